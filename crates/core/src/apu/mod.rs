//! Core APU (Audio Processing Unit) components.
//!
//! Reusable audio synthesis units for the 2A03 APU, one per file:
//!
//! - **Pulse Channel**: duty-sequenced square wave with sweep and envelope
//! - **Triangle Channel**: 32-step triangle wave gated by two counters
//! - **Noise Channel**: 15-bit LFSR noise generator
//! - **DMC Channel**: 1-bit delta-encoded sample playback
//! - **Length Counter / Envelope / Sweep**: shared channel sub-units
//! - **Frame Counter**: half-cycle-exact 4/5-step sequencer
//! - **Mixer**: canonical non-linear lookup-table mixer
//!
//! The units hold no bus references; the system crate wires registers,
//! memory fetches, and sampling around them.

pub mod dmc;
pub mod envelope;
pub mod frame_counter;
pub mod length_counter;
pub mod mixer;
pub mod noise;
pub mod pulse;
pub mod sweep;
pub mod timing;
pub mod triangle;

pub use dmc::DmcChannel;
pub use envelope::Envelope;
pub use frame_counter::FrameCounter;
pub use length_counter::{LengthCounter, LENGTH_TABLE};
pub use mixer::Mixer;
pub use noise::NoiseChannel;
pub use pulse::PulseChannel;
pub use sweep::SweepUnit;
pub use timing::TimingMode;
pub use triangle::TriangleChannel;
