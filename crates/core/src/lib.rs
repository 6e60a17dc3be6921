//! Core emulation primitives and traits.

pub mod apu;
pub mod cpu_6502;
pub mod logging;

pub mod types {
    use serde::Serialize;

    /// RGB frame buffer with pixels packed as 0xFFRRGGBB.
    #[derive(Debug, Clone, Serialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }

        /// Store a pixel; out-of-range coordinates are ignored.
        #[inline]
        pub fn put(&mut self, x: u32, y: u32, rgb: u32) {
            if x < self.width && y < self.height {
                self.pixels[(y * self.width + x) as usize] = rgb;
            }
        }

        #[inline]
        pub fn get(&self, x: u32, y: u32) -> u32 {
            if x < self.width && y < self.height {
                self.pixels[(y * self.width + x) as usize]
            } else {
                0
            }
        }
    }

    pub type AudioSample = i16;
}

/// A high-level System trait tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state.
    fn reset(&mut self);

    /// Emulate until a frame is produced and return a copy of the framebuffer.
    fn step_frame(&mut self) -> Result<types::Frame, Self::Error>;

    /// Return a JSON snapshot of interesting internal state for inspection.
    fn debug_state(&self) -> serde_json::Value;
}
