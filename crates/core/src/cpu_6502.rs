//! MOS 6502 CPU core implementation.
//!
//! This module provides a reusable, cycle-accurate 6502 CPU that can be used
//! by any system by implementing the [`Memory6502`] trait. All 56 documented
//! opcodes are decoded; the returned cycle counts include page-crossing and
//! branch penalties so a host system can tick its other components in
//! lockstep with the CPU.

use crate::logging::{log, LogCategory, LogLevel};
use thiserror::Error;

/// Status flag bits (NV-BDIZC).
pub const FLAG_CARRY: u8 = 0x01;
pub const FLAG_ZERO: u8 = 0x02;
pub const FLAG_IRQ_DISABLE: u8 = 0x04;
pub const FLAG_DECIMAL: u8 = 0x08;
pub const FLAG_BREAK: u8 = 0x10;
pub const FLAG_UNUSED: u8 = 0x20;
pub const FLAG_OVERFLOW: u8 = 0x40;
pub const FLAG_NEGATIVE: u8 = 0x80;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Memory interface trait for the 6502 CPU.
///
/// Systems using the 6502 must implement this trait to provide memory
/// access. The interrupt and stall hooks have no-op defaults so that plain
/// array-backed memories (tests, benches) only implement `read`/`write`.
pub trait Memory6502 {
    /// Read a byte from memory at the given address.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to memory at the given address.
    fn write(&mut self, addr: u16, val: u8);

    /// Take the pending-NMI latch, clearing it. Sampled once per
    /// instruction boundary.
    fn take_nmi(&mut self) -> bool {
        false
    }

    /// Level-sampled IRQ line.
    fn irq_asserted(&mut self) -> bool {
        false
    }

    /// Drain stall cycles the bus accumulated during the last instruction
    /// (OAM DMA, DMC sample fetches). Folded into the instruction cost.
    fn take_stall_cycles(&mut self) -> u32 {
        0
    }
}

/// Error returned when the CPU fetches an opcode outside the documented set.
///
/// The documented instruction set is closed, so this is always an engine or
/// ROM defect; callers are expected to abort emulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal opcode {opcode:#04X} at {pc:#06X}")]
pub struct IllegalOpcode {
    pub opcode: u8,
    pub pc: u16,
}

/// MOS 6502 CPU state and execution engine.
#[derive(Debug)]
pub struct Cpu6502<M: Memory6502> {
    /// Accumulator register
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer (points to 0x0100 + sp)
    pub sp: u8,
    /// Status register (NV-BDIZC); bit 5 always reads 1, bit 4 reads 0
    pub status: u8,
    /// Program counter
    pub pc: u16,
    /// Free-running cycle counter
    pub cycles: u64,
    /// Memory interface
    pub memory: M,
}

impl<M: Memory6502> Cpu6502<M> {
    /// Create a new 6502 in its power-on state. `reset` must be called
    /// before execution to load the reset vector.
    pub fn new(memory: M) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0x00,
            status: FLAG_IRQ_DISABLE | FLAG_UNUSED,
            pc: 0,
            cycles: 0,
            memory,
        }
    }

    /// Assert the reset line: SP drops by 3, interrupts are disabled, and
    /// PC is loaded from the vector at $FFFC. The internal reset sequence
    /// costs 7 cycles.
    pub fn reset(&mut self) {
        self.sp = self.sp.wrapping_sub(3);
        self.status |= FLAG_IRQ_DISABLE;
        self.pc = self.read_u16(RESET_VECTOR);
        self.cycles = self.cycles.wrapping_add(7);
    }

    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, val: u8) {
        self.memory.write(addr, val);
    }

    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    #[inline]
    fn fetch_u8(&mut self) -> u8 {
        let v = self.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    #[inline]
    fn fetch_u16(&mut self) -> u16 {
        let lo = self.fetch_u8() as u16;
        let hi = self.fetch_u8() as u16;
        (hi << 8) | lo
    }

    #[inline]
    fn tick(&mut self, n: u32) {
        self.cycles = self.cycles.wrapping_add(n as u64);
    }

    // ---- addressing modes ----
    //
    // The `(addr, crossed)` pairs report whether indexing crossed a 256-byte
    // page; read instructions add one cycle when it did, write and
    // read-modify-write instructions already account for the dummy access in
    // their base cost.

    #[inline]
    fn addr_zp(&mut self) -> u16 {
        self.fetch_u8() as u16
    }

    #[inline]
    fn addr_zpx(&mut self) -> u16 {
        self.fetch_u8().wrapping_add(self.x) as u16
    }

    #[inline]
    fn addr_zpy(&mut self) -> u16 {
        self.fetch_u8().wrapping_add(self.y) as u16
    }

    #[inline]
    fn addr_abs(&mut self) -> u16 {
        self.fetch_u16()
    }

    #[inline]
    fn addr_abx(&mut self) -> (u16, bool) {
        let base = self.fetch_u16();
        let addr = base.wrapping_add(self.x as u16);
        (addr, (addr ^ base) & 0xFF00 != 0)
    }

    #[inline]
    fn addr_aby(&mut self) -> (u16, bool) {
        let base = self.fetch_u16();
        let addr = base.wrapping_add(self.y as u16);
        (addr, (addr ^ base) & 0xFF00 != 0)
    }

    /// (Indirect,X): zero-page operand plus X selects a zero-page pointer.
    #[inline]
    fn addr_izx(&mut self) -> u16 {
        let zp = self.fetch_u8().wrapping_add(self.x);
        let lo = self.read(zp as u16) as u16;
        let hi = self.read(zp.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    /// (Indirect),Y: zero-page pointer plus Y, with page-cross detection.
    #[inline]
    fn addr_izy(&mut self) -> (u16, bool) {
        let zp = self.fetch_u8();
        let lo = self.read(zp as u16) as u16;
        let hi = self.read(zp.wrapping_add(1) as u16) as u16;
        let base = (hi << 8) | lo;
        let addr = base.wrapping_add(self.y as u16);
        (addr, (addr ^ base) & 0xFF00 != 0)
    }

    /// Read a 16-bit pointer for JMP (indirect) with the 6502 page-wrap bug:
    /// the high byte is fetched from the start of the same page when the
    /// pointer sits at $xxFF.
    #[inline]
    fn read_indirect_u16_bug(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.read(hi_addr) as u16;
        (hi << 8) | lo
    }

    // ---- stack ----

    #[inline]
    fn push_u8(&mut self, v: u8) {
        self.write(0x0100 | self.sp as u16, v);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    fn pop_u8(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read(0x0100 | self.sp as u16)
    }

    #[inline]
    fn push_u16(&mut self, v: u16) {
        self.push_u8((v >> 8) as u8);
        self.push_u8(v as u8);
    }

    #[inline]
    fn pop_u16(&mut self) -> u16 {
        let lo = self.pop_u8() as u16;
        let hi = self.pop_u8() as u16;
        (hi << 8) | lo
    }

    // ---- flags ----

    #[inline]
    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    #[inline]
    fn set_zn(&mut self, v: u8) {
        self.set_flag(FLAG_ZERO, v == 0);
        self.set_flag(FLAG_NEGATIVE, v & 0x80 != 0);
    }

    // ---- interrupt servicing ----

    /// Push PC and status (Break clear), disable interrupts, jump through
    /// the given vector. 7 cycles.
    fn interrupt(&mut self, vector: u16) {
        self.push_u16(self.pc);
        self.push_u8((self.status | FLAG_UNUSED) & !FLAG_BREAK);
        self.status |= FLAG_IRQ_DISABLE;
        self.pc = self.read_u16(vector);
        self.tick(7);
    }

    // ---- operations ----

    fn adc(&mut self, val: u8) {
        let carry_in = (self.status & FLAG_CARRY) as u16;
        let sum = self.a as u16 + val as u16 + carry_in;
        let result = sum as u8;
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        // overflow when both operands share a sign the result doesn't
        self.set_flag(FLAG_OVERFLOW, (!(self.a ^ val) & (self.a ^ result)) & 0x80 != 0);
        self.a = result;
        self.set_zn(result);
    }

    fn sbc(&mut self, val: u8) {
        // SBC is ADC of the one's complement; borrow is the inverted carry.
        self.adc(!val);
    }

    fn compare(&mut self, reg: u8, val: u8) {
        let result = reg.wrapping_sub(val);
        self.set_flag(FLAG_CARRY, reg >= val);
        self.set_zn(result);
    }

    fn bit(&mut self, val: u8) {
        self.set_flag(FLAG_ZERO, self.a & val == 0);
        self.set_flag(FLAG_OVERFLOW, val & 0x40 != 0);
        self.set_flag(FLAG_NEGATIVE, val & 0x80 != 0);
    }

    fn asl_val(&mut self, val: u8) -> u8 {
        self.set_flag(FLAG_CARRY, val & 0x80 != 0);
        let result = val << 1;
        self.set_zn(result);
        result
    }

    fn lsr_val(&mut self, val: u8) -> u8 {
        self.set_flag(FLAG_CARRY, val & 0x01 != 0);
        let result = val >> 1;
        self.set_zn(result);
        result
    }

    fn rol_val(&mut self, val: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, val & 0x80 != 0);
        let result = (val << 1) | carry_in;
        self.set_zn(result);
        result
    }

    fn ror_val(&mut self, val: u8) -> u8 {
        let carry_in = (self.status & FLAG_CARRY) << 7;
        self.set_flag(FLAG_CARRY, val & 0x01 != 0);
        let result = (val >> 1) | carry_in;
        self.set_zn(result);
        result
    }

    /// Conditional relative branch: 2 cycles, +1 when taken, +1 more when
    /// the target lies in a different page than the following instruction.
    fn branch(&mut self, cond: bool) {
        let offset = self.fetch_u8() as i8;
        self.tick(2);
        if cond {
            self.tick(1);
            let target = self.pc.wrapping_add(offset as u16);
            if (target ^ self.pc) & 0xFF00 != 0 {
                self.tick(1);
            }
            self.pc = target;
        }
    }

    /// Execute one instruction (servicing a pending interrupt first) and
    /// return the cycles consumed, including penalties and DMA stalls.
    pub fn step(&mut self) -> Result<u32, IllegalOpcode> {
        let start = self.cycles;

        if self.memory.take_nmi() {
            self.interrupt(NMI_VECTOR);
        } else if self.status & FLAG_IRQ_DISABLE == 0 && self.memory.irq_asserted() {
            self.interrupt(IRQ_VECTOR);
        }

        let pc = self.pc;
        let op = self.fetch_u8();
        self.execute(op, pc)?;

        let stall = self.memory.take_stall_cycles();
        self.tick(stall);

        Ok((self.cycles - start) as u32)
    }

    fn execute(&mut self, op: u8, pc: u16) -> Result<(), IllegalOpcode> {
        match op {
            // ---- loads ----
            0xA9 => { let v = self.fetch_u8(); self.a = v; self.set_zn(v); self.tick(2); }
            0xA5 => { let a = self.addr_zp(); let v = self.read(a); self.a = v; self.set_zn(v); self.tick(3); }
            0xB5 => { let a = self.addr_zpx(); let v = self.read(a); self.a = v; self.set_zn(v); self.tick(4); }
            0xAD => { let a = self.addr_abs(); let v = self.read(a); self.a = v; self.set_zn(v); self.tick(4); }
            0xBD => { let (a, p) = self.addr_abx(); let v = self.read(a); self.a = v; self.set_zn(v); self.tick(4 + p as u32); }
            0xB9 => { let (a, p) = self.addr_aby(); let v = self.read(a); self.a = v; self.set_zn(v); self.tick(4 + p as u32); }
            0xA1 => { let a = self.addr_izx(); let v = self.read(a); self.a = v; self.set_zn(v); self.tick(6); }
            0xB1 => { let (a, p) = self.addr_izy(); let v = self.read(a); self.a = v; self.set_zn(v); self.tick(5 + p as u32); }

            0xA2 => { let v = self.fetch_u8(); self.x = v; self.set_zn(v); self.tick(2); }
            0xA6 => { let a = self.addr_zp(); let v = self.read(a); self.x = v; self.set_zn(v); self.tick(3); }
            0xB6 => { let a = self.addr_zpy(); let v = self.read(a); self.x = v; self.set_zn(v); self.tick(4); }
            0xAE => { let a = self.addr_abs(); let v = self.read(a); self.x = v; self.set_zn(v); self.tick(4); }
            0xBE => { let (a, p) = self.addr_aby(); let v = self.read(a); self.x = v; self.set_zn(v); self.tick(4 + p as u32); }

            0xA0 => { let v = self.fetch_u8(); self.y = v; self.set_zn(v); self.tick(2); }
            0xA4 => { let a = self.addr_zp(); let v = self.read(a); self.y = v; self.set_zn(v); self.tick(3); }
            0xB4 => { let a = self.addr_zpx(); let v = self.read(a); self.y = v; self.set_zn(v); self.tick(4); }
            0xAC => { let a = self.addr_abs(); let v = self.read(a); self.y = v; self.set_zn(v); self.tick(4); }
            0xBC => { let (a, p) = self.addr_abx(); let v = self.read(a); self.y = v; self.set_zn(v); self.tick(4 + p as u32); }

            // ---- stores ----
            0x85 => { let a = self.addr_zp(); let v = self.a; self.write(a, v); self.tick(3); }
            0x95 => { let a = self.addr_zpx(); let v = self.a; self.write(a, v); self.tick(4); }
            0x8D => { let a = self.addr_abs(); let v = self.a; self.write(a, v); self.tick(4); }
            0x9D => { let (a, _) = self.addr_abx(); let v = self.a; self.write(a, v); self.tick(5); }
            0x99 => { let (a, _) = self.addr_aby(); let v = self.a; self.write(a, v); self.tick(5); }
            0x81 => { let a = self.addr_izx(); let v = self.a; self.write(a, v); self.tick(6); }
            0x91 => { let (a, _) = self.addr_izy(); let v = self.a; self.write(a, v); self.tick(6); }

            0x86 => { let a = self.addr_zp(); let v = self.x; self.write(a, v); self.tick(3); }
            0x96 => { let a = self.addr_zpy(); let v = self.x; self.write(a, v); self.tick(4); }
            0x8E => { let a = self.addr_abs(); let v = self.x; self.write(a, v); self.tick(4); }

            0x84 => { let a = self.addr_zp(); let v = self.y; self.write(a, v); self.tick(3); }
            0x94 => { let a = self.addr_zpx(); let v = self.y; self.write(a, v); self.tick(4); }
            0x8C => { let a = self.addr_abs(); let v = self.y; self.write(a, v); self.tick(4); }

            // ---- transfers ----
            0xAA => { self.x = self.a; let v = self.x; self.set_zn(v); self.tick(2); }
            0xA8 => { self.y = self.a; let v = self.y; self.set_zn(v); self.tick(2); }
            0xBA => { self.x = self.sp; let v = self.x; self.set_zn(v); self.tick(2); }
            0x8A => { self.a = self.x; let v = self.a; self.set_zn(v); self.tick(2); }
            0x9A => { self.sp = self.x; self.tick(2); }
            0x98 => { self.a = self.y; let v = self.a; self.set_zn(v); self.tick(2); }

            // ---- stack ----
            0x48 => { let v = self.a; self.push_u8(v); self.tick(3); }
            0x68 => { let v = self.pop_u8(); self.a = v; self.set_zn(v); self.tick(4); }
            0x08 => {
                // PHP pushes with Break and Unused set
                let v = self.status | FLAG_BREAK | FLAG_UNUSED;
                self.push_u8(v);
                self.tick(3);
            }
            0x28 => {
                // PLP leaves Break clear in the live register, Unused set
                let v = self.pop_u8();
                self.status = (v | FLAG_UNUSED) & !FLAG_BREAK;
                self.tick(4);
            }

            // ---- logic ----
            0x29 => { let v = self.fetch_u8(); self.a &= v; let r = self.a; self.set_zn(r); self.tick(2); }
            0x25 => { let a = self.addr_zp(); let v = self.read(a); self.a &= v; let r = self.a; self.set_zn(r); self.tick(3); }
            0x35 => { let a = self.addr_zpx(); let v = self.read(a); self.a &= v; let r = self.a; self.set_zn(r); self.tick(4); }
            0x2D => { let a = self.addr_abs(); let v = self.read(a); self.a &= v; let r = self.a; self.set_zn(r); self.tick(4); }
            0x3D => { let (a, p) = self.addr_abx(); let v = self.read(a); self.a &= v; let r = self.a; self.set_zn(r); self.tick(4 + p as u32); }
            0x39 => { let (a, p) = self.addr_aby(); let v = self.read(a); self.a &= v; let r = self.a; self.set_zn(r); self.tick(4 + p as u32); }
            0x21 => { let a = self.addr_izx(); let v = self.read(a); self.a &= v; let r = self.a; self.set_zn(r); self.tick(6); }
            0x31 => { let (a, p) = self.addr_izy(); let v = self.read(a); self.a &= v; let r = self.a; self.set_zn(r); self.tick(5 + p as u32); }

            0x09 => { let v = self.fetch_u8(); self.a |= v; let r = self.a; self.set_zn(r); self.tick(2); }
            0x05 => { let a = self.addr_zp(); let v = self.read(a); self.a |= v; let r = self.a; self.set_zn(r); self.tick(3); }
            0x15 => { let a = self.addr_zpx(); let v = self.read(a); self.a |= v; let r = self.a; self.set_zn(r); self.tick(4); }
            0x0D => { let a = self.addr_abs(); let v = self.read(a); self.a |= v; let r = self.a; self.set_zn(r); self.tick(4); }
            0x1D => { let (a, p) = self.addr_abx(); let v = self.read(a); self.a |= v; let r = self.a; self.set_zn(r); self.tick(4 + p as u32); }
            0x19 => { let (a, p) = self.addr_aby(); let v = self.read(a); self.a |= v; let r = self.a; self.set_zn(r); self.tick(4 + p as u32); }
            0x01 => { let a = self.addr_izx(); let v = self.read(a); self.a |= v; let r = self.a; self.set_zn(r); self.tick(6); }
            0x11 => { let (a, p) = self.addr_izy(); let v = self.read(a); self.a |= v; let r = self.a; self.set_zn(r); self.tick(5 + p as u32); }

            0x49 => { let v = self.fetch_u8(); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(2); }
            0x45 => { let a = self.addr_zp(); let v = self.read(a); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(3); }
            0x55 => { let a = self.addr_zpx(); let v = self.read(a); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(4); }
            0x4D => { let a = self.addr_abs(); let v = self.read(a); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(4); }
            0x5D => { let (a, p) = self.addr_abx(); let v = self.read(a); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(4 + p as u32); }
            0x59 => { let (a, p) = self.addr_aby(); let v = self.read(a); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(4 + p as u32); }
            0x41 => { let a = self.addr_izx(); let v = self.read(a); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(6); }
            0x51 => { let (a, p) = self.addr_izy(); let v = self.read(a); self.a ^= v; let r = self.a; self.set_zn(r); self.tick(5 + p as u32); }

            0x24 => { let a = self.addr_zp(); let v = self.read(a); self.bit(v); self.tick(3); }
            0x2C => { let a = self.addr_abs(); let v = self.read(a); self.bit(v); self.tick(4); }

            // ---- arithmetic ----
            0x69 => { let v = self.fetch_u8(); self.adc(v); self.tick(2); }
            0x65 => { let a = self.addr_zp(); let v = self.read(a); self.adc(v); self.tick(3); }
            0x75 => { let a = self.addr_zpx(); let v = self.read(a); self.adc(v); self.tick(4); }
            0x6D => { let a = self.addr_abs(); let v = self.read(a); self.adc(v); self.tick(4); }
            0x7D => { let (a, p) = self.addr_abx(); let v = self.read(a); self.adc(v); self.tick(4 + p as u32); }
            0x79 => { let (a, p) = self.addr_aby(); let v = self.read(a); self.adc(v); self.tick(4 + p as u32); }
            0x61 => { let a = self.addr_izx(); let v = self.read(a); self.adc(v); self.tick(6); }
            0x71 => { let (a, p) = self.addr_izy(); let v = self.read(a); self.adc(v); self.tick(5 + p as u32); }

            0xE9 => { let v = self.fetch_u8(); self.sbc(v); self.tick(2); }
            0xE5 => { let a = self.addr_zp(); let v = self.read(a); self.sbc(v); self.tick(3); }
            0xF5 => { let a = self.addr_zpx(); let v = self.read(a); self.sbc(v); self.tick(4); }
            0xED => { let a = self.addr_abs(); let v = self.read(a); self.sbc(v); self.tick(4); }
            0xFD => { let (a, p) = self.addr_abx(); let v = self.read(a); self.sbc(v); self.tick(4 + p as u32); }
            0xF9 => { let (a, p) = self.addr_aby(); let v = self.read(a); self.sbc(v); self.tick(4 + p as u32); }
            0xE1 => { let a = self.addr_izx(); let v = self.read(a); self.sbc(v); self.tick(6); }
            0xF1 => { let (a, p) = self.addr_izy(); let v = self.read(a); self.sbc(v); self.tick(5 + p as u32); }

            0xC9 => { let v = self.fetch_u8(); let r = self.a; self.compare(r, v); self.tick(2); }
            0xC5 => { let a = self.addr_zp(); let v = self.read(a); let r = self.a; self.compare(r, v); self.tick(3); }
            0xD5 => { let a = self.addr_zpx(); let v = self.read(a); let r = self.a; self.compare(r, v); self.tick(4); }
            0xCD => { let a = self.addr_abs(); let v = self.read(a); let r = self.a; self.compare(r, v); self.tick(4); }
            0xDD => { let (a, p) = self.addr_abx(); let v = self.read(a); let r = self.a; self.compare(r, v); self.tick(4 + p as u32); }
            0xD9 => { let (a, p) = self.addr_aby(); let v = self.read(a); let r = self.a; self.compare(r, v); self.tick(4 + p as u32); }
            0xC1 => { let a = self.addr_izx(); let v = self.read(a); let r = self.a; self.compare(r, v); self.tick(6); }
            0xD1 => { let (a, p) = self.addr_izy(); let v = self.read(a); let r = self.a; self.compare(r, v); self.tick(5 + p as u32); }

            0xE0 => { let v = self.fetch_u8(); let r = self.x; self.compare(r, v); self.tick(2); }
            0xE4 => { let a = self.addr_zp(); let v = self.read(a); let r = self.x; self.compare(r, v); self.tick(3); }
            0xEC => { let a = self.addr_abs(); let v = self.read(a); let r = self.x; self.compare(r, v); self.tick(4); }

            0xC0 => { let v = self.fetch_u8(); let r = self.y; self.compare(r, v); self.tick(2); }
            0xC4 => { let a = self.addr_zp(); let v = self.read(a); let r = self.y; self.compare(r, v); self.tick(3); }
            0xCC => { let a = self.addr_abs(); let v = self.read(a); let r = self.y; self.compare(r, v); self.tick(4); }

            // ---- increments / decrements ----
            0xE6 => { let a = self.addr_zp(); let v = self.read(a).wrapping_add(1); self.write(a, v); self.set_zn(v); self.tick(5); }
            0xF6 => { let a = self.addr_zpx(); let v = self.read(a).wrapping_add(1); self.write(a, v); self.set_zn(v); self.tick(6); }
            0xEE => { let a = self.addr_abs(); let v = self.read(a).wrapping_add(1); self.write(a, v); self.set_zn(v); self.tick(6); }
            0xFE => { let (a, _) = self.addr_abx(); let v = self.read(a).wrapping_add(1); self.write(a, v); self.set_zn(v); self.tick(7); }
            0xE8 => { self.x = self.x.wrapping_add(1); let v = self.x; self.set_zn(v); self.tick(2); }
            0xC8 => { self.y = self.y.wrapping_add(1); let v = self.y; self.set_zn(v); self.tick(2); }

            0xC6 => { let a = self.addr_zp(); let v = self.read(a).wrapping_sub(1); self.write(a, v); self.set_zn(v); self.tick(5); }
            0xD6 => { let a = self.addr_zpx(); let v = self.read(a).wrapping_sub(1); self.write(a, v); self.set_zn(v); self.tick(6); }
            0xCE => { let a = self.addr_abs(); let v = self.read(a).wrapping_sub(1); self.write(a, v); self.set_zn(v); self.tick(6); }
            0xDE => { let (a, _) = self.addr_abx(); let v = self.read(a).wrapping_sub(1); self.write(a, v); self.set_zn(v); self.tick(7); }
            0xCA => { self.x = self.x.wrapping_sub(1); let v = self.x; self.set_zn(v); self.tick(2); }
            0x88 => { self.y = self.y.wrapping_sub(1); let v = self.y; self.set_zn(v); self.tick(2); }

            // ---- shifts / rotates ----
            0x0A => { let v = self.a; self.a = self.asl_val(v); self.tick(2); }
            0x06 => { let a = self.addr_zp(); let v = self.read(a); let r = self.asl_val(v); self.write(a, r); self.tick(5); }
            0x16 => { let a = self.addr_zpx(); let v = self.read(a); let r = self.asl_val(v); self.write(a, r); self.tick(6); }
            0x0E => { let a = self.addr_abs(); let v = self.read(a); let r = self.asl_val(v); self.write(a, r); self.tick(6); }
            0x1E => { let (a, _) = self.addr_abx(); let v = self.read(a); let r = self.asl_val(v); self.write(a, r); self.tick(7); }

            0x4A => { let v = self.a; self.a = self.lsr_val(v); self.tick(2); }
            0x46 => { let a = self.addr_zp(); let v = self.read(a); let r = self.lsr_val(v); self.write(a, r); self.tick(5); }
            0x56 => { let a = self.addr_zpx(); let v = self.read(a); let r = self.lsr_val(v); self.write(a, r); self.tick(6); }
            0x4E => { let a = self.addr_abs(); let v = self.read(a); let r = self.lsr_val(v); self.write(a, r); self.tick(6); }
            0x5E => { let (a, _) = self.addr_abx(); let v = self.read(a); let r = self.lsr_val(v); self.write(a, r); self.tick(7); }

            0x2A => { let v = self.a; self.a = self.rol_val(v); self.tick(2); }
            0x26 => { let a = self.addr_zp(); let v = self.read(a); let r = self.rol_val(v); self.write(a, r); self.tick(5); }
            0x36 => { let a = self.addr_zpx(); let v = self.read(a); let r = self.rol_val(v); self.write(a, r); self.tick(6); }
            0x2E => { let a = self.addr_abs(); let v = self.read(a); let r = self.rol_val(v); self.write(a, r); self.tick(6); }
            0x3E => { let (a, _) = self.addr_abx(); let v = self.read(a); let r = self.rol_val(v); self.write(a, r); self.tick(7); }

            0x6A => { let v = self.a; self.a = self.ror_val(v); self.tick(2); }
            0x66 => { let a = self.addr_zp(); let v = self.read(a); let r = self.ror_val(v); self.write(a, r); self.tick(5); }
            0x76 => { let a = self.addr_zpx(); let v = self.read(a); let r = self.ror_val(v); self.write(a, r); self.tick(6); }
            0x6E => { let a = self.addr_abs(); let v = self.read(a); let r = self.ror_val(v); self.write(a, r); self.tick(6); }
            0x7E => { let (a, _) = self.addr_abx(); let v = self.read(a); let r = self.ror_val(v); self.write(a, r); self.tick(7); }

            // ---- jumps ----
            0x4C => { self.pc = self.fetch_u16(); self.tick(3); }
            0x6C => {
                let ptr = self.fetch_u16();
                self.pc = self.read_indirect_u16_bug(ptr);
                self.tick(5);
            }
            0x20 => {
                // JSR pushes the address of its last byte
                let target = self.fetch_u16();
                let ret = self.pc.wrapping_sub(1);
                self.push_u16(ret);
                self.pc = target;
                self.tick(6);
            }
            0x60 => {
                let ret = self.pop_u16();
                self.pc = ret.wrapping_add(1);
                self.tick(6);
            }

            // ---- branches ----
            0x90 => { let c = self.status & FLAG_CARRY == 0; self.branch(c); }
            0xB0 => { let c = self.status & FLAG_CARRY != 0; self.branch(c); }
            0xF0 => { let c = self.status & FLAG_ZERO != 0; self.branch(c); }
            0xD0 => { let c = self.status & FLAG_ZERO == 0; self.branch(c); }
            0x30 => { let c = self.status & FLAG_NEGATIVE != 0; self.branch(c); }
            0x10 => { let c = self.status & FLAG_NEGATIVE == 0; self.branch(c); }
            0x70 => { let c = self.status & FLAG_OVERFLOW != 0; self.branch(c); }
            0x50 => { let c = self.status & FLAG_OVERFLOW == 0; self.branch(c); }

            // ---- flag operations ----
            0x18 => { self.status &= !FLAG_CARRY; self.tick(2); }
            0x38 => { self.status |= FLAG_CARRY; self.tick(2); }
            0x58 => { self.status &= !FLAG_IRQ_DISABLE; self.tick(2); }
            0x78 => { self.status |= FLAG_IRQ_DISABLE; self.tick(2); }
            0xB8 => { self.status &= !FLAG_OVERFLOW; self.tick(2); }
            0xD8 => { self.status &= !FLAG_DECIMAL; self.tick(2); }
            0xF8 => { self.status |= FLAG_DECIMAL; self.tick(2); }

            // ---- system ----
            0x00 => {
                // BRK pushes PC past its padding byte, with Break set
                let ret = self.pc.wrapping_add(1);
                self.push_u16(ret);
                let v = self.status | FLAG_BREAK | FLAG_UNUSED;
                self.push_u8(v);
                self.status |= FLAG_IRQ_DISABLE;
                self.pc = self.read_u16(IRQ_VECTOR);
                self.tick(7);
            }
            0x40 => {
                // RTI restores flags (Break transient, Unused forced)
                let v = self.pop_u8();
                self.status = (v | FLAG_UNUSED) & !FLAG_BREAK;
                self.pc = self.pop_u16();
                self.tick(6);
            }
            0xEA => { self.tick(2); }

            _ => {
                log(LogCategory::Cpu, LogLevel::Error, || {
                    format!("illegal opcode {op:#04X} at {pc:#06X}")
                });
                return Err(IllegalOpcode { opcode: op, pc });
            }
        }
        Ok(())
    }
}
