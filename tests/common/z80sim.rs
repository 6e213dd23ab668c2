//! Minimal Z80 interpreter for behavioural tests of compiled flow constructs.
//!
//! Covers the branch forms the encoder emits plus a handful of accumulator
//! instructions used to drive conditions. `OUT (n),A` records `n` as a marker
//! so tests can assert which blocks ran and in what order.

use flowforge::core::codestream::CodeStream;
use flowforge::flow::{FlowCompiler, FlowConfig};
use flowforge::z80::Z80Encoder;

pub const DEFAULT_STEP_LIMIT: usize = 10_000;

pub fn nop() -> [u8; 1] {
    [0x00]
}

pub fn ld_a(n: u8) -> [u8; 2] {
    [0x3E, n]
}

pub fn ld_b(n: u8) -> [u8; 2] {
    [0x06, n]
}

pub fn inc_a() -> [u8; 1] {
    [0x3C]
}

pub fn dec_a() -> [u8; 1] {
    [0x3D]
}

pub fn cp(n: u8) -> [u8; 2] {
    [0xFE, n]
}

pub fn scf() -> [u8; 1] {
    [0x37]
}

pub fn ccf() -> [u8; 1] {
    [0x3F]
}

/// `OUT (n),A`, recorded as marker `n`.
pub fn marker(n: u8) -> [u8; 2] {
    [0xD3, n]
}

pub fn z80_compiler(origin: u16) -> FlowCompiler {
    FlowCompiler::new(
        Box::new(Z80Encoder),
        FlowConfig {
            origin,
            ..FlowConfig::default()
        },
    )
}

/// Build a program with `build`, finish it and return the image.
pub fn compile(origin: u16, build: impl FnOnce(&mut FlowCompiler)) -> CodeStream {
    let mut flow = z80_compiler(origin);
    build(&mut flow);
    flow.finish().expect("balanced program")
}

/// Run `code` from its origin until control reaches the end of the image.
pub fn run(code: &CodeStream) -> Result<Vec<u8>, String> {
    let mut sim = Z80Sim::load(code);
    sim.run_until(code.here(), DEFAULT_STEP_LIMIT)?;
    Ok(sim.markers)
}

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    zero: bool,
    carry: bool,
    sign: bool,
    parity_even: bool,
}

pub struct Z80Sim {
    mem: Vec<u8>,
    pc: u16,
    a: u8,
    b: u8,
    flags: Flags,
    pub markers: Vec<u8>,
    pub steps: usize,
}

impl Z80Sim {
    pub fn load(code: &CodeStream) -> Self {
        let mut mem = vec![0x76; 0x1_0000];
        let start = usize::from(code.origin());
        mem[start..start + code.len()].copy_from_slice(code.bytes());
        Self {
            mem,
            pc: code.origin(),
            a: 0,
            b: 0,
            flags: Flags::default(),
            markers: Vec::new(),
            steps: 0,
        }
    }

    pub fn run_until(&mut self, stop: u16, step_limit: usize) -> Result<(), String> {
        while self.pc != stop {
            if self.steps >= step_limit {
                return Err(format!("step limit hit at ${:04X}", self.pc));
            }
            self.step()?;
            self.steps += 1;
        }
        Ok(())
    }

    fn fetch(&mut self) -> u8 {
        let byte = self.mem[usize::from(self.pc)];
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch();
        let hi = self.fetch();
        u16::from_le_bytes([lo, hi])
    }

    fn jump_relative(&mut self, disp: u8) {
        self.pc = self.pc.wrapping_add(disp as i8 as u16);
    }

    fn set_result_flags(&mut self, value: u8) {
        self.flags.zero = value == 0;
        self.flags.sign = value & 0x80 != 0;
        self.flags.parity_even = value.count_ones() % 2 == 0;
    }

    /// 8080-style 3-bit condition field.
    fn condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flags.zero,
            1 => self.flags.zero,
            2 => !self.flags.carry,
            3 => self.flags.carry,
            4 => !self.flags.parity_even,
            5 => self.flags.parity_even,
            6 => !self.flags.sign,
            _ => self.flags.sign,
        }
    }

    fn step(&mut self) -> Result<(), String> {
        let at = self.pc;
        let op = self.fetch();
        match op {
            0x00 => {}
            0x06 => self.b = self.fetch(),
            0x3E => self.a = self.fetch(),
            0x3C => {
                self.a = self.a.wrapping_add(1);
                self.set_result_flags(self.a);
            }
            0x3D => {
                self.a = self.a.wrapping_sub(1);
                self.set_result_flags(self.a);
            }
            0xFE => {
                let n = self.fetch();
                let result = self.a.wrapping_sub(n);
                self.set_result_flags(result);
                self.flags.carry = self.a < n;
            }
            0x37 => self.flags.carry = true,
            0x3F => self.flags.carry = !self.flags.carry,
            0xD3 => {
                let n = self.fetch();
                self.markers.push(n);
            }
            0x10 => {
                let disp = self.fetch();
                self.b = self.b.wrapping_sub(1);
                if self.b != 0 {
                    self.jump_relative(disp);
                }
            }
            0x18 => {
                let disp = self.fetch();
                self.jump_relative(disp);
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let disp = self.fetch();
                if self.condition((op >> 3) & 0x03) {
                    self.jump_relative(disp);
                }
            }
            0xC3 => self.pc = self.fetch_word(),
            op if op & 0xC7 == 0xC2 => {
                let target = self.fetch_word();
                if self.condition((op >> 3) & 0x07) {
                    self.pc = target;
                }
            }
            0x76 => return Err(format!("halted at ${at:04X}")),
            other => return Err(format!("unsupported opcode ${other:02X} at ${at:04X}")),
        }
        Ok(())
    }
}
