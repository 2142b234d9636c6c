/*
    interp86
    https://github.com/dbalsom/interp86

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    mod.rs

    The interpreter core. `run` executes instructions against a bus until
    the cycle budget runs out or the guest reaches a state the embedder
    must handle (HALT, a pending trap, a host callback). Each instruction
    flows through a Load / Operate / Store pipeline selected by the opcode
    table; prefix bytes restart the Load phase with accumulated state.

    The fetch pointer (`inst.cseip`) runs ahead of the architectural IP
    during an instruction; `retire` folds it back into IP when the
    instruction completes, and control transfers overwrite both through
    `set_ip`. A faulting instruction therefore never advances IP, and the
    run loop unwinds its partial flag and stack-pointer effects before
    surfacing the fault.

*/

pub mod addressing;
pub mod alu;
pub mod bcd;
pub mod bitwise;
pub mod decode;
pub mod flags;
pub mod interrupt;
pub mod load;
pub mod muldiv;
pub mod operate;
pub mod optable;
pub mod registers;
pub mod segments;
pub mod stack;
pub mod store;
pub mod string;

use crate::{bus::Bus, memerror::MemFault};
use interp86_common::{CoreConfig, CpuLevel};

use decode::{Inst, PREFIX_ADDR};
use flags::{Flags, Width, FLAG_TF};
use optable::OPCODE_TABLE;
use registers::Registers;
use segments::{SegReg, Segments};

/// Why `run` returned to the embedder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunExit {
    /// Cycle budget exhausted, or the core yielded so a pending external
    /// interrupt can be delivered.
    None,
    /// TF is set; the embedder should single-step through a trap-aware
    /// path.
    Trap,
    /// HLT executed.
    Halt,
    /// A callback pseudo-instruction fired; the payload selects the host
    /// handler.
    Callback(u16),
}

/// Instruction pipeline verdicts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Pipe {
    /// Prefix handled; re-enter decode for the next byte.
    Restart,
    /// Continue to the next phase.
    Next,
    /// Instruction complete; skip the remaining phases.
    Retire,
    /// Instruction complete and the run loop must return.
    Exit(RunExit),
}

pub struct Cpu {
    pub regs: Registers,
    pub segments: Segments,
    pub flags: Flags,
    level: CpuLevel,
    trace_illegal: bool,
    /// Protected-mode flag (CR0.PE). Real-mode semantics apply when clear.
    pub pmode: bool,
    pub cpl: u8,
    pub cr: [u32; 8],
    pub dr: [u32; 8],
    pub tr: [u32; 8],
    pub ldtr: u16,
    pub task_reg: u16,
    pub gdt_base: u32,
    pub gdt_limit: u16,
    pub idt_base: u32,
    pub idt_limit: u16,
    cycles: i64,
    cycle_total: u64,
    pub(crate) inst: Inst,
}

impl Cpu {
    pub fn new(config: &CoreConfig) -> Cpu {
        let mut cpu = Cpu {
            regs: Registers::default(),
            segments: Segments::default(),
            flags: Flags::new(),
            level: config.cpu_level,
            trace_illegal: config.trace_illegal,
            pmode: false,
            cpl: 0,
            cr: [0; 8],
            dr: [0; 8],
            tr: [0; 8],
            ldtr: 0,
            task_reg: 0,
            gdt_base: 0,
            gdt_limit: 0,
            idt_base: 0,
            idt_limit: 0x03FF,
            cycles: 0,
            cycle_total: 0,
            inst: Inst::default(),
        };
        cpu.reset();
        cpu
    }

    /// Return to the architectural power-on state.
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.segments = Segments::default();
        self.flags = Flags::new();
        self.pmode = false;
        self.cpl = 0;
        self.cr = [0; 8];
        self.idt_base = 0;
        self.idt_limit = 0x03FF;
        self.segments.reload(SegReg::CS, 0xF000);
        self.regs.ip = 0xFFF0;
        log::debug!("cpu reset, level {:?}", self.level);
    }

    #[inline(always)]
    pub fn cpu_level(&self) -> CpuLevel {
        self.level
    }

    /// Total instructions retired since construction.
    #[inline(always)]
    pub fn cycle_total(&self) -> u64 {
        self.cycle_total
    }

    /// Execute up to `budget` instruction cycles. Returns early when the
    /// guest halts, requests a host callback, yields for interrupt
    /// delivery, or has TF set. A memory fault unwinds the partial flag
    /// and stack-pointer state of the faulting instruction; IP still
    /// points at it, so execution can resume after the embedder services
    /// the fault.
    pub fn run(&mut self, bus: &mut impl Bus, budget: u32) -> Result<RunExit, MemFault> {
        self.cycles = i64::from(budget);
        loop {
            if self.flags.test(FLAG_TF) {
                return Ok(RunExit::Trap);
            }
            if self.cycles <= 0 {
                return Ok(RunExit::None);
            }
            let saved_flags = self.flags;
            let saved_esp = self.regs.esp();
            match self.step(bus) {
                Ok(None) => {
                    self.cycles -= 1;
                    self.cycle_total += 1;
                }
                Ok(Some(exit)) => {
                    self.cycle_total += 1;
                    return Ok(exit);
                }
                Err(fault) => {
                    self.flags = saved_flags;
                    self.regs.set_esp(saved_esp);
                    return Err(fault);
                }
            }
        }
    }

    /// Decode and execute a single instruction.
    fn step(&mut self, bus: &mut impl Bus) -> Result<Option<RunExit>, MemFault> {
        let big = self.segments.cache(SegReg::CS).big;
        self.inst = Inst {
            entry: if big { 0x200 } else { 0 },
            prefix: if big { PREFIX_ADDR } else { 0 },
            start_ip: self.regs.ip,
            cseip: self.segments.base(SegReg::CS).wrapping_add(self.regs.ip),
            ..Inst::default()
        };
        loop {
            let opcode = self.fetch_u8(bus)?;
            self.inst.entry = (self.inst.entry & 0xFF00) | u16::from(opcode);
            self.inst.code = OPCODE_TABLE[self.inst.entry as usize];
            match self.load(bus)? {
                Pipe::Restart => continue,
                Pipe::Retire => break,
                Pipe::Exit(exit) => {
                    self.retire();
                    return Ok(Some(exit));
                }
                Pipe::Next => match self.operate(bus)? {
                    Pipe::Retire => break,
                    Pipe::Exit(exit) => {
                        self.retire();
                        return Ok(Some(exit));
                    }
                    _ => {
                        self.store(bus)?;
                        break;
                    }
                },
            }
        }
        self.retire();
        Ok(None)
    }

    /// Fold the fetch pointer back into the architectural IP.
    #[inline(always)]
    fn retire(&mut self) {
        self.regs.ip = self
            .inst
            .cseip
            .wrapping_sub(self.segments.base(SegReg::CS));
    }

    /// Control transfer: update IP and the fetch pointer together, so a
    /// subsequent `retire` is a no-op.
    #[inline(always)]
    pub(crate) fn set_ip(&mut self, ip: u32) {
        self.regs.ip = ip;
        self.inst.cseip = self.segments.base(SegReg::CS).wrapping_add(ip);
    }

    /// Register view of the E operand (mod=11).
    #[inline(always)]
    pub(crate) fn e_reg(&self, width: Width) -> u32 {
        let idx = self.inst.rm_eai as usize;
        match width {
            Width::Byte => u32::from(self.regs.r8(idx)),
            Width::Word => u32::from(self.regs.r16(idx)),
            Width::Dword => self.regs.r32(idx),
        }
    }

    #[inline(always)]
    pub(crate) fn set_e_reg(&mut self, width: Width, value: u32) {
        let idx = self.inst.rm_eai as usize;
        match width {
            Width::Byte => self.regs.set_r8(idx, value as u8),
            Width::Word => self.regs.set_r16(idx, value as u16),
            Width::Dword => self.regs.set_r32(idx, value),
        }
    }

    /// Read the E operand: register for mod=11, memory otherwise.
    pub(crate) fn read_e(&mut self, bus: &mut impl Bus, width: Width) -> Result<u32, MemFault> {
        if self.inst.rm_mod == 3 {
            Ok(self.e_reg(width))
        }
        else {
            match width {
                Width::Byte => Ok(u32::from(bus.read_u8(self.inst.rm_eaa)?)),
                Width::Word => Ok(u32::from(bus.read_u16(self.inst.rm_eaa)?)),
                Width::Dword => bus.read_u32(self.inst.rm_eaa),
            }
        }
    }

    pub(crate) fn write_e(
        &mut self,
        bus: &mut impl Bus,
        width: Width,
        value: u32,
    ) -> Result<(), MemFault> {
        if self.inst.rm_mod == 3 {
            self.set_e_reg(width, value);
            Ok(())
        }
        else {
            match width {
                Width::Byte => bus.write_u8(self.inst.rm_eaa, value as u8),
                Width::Word => bus.write_u16(self.inst.rm_eaa, value as u16),
                Width::Dword => bus.write_u32(self.inst.rm_eaa, value),
            }
        }
    }

    /// G register of the current ModRM byte.
    #[inline(always)]
    pub(crate) fn g_reg(&self, width: Width) -> u32 {
        let idx = self.inst.rm_index as usize;
        match width {
            Width::Byte => u32::from(self.regs.r8(idx)),
            Width::Word => u32::from(self.regs.r16(idx)),
            Width::Dword => self.regs.r32(idx),
        }
    }

    #[inline(always)]
    pub(crate) fn set_g_reg(&mut self, width: Width, value: u32) {
        let idx = self.inst.rm_index as usize;
        match width {
            Width::Byte => self.regs.set_r8(idx, value as u8),
            Width::Word => self.regs.set_r16(idx, value as u16),
            Width::Dword => self.regs.set_r32(idx, value),
        }
    }

    /// Accumulator access at operand width.
    #[inline(always)]
    pub(crate) fn acc(&self, width: Width) -> u32 {
        match width {
            Width::Byte => u32::from(self.regs.al()),
            Width::Word => u32::from(self.regs.ax()),
            Width::Dword => self.regs.eax(),
        }
    }

    #[inline(always)]
    pub(crate) fn set_acc(&mut self, width: Width, value: u32) {
        match width {
            Width::Byte => self.regs.set_al(value as u8),
            Width::Word => self.regs.set_ax(value as u16),
            Width::Dword => self.regs.set_eax(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use interp86_common::CoreConfig;

    fn boot(code: &[u8]) -> (Cpu, FlatBus) {
        let mut cpu = Cpu::new(&CoreConfig::default());
        let mut bus = FlatBus::new(0x10_0000);
        cpu.segments.reload(SegReg::CS, 0x0100);
        cpu.segments.reload(SegReg::DS, 0x0200);
        cpu.segments.reload(SegReg::SS, 0x0300);
        cpu.regs.ip = 0;
        cpu.regs.set_esp(0x0200);
        bus.load(0x1000, code);
        (cpu, bus)
    }

    #[test]
    fn add_immediate_to_accumulator() {
        // ADD AX, 0x0001 with AX=0x00FF, then HLT.
        let (mut cpu, mut bus) = boot(&[0x05, 0x01, 0x00, 0xF4]);
        cpu.regs.set_ax(0x00FF);
        let exit = cpu.run(&mut bus, 100).unwrap();
        assert_eq!(exit, RunExit::Halt);
        assert_eq!(cpu.regs.ax(), 0x0100);
        assert!(!cpu.flags.cf());
        assert!(!cpu.flags.zf());
        assert_eq!(cpu.regs.ip, 4);
    }

    #[test]
    fn mov_from_memory_operand() {
        // MOV AX, [0x0010]; HLT
        let (mut cpu, mut bus) = boot(&[0x8B, 0x06, 0x10, 0x00, 0xF4]);
        bus.load(0x2000 + 0x0010, &[0xCD, 0xAB]);
        let exit = cpu.run(&mut bus, 100).unwrap();
        assert_eq!(exit, RunExit::Halt);
        assert_eq!(cpu.regs.ax(), 0xABCD);
    }

    #[test]
    fn budget_exhaustion_preserves_state() {
        // Four INC AX in a row, budget of two.
        let (mut cpu, mut bus) = boot(&[0x40, 0x40, 0x40, 0x40]);
        let exit = cpu.run(&mut bus, 2).unwrap();
        assert_eq!(exit, RunExit::None);
        assert_eq!(cpu.regs.ax(), 2);
        assert_eq!(cpu.regs.ip, 2);
        // Resume where we left off.
        let exit = cpu.run(&mut bus, 2).unwrap();
        assert_eq!(exit, RunExit::None);
        assert_eq!(cpu.regs.ax(), 4);
    }

    #[test]
    fn trap_flag_defers_to_embedder() {
        let (mut cpu, mut bus) = boot(&[0x40]);
        cpu.flags.set(FLAG_TF, true);
        let exit = cpu.run(&mut bus, 10).unwrap();
        assert_eq!(exit, RunExit::Trap);
        // Nothing executed.
        assert_eq!(cpu.regs.ax(), 0);
        assert_eq!(cpu.regs.ip, 0);
    }

    #[test]
    fn fault_unwinds_partial_stack_writes() {
        // PUSHA with SP low enough that a later push wraps to the top of
        // the segment and runs off the end of physical memory.
        let mut cpu = Cpu::new(&CoreConfig::default());
        let mut bus = FlatBus::new(0x1_0000);
        cpu.segments.reload(SegReg::CS, 0x0100);
        cpu.segments.reload(SegReg::SS, 0x0F00);
        cpu.regs.ip = 0;
        cpu.regs.set_esp(0x0004); // room for two pushes before the wrap
        bus.load(0x1000, &[0x60]); // PUSHA
        let before_sp = cpu.regs.esp();
        let err = cpu.run(&mut bus, 10).unwrap_err();
        assert_eq!(err.kind, crate::memerror::AccessKind::Write);
        assert_eq!(cpu.regs.esp(), before_sp);
        // IP still points at the PUSHA.
        assert_eq!(cpu.regs.ip, 0);
    }

    #[test]
    fn prefixed_instruction_retires_past_all_prefixes() {
        // ES: MOV AX, [0x0010]; HLT — override applies and IP covers the
        // prefix byte.
        let (mut cpu, mut bus) = boot(&[0x26, 0x8B, 0x06, 0x10, 0x00, 0xF4]);
        cpu.segments.reload(SegReg::ES, 0x0400);
        bus.load(0x4000 + 0x0010, &[0x99, 0x88]);
        cpu.run(&mut bus, 100).unwrap();
        assert_eq!(cpu.regs.ax(), 0x8899);
        assert_eq!(cpu.regs.ip, 6);
    }

    #[test]
    fn operand_size_prefix_selects_wide_bank() {
        // 66 40 = INC EAX with a 16-bit code segment; HLT.
        let (mut cpu, mut bus) = boot(&[0x66, 0x40, 0xF4]);
        cpu.regs.set_eax(0x0000_FFFF);
        cpu.run(&mut bus, 100).unwrap();
        assert_eq!(cpu.regs.eax(), 0x0001_0000);
    }

    #[test]
    fn invalid_opcode_vectors_through_ivt() {
        // 0F 04 is unassigned on every supported level.
        let (mut cpu, mut bus) = boot(&[0x0F, 0x04]);
        bus.load(6 * 4, &[0x34, 0x12, 0x00, 0xF0]); // vector 6 -> F000:1234
        cpu.run(&mut bus, 1).unwrap();
        assert_eq!(cpu.segments.selector(SegReg::CS), 0xF000);
        assert_eq!(cpu.regs.ip, 0x1234);
        // Return address on the stack points back at the opcode itself.
        assert_eq!(bus.read_u16(0x3000 + 0x01FA).unwrap(), 0x0000);
    }
}
