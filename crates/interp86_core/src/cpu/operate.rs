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

    operate.rs

    The Operate phase: transform the loaded operand slots. Most entries
    fall through to the Store phase with the result in op1; control
    transfers and system instructions complete here and retire directly.

*/

use crate::{
    bus::Bus,
    cpu::{
        decode::{Cc, Op, PREFIX_ADDR},
        flags::{Width, FLAG_VM, FLAG_ZF},
        interrupt::{EXCEPTION_BR, EXCEPTION_GP},
        segments::SegReg,
        Cpu, Pipe, RunExit,
    },
    memerror::MemFault,
};
use interp86_common::CpuLevel;

#[inline(always)]
fn sext(value: u32, width: Width) -> i32 {
    match width {
        Width::Byte => value as u8 as i8 as i32,
        Width::Word => value as u16 as i16 as i32,
        Width::Dword => value as i32,
    }
}

impl Cpu {
    fn eval_cc(&self, cc: Cc) -> bool {
        let flags = &self.flags;
        match cc {
            Cc::O => flags.of(),
            Cc::No => !flags.of(),
            Cc::B => flags.cf(),
            Cc::Nb => !flags.cf(),
            Cc::Z => flags.zf(),
            Cc::Nz => !flags.zf(),
            Cc::Be => flags.cf() || flags.zf(),
            Cc::Nbe => !flags.cf() && !flags.zf(),
            Cc::S => flags.sf(),
            Cc::Ns => !flags.sf(),
            Cc::P => flags.pf(),
            Cc::Np => !flags.pf(),
            Cc::L => flags.sf() != flags.of(),
            Cc::Nl => flags.sf() == flags.of(),
            Cc::Le => flags.zf() || (flags.sf() != flags.of()),
            Cc::Nle => !flags.zf() && (flags.sf() == flags.of()),
        }
    }

    pub(crate) fn operate(&mut self, bus: &mut impl Bus) -> Result<Pipe, MemFault> {
        match self.inst.code.op {
            Op::None => {}
            Op::Add(w) => self.alu_add(w),
            Op::Adc(w) => self.alu_adc(w),
            Op::Sub(w) => self.alu_sub(w),
            Op::Sbb(w) => self.alu_sbb(w),
            Op::Cmp(w) => self.alu_cmp(w),
            Op::And(w) => self.alu_and(w),
            Op::Or(w) => self.alu_or(w),
            Op::Xor(w) => self.alu_xor(w),
            Op::Test(w) => self.alu_test(w),
            Op::Inc(w) => self.alu_inc(w),
            Op::Dec(w) => self.alu_dec(w),
            Op::Not => self.alu_not(Width::Dword),
            Op::Neg(w) => self.alu_neg(w),
            Op::Rol(w) => self.shf_rol(w),
            Op::Ror(w) => self.shf_ror(w),
            Op::Rcl(w) => self.shf_rcl(w),
            Op::Rcr(w) => self.shf_rcr(w),
            Op::Shl(w) => self.shf_shl(w),
            Op::Shr(w) => self.shf_shr(w),
            Op::Sar(w) => self.shf_sar(w),
            Op::Dshl(w) => self.shf_dshl(w),
            Op::Dshr(w) => self.shf_dshr(w),
            Op::Mul(w) => self.mul(w),
            Op::Imul(w) => self.imul(w),
            Op::Div(w) => {
                if !self.div(bus, w)? {
                    return Ok(Pipe::Retire);
                }
            }
            Op::Idiv(w) => {
                if !self.idiv(bus, w)? {
                    return Ok(Pipe::Retire);
                }
            }
            Op::ImulR(w) => self.imul_r(w),
            Op::Aam => {
                if !self.aam(bus)? {
                    return Ok(Pipe::Retire);
                }
            }
            Op::Aad => self.aad(),
            Op::Cond(cc) => self.inst.cond = self.eval_cc(cc),
            Op::LoadAcc(w) => {
                let value = match w {
                    Width::Byte => u32::from(bus.read_u8(self.inst.rm_eaa)?),
                    Width::Word => u32::from(bus.read_u16(self.inst.rm_eaa)?),
                    Width::Dword => bus.read_u32(self.inst.rm_eaa)?,
                };
                self.set_acc(w, value);
            }
            Op::StoreAcc(w) => {
                let value = self.acc(w);
                match w {
                    Width::Byte => bus.write_u8(self.inst.rm_eaa, value as u8)?,
                    Width::Word => bus.write_u16(self.inst.rm_eaa, value as u16)?,
                    Width::Dword => bus.write_u32(self.inst.rm_eaa, value)?,
                }
            }
            Op::XchgAcc(w) => {
                let acc = self.acc(w);
                self.set_acc(w, self.inst.op1);
                self.inst.op1 = acc;
            }
            Op::CallN(w) => {
                let return_ip = self
                    .inst
                    .cseip
                    .wrapping_sub(self.segments.base(SegReg::CS));
                self.push(bus, w, return_ip)?;
            }
            Op::CallF(w) => {
                let (offset, selector) = (self.inst.op1, self.inst.op2 as u16);
                self.call_far(bus, w, offset, selector)?;
                return Ok(Pipe::Retire);
            }
            Op::JmpF(w) => {
                let (offset, selector) = (self.inst.op1, self.inst.op2 as u16);
                self.jmp_far(w, offset, selector);
                return Ok(Pipe::Retire);
            }
            Op::Int => {
                let vector = self.inst.op1 as u8;
                self.interrupt(bus, vector)?;
                return Ok(Pipe::Retire);
            }
            Op::Loop | Op::Loopz | Op::Loopnz | Op::Jcxz => {
                let wide = self.inst.prefix & PREFIX_ADDR != 0;
                let count = match self.inst.code.op {
                    Op::Jcxz => {
                        if wide {
                            self.regs.ecx()
                        }
                        else {
                            u32::from(self.regs.cx())
                        }
                    }
                    _ => {
                        if wide {
                            let count = self.regs.ecx().wrapping_sub(1);
                            self.regs.set_ecx(count);
                            count
                        }
                        else {
                            let count = self.regs.cx().wrapping_sub(1);
                            self.regs.set_cx(count);
                            u32::from(count)
                        }
                    }
                };
                let taken = match self.inst.code.op {
                    Op::Loop => count != 0,
                    Op::Loopz => count != 0 && self.flags.zf(),
                    Op::Loopnz => count != 0 && !self.flags.zf(),
                    _ => count == 0,
                };
                if !taken {
                    return Ok(Pipe::Retire);
                }
            }
            Op::In(w) => {
                let port = self.inst.op1 as u16;
                if !bus.io_allowed(port, w.bytes()) {
                    self.exception(bus, EXCEPTION_GP)?;
                    return Ok(Pipe::Retire);
                }
                let value = match w {
                    Width::Byte => u32::from(bus.io_read_u8(port)),
                    Width::Word => u32::from(bus.io_read_u16(port)),
                    Width::Dword => bus.io_read_u32(port),
                };
                self.set_acc(w, value);
            }
            Op::Out(w) => {
                let port = self.inst.op1 as u16;
                if !bus.io_allowed(port, w.bytes()) {
                    self.exception(bus, EXCEPTION_GP)?;
                    return Ok(Pipe::Retire);
                }
                let value = self.acc(w);
                match w {
                    Width::Byte => bus.io_write_u8(port, value as u8),
                    Width::Word => bus.io_write_u16(port, value as u16),
                    Width::Dword => bus.io_write_u32(port, value),
                }
            }
            Op::Callback => {
                self.flags.fill();
                return Ok(Pipe::Exit(RunExit::Callback(self.inst.op1 as u16)));
            }
            Op::Grp6(_) => return self.grp6(bus),
            Op::Grp7(w) => return self.grp7(bus, w),
            Op::Lar(_) | Op::Lsl(_) => {
                // Descriptor-table walking is the embedder's business; the
                // selector is reported as invalid.
                self.flags.fill();
                self.flags.set(FLAG_ZF, false);
                return Ok(Pipe::Retire);
            }
            Op::Arpl => {
                self.flags.fill();
                let (dest, src) = (self.inst.op1, self.inst.op2);
                if dest & 3 < src & 3 {
                    self.inst.op1 = (dest & !3) | (src & 3);
                    self.flags.set(FLAG_ZF, true);
                }
                else {
                    self.flags.set(FLAG_ZF, false);
                }
            }
            Op::Bound(w) => {
                if self.inst.rm_mod == 3 {
                    return self.invalid(bus);
                }
                let eaa = self.inst.rm_eaa;
                let (low, high) = match w {
                    Width::Dword => (
                        bus.read_u32(eaa)? as i32,
                        bus.read_u32(eaa.wrapping_add(4))? as i32,
                    ),
                    _ => (
                        i32::from(bus.read_u16(eaa)? as i16),
                        i32::from(bus.read_u16(eaa.wrapping_add(2))? as i16),
                    ),
                };
                let index = sext(self.inst.op1, w);
                if index < low || index > high {
                    self.exception(bus, EXCEPTION_BR)?;
                }
                return Ok(Pipe::Retire);
            }
            Op::Bt(w) => self.bit_test(w, false, false, false),
            Op::Bts(w) => self.bit_test(w, true, false, false),
            Op::Btr(w) => self.bit_test(w, false, true, false),
            Op::Btc(w) => self.bit_test(w, false, false, true),
            Op::Bsf(_) => {
                if !self.bit_scan_forward() {
                    return Ok(Pipe::Retire);
                }
            }
            Op::Bsr(_) => {
                if !self.bit_scan_reverse() {
                    return Ok(Pipe::Retire);
                }
            }
            Op::Bswap(w) => {
                if self.level < CpuLevel::Cpu486 {
                    return self.invalid(bus);
                }
                self.inst.op1 = match w {
                    // The 16-bit form is undefined; real parts produce
                    // zero.
                    Width::Dword => self.inst.op1.swap_bytes(),
                    _ => 0,
                };
            }
            Op::Xadd(w) => {
                if self.level < CpuLevel::Cpu486 {
                    return self.invalid(bus);
                }
                self.alu_add(w);
            }
            Op::Cmpxchg => {
                if self.level < CpuLevel::Cpu486 {
                    return self.invalid(bus);
                }
                self.flags.fill();
                if self.regs.eax() == self.inst.op1 {
                    self.inst.op1 = self.g_reg(Width::Dword);
                    self.flags.set(FLAG_ZF, true);
                }
                else {
                    // The destination is rewritten either way.
                    self.regs.set_eax(self.inst.op1);
                    self.flags.set(FLAG_ZF, false);
                }
            }
            Op::MovFromCr => {
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                if !matches!(self.inst.rm_index, 0 | 2 | 3) {
                    return self.invalid(bus);
                }
                // MOV from/to CR ignores mod; the operand is always a
                // register.
                self.inst.rm_mod = 3;
                self.inst.op1 = self.cr[self.inst.rm_index as usize];
            }
            Op::MovToCr => {
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                match self.inst.rm_index {
                    0 => {
                        self.cr[0] = self.inst.op1;
                        self.pmode = self.cr[0] & 1 != 0;
                    }
                    2 | 3 => self.cr[self.inst.rm_index as usize] = self.inst.op1,
                    _ => return self.invalid(bus),
                }
                return Ok(Pipe::Retire);
            }
            Op::MovFromDr => {
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                self.inst.rm_mod = 3;
                self.inst.op1 = self.dr[self.inst.rm_index as usize];
            }
            Op::MovToDr => {
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                self.dr[self.inst.rm_index as usize] = self.inst.op1;
                return Ok(Pipe::Retire);
            }
            Op::MovFromTr => {
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                self.inst.rm_mod = 3;
                self.inst.op1 = self.tr[self.inst.rm_index as usize];
            }
            Op::MovToTr => {
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                self.tr[self.inst.rm_index as usize] = self.inst.op1;
                return Ok(Pipe::Retire);
            }
            Op::LoadSeg(s) => {
                let selector = self.inst.op2 as u16;
                self.segments.reload(s, selector);
            }
            Op::Fpu => return Ok(Pipe::Retire),
        }
        Ok(Pipe::Next)
    }

    /// Privileged instruction gate: #GP unless ring 0 (or real mode).
    fn require_cpl0(&mut self, bus: &mut impl Bus) -> Result<Option<Pipe>, MemFault> {
        if self.pmode && (self.cpl != 0 || self.flags.test(FLAG_VM)) {
            self.exception(bus, EXCEPTION_GP)?;
            return Ok(Some(Pipe::Retire));
        }
        Ok(None)
    }

    fn grp6(&mut self, bus: &mut impl Bus) -> Result<Pipe, MemFault> {
        if !self.pmode || self.flags.test(FLAG_VM) {
            return self.invalid(bus);
        }
        match self.inst.rm_index {
            0 => {
                // SLDT
                self.inst.op1 = u32::from(self.ldtr);
                Ok(Pipe::Next)
            }
            1 => {
                // STR
                self.inst.op1 = u32::from(self.task_reg);
                Ok(Pipe::Next)
            }
            2 => {
                // LLDT
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                self.ldtr = self.inst.op1 as u16;
                Ok(Pipe::Retire)
            }
            3 => {
                // LTR
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                self.task_reg = self.inst.op1 as u16;
                Ok(Pipe::Retire)
            }
            4 | 5 => {
                // VERR/VERW without descriptor tables: nothing verifies.
                self.flags.fill();
                self.flags.set(FLAG_ZF, false);
                Ok(Pipe::Retire)
            }
            _ => self.invalid(bus),
        }
    }

    fn grp7(&mut self, bus: &mut impl Bus, width: Width) -> Result<Pipe, MemFault> {
        let eaa = self.inst.rm_eaa;
        match self.inst.rm_index {
            0 | 1 => {
                // SGDT/SIDT
                if self.inst.rm_mod == 3 {
                    return self.invalid(bus);
                }
                let (limit, base) = if self.inst.rm_index == 0 {
                    (self.gdt_limit, self.gdt_base)
                }
                else {
                    (self.idt_limit, self.idt_base)
                };
                let base = match width {
                    Width::Dword => base,
                    _ => base & 0x00FF_FFFF,
                };
                bus.write_u16(eaa, limit)?;
                bus.write_u32(eaa.wrapping_add(2), base)?;
                Ok(Pipe::Retire)
            }
            2 | 3 => {
                // LGDT/LIDT
                if self.inst.rm_mod == 3 {
                    return self.invalid(bus);
                }
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                let limit = bus.read_u16(eaa)?;
                let mut base = bus.read_u32(eaa.wrapping_add(2))?;
                if width != Width::Dword {
                    base &= 0x00FF_FFFF;
                }
                if self.inst.rm_index == 2 {
                    self.gdt_limit = limit;
                    self.gdt_base = base;
                }
                else {
                    self.idt_limit = limit;
                    self.idt_base = base;
                }
                Ok(Pipe::Retire)
            }
            4 => {
                // SMSW
                self.inst.op1 = self.cr[0] & 0xFFFF;
                Ok(Pipe::Next)
            }
            6 => {
                // LMSW: the PE bit can be set but never cleared here.
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                let mut value = self.inst.op1 & 0xF;
                if self.cr[0] & 1 != 0 {
                    value |= 1;
                }
                self.cr[0] = (self.cr[0] & !0xF) | value;
                self.pmode = self.cr[0] & 1 != 0;
                Ok(Pipe::Retire)
            }
            7 => {
                // INVLPG: no TLB to flush.
                if let Some(pipe) = self.require_cpl0(bus)? {
                    return Ok(pipe);
                }
                Ok(Pipe::Retire)
            }
            _ => self.invalid(bus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use crate::cpu::flags::FLAG_CF;
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
    fn conditional_jump_on_lazy_flags() {
        // CMP AX, 5; JZ +1; HLT; INC BX; HLT
        let (mut cpu, mut bus) = boot(&[0x3D, 0x05, 0x00, 0x74, 0x01, 0xF4, 0x43, 0xF4]);
        cpu.regs.set_ax(5);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.bx(), 1);
    }

    #[test]
    fn loop_decrements_cx() {
        // Label: LOOP label; HLT
        let (mut cpu, mut bus) = boot(&[0xE2, 0xFE, 0xF4]);
        cpu.regs.set_cx(3);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.cx(), 0);
        assert_eq!(cpu.regs.ip, 3);
    }

    #[test]
    fn near_call_pushes_return_address() {
        // CALL +1; HLT; INC AX; RET
        let (mut cpu, mut bus) = boot(&[0xE8, 0x01, 0x00, 0xF4, 0x40, 0xC3]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ax(), 1);
        assert_eq!(cpu.regs.ip, 4);
        assert_eq!(cpu.regs.sp(), 0x0200);
    }

    #[test]
    fn software_interrupt_and_return() {
        // INT 0x21; HLT ... handler at 0x1800:0x0000: INC AX; IRET
        let (mut cpu, mut bus) = boot(&[0xCD, 0x21, 0xF4]);
        bus.load(0x21 * 4, &[0x00, 0x00, 0x00, 0x18]);
        bus.load(0x1_8000, &[0x40, 0xCF]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ax(), 1);
        assert_eq!(cpu.regs.ip, 3);
        assert_eq!(cpu.segments.selector(SegReg::CS), 0x0100);
    }

    #[test]
    fn xchg_with_accumulator() {
        // XCHG AX, CX; HLT
        let (mut cpu, mut bus) = boot(&[0x91, 0xF4]);
        cpu.regs.set_ax(0x1111);
        cpu.regs.set_cx(0x2222);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ax(), 0x2222);
        assert_eq!(cpu.regs.cx(), 0x1111);
    }

    #[test]
    fn setcc_writes_byte() {
        // STC; SETC AL; HLT
        let (mut cpu, mut bus) = boot(&[0xF9, 0x0F, 0x92, 0xC0, 0xF4]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.al(), 1);
        assert!(cpu.flags.test(FLAG_CF));
    }

    #[test]
    fn bound_raises_range_exception() {
        // BOUND AX, [0x0060]; HLT; bounds 0..=4, index 9.
        let (mut cpu, mut bus) = boot(&[0x62, 0x06, 0x60, 0x00, 0xF4]);
        bus.load(0x2000 + 0x0060, &[0x00, 0x00, 0x04, 0x00]);
        bus.load(5 * 4, &[0x00, 0x20, 0x00, 0x18]); // vector 5 -> 1800:2000
        bus.load(0x1_8000 + 0x2000, &[0xF4]);
        cpu.regs.set_ax(9);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.segments.selector(SegReg::CS), 0x1800);
        // Fault-class: return address is the BOUND itself.
        assert_eq!(bus.read_u16(0x3000 + 0x01FA).unwrap(), 0x0000);
    }

    #[test]
    fn divide_fault_restarts_instruction() {
        // XOR CX, CX; DIV CX; ... handler fixes CX and IRETs.
        let (mut cpu, mut bus) = boot(&[0x31, 0xC9, 0xF7, 0xF1, 0xF4]);
        bus.load(0, &[0x00, 0x00, 0x00, 0x18]); // vector 0 -> 1800:0000
        // MOV CX, 2; IRET
        bus.load(0x1_8000, &[0xB9, 0x02, 0x00, 0xCF]);
        cpu.regs.set_ax(10);
        cpu.run(&mut bus, 20).unwrap();
        // After the handler patches CX the DIV re-executes: 10/2.
        assert_eq!(cpu.regs.ax(), 5);
        assert_eq!(cpu.regs.ip, 5);
    }
}
