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

    load.rs

    The Load phase. Fills the operand slots from registers, immediates and
    memory per the entry's operand-spec code, handles prefix bytes by
    restarting decode, redirects group entries through the group table, and
    executes the self-contained `Direct` instructions outright.

*/

use crate::{
    bus::Bus,
    cpu::{
        decode::{Dir, Ld, M, PREFIX_ADDR, PREFIX_REP, PREFIX_SEG},
        flags::{Width, FLAG_CF, FLAG_DF, FLAG_IF, FLAG_VM},
        interrupt::{EXCEPTION_GP, EXCEPTION_UD},
        optable::GROUP_TABLE,
        segments::SegReg,
        Cpu, Pipe, RunExit,
    },
    memerror::MemFault,
};
use interp86_common::CpuLevel;

#[inline(always)]
fn sext(value: u32, width: Width) -> u32 {
    match width {
        Width::Byte => value as u8 as i8 as i32 as u32,
        Width::Word => value as u16 as i16 as i32 as u32,
        Width::Dword => value,
    }
}

impl Cpu {
    /// Raise #UD for the current instruction.
    pub(crate) fn invalid(&mut self, bus: &mut impl Bus) -> Result<Pipe, MemFault> {
        if self.trace_illegal {
            log::warn!(
                "invalid opcode, table entry {:#05X} at {:04X}:{:08X}",
                self.inst.entry,
                self.segments.selector(SegReg::CS),
                self.inst.start_ip
            );
        }
        self.exception(bus, EXCEPTION_UD)?;
        Ok(Pipe::Retire)
    }

    pub(crate) fn load(&mut self, bus: &mut impl Bus) -> Result<Pipe, MemFault> {
        match self.inst.code.load {
            Ld::Illegal => self.invalid(bus),
            Ld::Modrm(m) => {
                self.modrm_fetch(bus)?;
                self.modrm_load(bus, m)
            }
            Ld::ModrmPm(m) => {
                if !self.pmode || self.flags.test(FLAG_VM) {
                    return self.invalid(bus);
                }
                self.modrm_fetch(bus)?;
                self.modrm_load(bus, m)
            }
            Ld::Pop(w) => {
                self.inst.op1 = self.pop(bus, w)?;
                Ok(Pipe::Next)
            }
            Ld::PopRm(w, _) => {
                // The operand comes off the stack before the destination
                // is decoded, so [ESP]-relative forms see the new ESP.
                self.inst.op1 = self.pop(bus, w)?;
                self.modrm_fetch(bus)?;
                Ok(Pipe::Next)
            }
            Ld::I(w) => {
                self.inst.op1 = self.fetch_imm(bus, w)?;
                Ok(Pipe::Next)
            }
            Ld::Ix(w) => {
                self.inst.op1 = self.fetch_imm_signed(bus, w)?;
                Ok(Pipe::Next)
            }
            Ld::If(w) => {
                self.inst.op1 = self.fetch_imm(bus, w)?;
                self.inst.op2 = u32::from(self.fetch_u16(bus)?);
                Ok(Pipe::Next)
            }
            Ld::Reg(w, r) => {
                self.inst.op1 = self.reg_sized(w, r);
                Ok(Pipe::Next)
            }
            Ld::RegI(w, r) => {
                self.inst.op1 = self.reg_sized(w, r);
                self.inst.op2 = self.fetch_imm(bus, w)?;
                Ok(Pipe::Next)
            }
            Ld::Seg(s) => {
                self.inst.op1 = u32::from(self.segments.selector(s));
                Ok(Pipe::Next)
            }
            Ld::Moffs => {
                let offset = if self.inst.prefix & PREFIX_ADDR != 0 {
                    self.fetch_u32(bus)?
                }
                else {
                    u32::from(self.fetch_u16(bus)?)
                };
                self.inst.rm_eaa = self.operand_base(SegReg::DS).wrapping_add(offset);
                Ok(Pipe::Next)
            }
            Ld::Double => {
                self.inst.entry |= 0x100;
                Ok(Pipe::Restart)
            }
            Ld::PreSeg(s) => {
                self.inst.prefix |= PREFIX_SEG;
                self.inst.seg_base = self.segments.base(s);
                Ok(Pipe::Restart)
            }
            Ld::PreRep(z) => {
                self.inst.prefix |= PREFIX_REP;
                self.inst.repz = z;
                Ok(Pipe::Restart)
            }
            Ld::PreOp => {
                let big = self.segments.cache(SegReg::CS).big;
                self.inst.entry = if big { 0 } else { 0x200 };
                Ok(Pipe::Restart)
            }
            Ld::PreAdd => {
                let big = self.segments.cache(SegReg::CS).big;
                self.inst.prefix =
                    (self.inst.prefix & !PREFIX_ADDR) | if big { 0 } else { PREFIX_ADDR };
                Ok(Pipe::Restart)
            }
            Ld::Val(v) => {
                self.inst.op1 = v;
                Ok(Pipe::Next)
            }
            Ld::Into => {
                if self.flags.of() {
                    self.inst.op1 = 4;
                    Ok(Pipe::Next)
                }
                else {
                    Ok(Pipe::Retire)
                }
            }
            Ld::Str(op) => self.run_string(bus, op),
            Ld::Direct(dir) => self.direct(bus, dir),
        }
    }

    #[inline(always)]
    fn reg_sized(&self, width: Width, r: u8) -> u32 {
        match width {
            Width::Byte => u32::from(self.regs.r8(r as usize)),
            Width::Word => u32::from(self.regs.r16(r as usize)),
            Width::Dword => self.regs.r32(r as usize),
        }
    }

    fn modrm_load(&mut self, bus: &mut impl Bus, m: M) -> Result<Pipe, MemFault> {
        match m {
            M::None => {}
            M::Ib => self.inst.op1 = u32::from(self.fetch_u8(bus)?),
            M::Iw => self.inst.op1 = u32::from(self.fetch_u16(bus)?),
            M::Id => self.inst.op1 = self.fetch_u32(bus)?,
            M::Eb => self.inst.op1 = self.read_e(bus, Width::Byte)?,
            M::Ebx => self.inst.op1 = sext(self.read_e(bus, Width::Byte)?, Width::Byte),
            M::EbIb => {
                self.inst.op1 = self.read_e(bus, Width::Byte)?;
                self.inst.op2 = u32::from(self.fetch_u8(bus)?);
            }
            M::EbGb => {
                self.inst.op1 = self.read_e(bus, Width::Byte)?;
                self.inst.op2 = self.g_reg(Width::Byte);
            }
            M::Gb => self.inst.op1 = self.g_reg(Width::Byte),
            M::GbEb => {
                self.inst.op1 = self.g_reg(Width::Byte);
                self.inst.op2 = self.read_e(bus, Width::Byte)?;
            }
            M::Ew => self.inst.op1 = self.read_e(bus, Width::Word)?,
            M::Ewx => self.inst.op1 = sext(self.read_e(bus, Width::Word)?, Width::Word),
            M::EwIb => {
                self.inst.op1 = self.read_e(bus, Width::Word)?;
                self.inst.op2 = u32::from(self.fetch_u8(bus)?);
            }
            M::EwIbx => {
                self.inst.op1 = self.read_e(bus, Width::Word)?;
                self.inst.op2 = self.fetch_imm_signed(bus, Width::Byte)? & 0xFFFF;
            }
            M::EwIw => {
                self.inst.op1 = self.read_e(bus, Width::Word)?;
                self.inst.op2 = u32::from(self.fetch_u16(bus)?);
            }
            M::EwGw => {
                self.inst.op1 = self.read_e(bus, Width::Word)?;
                self.inst.op2 = self.g_reg(Width::Word);
            }
            M::EwGwCl => {
                self.inst.op1 = self.read_e(bus, Width::Word)?;
                self.inst.op2 = self.g_reg(Width::Word);
                self.inst.imm = u32::from(self.regs.cl());
            }
            M::EwGwIb => {
                self.inst.op1 = self.read_e(bus, Width::Word)?;
                self.inst.op2 = self.g_reg(Width::Word);
                self.inst.imm = u32::from(self.fetch_u8(bus)?);
            }
            M::EwGwT => {
                // Bit offset: for memory operands the address is displaced
                // by the signed word index before the operand is read.
                let offset = sext(self.g_reg(Width::Word), Width::Word);
                if self.inst.rm_mod != 3 {
                    self.inst.rm_eaa = self
                        .inst
                        .rm_eaa
                        .wrapping_add((((offset as i32) >> 4) * 2) as u32);
                }
                self.inst.op1 = self.read_e(bus, Width::Word)?;
                self.inst.op2 = offset;
            }
            M::Gw => self.inst.op1 = self.g_reg(Width::Word),
            M::GwEw => {
                self.inst.op1 = self.g_reg(Width::Word);
                self.inst.op2 = self.read_e(bus, Width::Word)?;
            }
            M::EwxGwx => {
                self.inst.op1 = sext(self.read_e(bus, Width::Word)?, Width::Word);
                self.inst.op2 = sext(self.g_reg(Width::Word), Width::Word);
            }
            M::EwxIbx => {
                self.inst.op1 = sext(self.read_e(bus, Width::Word)?, Width::Word);
                self.inst.op2 = self.fetch_imm_signed(bus, Width::Byte)?;
            }
            M::EwxIwx => {
                self.inst.op1 = sext(self.read_e(bus, Width::Word)?, Width::Word);
                self.inst.op2 = self.fetch_imm_signed(bus, Width::Word)?;
            }
            M::Ed => self.inst.op1 = self.read_e(bus, Width::Dword)?,
            M::EdIb => {
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = u32::from(self.fetch_u8(bus)?);
            }
            M::EdIbx => {
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = self.fetch_imm_signed(bus, Width::Byte)?;
            }
            M::EdId => {
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = self.fetch_u32(bus)?;
            }
            M::EdGd => {
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = self.g_reg(Width::Dword);
            }
            M::EdGdCl => {
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = self.g_reg(Width::Dword);
                self.inst.imm = u32::from(self.regs.cl());
            }
            M::EdGdIb => {
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = self.g_reg(Width::Dword);
                self.inst.imm = u32::from(self.fetch_u8(bus)?);
            }
            M::EdGdT => {
                let offset = self.g_reg(Width::Dword);
                if self.inst.rm_mod != 3 {
                    self.inst.rm_eaa = self
                        .inst
                        .rm_eaa
                        .wrapping_add((((offset as i32) >> 5) * 4) as u32);
                }
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = offset;
            }
            M::Gd => self.inst.op1 = self.g_reg(Width::Dword),
            M::GdEd => {
                self.inst.op1 = self.g_reg(Width::Dword);
                self.inst.op2 = self.read_e(bus, Width::Dword)?;
            }
            M::EdxGdx => {
                self.inst.op1 = self.read_e(bus, Width::Dword)?;
                self.inst.op2 = self.g_reg(Width::Dword);
            }
            M::Seg => {
                let Some(seg) = SegReg::from_index(self.inst.rm_index)
                else {
                    return self.invalid(bus);
                };
                self.inst.op1 = u32::from(self.segments.selector(seg));
            }
            M::Efw => {
                if self.inst.rm_mod == 3 {
                    return self.invalid(bus);
                }
                self.inst.op1 = u32::from(bus.read_u16(self.inst.rm_eaa)?);
                self.inst.op2 = u32::from(bus.read_u16(self.inst.rm_eaa.wrapping_add(2))?);
            }
            M::Efd => {
                if self.inst.rm_mod == 3 {
                    return self.invalid(bus);
                }
                self.inst.op1 = bus.read_u32(self.inst.rm_eaa)?;
                self.inst.op2 = u32::from(bus.read_u16(self.inst.rm_eaa.wrapping_add(4))?);
            }
            M::Ea => {
                if self.inst.rm_mod == 3 {
                    return self.invalid(bus);
                }
                self.inst.op1 = self.inst.rm_off;
            }
            M::Grp(g) => {
                self.inst.code = GROUP_TABLE[g as usize][self.inst.rm_index as usize];
                return match self.inst.code.load {
                    Ld::Modrm(inner) => self.modrm_load(bus, inner),
                    _ => self.invalid(bus),
                };
            }
            M::GrpIb(g) => {
                self.redirect(bus, g)?;
                self.inst.op2 = u32::from(self.fetch_u8(bus)?) & 0x1F;
            }
            M::GrpCl(g) => {
                self.redirect(bus, g)?;
                self.inst.op2 = u32::from(self.regs.cl()) & 0x1F;
            }
            M::Grp1(g) => {
                self.redirect(bus, g)?;
                self.inst.op2 = 1;
            }
            M::Fpu(_) => {
                // Coprocessor escape: the operand address is resolved and
                // the operation is discarded.
            }
        }
        Ok(Pipe::Next)
    }

    /// Shift-group redirect: swap in the row entry and run its operand
    /// load; the caller supplies the count.
    fn redirect(&mut self, bus: &mut impl Bus, group: u8) -> Result<(), MemFault> {
        self.inst.code = GROUP_TABLE[group as usize][self.inst.rm_index as usize];
        if let Ld::Modrm(inner) = self.inst.code.load {
            self.modrm_load(bus, inner)?;
        }
        Ok(())
    }

    fn direct(&mut self, bus: &mut impl Bus, dir: Dir) -> Result<Pipe, MemFault> {
        match dir {
            Dir::Iret(w) => {
                self.iret(bus, w)?;
                if self.flags.test(FLAG_IF) && bus.int_pending() {
                    return Ok(Pipe::Exit(RunExit::None));
                }
            }
            Dir::Retf(w) => self.retf(bus, w, 0)?,
            Dir::RetfIw(w) => {
                let release = u32::from(self.fetch_u16(bus)?);
                self.retf(bus, w, release)?;
            }
            Dir::Pusha(w) => self.pusha(bus, w)?,
            Dir::Popa(w) => self.popa(bus, w)?,
            Dir::PopSeg(s, w) => {
                let selector = self.pop(bus, w)? as u16;
                self.segments.reload(s, selector);
            }
            Dir::Setalc => {
                let al = if self.flags.cf() { 0xFF } else { 0x00 };
                self.regs.set_al(al);
            }
            Dir::Xlat => {
                let amask = if self.inst.prefix & PREFIX_ADDR != 0 {
                    0xFFFF_FFFF
                }
                else {
                    0xFFFF
                };
                let offset = self
                    .regs
                    .ebx()
                    .wrapping_add(u32::from(self.regs.al()))
                    & amask;
                let addr = self.operand_base(SegReg::DS).wrapping_add(offset);
                let value = bus.read_u8(addr)?;
                self.regs.set_al(value);
            }
            Dir::Cbw(w) => match w {
                Width::Dword => {
                    let value = self.regs.ax() as i16 as i32 as u32;
                    self.regs.set_eax(value);
                }
                _ => {
                    let value = self.regs.al() as i8 as i16 as u16;
                    self.regs.set_ax(value);
                }
            },
            Dir::Cwd(w) => match w {
                Width::Dword => {
                    let fill = if self.regs.eax() & 0x8000_0000 != 0 {
                        0xFFFF_FFFF
                    }
                    else {
                        0
                    };
                    self.regs.set_edx(fill);
                }
                _ => {
                    let fill = if self.regs.ax() & 0x8000 != 0 { 0xFFFF } else { 0 };
                    self.regs.set_dx(fill);
                }
            },
            Dir::Cli => self.flags.set(FLAG_IF, false),
            Dir::Sti => {
                self.flags.set(FLAG_IF, true);
                if bus.int_pending() {
                    return Ok(Pipe::Exit(RunExit::None));
                }
            }
            Dir::Stc => {
                self.flags.fill();
                self.flags.set(FLAG_CF, true);
            }
            Dir::Clc => {
                self.flags.fill();
                self.flags.set(FLAG_CF, false);
            }
            Dir::Cmc => {
                self.flags.fill();
                let cf = self.flags.test(FLAG_CF);
                self.flags.set(FLAG_CF, !cf);
            }
            Dir::Cld => self.flags.set(FLAG_DF, false),
            Dir::Std => self.flags.set(FLAG_DF, true),
            Dir::Pushf(w) => {
                let word = self.flags.fill();
                match w {
                    // VM and RF never appear on the stack.
                    Width::Dword => self.push(bus, w, word & 0x00FC_FFFF)?,
                    _ => self.push(bus, w, word)?,
                }
            }
            Dir::Popf(w) => {
                let value = self.pop(bus, w)?;
                self.flags
                    .set_word(value, crate::cpu::flags::FLAG_MASK_POP);
                if self.flags.test(FLAG_IF) && bus.int_pending() {
                    return Ok(Pipe::Exit(RunExit::None));
                }
            }
            Dir::Sahf => {
                self.flags.fill();
                let ah = u32::from(self.regs.ah());
                self.flags
                    .set_word(ah, crate::cpu::flags::FLAG_MASK_SAHF);
            }
            Dir::Lahf => {
                let word = self.flags.fill();
                self.regs.set_ah(word as u8);
            }
            Dir::Wait | Dir::Nop | Dir::Lock => {}
            Dir::Enter(w) => {
                let bytes = u32::from(self.fetch_u16(bus)?);
                let level = u32::from(self.fetch_u8(bus)?);
                self.enter(bus, w, bytes, level)?;
            }
            Dir::Leave(w) => self.leave(bus, w)?,
            Dir::Daa => self.daa(),
            Dir::Das => self.das(),
            Dir::Aaa => self.aaa(),
            Dir::Aas => self.aas(),
            Dir::Cpuid => {
                if self.level < CpuLevel::Pentium {
                    return self.invalid(bus);
                }
                self.cpuid();
            }
            Dir::Hlt => {
                if self.pmode && self.cpl != 0 {
                    self.exception(bus, EXCEPTION_GP)?;
                    return Ok(Pipe::Retire);
                }
                self.flags.fill();
                return Ok(Pipe::Exit(RunExit::Halt));
            }
            Dir::Clts => {
                if self.pmode && self.cpl != 0 {
                    self.exception(bus, EXCEPTION_GP)?;
                    return Ok(Pipe::Retire);
                }
                self.cr[0] &= !0x8;
            }
            Dir::Icebp => self.interrupt(bus, 1)?,
            Dir::Rdtsc => {
                if self.level < CpuLevel::Pentium {
                    return self.invalid(bus);
                }
                let stamp = self.cycle_total;
                self.regs.set_eax(stamp as u32);
                self.regs.set_edx((stamp >> 32) as u32);
            }
        }
        Ok(Pipe::Retire)
    }

    fn cpuid(&mut self) {
        match self.regs.eax() {
            0 => {
                self.regs.set_eax(1);
                self.regs.set_ebx(0x756E_6547); // "Genu"
                self.regs.set_edx(0x4965_6E69); // "ineI"
                self.regs.set_ecx(0x6C65_746E); // "ntel"
            }
            1 => {
                self.regs.set_eax(0x513);
                self.regs.set_ebx(0);
                self.regs.set_ecx(0);
                self.regs.set_edx(0x01); // FPU present
            }
            _ => {
                self.regs.set_eax(0);
                self.regs.set_ebx(0);
                self.regs.set_ecx(0);
                self.regs.set_edx(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use crate::cpu::flags::FLAG_ZF;
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
    fn group_immediate_alu() {
        // CMP byte [0x0040], 0x10; HLT
        let (mut cpu, mut bus) = boot(&[0x80, 0x3E, 0x40, 0x00, 0x10, 0xF4]);
        bus.load(0x2000 + 0x0040, &[0x10]);
        cpu.run(&mut bus, 10).unwrap();
        assert!(cpu.flags.test(FLAG_ZF));
        // CMP writes nothing back.
        assert_eq!(bus.read_u8(0x2000 + 0x0040).unwrap(), 0x10);
    }

    #[test]
    fn shift_group_immediate_count() {
        // SHL AL, 4; HLT
        let (mut cpu, mut bus) = boot(&[0xC0, 0xE0, 0x04, 0xF4]);
        cpu.regs.set_al(0x0F);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.al(), 0xF0);
        assert!(!cpu.flags.cf());
    }

    #[test]
    fn lea_takes_offset_not_contents() {
        // LEA AX, [BX+SI+0x10]; HLT
        let (mut cpu, mut bus) = boot(&[0x8D, 0x40, 0x10, 0xF4]);
        cpu.regs.set_bx(0x0100);
        cpu.regs.set_si(0x0002);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ax(), 0x0112);
    }

    #[test]
    fn les_loads_register_and_segment() {
        // LES AX, [0x0020]; HLT
        let (mut cpu, mut bus) = boot(&[0xC4, 0x06, 0x20, 0x00, 0xF4]);
        bus.load(0x2000 + 0x0020, &[0x34, 0x12, 0x00, 0x7C]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ax(), 0x1234);
        assert_eq!(cpu.segments.selector(SegReg::ES), 0x7C00);
    }

    #[test]
    fn xlat_honors_segment_override() {
        // ES: XLAT; HLT
        let (mut cpu, mut bus) = boot(&[0x26, 0xD7, 0xF4]);
        cpu.segments.reload(SegReg::ES, 0x0400);
        cpu.regs.set_bx(0x0050);
        cpu.regs.set_al(0x03);
        bus.load(0x4000 + 0x0053, &[0xAA]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.al(), 0xAA);
    }

    #[test]
    fn pushf_popf_roundtrip() {
        // STC; PUSHF; CLC; POPF; HLT
        let (mut cpu, mut bus) = boot(&[0xF9, 0x9C, 0xF8, 0x9D, 0xF4]);
        cpu.run(&mut bus, 10).unwrap();
        assert!(cpu.flags.test(FLAG_CF));
    }

    #[test]
    fn into_only_fires_on_overflow() {
        // INTO; HLT with OF clear.
        let (mut cpu, mut bus) = boot(&[0xCE, 0xF4]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ip, 2);
    }

    #[test]
    fn cpuid_gated_by_level() {
        let mut config = CoreConfig::default();
        config.cpu_level = CpuLevel::Pentium;
        let mut cpu = Cpu::new(&config);
        let mut bus = FlatBus::new(0x10_0000);
        cpu.segments.reload(SegReg::CS, 0x0100);
        cpu.regs.ip = 0;
        bus.load(0x1000, &[0x0F, 0xA2, 0xF4]); // CPUID; HLT
        cpu.regs.set_eax(0);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ebx(), 0x756E_6547);
    }
}
