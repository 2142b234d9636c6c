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

    stack.rs

    Stack primitives. All stack-pointer arithmetic is carried out under the
    SS size mask so a 16-bit stack wraps at 64K while the upper half of ESP
    is preserved, and every access goes through the SS base. PUSHA/POPA and
    ENTER/LEAVE build on the primitives.

*/

use crate::{
    bus::Bus,
    cpu::{
        flags::Width,
        registers::{REG_AX, REG_BP, REG_BX, REG_CX, REG_DI, REG_DX, REG_SI, REG_SP},
        segments::SegReg,
        Cpu,
    },
    memerror::MemFault,
};

impl Cpu {
    pub(crate) fn push(
        &mut self,
        bus: &mut impl Bus,
        width: Width,
        value: u32,
    ) -> Result<(), MemFault> {
        let mask = self.segments.stack_mask();
        let esp = self.regs.esp();
        let new_sp = esp.wrapping_sub(width.bytes()) & mask;
        let addr = self.segments.base(SegReg::SS).wrapping_add(new_sp);
        match width {
            Width::Dword => bus.write_u32(addr, value)?,
            _ => bus.write_u16(addr, value as u16)?,
        }
        self.regs.set_esp((esp & !mask) | new_sp);
        Ok(())
    }

    pub(crate) fn pop(&mut self, bus: &mut impl Bus, width: Width) -> Result<u32, MemFault> {
        let mask = self.segments.stack_mask();
        let esp = self.regs.esp();
        let addr = self.segments.base(SegReg::SS).wrapping_add(esp & mask);
        let value = match width {
            Width::Dword => bus.read_u32(addr)?,
            _ => u32::from(bus.read_u16(addr)?),
        };
        self.regs
            .set_esp((esp & !mask) | (esp.wrapping_add(width.bytes()) & mask));
        Ok(value)
    }

    /// Discard stack bytes without reading them (the SP slot of POPA, RET
    /// imm16).
    pub(crate) fn stack_release(&mut self, bytes: u32) {
        let mask = self.segments.stack_mask();
        let esp = self.regs.esp();
        self.regs
            .set_esp((esp & !mask) | (esp.wrapping_add(bytes) & mask));
    }

    pub(crate) fn pusha(&mut self, bus: &mut impl Bus, width: Width) -> Result<(), MemFault> {
        let orig_sp = match width {
            Width::Dword => self.regs.esp(),
            _ => u32::from(self.regs.sp()),
        };
        const ORDER: [usize; 8] = [
            REG_AX, REG_CX, REG_DX, REG_BX, REG_SP, REG_BP, REG_SI, REG_DI,
        ];
        for reg in ORDER {
            let value = if reg == REG_SP {
                orig_sp
            }
            else {
                self.regs.r32(reg)
            };
            self.push(bus, width, value)?;
        }
        Ok(())
    }

    pub(crate) fn popa(&mut self, bus: &mut impl Bus, width: Width) -> Result<(), MemFault> {
        const ORDER: [usize; 8] = [
            REG_DI, REG_SI, REG_BP, REG_SP, REG_BX, REG_DX, REG_CX, REG_AX,
        ];
        for reg in ORDER {
            let value = self.pop(bus, width)?;
            // The saved SP is discarded.
            if reg == REG_SP {
                continue;
            }
            match width {
                Width::Dword => self.regs.set_r32(reg, value),
                _ => self.regs.set_r16(reg, value as u16),
            }
        }
        Ok(())
    }

    pub(crate) fn enter(
        &mut self,
        bus: &mut impl Bus,
        width: Width,
        bytes: u32,
        level: u32,
    ) -> Result<(), MemFault> {
        let level = level & 0x1F;
        let mask = self.segments.stack_mask();
        let ss_base = self.segments.base(SegReg::SS);
        let step = width.bytes();
        let mut sp_index = self.regs.esp() & mask;
        let mut bp_index = self.regs.ebp() & mask;

        sp_index = sp_index.wrapping_sub(step) & mask;
        match width {
            Width::Dword => {
                bus.write_u32(ss_base.wrapping_add(sp_index), self.regs.ebp())?;
                self.regs.set_ebp(self.regs.esp().wrapping_sub(4));
            }
            _ => {
                bus.write_u16(ss_base.wrapping_add(sp_index), self.regs.bp())?;
                self.regs.set_bp(self.regs.esp().wrapping_sub(2) as u16);
            }
        }
        if level != 0 {
            for _ in 1..level {
                sp_index = sp_index.wrapping_sub(step) & mask;
                bp_index = bp_index.wrapping_sub(step) & mask;
                match width {
                    Width::Dword => {
                        let frame = bus.read_u32(ss_base.wrapping_add(bp_index))?;
                        bus.write_u32(ss_base.wrapping_add(sp_index), frame)?;
                    }
                    _ => {
                        let frame = bus.read_u16(ss_base.wrapping_add(bp_index))?;
                        bus.write_u16(ss_base.wrapping_add(sp_index), frame)?;
                    }
                }
            }
            sp_index = sp_index.wrapping_sub(step) & mask;
            match width {
                Width::Dword => bus.write_u32(ss_base.wrapping_add(sp_index), self.regs.ebp())?,
                _ => bus.write_u16(ss_base.wrapping_add(sp_index), self.regs.bp())?,
            }
        }
        sp_index = sp_index.wrapping_sub(bytes) & mask;
        let esp = self.regs.esp();
        self.regs.set_esp((esp & !mask) | sp_index);
        Ok(())
    }

    pub(crate) fn leave(&mut self, bus: &mut impl Bus, width: Width) -> Result<(), MemFault> {
        let mask = self.segments.stack_mask();
        let esp = self.regs.esp();
        self.regs.set_esp((esp & !mask) | (self.regs.ebp() & mask));
        let value = self.pop(bus, width)?;
        match width {
            Width::Dword => self.regs.set_ebp(value),
            _ => self.regs.set_bp(value as u16),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use interp86_common::CoreConfig;

    fn setup() -> (Cpu, FlatBus) {
        let mut cpu = Cpu::new(&CoreConfig::default());
        let bus = FlatBus::new(0x2_0000);
        cpu.segments.reload(SegReg::SS, 0x1000);
        cpu.regs.set_esp(0x0100);
        (cpu, bus)
    }

    #[test]
    fn push_pop_roundtrip_word() {
        let (mut cpu, mut bus) = setup();
        cpu.push(&mut bus, Width::Word, 0x1234).unwrap();
        assert_eq!(cpu.regs.sp(), 0x00FE);
        assert_eq!(cpu.pop(&mut bus, Width::Word).unwrap(), 0x1234);
        assert_eq!(cpu.regs.sp(), 0x0100);
    }

    #[test]
    fn sixteen_bit_stack_wraps_at_zero() {
        let (mut cpu, mut bus) = setup();
        cpu.regs.set_esp(0xABCD_0000);
        cpu.push(&mut bus, Width::Word, 0x5678).unwrap();
        assert_eq!(cpu.regs.sp(), 0xFFFE);
        // Upper half of ESP untouched by 16-bit stack arithmetic.
        assert_eq!(cpu.regs.esp(), 0xABCD_FFFE);
    }

    #[test]
    fn pusha_records_original_sp() {
        let (mut cpu, mut bus) = setup();
        cpu.regs.set_ax(0xA0A0);
        cpu.regs.set_di(0xD1D1);
        cpu.pusha(&mut bus, Width::Word).unwrap();
        assert_eq!(cpu.regs.sp(), 0x0100 - 16);
        // AX pushed first (highest address), DI last; SP slot holds the
        // pre-push value.
        assert_eq!(bus.read_u16(0x1_0000 + 0x00FE).unwrap(), 0xA0A0);
        assert_eq!(bus.read_u16(0x1_0000 + 0x00F6).unwrap(), 0x0100);
        assert_eq!(bus.read_u16(0x1_0000 + 0x00F0).unwrap(), 0xD1D1);
    }

    #[test]
    fn popa_skips_saved_sp() {
        let (mut cpu, mut bus) = setup();
        cpu.regs.set_bx(0xB0B0);
        cpu.pusha(&mut bus, Width::Word).unwrap();
        cpu.regs.set_bx(0);
        cpu.regs.set_sp(0x0100 - 16);
        cpu.popa(&mut bus, Width::Word).unwrap();
        assert_eq!(cpu.regs.bx(), 0xB0B0);
        assert_eq!(cpu.regs.sp(), 0x0100);
    }

    #[test]
    fn enter_leave_frame() {
        let (mut cpu, mut bus) = setup();
        cpu.regs.set_bp(0x0200);
        cpu.enter(&mut bus, Width::Word, 8, 0).unwrap();
        assert_eq!(cpu.regs.bp(), 0x00FE);
        assert_eq!(cpu.regs.sp(), 0x00FE - 8);
        assert_eq!(bus.read_u16(0x1_0000 + 0x00FE).unwrap(), 0x0200);
        cpu.leave(&mut bus, Width::Word).unwrap();
        assert_eq!(cpu.regs.bp(), 0x0200);
        assert_eq!(cpu.regs.sp(), 0x0100);
    }
}
