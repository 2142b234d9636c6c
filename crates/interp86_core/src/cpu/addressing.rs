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

    addressing.rs

    ModRM and SIB effective-address resolution. `modrm_fetch` reads the
    ModRM byte (plus SIB and displacement when present) and records both the
    segment-relative offset and the linear address of the memory operand.
    With mod=11 no address is formed; the E operand resolves to a register
    and the resolver is bypassed entirely.

*/

use crate::{
    bus::Bus,
    cpu::{
        decode::PREFIX_ADDR,
        registers::{REG_BP, REG_SP},
        segments::SegReg,
        Cpu,
    },
    memerror::MemFault,
};

impl Cpu {
    /// Fetch the ModRM byte and resolve the memory operand, if any.
    pub(crate) fn modrm_fetch(&mut self, bus: &mut impl Bus) -> Result<(), MemFault> {
        let modrm = self.fetch_u8(bus)?;
        self.inst.rm = modrm;
        self.inst.rm_mod = modrm >> 6;
        self.inst.rm_index = (modrm >> 3) & 7;
        self.inst.rm_eai = modrm & 7;

        if self.inst.rm_mod != 3 {
            if self.inst.prefix & PREFIX_ADDR != 0 {
                self.ea32(bus)?;
            }
            else {
                self.ea16(bus)?;
            }
        }
        Ok(())
    }

    /// 16-bit effective address: two-register base forms with BP selecting
    /// the stack segment by default.
    fn ea16(&mut self, bus: &mut impl Bus) -> Result<(), MemFault> {
        let eai = self.inst.rm_eai as usize;
        let regs = &self.regs;

        let (mut offset, default_seg) = match eai {
            0 => (regs.bx().wrapping_add(regs.si()), SegReg::DS),
            1 => (regs.bx().wrapping_add(regs.di()), SegReg::DS),
            2 => (regs.bp().wrapping_add(regs.si()), SegReg::SS),
            3 => (regs.bp().wrapping_add(regs.di()), SegReg::SS),
            4 => (regs.si(), SegReg::DS),
            5 => (regs.di(), SegReg::DS),
            6 => {
                if self.inst.rm_mod == 0 {
                    (self.fetch_u16(bus)?, SegReg::DS)
                }
                else {
                    (regs.bp(), SegReg::SS)
                }
            }
            _ => (regs.bx(), SegReg::DS),
        };

        match self.inst.rm_mod {
            1 => offset = offset.wrapping_add(self.fetch_u8(bus)? as i8 as u16),
            2 => offset = offset.wrapping_add(self.fetch_u16(bus)?),
            _ => {}
        }

        self.inst.rm_off = u32::from(offset);
        self.inst.rm_eaa = self.operand_base(default_seg).wrapping_add(u32::from(offset));
        Ok(())
    }

    /// 32-bit effective address, including the SIB forms. EBP and ESP bases
    /// select the stack segment by default.
    fn ea32(&mut self, bus: &mut impl Bus) -> Result<(), MemFault> {
        let eai = self.inst.rm_eai as usize;

        let (mut offset, default_seg) = match eai {
            REG_SP => self.sib(bus)?,
            REG_BP if self.inst.rm_mod == 0 => (self.fetch_u32(bus)?, SegReg::DS),
            REG_BP => (self.regs.r32(REG_BP), SegReg::SS),
            _ => (self.regs.r32(eai), SegReg::DS),
        };

        match self.inst.rm_mod {
            1 => offset = offset.wrapping_add(self.fetch_u8(bus)? as i8 as u32),
            2 => offset = offset.wrapping_add(self.fetch_u32(bus)?),
            _ => {}
        }

        self.inst.rm_off = offset;
        self.inst.rm_eaa = self.operand_base(default_seg).wrapping_add(offset);
        Ok(())
    }

    fn sib(&mut self, bus: &mut impl Bus) -> Result<(u32, SegReg), MemFault> {
        let sib = self.fetch_u8(bus)?;
        let scale = sib >> 6;
        let index = ((sib >> 3) & 7) as usize;
        let base = (sib & 7) as usize;

        let (mut offset, default_seg) = if base == REG_BP && self.inst.rm_mod == 0 {
            (self.fetch_u32(bus)?, SegReg::DS)
        }
        else if base == REG_SP || base == REG_BP {
            (self.regs.r32(base), SegReg::SS)
        }
        else {
            (self.regs.r32(base), SegReg::DS)
        };

        if index != REG_SP {
            offset = offset.wrapping_add(self.regs.r32(index) << scale);
        }
        Ok((offset, default_seg))
    }

    /// Base address for a memory operand: the segment override when one is
    /// active, otherwise the addressing-form default.
    #[inline(always)]
    pub(crate) fn operand_base(&self, default_seg: SegReg) -> u32 {
        if self.inst.prefix & crate::cpu::decode::PREFIX_SEG != 0 {
            self.inst.seg_base
        }
        else {
            self.segments.base(default_seg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use interp86_common::CoreConfig;

    fn cpu_with_code(code: &[u8]) -> (Cpu, FlatBus) {
        let mut cpu = Cpu::new(&CoreConfig::default());
        let mut bus = FlatBus::new(0x10_0000);
        bus.load(0x1000, code);
        cpu.inst.cseip = 0x1000;
        (cpu, bus)
    }

    #[test]
    fn sixteen_bit_base_forms() {
        // All eight eai encodings with mod=00 (except the disp16 form).
        let cases: [(u8, u32); 7] = [
            (0x00, 0x1100 + 0x20), // [BX+SI]
            (0x01, 0x1100 + 0x30), // [BX+DI]
            (0x02, 0x2200 + 0x20), // [BP+SI]
            (0x03, 0x2200 + 0x30), // [BP+DI]
            (0x04, 0x20),          // [SI]
            (0x05, 0x30),          // [DI]
            (0x07, 0x1100),        // [BX]
        ];
        for (eai, want_off) in cases {
            let (mut cpu, mut bus) = cpu_with_code(&[eai]);
            cpu.regs.set_bx(0x1100);
            cpu.regs.set_bp(0x2200);
            cpu.regs.set_si(0x0020);
            cpu.regs.set_di(0x0030);
            cpu.modrm_fetch(&mut bus).unwrap();
            assert_eq!(cpu.inst.rm_off, want_off, "eai {eai:#x}");
        }
    }

    #[test]
    fn bp_forms_default_to_stack_segment() {
        let (mut cpu, mut bus) = cpu_with_code(&[0x42, 0x10]); // [BP+SI+disp8]
        cpu.segments.reload(SegReg::SS, 0x2000);
        cpu.segments.reload(SegReg::DS, 0x3000);
        cpu.regs.set_bp(0x0100);
        cpu.regs.set_si(0x0001);
        cpu.modrm_fetch(&mut bus).unwrap();
        assert_eq!(cpu.inst.rm_off, 0x0111);
        assert_eq!(cpu.inst.rm_eaa, 0x2_0000 + 0x0111);
    }

    #[test]
    fn disp16_form_uses_data_segment() {
        let (mut cpu, mut bus) = cpu_with_code(&[0x06, 0x34, 0x12]); // [disp16]
        cpu.segments.reload(SegReg::DS, 0x3000);
        cpu.regs.set_bp(0xFFFF);
        cpu.modrm_fetch(&mut bus).unwrap();
        assert_eq!(cpu.inst.rm_off, 0x1234);
        assert_eq!(cpu.inst.rm_eaa, 0x3_0000 + 0x1234);
    }

    #[test]
    fn sixteen_bit_offset_wraps() {
        let (mut cpu, mut bus) = cpu_with_code(&[0x40, 0x10]); // [BX+SI+disp8]
        cpu.regs.set_bx(0xFFF0);
        cpu.regs.set_si(0x0008);
        cpu.modrm_fetch(&mut bus).unwrap();
        assert_eq!(cpu.inst.rm_off, 0x0008);
    }

    #[test]
    fn sib_disp32_base_with_scaled_index() {
        // [EAX*4 + disp32] with address-size prefix active.
        let (mut cpu, mut bus) = cpu_with_code(&[0x04, 0x85, 0x00, 0x00, 0x01, 0x00]);
        cpu.inst.prefix = PREFIX_ADDR;
        cpu.regs.set_eax(0x10);
        cpu.modrm_fetch(&mut bus).unwrap();
        assert_eq!(cpu.inst.rm_off, 0x1_0000 + 0x40);
    }

    #[test]
    fn sib_ebp_base_defaults_to_stack_segment() {
        // [EBP+ECX+disp8] via SIB, mod=01.
        let (mut cpu, mut bus) = cpu_with_code(&[0x44, 0x0D, 0x08]);
        cpu.inst.prefix = PREFIX_ADDR;
        cpu.segments.reload(SegReg::SS, 0x2000);
        cpu.regs.set_ebp(0x100);
        cpu.regs.set_ecx(0x10);
        cpu.modrm_fetch(&mut bus).unwrap();
        assert_eq!(cpu.inst.rm_off, 0x118);
        assert_eq!(cpu.inst.rm_eaa, 0x2_0000 + 0x118);
    }

    #[test]
    fn register_form_skips_resolution() {
        let (mut cpu, mut bus) = cpu_with_code(&[0xC3]); // mod=11, reg=0, rm=3
        cpu.inst.rm_eaa = 0xDEAD_BEEF;
        cpu.modrm_fetch(&mut bus).unwrap();
        assert_eq!(cpu.inst.rm_mod, 3);
        assert_eq!(cpu.inst.rm_eai, 3);
        // Address state untouched.
        assert_eq!(cpu.inst.rm_eaa, 0xDEAD_BEEF);
    }

    #[test]
    fn segment_override_replaces_default_base() {
        let (mut cpu, mut bus) = cpu_with_code(&[0x46, 0x02]); // [BP+disp8]
        cpu.segments.reload(SegReg::SS, 0x2000);
        cpu.inst.prefix = crate::cpu::decode::PREFIX_SEG;
        cpu.inst.seg_base = 0x5_0000;
        cpu.regs.set_bp(0x10);
        cpu.modrm_fetch(&mut bus).unwrap();
        assert_eq!(cpu.inst.rm_eaa, 0x5_0000 + 0x12);
    }
}
