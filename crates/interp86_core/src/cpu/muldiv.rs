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

    muldiv.rs

    Widening multiply and divide against the accumulator. The source value
    sits in op1; results land in AX, DX:AX or EDX:EAX. MUL/IMUL set CF and
    OF from whether the upper half carries significance (with the historical
    ZF-from-low-half quirk), the truncating IMUL forms from whether the full
    product survives truncation. Divides raise #DE on a zero divisor or
    quotient overflow, leaving the registers untouched.

*/

use crate::{
    bus::Bus,
    cpu::{
        flags::{Width, FLAG_CF, FLAG_OF, FLAG_ZF},
        interrupt::EXCEPTION_DE,
        Cpu,
    },
    memerror::MemFault,
};

impl Cpu {
    fn set_cf_of(&mut self, value: bool) {
        self.flags.set(FLAG_CF, value);
        self.flags.set(FLAG_OF, value);
    }

    pub(crate) fn mul(&mut self, width: Width) {
        let src = self.inst.op1;
        match width {
            Width::Byte => {
                let product = u32::from(self.regs.al()) * src;
                self.regs.set_ax(product as u16);
                self.flags.fill_no_cf_of();
                self.flags.set(FLAG_ZF, self.regs.al() == 0);
                self.set_cf_of(product & 0xFF00 != 0);
            }
            Width::Word => {
                let product = u32::from(self.regs.ax()) * src;
                self.regs.set_ax(product as u16);
                self.regs.set_dx((product >> 16) as u16);
                self.flags.fill_no_cf_of();
                self.flags.set(FLAG_ZF, self.regs.ax() == 0);
                self.set_cf_of(self.regs.dx() != 0);
            }
            Width::Dword => {
                let product = u64::from(self.regs.eax()) * u64::from(src);
                self.regs.set_eax(product as u32);
                self.regs.set_edx((product >> 32) as u32);
                self.flags.fill_no_cf_of();
                self.flags.set(FLAG_ZF, self.regs.eax() == 0);
                self.set_cf_of(self.regs.edx() != 0);
            }
        }
    }

    pub(crate) fn imul(&mut self, width: Width) {
        let src = self.inst.op1;
        match width {
            Width::Byte => {
                let product = i32::from(self.regs.al() as i8) * i32::from(src as u8 as i8);
                self.regs.set_ax(product as u16);
                self.flags.fill_no_cf_of();
                let upper = self.regs.ax() & 0xFF80;
                self.set_cf_of(upper != 0xFF80 && upper != 0x0000);
            }
            Width::Word => {
                let product = i32::from(self.regs.ax() as i16) * i32::from(src as u16 as i16);
                self.regs.set_ax(product as u16);
                self.regs.set_dx((product >> 16) as u16);
                self.flags.fill_no_cf_of();
                let upper = (product as u32) & 0xFFFF_8000;
                self.set_cf_of(upper != 0xFFFF_8000 && upper != 0x0000);
            }
            Width::Dword => {
                let product = i64::from(self.regs.eax() as i32) * i64::from(src as i32);
                self.regs.set_eax(product as u32);
                self.regs.set_edx((product >> 32) as u32);
                self.flags.fill_no_cf_of();
                let fits = (self.regs.edx() == 0xFFFF_FFFF
                    && self.regs.eax() & 0x8000_0000 != 0)
                    || (self.regs.edx() == 0 && self.regs.eax() < 0x8000_0000);
                self.set_cf_of(!fits);
            }
        }
    }

    /// Two/three-operand IMUL: op1 * op2 truncated back into op1, both
    /// operands already sign-extended by the Load phase.
    pub(crate) fn imul_r(&mut self, width: Width) {
        match width {
            Width::Dword => {
                let product = i64::from(self.inst.op1 as i32) * i64::from(self.inst.op2 as i32);
                self.inst.op1 = product as u32;
                self.flags.fill_no_cf_of();
                self.set_cf_of(!(product > -2_147_483_648 && product < 2_147_483_647));
            }
            _ => {
                let product = (self.inst.op1 as i32).wrapping_mul(self.inst.op2 as i32);
                self.inst.op1 = (product as u32) & 0xFFFF;
                self.flags.fill_no_cf_of();
                self.set_cf_of(!(product > -32768 && product < 32767));
            }
        }
    }

    pub(crate) fn div(&mut self, bus: &mut impl Bus, width: Width) -> Result<bool, MemFault> {
        let val = self.inst.op1;
        if val == 0 {
            self.exception(bus, EXCEPTION_DE)?;
            return Ok(false);
        }
        match width {
            Width::Byte => {
                let num = u32::from(self.regs.ax());
                let quo = num / val;
                if quo > 0xFF {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                self.regs.set_ah((num % val) as u8);
                self.regs.set_al(quo as u8);
            }
            Width::Word => {
                let num = (u32::from(self.regs.dx()) << 16) | u32::from(self.regs.ax());
                let quo = num / val;
                if quo > 0xFFFF {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                self.regs.set_dx((num % val) as u16);
                self.regs.set_ax(quo as u16);
            }
            Width::Dword => {
                let num = (u64::from(self.regs.edx()) << 32) | u64::from(self.regs.eax());
                let quo = num / u64::from(val);
                if quo > 0xFFFF_FFFF {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                self.regs.set_edx((num % u64::from(val)) as u32);
                self.regs.set_eax(quo as u32);
            }
        }
        Ok(true)
    }

    pub(crate) fn idiv(&mut self, bus: &mut impl Bus, width: Width) -> Result<bool, MemFault> {
        match width {
            Width::Byte => {
                let val = i32::from(self.inst.op1 as u8 as i8);
                if val == 0 {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                let num = i32::from(self.regs.ax() as i16);
                let quo = num / val;
                if quo != i32::from(quo as i8) {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                self.regs.set_ah((num % val) as u8);
                self.regs.set_al(quo as u8);
            }
            Width::Word => {
                let val = i32::from(self.inst.op1 as u16 as i16);
                if val == 0 {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                let num = ((u32::from(self.regs.dx()) << 16) | u32::from(self.regs.ax())) as i32;
                let quo = num / val;
                if quo != i32::from(quo as i16) {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                self.regs.set_dx((num % val) as u16);
                self.regs.set_ax(quo as u16);
            }
            Width::Dword => {
                let val = i64::from(self.inst.op1 as i32);
                if val == 0 {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                let num = (((u64::from(self.regs.edx())) << 32) | u64::from(self.regs.eax())) as i64;
                let quo = num / val;
                if quo != i64::from(quo as i32) {
                    self.exception(bus, EXCEPTION_DE)?;
                    return Ok(false);
                }
                self.regs.set_edx((num % val) as u32);
                self.regs.set_eax(quo as u32);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interp86_common::CoreConfig;

    fn cpu() -> Cpu {
        Cpu::new(&CoreConfig::default())
    }

    #[test]
    fn mul_byte_sets_carry_on_wide_product() {
        let mut cpu = cpu();
        cpu.regs.set_al(0x40);
        cpu.inst.op1 = 0x04;
        cpu.mul(Width::Byte);
        assert_eq!(cpu.regs.ax(), 0x0100);
        assert!(cpu.flags.test(FLAG_CF));
        assert!(cpu.flags.test(FLAG_OF));
        // Low half is zero.
        assert!(cpu.flags.test(FLAG_ZF));
    }

    #[test]
    fn imul_word_within_range_clears_carry() {
        let mut cpu = cpu();
        cpu.regs.set_ax(0xFFFF); // -1
        cpu.inst.op1 = 0x0002;
        cpu.imul(Width::Word);
        assert_eq!(cpu.regs.ax(), 0xFFFE);
        assert_eq!(cpu.regs.dx(), 0xFFFF);
        assert!(!cpu.flags.test(FLAG_CF));
    }

    #[test]
    fn imul_r_truncation_sets_overflow() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0x4000;
        cpu.inst.op2 = 0x0004;
        cpu.imul_r(Width::Word);
        assert_eq!(cpu.inst.op1, 0x0000);
        assert!(cpu.flags.test(FLAG_CF));
        assert!(cpu.flags.test(FLAG_OF));
    }

    #[test]
    fn div_word_splits_quotient_and_remainder() {
        let mut cpu = cpu();
        let mut bus = crate::bus::FlatBus::new(0x1_0000);
        cpu.regs.set_dx(0x0001);
        cpu.regs.set_ax(0x0005); // 0x10005
        cpu.inst.op1 = 0x0002;
        assert!(cpu.div(&mut bus, Width::Word).unwrap());
        assert_eq!(cpu.regs.ax(), 0x8002);
        assert_eq!(cpu.regs.dx(), 0x0001);
    }

    #[test]
    fn idiv_overflow_raises_divide_error() {
        let mut cpu = cpu();
        let mut bus = crate::bus::FlatBus::new(0x1_0000);
        // -32768 / -1 does not fit a signed word.
        cpu.regs.set_dx(0xFFFF);
        cpu.regs.set_ax(0x8000);
        cpu.inst.op1 = 0xFFFF;
        assert!(!cpu.idiv(&mut bus, Width::Word).unwrap());
        // Registers unchanged on fault.
        assert_eq!(cpu.regs.ax(), 0x8000);
        assert_eq!(cpu.regs.dx(), 0xFFFF);
    }
}
