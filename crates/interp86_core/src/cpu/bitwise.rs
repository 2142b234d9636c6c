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

    bitwise.rs

    Shifts, rotates, double-precision shifts and the bit-test family. The
    shift count arrives in op2 already masked to 0x1F; a masked count of
    zero leaves both the operand and all flags untouched. Rotates set CF
    and OF explicitly after materializing the other flags, while SHL, SHR,
    SAR and the double shifts deposit lazy records.

*/

use crate::cpu::{
    flags::{FlagOp, Width, FLAG_CF, FLAG_OF, FLAG_ZF},
    Cpu,
};

#[inline(always)]
fn sext(value: u32, width: Width) -> i32 {
    match width {
        Width::Byte => value as u8 as i8 as i32,
        Width::Word => value as u16 as i16 as i32,
        Width::Dword => value as i32,
    }
}

impl Cpu {
    pub(crate) fn shf_rol(&mut self, width: Width) {
        let count = self.inst.op2;
        let bits = width.bits();
        let low = bits - 1;
        if width != Width::Dword && count & low == 0 {
            // Multiple-of-width rotate: the operand is unchanged but CF/OF
            // still reflect a full revolution.
            if count & (0x1F & !low) != 0 {
                let op1 = self.inst.op1;
                self.flags.fill_no_cf_of();
                self.flags.set(FLAG_CF, op1 & 1 != 0);
                self.flags
                    .set(FLAG_OF, ((op1 & 1) ^ (op1 >> (bits - 1))) & 1 != 0);
            }
            return;
        }
        if count == 0 {
            return;
        }
        self.flags.fill_no_cf_of();
        let n = count & low;
        let op1 = self.inst.op1;
        let res = ((op1 << n) | (op1 >> (bits - n))) & width.mask();
        self.inst.op1 = res;
        self.flags.set(FLAG_CF, res & 1 != 0);
        self.flags
            .set(FLAG_OF, ((res & 1) ^ (res >> (bits - 1))) & 1 != 0);
    }

    pub(crate) fn shf_ror(&mut self, width: Width) {
        let count = self.inst.op2;
        let bits = width.bits();
        let low = bits - 1;
        let sign = width.sign_bit();
        if width != Width::Dword && count & low == 0 {
            if count & (0x1F & !low) != 0 {
                let op1 = self.inst.op1;
                self.flags.fill_no_cf_of();
                self.flags.set(FLAG_CF, op1 & sign != 0);
                self.flags
                    .set(FLAG_OF, ((op1 >> (bits - 1)) ^ ((op1 >> (bits - 2)) & 1)) & 1 != 0);
            }
            return;
        }
        if count == 0 {
            return;
        }
        self.flags.fill_no_cf_of();
        let n = count & low;
        let op1 = self.inst.op1;
        let res = ((op1 >> n) | (op1 << (bits - n))) & width.mask();
        self.inst.op1 = res;
        self.flags.set(FLAG_CF, res & sign != 0);
        self.flags.set(FLAG_OF, (res ^ (res << 1)) & sign != 0);
    }

    pub(crate) fn shf_rcl(&mut self, width: Width) {
        let count = self.inst.op2;
        let bits = width.bits();
        // CF participates as a ninth/seventeenth bit, so the effective
        // count is modulo width+1 for the narrow forms.
        let n = match width {
            Width::Dword => count,
            _ => count % (bits + 1),
        };
        if n == 0 {
            return;
        }
        let cf = self.flags.fill() & 1;
        let op1 = self.inst.op1;
        let res = if n == 1 {
            ((op1 << 1) | cf) & width.mask()
        }
        else {
            ((op1 << n) | (cf << (n - 1)) | (op1 >> (bits + 1 - n))) & width.mask()
        };
        self.inst.op1 = res;
        self.flags.set(FLAG_CF, (op1 >> (bits - n)) & 1 != 0);
        let newcf = self.flags.test(FLAG_CF) as u32;
        self.flags.set(FLAG_OF, (newcf ^ (res >> (bits - 1))) & 1 != 0);
    }

    pub(crate) fn shf_rcr(&mut self, width: Width) {
        let count = self.inst.op2;
        let bits = width.bits();
        let sign = width.sign_bit();
        let n = match width {
            Width::Dword => count,
            _ => count % (bits + 1),
        };
        if n == 0 {
            return;
        }
        let cf = self.flags.fill() & 1;
        let op1 = self.inst.op1;
        let res = if n == 1 {
            ((op1 >> 1) | (cf << (bits - 1))) & width.mask()
        }
        else {
            ((op1 >> n) | (cf << (bits - n)) | (op1 << (bits + 1 - n))) & width.mask()
        };
        self.inst.op1 = res;
        self.flags.set(FLAG_CF, (op1 >> (n - 1)) & 1 != 0);
        self.flags.set(FLAG_OF, (res ^ (res << 1)) & sign != 0);
    }

    pub(crate) fn shf_shl(&mut self, width: Width) {
        let count = self.inst.op2;
        if count == 0 {
            return;
        }
        let var1 = self.inst.op1;
        let res = if count >= 32 { 0 } else { (var1 << count) & width.mask() };
        self.flags.set_record(FlagOp::Shl, width, var1, count, res);
        self.inst.op1 = res;
    }

    pub(crate) fn shf_shr(&mut self, width: Width) {
        let count = self.inst.op2;
        if count == 0 {
            return;
        }
        let var1 = self.inst.op1;
        let res = if count >= 32 { 0 } else { var1 >> count };
        self.flags.set_record(FlagOp::Shr, width, var1, count, res);
        self.inst.op1 = res;
    }

    pub(crate) fn shf_sar(&mut self, width: Width) {
        let count = self.inst.op2;
        if count == 0 {
            return;
        }
        let n = count.min(width.bits());
        let var1 = self.inst.op1;
        let res = ((sext(var1, width) >> n) as u32) & width.mask();
        self.flags.set_record(FlagOp::Sar, width, var1, n, res);
        self.inst.op1 = res;
    }

    /// SHLD: op1 receives its own high bits shifted left, filled from op2.
    /// The count lives in the imm slot.
    pub(crate) fn shf_dshl(&mut self, width: Width) {
        let count = self.inst.imm & 0x1F;
        if count == 0 {
            return;
        }
        let (op1, op2) = (self.inst.op1, self.inst.op2);
        match width {
            Width::Dword => {
                let res = (op1 << count) | (op2 >> (32 - count));
                self.flags.set_record(FlagOp::Dshl, width, op1, count, res);
                self.inst.op1 = res;
            }
            _ => {
                // The 16-bit form rotates through a 32-bit composite; counts
                // above 16 pull source bits around again.
                let var1 = (op1 << 16) | op2;
                let mut tempd = var1 << count;
                if count > 16 {
                    tempd |= op2 << (count - 16);
                }
                let res = (tempd >> 16) & 0xFFFF;
                self.flags.set_record(FlagOp::Dshl, width, var1, count, res);
                self.inst.op1 = res;
            }
        }
    }

    /// SHRD: op1 receives its own low bits shifted right, filled from op2.
    pub(crate) fn shf_dshr(&mut self, width: Width) {
        let count = self.inst.imm & 0x1F;
        if count == 0 {
            return;
        }
        let (op1, op2) = (self.inst.op1, self.inst.op2);
        match width {
            Width::Dword => {
                let res = (op1 >> count) | (op2 << (32 - count));
                self.flags.set_record(FlagOp::Dshr, width, op1, count, res);
                self.inst.op1 = res;
            }
            _ => {
                let var1 = (op2 << 16) | op1;
                let mut tempd = var1 >> count;
                if count > 16 {
                    tempd |= op2 << (32 - count);
                }
                let res = tempd & 0xFFFF;
                self.flags.set_record(FlagOp::Dshr, width, var1, count, res);
                self.inst.op1 = res;
            }
        }
    }

    /// BT/BTS/BTR/BTC. The bit offset in op2 is reduced modulo the operand
    /// width; for memory operands the Load phase already displaced the
    /// effective address by the word offset.
    pub(crate) fn bit_test(&mut self, width: Width, set: bool, clear: bool, complement: bool) {
        self.flags.fill();
        let mask = 1u32 << (self.inst.op2 & (width.bits() - 1));
        self.flags.set(FLAG_CF, self.inst.op1 & mask != 0);
        if set {
            self.inst.op1 |= mask;
        }
        if clear {
            self.inst.op1 &= !mask;
        }
        if complement {
            self.inst.op1 ^= mask;
        }
    }

    /// Bit scan forward. Returns false (and sets ZF) for a zero source, in
    /// which case the destination register is left unwritten.
    pub(crate) fn bit_scan_forward(&mut self) -> bool {
        self.flags.fill();
        if self.inst.op1 == 0 {
            self.flags.set(FLAG_ZF, true);
            false
        }
        else {
            self.flags.set(FLAG_ZF, false);
            self.inst.op1 = self.inst.op1.trailing_zeros();
            true
        }
    }

    pub(crate) fn bit_scan_reverse(&mut self) -> bool {
        self.flags.fill();
        if self.inst.op1 == 0 {
            self.flags.set(FLAG_ZF, true);
            false
        }
        else {
            self.flags.set(FLAG_ZF, false);
            self.inst.op1 = 31 - self.inst.op1.leading_zeros();
            true
        }
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
    fn rol_byte_by_full_width_sets_flags_only() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0x81;
        cpu.inst.op2 = 8;
        cpu.shf_rol(Width::Byte);
        assert_eq!(cpu.inst.op1, 0x81);
        assert!(cpu.flags.test(FLAG_CF));
        // bit0 ^ bit7 = 1 ^ 1 = 0
        assert!(!cpu.flags.test(FLAG_OF));
    }

    #[test]
    fn rcl_rotates_through_carry() {
        let mut cpu = cpu();
        cpu.flags.set(FLAG_CF, true);
        cpu.inst.op1 = 0x80;
        cpu.inst.op2 = 1;
        cpu.shf_rcl(Width::Byte);
        assert_eq!(cpu.inst.op1, 0x01);
        assert!(cpu.flags.test(FLAG_CF));
    }

    #[test]
    fn rcr_count_modulo_width_plus_one() {
        let mut cpu = cpu();
        cpu.flags.set(FLAG_CF, true);
        cpu.inst.op1 = 0x12;
        cpu.inst.op2 = 9; // 9 % 9 == 0: nothing happens at byte width
        cpu.shf_rcr(Width::Byte);
        assert_eq!(cpu.inst.op1, 0x12);
        assert!(cpu.flags.test(FLAG_CF));
    }

    #[test]
    fn zero_count_leaves_pending_flags_alone() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0xFFFF;
        cpu.inst.op2 = 0x0001;
        cpu.alu_add(Width::Word); // pending record with CF set
        cpu.inst.op2 = 0;
        cpu.inst.op1 = 0x55;
        cpu.shf_shl(Width::Byte);
        assert_eq!(cpu.inst.op1, 0x55);
        assert!(cpu.flags.cf());
    }

    #[test]
    fn sar_sign_extends() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0xF0;
        cpu.inst.op2 = 2;
        cpu.shf_sar(Width::Byte);
        assert_eq!(cpu.inst.op1, 0xFC);
        assert!(!cpu.flags.cf());
        assert!(cpu.flags.sf());
    }

    #[test]
    fn dshl_word_pulls_bits_from_source() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0x1234;
        cpu.inst.op2 = 0xABCD;
        cpu.inst.imm = 4;
        cpu.shf_dshl(Width::Word);
        assert_eq!(cpu.inst.op1, 0x234A);
    }

    #[test]
    fn dshr_dword_pulls_bits_from_source() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0x0000_0001;
        cpu.inst.op2 = 0x8000_0000;
        cpu.inst.imm = 1;
        cpu.shf_dshr(Width::Dword);
        assert_eq!(cpu.inst.op1, 0x4000_0000);
        assert!(cpu.flags.cf());
    }

    #[test]
    fn bts_sets_bit_and_reports_old_value() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0b0100;
        cpu.inst.op2 = 2;
        cpu.bit_test(Width::Word, true, false, false);
        assert!(cpu.flags.test(FLAG_CF));
        cpu.inst.op2 = 0;
        cpu.bit_test(Width::Word, true, false, false);
        assert!(!cpu.flags.test(FLAG_CF));
        assert_eq!(cpu.inst.op1, 0b0101);
    }

    #[test]
    fn bit_scans_find_edges() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0x0080_0100;
        assert!(cpu.bit_scan_forward());
        assert_eq!(cpu.inst.op1, 8);
        cpu.inst.op1 = 0x0080_0100;
        assert!(cpu.bit_scan_reverse());
        assert_eq!(cpu.inst.op1, 23);
        cpu.inst.op1 = 0;
        assert!(!cpu.bit_scan_forward());
        assert!(cpu.flags.test(FLAG_ZF));
    }
}
