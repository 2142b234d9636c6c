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

    alu.rs

    Two-operand integer arithmetic. Each operation combines the operand
    slots op1 (destination) and op2 (source), leaves the result in op1 for
    the Store phase, and deposits a lazy flag record instead of computing
    the arithmetic flags eagerly.

*/

use crate::cpu::{
    flags::{FlagOp, Width},
    Cpu,
};

impl Cpu {
    pub(crate) fn alu_add(&mut self, width: Width) {
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1.wrapping_add(var2) & width.mask();
        self.flags.set_record(FlagOp::Add, width, var1, var2, res);
        self.inst.op1 = res;
    }

    pub(crate) fn alu_adc(&mut self, width: Width) {
        let oldcf = self.flags.cf();
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1.wrapping_add(var2).wrapping_add(oldcf as u32) & width.mask();
        self.flags
            .set_record_carry(FlagOp::Adc, width, var1, var2, res, oldcf);
        self.inst.op1 = res;
    }

    pub(crate) fn alu_sub(&mut self, width: Width) {
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1.wrapping_sub(var2) & width.mask();
        self.flags.set_record(FlagOp::Sub, width, var1, var2, res);
        self.inst.op1 = res;
    }

    pub(crate) fn alu_sbb(&mut self, width: Width) {
        let oldcf = self.flags.cf();
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1.wrapping_sub(var2).wrapping_sub(oldcf as u32) & width.mask();
        self.flags
            .set_record_carry(FlagOp::Sbb, width, var1, var2, res, oldcf);
        self.inst.op1 = res;
    }

    /// SUB without the writeback; op1 is left untouched.
    pub(crate) fn alu_cmp(&mut self, width: Width) {
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1.wrapping_sub(var2) & width.mask();
        self.flags.set_record(FlagOp::Sub, width, var1, var2, res);
    }

    pub(crate) fn alu_and(&mut self, width: Width) {
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1 & var2;
        self.flags.set_record(FlagOp::Logic, width, var1, var2, res);
        self.inst.op1 = res;
    }

    pub(crate) fn alu_or(&mut self, width: Width) {
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1 | var2;
        self.flags.set_record(FlagOp::Logic, width, var1, var2, res);
        self.inst.op1 = res;
    }

    pub(crate) fn alu_xor(&mut self, width: Width) {
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        let res = var1 ^ var2;
        self.flags.set_record(FlagOp::Logic, width, var1, var2, res);
        self.inst.op1 = res;
    }

    /// AND without the writeback.
    pub(crate) fn alu_test(&mut self, width: Width) {
        let (var1, var2) = (self.inst.op1, self.inst.op2);
        self.flags
            .set_record(FlagOp::Logic, width, var1, var2, var1 & var2);
    }

    /// INC and DEC preserve CF, so the pending carry is materialized into
    /// the word before the record is replaced.
    pub(crate) fn alu_inc(&mut self, width: Width) {
        self.flags.load_cf();
        let var1 = self.inst.op1;
        let res = var1.wrapping_add(1) & width.mask();
        self.flags.set_record(FlagOp::Inc, width, var1, 1, res);
        self.inst.op1 = res;
    }

    pub(crate) fn alu_dec(&mut self, width: Width) {
        self.flags.load_cf();
        let var1 = self.inst.op1;
        let res = var1.wrapping_sub(1) & width.mask();
        self.flags.set_record(FlagOp::Dec, width, var1, 1, res);
        self.inst.op1 = res;
    }

    pub(crate) fn alu_not(&mut self, width: Width) {
        self.inst.op1 = !self.inst.op1 & width.mask();
    }

    pub(crate) fn alu_neg(&mut self, width: Width) {
        let var1 = self.inst.op1;
        let res = 0u32.wrapping_sub(var1) & width.mask();
        self.flags.set_record(FlagOp::Neg, width, var1, 0, res);
        self.inst.op1 = res;
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
    fn adc_chains_through_a_wide_addition() {
        // 0x0001_FFFF + 0x0000_0001 split into two 16-bit halves.
        let mut cpu = cpu();
        cpu.inst.op1 = 0xFFFF;
        cpu.inst.op2 = 0x0001;
        cpu.alu_add(Width::Word);
        assert_eq!(cpu.inst.op1, 0x0000);
        assert!(cpu.flags.cf());

        cpu.inst.op1 = 0x0001;
        cpu.inst.op2 = 0x0000;
        cpu.alu_adc(Width::Word);
        assert_eq!(cpu.inst.op1, 0x0002);
        assert!(!cpu.flags.cf());
    }

    #[test]
    fn sbb_borrows_from_prior_subtraction() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0x0000;
        cpu.inst.op2 = 0x0001;
        cpu.alu_sub(Width::Word);
        assert!(cpu.flags.cf());

        cpu.inst.op1 = 0x0005;
        cpu.inst.op2 = 0x0002;
        cpu.alu_sbb(Width::Word);
        assert_eq!(cpu.inst.op1, 0x0002);
        assert!(!cpu.flags.cf());
    }

    #[test]
    fn cmp_leaves_destination_untouched() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0x10;
        cpu.inst.op2 = 0x20;
        cpu.alu_cmp(Width::Byte);
        assert_eq!(cpu.inst.op1, 0x10);
        assert!(cpu.flags.cf());
        assert!(cpu.flags.sf());
    }

    #[test]
    fn inc_wraps_and_keeps_carry() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0;
        cpu.inst.op2 = 1;
        cpu.alu_sub(Width::Byte); // leaves CF set
        cpu.inst.op1 = 0xFF;
        cpu.alu_inc(Width::Byte);
        assert_eq!(cpu.inst.op1, 0x00);
        assert!(cpu.flags.zf());
        assert!(cpu.flags.cf());
    }

    #[test]
    fn neg_of_zero_clears_carry() {
        let mut cpu = cpu();
        cpu.inst.op1 = 0;
        cpu.alu_neg(Width::Word);
        assert_eq!(cpu.inst.op1, 0);
        assert!(!cpu.flags.cf());
        assert!(cpu.flags.zf());

        cpu.inst.op1 = 1;
        cpu.alu_neg(Width::Word);
        assert_eq!(cpu.inst.op1, 0xFFFF);
        assert!(cpu.flags.cf());
    }
}
