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

    bcd.rs

    The decimal-adjust family. Each adjust consumes the pending AF/CF (via
    a full materialization) and then writes every arithmetic flag
    explicitly, including the undocumented SF/OF behavior real hardware
    exhibits. AAM divides by its immediate and raises #DE when it is zero.

*/

use crate::{
    bus::Bus,
    cpu::{
        flags::{Flags, FLAG_AF, FLAG_CF, FLAG_OF, FLAG_PF, FLAG_SF, FLAG_ZF},
        interrupt::EXCEPTION_DE,
        Cpu,
    },
    memerror::MemFault,
};

impl Cpu {
    fn set_szp(&mut self, value: u8) {
        self.flags.set(FLAG_SF, value & 0x80 != 0);
        self.flags.set(FLAG_ZF, value == 0);
        self.flags.set(FLAG_PF, Flags::parity(value));
    }

    pub(crate) fn daa(&mut self) {
        self.flags.fill();
        let al = self.regs.al();
        if al & 0x0F > 0x09 || self.flags.test(FLAG_AF) {
            if al > 0x99 || self.flags.test(FLAG_CF) {
                self.regs.set_al(al.wrapping_add(0x60));
                self.flags.set(FLAG_CF, true);
            }
            else {
                self.flags.set(FLAG_CF, false);
            }
            self.regs.set_al(self.regs.al().wrapping_add(0x06));
            self.flags.set(FLAG_AF, true);
        }
        else {
            if al > 0x99 || self.flags.test(FLAG_CF) {
                self.regs.set_al(al.wrapping_add(0x60));
                self.flags.set(FLAG_CF, true);
            }
            else {
                self.flags.set(FLAG_CF, false);
            }
            self.flags.set(FLAG_AF, false);
        }
        self.set_szp(self.regs.al());
    }

    pub(crate) fn das(&mut self) {
        self.flags.fill();
        let al = self.regs.al();
        let osigned = al & 0x80 != 0;
        if al & 0x0F > 9 || self.flags.test(FLAG_AF) {
            if al > 0x99 || self.flags.test(FLAG_CF) {
                self.regs.set_al(al.wrapping_sub(0x60));
                self.flags.set(FLAG_CF, true);
            }
            else {
                self.flags.set(FLAG_CF, al <= 0x05);
            }
            self.regs.set_al(self.regs.al().wrapping_sub(6));
            self.flags.set(FLAG_AF, true);
        }
        else {
            if al > 0x99 || self.flags.test(FLAG_CF) {
                self.regs.set_al(al.wrapping_sub(0x60));
                self.flags.set(FLAG_CF, true);
            }
            else {
                self.flags.set(FLAG_CF, false);
            }
            self.flags.set(FLAG_AF, false);
        }
        self.flags
            .set(FLAG_OF, osigned && self.regs.al() & 0x80 == 0);
        self.set_szp(self.regs.al());
    }

    pub(crate) fn aaa(&mut self) {
        self.flags.fill();
        let al = self.regs.al();
        self.flags.set(FLAG_SF, (0x7A..=0xF9).contains(&al));
        if al & 0x0F > 9 {
            self.flags.set(FLAG_OF, al & 0xF0 == 0x70);
            self.regs.set_ax(self.regs.ax().wrapping_add(0x106));
            self.flags.set(FLAG_CF, true);
            self.flags.set(FLAG_ZF, self.regs.al() == 0);
            self.flags.set(FLAG_AF, true);
        }
        else if self.flags.test(FLAG_AF) {
            self.regs.set_ax(self.regs.ax().wrapping_add(0x106));
            self.flags.set(FLAG_OF, false);
            self.flags.set(FLAG_CF, true);
            self.flags.set(FLAG_ZF, false);
            self.flags.set(FLAG_AF, true);
        }
        else {
            self.flags.set(FLAG_OF, false);
            self.flags.set(FLAG_CF, false);
            self.flags.set(FLAG_ZF, self.regs.al() == 0);
            self.flags.set(FLAG_AF, false);
        }
        self.flags.set(FLAG_PF, Flags::parity(self.regs.al()));
        self.regs.set_al(self.regs.al() & 0x0F);
    }

    pub(crate) fn aas(&mut self) {
        self.flags.fill();
        let al = self.regs.al();
        if al & 0x0F > 9 {
            self.flags.set(FLAG_SF, al > 0x85);
            self.regs.set_ax(self.regs.ax().wrapping_sub(0x106));
            self.flags.set(FLAG_OF, false);
            self.flags.set(FLAG_CF, true);
            self.flags.set(FLAG_AF, true);
        }
        else if self.flags.test(FLAG_AF) {
            self.flags.set(FLAG_OF, (0x80..=0x85).contains(&al));
            self.flags.set(FLAG_SF, al < 0x06 || al > 0x85);
            self.regs.set_ax(self.regs.ax().wrapping_sub(0x106));
            self.flags.set(FLAG_CF, true);
            self.flags.set(FLAG_AF, true);
        }
        else {
            self.flags.set(FLAG_SF, al >= 0x80);
            self.flags.set(FLAG_OF, false);
            self.flags.set(FLAG_CF, false);
            self.flags.set(FLAG_AF, false);
        }
        self.flags.set(FLAG_ZF, self.regs.al() == 0);
        self.flags.set(FLAG_PF, Flags::parity(self.regs.al()));
        self.regs.set_al(self.regs.al() & 0x0F);
    }

    /// AAM: unsigned divide of AL by the immediate. Raises #DE for a zero
    /// immediate.
    pub(crate) fn aam(&mut self, bus: &mut impl Bus) -> Result<bool, MemFault> {
        let dv = self.inst.op1 as u8;
        if dv == 0 {
            self.exception(bus, EXCEPTION_DE)?;
            return Ok(false);
        }
        self.flags.fill();
        let al = self.regs.al();
        self.regs.set_ah(al / dv);
        self.regs.set_al(al % dv);
        self.set_szp(self.regs.al());
        self.flags.set(FLAG_CF, false);
        self.flags.set(FLAG_OF, false);
        self.flags.set(FLAG_AF, false);
        Ok(true)
    }

    pub(crate) fn aad(&mut self) {
        self.flags.fill();
        let sum = (u16::from(self.regs.ah()) * u16::from(self.inst.op1 as u8))
            .wrapping_add(u16::from(self.regs.al()));
        self.regs.set_al(sum as u8);
        self.regs.set_ah(0);
        self.flags.set(FLAG_CF, false);
        self.flags.set(FLAG_OF, false);
        self.flags.set(FLAG_AF, false);
        self.set_szp(self.regs.al());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::flags::{FlagOp, Width};
    use interp86_common::CoreConfig;

    fn cpu() -> Cpu {
        Cpu::new(&CoreConfig::default())
    }

    #[test]
    fn daa_adjusts_packed_sum() {
        // 0x19 + 0x28 = 0x41, adjusted to 0x47.
        let mut cpu = cpu();
        cpu.regs.set_al(0x41);
        cpu.flags
            .set_record(FlagOp::Add, Width::Byte, 0x19, 0x28, 0x41);
        cpu.daa();
        assert_eq!(cpu.regs.al(), 0x47);
        assert!(!cpu.flags.test(FLAG_CF));
        assert!(cpu.flags.test(FLAG_AF));
    }

    #[test]
    fn das_adjusts_packed_difference() {
        // 0x31 - 0x07 = 0x2A, adjusted to 0x24.
        let mut cpu = cpu();
        cpu.regs.set_al(0x2A);
        cpu.flags
            .set_record(FlagOp::Sub, Width::Byte, 0x31, 0x07, 0x2A);
        cpu.das();
        assert_eq!(cpu.regs.al(), 0x24);
        assert!(!cpu.flags.test(FLAG_CF));
    }

    #[test]
    fn aaa_carries_into_ah() {
        let mut cpu = cpu();
        cpu.regs.set_ax(0x000B);
        cpu.aaa();
        assert_eq!(cpu.regs.ah(), 0x01);
        assert_eq!(cpu.regs.al(), 0x01);
        assert!(cpu.flags.test(FLAG_CF));
        assert!(cpu.flags.test(FLAG_AF));
    }

    #[test]
    fn aam_splits_binary_into_digits() {
        let mut cpu = cpu();
        let mut bus = crate::bus::FlatBus::new(0x1_0000);
        cpu.regs.set_al(45);
        cpu.inst.op1 = 10;
        assert!(cpu.aam(&mut bus).unwrap());
        assert_eq!(cpu.regs.ah(), 4);
        assert_eq!(cpu.regs.al(), 5);
        assert!(!cpu.flags.test(FLAG_ZF));
    }

    #[test]
    fn aad_recombines_digits() {
        let mut cpu = cpu();
        cpu.regs.set_ah(4);
        cpu.regs.set_al(5);
        cpu.inst.op1 = 10;
        cpu.aad();
        assert_eq!(cpu.regs.ax(), 45);
    }
}
