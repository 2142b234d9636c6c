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

    flags.rs

    Lazy arithmetic flags. ALU operations record (operation, width, operands,
    result) instead of computing CF/PF/AF/ZF/SF/OF eagerly; the individual
    flags are derived on demand from the record, and `fill` materializes all
    six into the flags word when an instruction needs the word itself
    (PUSHF, LAHF, interrupt delivery). Control bits (TF, IF, DF, IOPL, ...)
    always live in the word directly.

*/

pub const FLAG_CF: u32 = 0x0001;
pub const FLAG_PF: u32 = 0x0004;
pub const FLAG_AF: u32 = 0x0010;
pub const FLAG_ZF: u32 = 0x0040;
pub const FLAG_SF: u32 = 0x0080;
pub const FLAG_TF: u32 = 0x0100;
pub const FLAG_IF: u32 = 0x0200;
pub const FLAG_DF: u32 = 0x0400;
pub const FLAG_OF: u32 = 0x0800;
pub const FLAG_IOPL: u32 = 0x3000;
pub const FLAG_NT: u32 = 0x4000;
pub const FLAG_VM: u32 = 0x2_0000;

/// Bits replaceable by POPF/IRET.
pub const FLAG_MASK_POP: u32 = 0x7FD5;
/// Bits replaceable by SAHF.
pub const FLAG_MASK_SAHF: u32 = 0x00D5;
/// Bit 1 always reads as set.
const FLAG_FIXED: u32 = 0x0002;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
    Dword,
}

impl Width {
    #[inline(always)]
    pub fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF,
            Width::Dword => 0xFFFF_FFFF,
        }
    }

    #[inline(always)]
    pub fn sign_bit(self) -> u32 {
        match self {
            Width::Byte => 0x80,
            Width::Word => 0x8000,
            Width::Dword => 0x8000_0000,
        }
    }

    #[inline(always)]
    pub fn bits(self) -> u32 {
        match self {
            Width::Byte => 8,
            Width::Word => 16,
            Width::Dword => 32,
        }
    }

    #[inline(always)]
    pub fn bytes(self) -> u32 {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
            Width::Dword => 4,
        }
    }
}

/// Operation tag for the lazy record. `None` means the flags word is
/// current.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum FlagOp {
    #[default]
    None,
    Add,
    Adc,
    Sub,
    Sbb,
    Inc,
    Dec,
    Neg,
    Logic,
    Shl,
    Shr,
    Sar,
    Dshl,
    Dshr,
}

const fn build_parity() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u32).count_ones() & 1 == 0;
        i += 1;
    }
    table
}

static PARITY: [bool; 256] = build_parity();

#[derive(Copy, Clone, Debug)]
pub struct Flags {
    word: u32,
    op: FlagOp,
    width: Width,
    var1: u32,
    var2: u32,
    res: u32,
    oldcf: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            word: FLAG_FIXED,
            op: FlagOp::None,
            width: Width::Byte,
            var1: 0,
            var2: 0,
            res: 0,
            oldcf: false,
        }
    }
}

#[inline(always)]
fn sext(value: u32, width: Width) -> i32 {
    match width {
        Width::Byte => value as u8 as i8 as i32,
        Width::Word => value as u16 as i16 as i32,
        Width::Dword => value as i32,
    }
}

impl Flags {
    pub fn new() -> Flags {
        Flags::default()
    }

    /// Even-parity lookup for explicit PF updates (BCD adjusts, AAM/AAD).
    #[inline(always)]
    pub(crate) fn parity(value: u8) -> bool {
        PARITY[value as usize]
    }

    /// Raw flags word. CF..OF may be stale while a lazy record is pending;
    /// call `fill` first when the whole word matters.
    #[inline(always)]
    pub fn bits(&self) -> u32 {
        self.word
    }

    #[inline(always)]
    pub fn test(&self, bit: u32) -> bool {
        self.word & bit != 0
    }

    #[inline(always)]
    pub fn set(&mut self, bit: u32, value: bool) {
        if value {
            self.word |= bit;
        }
        else {
            self.word &= !bit;
        }
    }

    /// IOPL field value (0-3).
    #[inline(always)]
    pub fn iopl(&self) -> u32 {
        (self.word & FLAG_IOPL) >> 12
    }

    /// Replace the masked bits of the flags word, dropping any pending
    /// record. Used by POPF, IRET and SAHF (which materialize first when
    /// they only replace a subset of the arithmetic flags).
    pub fn set_word(&mut self, value: u32, mask: u32) {
        self.word = ((self.word & !mask) | (value & mask) | FLAG_FIXED) & !0x0008 & !0x0020;
        self.op = FlagOp::None;
    }

    pub(crate) fn set_record(&mut self, op: FlagOp, width: Width, var1: u32, var2: u32, res: u32) {
        self.op = op;
        self.width = width;
        self.var1 = var1;
        self.var2 = var2;
        self.res = res;
        self.oldcf = false;
    }

    pub(crate) fn set_record_carry(
        &mut self,
        op: FlagOp,
        width: Width,
        var1: u32,
        var2: u32,
        res: u32,
        oldcf: bool,
    ) {
        self.set_record(op, width, var1, var2, res);
        self.oldcf = oldcf;
    }

    /// Materialize the current CF into the word before an operation that
    /// preserves it (INC/DEC).
    pub(crate) fn load_cf(&mut self) {
        let cf = self.cf();
        self.set(FLAG_CF, cf);
    }

    pub fn cf(&self) -> bool {
        let (var1, var2, res) = (self.var1, self.var2, self.res);
        match self.op {
            FlagOp::None | FlagOp::Inc | FlagOp::Dec => self.word & FLAG_CF != 0,
            FlagOp::Add => res < var1,
            FlagOp::Adc => res < var1 || (self.oldcf && res == var1),
            FlagOp::Sub => var1 < var2,
            FlagOp::Sbb => var1 < res || (self.oldcf && var2 == self.width.mask()),
            FlagOp::Neg => var1 != 0,
            FlagOp::Logic => false,
            FlagOp::Shl => {
                if var2 > self.width.bits() {
                    false
                }
                else {
                    (var1 >> (self.width.bits() - var2)) & 1 != 0
                }
            }
            FlagOp::Dshl => (var1 >> (32 - var2)) & 1 != 0,
            FlagOp::Shr | FlagOp::Dshr => (var1 >> (var2 - 1)) & 1 != 0,
            FlagOp::Sar => (sext(var1, self.width) >> (var2 - 1)) & 1 != 0,
        }
    }

    pub fn af(&self) -> bool {
        let (var1, var2, res) = (self.var1, self.var2, self.res);
        match self.op {
            FlagOp::None => self.word & FLAG_AF != 0,
            FlagOp::Add | FlagOp::Adc | FlagOp::Sub | FlagOp::Sbb => {
                ((var1 ^ var2) ^ res) & 0x10 != 0
            }
            FlagOp::Inc => res & 0x0F == 0,
            FlagOp::Dec => res & 0x0F == 0x0F,
            FlagOp::Neg => var1 & 0x0F != 0,
            FlagOp::Shl | FlagOp::Shr | FlagOp::Sar => var2 & 0x1F != 0,
            FlagOp::Logic | FlagOp::Dshl | FlagOp::Dshr => false,
        }
    }

    pub fn zf(&self) -> bool {
        match self.op {
            FlagOp::None => self.word & FLAG_ZF != 0,
            _ => self.res & self.width.mask() == 0,
        }
    }

    pub fn sf(&self) -> bool {
        match self.op {
            FlagOp::None => self.word & FLAG_SF != 0,
            _ => self.res & self.width.sign_bit() != 0,
        }
    }

    pub fn pf(&self) -> bool {
        match self.op {
            FlagOp::None => self.word & FLAG_PF != 0,
            _ => PARITY[self.res as u8 as usize],
        }
    }

    pub fn of(&self) -> bool {
        let (var1, var2, res) = (self.var1, self.var2, self.res);
        let sign = self.width.sign_bit();
        match self.op {
            FlagOp::None => self.word & FLAG_OF != 0,
            FlagOp::Inc => res & self.width.mask() == sign,
            FlagOp::Dec => res & self.width.mask() == sign - 1,
            FlagOp::Neg => var1 & self.width.mask() == sign,
            FlagOp::Add | FlagOp::Adc => (!(var1 ^ var2) & (var1 ^ res)) & sign != 0,
            FlagOp::Sub | FlagOp::Sbb => ((var1 ^ var2) & (var1 ^ res)) & sign != 0,
            FlagOp::Logic | FlagOp::Sar => false,
            FlagOp::Shl | FlagOp::Dshl | FlagOp::Dshr => (res ^ var1) & sign != 0,
            FlagOp::Shr => {
                if var2 & 0x1F == 1 {
                    var1 & sign != 0
                }
                else {
                    false
                }
            }
        }
    }

    /// Materialize all six arithmetic flags into the word and clear the
    /// record. Returns the complete flags word.
    pub fn fill(&mut self) -> u32 {
        if self.op != FlagOp::None {
            let (cf, pf, af, zf, sf, of) =
                (self.cf(), self.pf(), self.af(), self.zf(), self.sf(), self.of());
            self.set(FLAG_CF, cf);
            self.set(FLAG_PF, pf);
            self.set(FLAG_AF, af);
            self.set(FLAG_ZF, zf);
            self.set(FLAG_SF, sf);
            self.set(FLAG_OF, of);
            self.op = FlagOp::None;
        }
        self.word
    }

    /// Materialize PF/AF/ZF/SF only, for operations that go on to set CF
    /// and OF explicitly (rotates, multiplies, BCD adjusts).
    pub fn fill_no_cf_of(&mut self) {
        if self.op != FlagOp::None {
            let (pf, af, zf, sf) = (self.pf(), self.af(), self.zf(), self.sf());
            self.set(FLAG_PF, pf);
            self.set(FLAG_AF, af);
            self.set(FLAG_ZF, zf);
            self.set(FLAG_SF, sf);
            self.op = FlagOp::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_overflow_at_dword() {
        let mut flags = Flags::new();
        // 0x7FFFFFFF + 1: overflow and sign set, carry clear.
        flags.set_record(FlagOp::Add, Width::Dword, 0x7FFF_FFFF, 1, 0x8000_0000);
        assert!(flags.of());
        assert!(flags.sf());
        assert!(!flags.cf());
        assert!(!flags.zf());
        let word = flags.fill();
        assert_eq!(word & (FLAG_OF | FLAG_SF), FLAG_OF | FLAG_SF);
        assert_eq!(word & FLAG_CF, 0);
    }

    #[test]
    fn sub_borrow_at_dword() {
        let mut flags = Flags::new();
        // 0 - 1: carry and sign set, zero clear.
        flags.set_record(FlagOp::Sub, Width::Dword, 0, 1, 0xFFFF_FFFF);
        assert!(flags.cf());
        assert!(flags.sf());
        assert!(!flags.zf());
        assert!(!flags.of());
    }

    #[test]
    fn adc_carries_through_equal_result() {
        let mut flags = Flags::new();
        // 0xFF + 0x00 + carry-in wraps to 0x00 at byte width.
        flags.set_record_carry(FlagOp::Adc, Width::Byte, 0xFF, 0x00, 0x00, true);
        assert!(flags.cf());
        assert!(flags.zf());
    }

    #[test]
    fn parity_of_low_byte_only() {
        let mut flags = Flags::new();
        flags.set_record(FlagOp::Logic, Width::Word, 0, 0, 0xFF00);
        // Low byte 0x00 has even parity regardless of the high byte.
        assert!(flags.pf());
        flags.set_record(FlagOp::Logic, Width::Word, 0, 0, 0xFF01);
        assert!(!flags.pf());
    }

    #[test]
    fn inc_preserves_carry() {
        let mut flags = Flags::new();
        flags.set_record(FlagOp::Sub, Width::Byte, 0, 1, 0xFF); // sets CF lazily
        flags.load_cf();
        flags.set_record(FlagOp::Inc, Width::Byte, 0x7F, 1, 0x80);
        assert!(flags.cf());
        assert!(flags.of());
    }

    #[test]
    fn shr_overflow_only_on_single_shift() {
        let mut flags = Flags::new();
        flags.set_record(FlagOp::Shr, Width::Byte, 0x80, 1, 0x40);
        assert!(flags.of());
        assert!(!flags.cf());
        flags.set_record(FlagOp::Shr, Width::Byte, 0x80, 2, 0x20);
        assert!(!flags.of());
        assert!(flags.cf());
    }

    #[test]
    fn pop_mask_excludes_reserved_bits() {
        let mut flags = Flags::new();
        flags.set_word(0xFFFF_FFFF, FLAG_MASK_POP);
        assert_eq!(flags.bits() & 0x0008, 0);
        assert_eq!(flags.bits() & 0x0020, 0);
        assert!(flags.test(FLAG_IF));
        assert!(flags.test(FLAG_OF));
    }
}
