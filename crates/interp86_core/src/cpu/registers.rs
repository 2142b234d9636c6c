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

    registers.rs

    The general register file. Eight 32-bit registers addressed by their
    instruction-encoding index, with masked 8/16/32-bit views; the 8-bit
    index space maps 0-3 to the low bytes of AX-BX and 4-7 to the high
    bytes (AH, CH, DH, BH).

*/

// Register indices in instruction encoding order.
pub const REG_AX: usize = 0;
pub const REG_CX: usize = 1;
pub const REG_DX: usize = 2;
pub const REG_BX: usize = 3;
pub const REG_SP: usize = 4;
pub const REG_BP: usize = 5;
pub const REG_SI: usize = 6;
pub const REG_DI: usize = 7;

#[derive(Copy, Clone, Debug, Default)]
pub struct Registers {
    gpr: [u32; 8],
    pub ip: u32,
}

macro_rules! accessors_16 {
    ($get:ident, $set:ident, $idx:expr) => {
        #[inline(always)]
        pub fn $get(&self) -> u16 {
            self.gpr[$idx] as u16
        }
        #[inline(always)]
        pub fn $set(&mut self, value: u16) {
            self.gpr[$idx] = (self.gpr[$idx] & 0xFFFF_0000) | u32::from(value);
        }
    };
}

macro_rules! accessors_32 {
    ($get:ident, $set:ident, $idx:expr) => {
        #[inline(always)]
        pub fn $get(&self) -> u32 {
            self.gpr[$idx]
        }
        #[inline(always)]
        pub fn $set(&mut self, value: u32) {
            self.gpr[$idx] = value;
        }
    };
}

impl Registers {
    #[inline(always)]
    pub fn r8(&self, idx: usize) -> u8 {
        if idx < 4 {
            self.gpr[idx] as u8
        }
        else {
            (self.gpr[idx - 4] >> 8) as u8
        }
    }

    #[inline(always)]
    pub fn set_r8(&mut self, idx: usize, value: u8) {
        if idx < 4 {
            self.gpr[idx] = (self.gpr[idx] & 0xFFFF_FF00) | u32::from(value);
        }
        else {
            self.gpr[idx - 4] = (self.gpr[idx - 4] & 0xFFFF_00FF) | (u32::from(value) << 8);
        }
    }

    #[inline(always)]
    pub fn r16(&self, idx: usize) -> u16 {
        self.gpr[idx] as u16
    }

    #[inline(always)]
    pub fn set_r16(&mut self, idx: usize, value: u16) {
        self.gpr[idx] = (self.gpr[idx] & 0xFFFF_0000) | u32::from(value);
    }

    #[inline(always)]
    pub fn r32(&self, idx: usize) -> u32 {
        self.gpr[idx]
    }

    #[inline(always)]
    pub fn set_r32(&mut self, idx: usize, value: u32) {
        self.gpr[idx] = value;
    }

    #[inline(always)]
    pub fn al(&self) -> u8 {
        self.gpr[REG_AX] as u8
    }

    #[inline(always)]
    pub fn set_al(&mut self, value: u8) {
        self.set_r8(0, value);
    }

    #[inline(always)]
    pub fn ah(&self) -> u8 {
        (self.gpr[REG_AX] >> 8) as u8
    }

    #[inline(always)]
    pub fn set_ah(&mut self, value: u8) {
        self.set_r8(4, value);
    }

    #[inline(always)]
    pub fn cl(&self) -> u8 {
        self.gpr[REG_CX] as u8
    }

    accessors_16!(ax, set_ax, REG_AX);
    accessors_16!(cx, set_cx, REG_CX);
    accessors_16!(dx, set_dx, REG_DX);
    accessors_16!(bx, set_bx, REG_BX);
    accessors_16!(sp, set_sp, REG_SP);
    accessors_16!(bp, set_bp, REG_BP);
    accessors_16!(si, set_si, REG_SI);
    accessors_16!(di, set_di, REG_DI);

    accessors_32!(eax, set_eax, REG_AX);
    accessors_32!(ecx, set_ecx, REG_CX);
    accessors_32!(edx, set_edx, REG_DX);
    accessors_32!(ebx, set_ebx, REG_BX);
    accessors_32!(esp, set_esp, REG_SP);
    accessors_32!(ebp, set_ebp, REG_BP);
    accessors_32!(esi, set_esi, REG_SI);
    accessors_32!(edi, set_edi, REG_DI);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_byte_registers_alias_word_registers() {
        let mut regs = Registers::default();
        regs.set_ebx(0xAABB_CCDD);
        assert_eq!(regs.r8(3), 0xDD); // BL
        assert_eq!(regs.r8(7), 0xCC); // BH
        regs.set_r8(7, 0x12);
        assert_eq!(regs.bx(), 0x12DD);
        assert_eq!(regs.ebx(), 0xAABB_12DD);
    }

    #[test]
    fn word_writes_preserve_upper_half() {
        let mut regs = Registers::default();
        regs.set_esi(0xDEAD_BEEF);
        regs.set_si(0x1234);
        assert_eq!(regs.esi(), 0xDEAD_1234);
    }
}
