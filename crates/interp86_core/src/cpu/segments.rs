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

    segments.rs

    Segment register file with cached descriptor state. In real mode a
    selector load recomputes the cached base as selector << 4; embedders
    running protected-mode guests write the caches directly.

*/

use strum_macros::Display;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum SegReg {
    ES = 0,
    CS = 1,
    SS = 2,
    DS = 3,
    FS = 4,
    GS = 5,
}

impl SegReg {
    /// Segment register encoding as used by ModRM.reg in segment moves.
    pub fn from_index(idx: u8) -> Option<SegReg> {
        match idx {
            0 => Some(SegReg::ES),
            1 => Some(SegReg::CS),
            2 => Some(SegReg::SS),
            3 => Some(SegReg::DS),
            4 => Some(SegReg::FS),
            5 => Some(SegReg::GS),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SegmentCache {
    pub selector: u16,
    pub base: u32,
    pub limit: u32,
    pub expand_down: bool,
    /// Default operand/address size. Set on CS for 32-bit code segments and
    /// on SS for 32-bit stacks.
    pub big: bool,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Segments {
    seg: [SegmentCache; 6],
}

impl Segments {
    #[inline(always)]
    pub fn cache(&self, seg: SegReg) -> &SegmentCache {
        &self.seg[seg as usize]
    }

    #[inline(always)]
    pub fn cache_mut(&mut self, seg: SegReg) -> &mut SegmentCache {
        &mut self.seg[seg as usize]
    }

    #[inline(always)]
    pub fn selector(&self, seg: SegReg) -> u16 {
        self.seg[seg as usize].selector
    }

    #[inline(always)]
    pub fn base(&self, seg: SegReg) -> u32 {
        self.seg[seg as usize].base
    }

    /// Real-mode selector load.
    pub fn reload(&mut self, seg: SegReg, selector: u16) {
        let cache = &mut self.seg[seg as usize];
        cache.selector = selector;
        cache.base = u32::from(selector) << 4;
        if cache.limit < 0xFFFF {
            cache.limit = 0xFFFF;
        }
    }

    /// Mask for stack-pointer arithmetic: 0xFFFF for 16-bit stacks,
    /// 0xFFFFFFFF for 32-bit stacks.
    #[inline(always)]
    pub fn stack_mask(&self) -> u32 {
        if self.seg[SegReg::SS as usize].big {
            0xFFFF_FFFF
        }
        else {
            0xFFFF
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_mode_reload_shifts_selector() {
        let mut segs = Segments::default();
        segs.reload(SegReg::DS, 0xA000);
        assert_eq!(segs.selector(SegReg::DS), 0xA000);
        assert_eq!(segs.base(SegReg::DS), 0xA_0000);
    }

    #[test]
    fn stack_mask_follows_ss_size() {
        let mut segs = Segments::default();
        assert_eq!(segs.stack_mask(), 0xFFFF);
        segs.cache_mut(SegReg::SS).big = true;
        assert_eq!(segs.stack_mask(), 0xFFFF_FFFF);
    }
}
