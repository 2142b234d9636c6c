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

    decode.rs

    The per-instruction decode context and the closed micro-op code spaces
    that drive the pipeline. Each opcode table entry is a (load, operate,
    store) triple; the Load phase fills the context's operand slots, Operate
    transforms them, Store writes them back. Codes that a phase does not
    recognize cannot exist: the enums are exhaustive and every arm is
    handled.

*/

use crate::{
    bus::Bus,
    cpu::{
        flags::Width,
        segments::SegReg,
        Cpu,
    },
    memerror::MemFault,
};

pub const PREFIX_ADDR: u8 = 0x01;
pub const PREFIX_SEG: u8 = 0x02;
pub const PREFIX_REP: u8 = 0x04;

/// Condition codes in opcode order (0x70 + cc, SETcc, Jcc near).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cc {
    O,
    No,
    B,
    Nb,
    Z,
    Nz,
    Be,
    Nbe,
    S,
    Ns,
    P,
    Np,
    L,
    Nl,
    Le,
    Nle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StringOp {
    Ins(Width),
    Outs(Width),
    Movs(Width),
    Lods(Width),
    Stos(Width),
    Scas(Width),
    Cmps(Width),
}

/// ModRM operand-spec codes. `E` is the ModRM-selected register or memory
/// operand, `G` the ModRM.reg register, `I` an immediate; a trailing `x`
/// sign-extends into the 32-bit operand slot. `EwGwT`/`EdGdT` apply the
/// BT-family bit-offset displacement to the effective address. The `Grp*`
/// codes redirect dispatch through a group table row selected by ModRM.reg.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum M {
    None,
    Ib,
    Iw,
    Id,
    Eb,
    Ebx,
    EbIb,
    EbGb,
    Gb,
    GbEb,
    Ew,
    Ewx,
    EwIb,
    EwIbx,
    EwIw,
    EwGw,
    EwGwCl,
    EwGwIb,
    EwGwT,
    Gw,
    GwEw,
    EwxGwx,
    EwxIbx,
    EwxIwx,
    Ed,
    EdIb,
    EdIbx,
    EdId,
    EdGd,
    EdGdCl,
    EdGdIb,
    EdGdT,
    Gd,
    GdEd,
    EdxGdx,
    Seg,
    Efw,
    Efd,
    Ea,
    Grp(u8),
    GrpIb(u8),
    GrpCl(u8),
    Grp1(u8),
    Fpu(u8),
}

/// Self-contained instructions that complete entirely in the Load phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dir {
    Iret(Width),
    Retf(Width),
    RetfIw(Width),
    Pusha(Width),
    Popa(Width),
    PopSeg(SegReg, Width),
    Setalc,
    Xlat,
    Cbw(Width),
    Cwd(Width),
    Cli,
    Sti,
    Stc,
    Clc,
    Cmc,
    Cld,
    Std,
    Pushf(Width),
    Popf(Width),
    Sahf,
    Lahf,
    Wait,
    Nop,
    Lock,
    Enter(Width),
    Leave(Width),
    Daa,
    Das,
    Aaa,
    Aas,
    Cpuid,
    Hlt,
    Clts,
    Icebp,
    Rdtsc,
}

/// Load-phase codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ld {
    /// Unassigned table slot; raises #UD.
    Illegal,
    Modrm(M),
    /// ModRM load that additionally requires protected mode outside V86
    /// (ARPL, LAR, LSL).
    ModrmPm(M),
    Pop(Width),
    /// Pop the operand first, then decode ModRM for the store side (8F).
    PopRm(Width, M),
    I(Width),
    Ix(Width),
    /// Far pointer immediate: offset then 16-bit selector.
    If(Width),
    Reg(Width, u8),
    RegI(Width, u8),
    Seg(SegReg),
    /// Direct-offset memory operand (A0-A3).
    Moffs,
    /// 0F escape: shift dispatch into the second table bank and restart.
    Double,
    PreSeg(SegReg),
    PreRep(bool),
    PreOp,
    PreAdd,
    Val(u32),
    /// INTO: proceed as INT 4 only when OF is set.
    Into,
    Str(StringOp),
    Direct(Dir),
}

/// Operate-phase codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    None,
    Add(Width),
    Adc(Width),
    Sub(Width),
    Sbb(Width),
    Cmp(Width),
    And(Width),
    Or(Width),
    Xor(Width),
    Test(Width),
    Inc(Width),
    Dec(Width),
    Not,
    Neg(Width),
    Rol(Width),
    Ror(Width),
    Rcl(Width),
    Rcr(Width),
    Shl(Width),
    Shr(Width),
    Sar(Width),
    Dshl(Width),
    Dshr(Width),
    Mul(Width),
    Imul(Width),
    Div(Width),
    Idiv(Width),
    /// Two/three-operand IMUL with truncated result.
    ImulR(Width),
    Aam,
    Aad,
    Cond(Cc),
    LoadAcc(Width),
    StoreAcc(Width),
    XchgAcc(Width),
    CallN(Width),
    CallF(Width),
    JmpF(Width),
    Int,
    Loop,
    Loopz,
    Loopnz,
    Jcxz,
    In(Width),
    Out(Width),
    /// Host callback trap: exits the run loop with the operand as handler
    /// index.
    Callback,
    Grp6(Width),
    Grp7(Width),
    Lar(Width),
    Lsl(Width),
    Arpl,
    Bound(Width),
    Bt(Width),
    Bts(Width),
    Btr(Width),
    Btc(Width),
    Bsf(Width),
    Bsr(Width),
    Bswap(Width),
    /// Exchange-and-add: op1 becomes the sum, op2 the original E value.
    Xadd(Width),
    Cmpxchg,
    MovFromCr,
    MovToCr,
    MovFromDr,
    MovToDr,
    MovFromTr,
    MovToTr,
    LoadSeg(SegReg),
    Fpu,
}

/// Store-phase codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum St {
    None,
    E(Width),
    G(Width),
    /// op1 to the E operand, op2 to the G register (XCHG, XADD).
    EG(Width),
    /// Segment selector store with 32-bit operand size: full register,
    /// 16-bit memory.
    EdMw,
    Reg(Width, u8),
    /// Segment register load from op1, selected by ModRM.reg.
    SegM,
    /// Far-pointer register side: G register receives op1 after the Operate
    /// phase loaded the segment (LES/LDS/LSS/LFS/LGS).
    SegG(Width),
    Push(Width),
    /// SETcc byte store.
    CondEb,
    /// Conditional near jump: falls through to `AddIp` when the condition
    /// holds.
    CondIp(Width),
    /// Relative jump: add op1 to the instruction pointer.
    AddIp(Width),
    Ip,
    /// Near RET imm16: release stack bytes, then set the instruction
    /// pointer.
    IpIw,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MicroOps {
    pub load: Ld,
    pub op: Op,
    pub store: St,
}

/// Transient per-instruction state. Rebuilt for every instruction; prefix
/// bytes restart decode with the prefix bits accumulated here.
#[derive(Copy, Clone, Debug)]
pub struct Inst {
    pub code: MicroOps,
    /// Dispatch table index: opcode byte plus 0x100 (0F bank) and 0x200
    /// (32-bit operand size) offsets.
    pub entry: u16,
    pub prefix: u8,
    /// Base of the segment override, valid when PREFIX_SEG is set.
    pub seg_base: u32,
    pub rm: u8,
    pub rm_mod: u8,
    pub rm_index: u8,
    pub rm_eai: u8,
    /// Linear address of the memory operand.
    pub rm_eaa: u32,
    /// Segment-relative offset of the memory operand (LEA).
    pub rm_off: u32,
    pub op1: u32,
    pub op2: u32,
    pub imm: u32,
    pub cond: bool,
    pub repz: bool,
    /// IP at the start of the instruction, before any prefix bytes.
    pub start_ip: u32,
    /// Linear fetch pointer (CS base + IP).
    pub cseip: u32,
}

impl Default for Inst {
    fn default() -> Self {
        Inst {
            code: MicroOps {
                load: Ld::Illegal,
                op: Op::None,
                store: St::None,
            },
            entry: 0,
            prefix: 0,
            seg_base: 0,
            rm: 0,
            rm_mod: 0,
            rm_index: 0,
            rm_eai: 0,
            rm_eaa: 0,
            rm_off: 0,
            op1: 0,
            op2: 0,
            imm: 0,
            cond: false,
            repz: false,
            start_ip: 0,
            cseip: 0,
        }
    }
}

impl Cpu {
    #[inline(always)]
    pub(crate) fn fetch_u8(&mut self, bus: &mut impl Bus) -> Result<u8, MemFault> {
        let value = bus.read_u8(self.inst.cseip)?;
        self.inst.cseip = self.inst.cseip.wrapping_add(1);
        Ok(value)
    }

    #[inline(always)]
    pub(crate) fn fetch_u16(&mut self, bus: &mut impl Bus) -> Result<u16, MemFault> {
        let value = bus.read_u16(self.inst.cseip)?;
        self.inst.cseip = self.inst.cseip.wrapping_add(2);
        Ok(value)
    }

    #[inline(always)]
    pub(crate) fn fetch_u32(&mut self, bus: &mut impl Bus) -> Result<u32, MemFault> {
        let value = bus.read_u32(self.inst.cseip)?;
        self.inst.cseip = self.inst.cseip.wrapping_add(4);
        Ok(value)
    }

    /// Fetch an immediate at `width`, zero-extended.
    pub(crate) fn fetch_imm(&mut self, bus: &mut impl Bus, width: Width) -> Result<u32, MemFault> {
        match width {
            Width::Byte => Ok(u32::from(self.fetch_u8(bus)?)),
            Width::Word => Ok(u32::from(self.fetch_u16(bus)?)),
            Width::Dword => self.fetch_u32(bus),
        }
    }

    /// Fetch an immediate at `width`, sign-extended to 32 bits.
    pub(crate) fn fetch_imm_signed(
        &mut self,
        bus: &mut impl Bus,
        width: Width,
    ) -> Result<u32, MemFault> {
        match width {
            Width::Byte => Ok(self.fetch_u8(bus)? as i8 as i32 as u32),
            Width::Word => Ok(self.fetch_u16(bus)? as i16 as i32 as u32),
            Width::Dword => self.fetch_u32(bus),
        }
    }
}
