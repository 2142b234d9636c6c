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

    optable.rs

    The dispatch tables. OPCODE_TABLE has four 256-entry banks indexed by
    entry = opcode | 0x100 (0F prefix) | 0x200 (32-bit operand size); the
    operand-size and 0F prefixes re-dispatch into the other banks rather
    than being decoded per-handler. GROUP_TABLE holds the ModRM.reg-selected
    rows for the immediate/shift/unary/FF/BT groups; a `Grp*` operand-spec
    replaces the current entry with the row entry and re-enters ModRM
    decoding. Unassigned slots stay `Illegal` and raise #UD.

*/

use crate::cpu::{
    decode::{Cc, Dir, Ld, M, MicroOps, Op, St, StringOp},
    flags::Width::{Byte as B, Dword as D, Word as W},
    segments::SegReg::{CS, DS, ES, FS, GS, SS},
};

const fn e(load: Ld, op: Op, store: St) -> MicroOps {
    MicroOps { load, op, store }
}

const fn m(spec: M, op: Op, store: St) -> MicroOps {
    e(Ld::Modrm(spec), op, store)
}

const fn d(dir: Dir) -> MicroOps {
    e(Ld::Direct(dir), Op::None, St::None)
}

const ILLEGAL: MicroOps = e(Ld::Illegal, Op::None, St::None);

const CC: [Cc; 16] = [
    Cc::O,
    Cc::No,
    Cc::B,
    Cc::Nb,
    Cc::Z,
    Cc::Nz,
    Cc::Be,
    Cc::Nbe,
    Cc::S,
    Cc::Ns,
    Cc::P,
    Cc::Np,
    Cc::L,
    Cc::Nl,
    Cc::Le,
    Cc::Nle,
];

#[rustfmt::skip]
const fn build_opcode_table() -> [MicroOps; 1024] {
    let mut t = [ILLEGAL; 1024];

    // ------------------------------------------------------------------
    // Bank 0x000: one-byte opcodes, 16-bit operand size.
    // ------------------------------------------------------------------

    // ALU rows: op r/m,r; op r,r/m; op acc,imm.
    t[0x00] = m(M::EbGb, Op::Add(B), St::E(B));
    t[0x01] = m(M::EwGw, Op::Add(W), St::E(W));
    t[0x02] = m(M::GbEb, Op::Add(B), St::G(B));
    t[0x03] = m(M::GwEw, Op::Add(W), St::G(W));
    t[0x04] = e(Ld::RegI(B, 0), Op::Add(B), St::Reg(B, 0));
    t[0x05] = e(Ld::RegI(W, 0), Op::Add(W), St::Reg(W, 0));
    t[0x06] = e(Ld::Seg(ES), Op::None, St::Push(W));
    t[0x07] = d(Dir::PopSeg(ES, W));
    t[0x08] = m(M::EbGb, Op::Or(B), St::E(B));
    t[0x09] = m(M::EwGw, Op::Or(W), St::E(W));
    t[0x0A] = m(M::GbEb, Op::Or(B), St::G(B));
    t[0x0B] = m(M::GwEw, Op::Or(W), St::G(W));
    t[0x0C] = e(Ld::RegI(B, 0), Op::Or(B), St::Reg(B, 0));
    t[0x0D] = e(Ld::RegI(W, 0), Op::Or(W), St::Reg(W, 0));
    t[0x0E] = e(Ld::Seg(CS), Op::None, St::Push(W));
    t[0x0F] = e(Ld::Double, Op::None, St::None);
    t[0x10] = m(M::EbGb, Op::Adc(B), St::E(B));
    t[0x11] = m(M::EwGw, Op::Adc(W), St::E(W));
    t[0x12] = m(M::GbEb, Op::Adc(B), St::G(B));
    t[0x13] = m(M::GwEw, Op::Adc(W), St::G(W));
    t[0x14] = e(Ld::RegI(B, 0), Op::Adc(B), St::Reg(B, 0));
    t[0x15] = e(Ld::RegI(W, 0), Op::Adc(W), St::Reg(W, 0));
    t[0x16] = e(Ld::Seg(SS), Op::None, St::Push(W));
    t[0x17] = d(Dir::PopSeg(SS, W));
    t[0x18] = m(M::EbGb, Op::Sbb(B), St::E(B));
    t[0x19] = m(M::EwGw, Op::Sbb(W), St::E(W));
    t[0x1A] = m(M::GbEb, Op::Sbb(B), St::G(B));
    t[0x1B] = m(M::GwEw, Op::Sbb(W), St::G(W));
    t[0x1C] = e(Ld::RegI(B, 0), Op::Sbb(B), St::Reg(B, 0));
    t[0x1D] = e(Ld::RegI(W, 0), Op::Sbb(W), St::Reg(W, 0));
    t[0x1E] = e(Ld::Seg(DS), Op::None, St::Push(W));
    t[0x1F] = d(Dir::PopSeg(DS, W));
    t[0x20] = m(M::EbGb, Op::And(B), St::E(B));
    t[0x21] = m(M::EwGw, Op::And(W), St::E(W));
    t[0x22] = m(M::GbEb, Op::And(B), St::G(B));
    t[0x23] = m(M::GwEw, Op::And(W), St::G(W));
    t[0x24] = e(Ld::RegI(B, 0), Op::And(B), St::Reg(B, 0));
    t[0x25] = e(Ld::RegI(W, 0), Op::And(W), St::Reg(W, 0));
    t[0x26] = e(Ld::PreSeg(ES), Op::None, St::None);
    t[0x27] = d(Dir::Daa);
    t[0x28] = m(M::EbGb, Op::Sub(B), St::E(B));
    t[0x29] = m(M::EwGw, Op::Sub(W), St::E(W));
    t[0x2A] = m(M::GbEb, Op::Sub(B), St::G(B));
    t[0x2B] = m(M::GwEw, Op::Sub(W), St::G(W));
    t[0x2C] = e(Ld::RegI(B, 0), Op::Sub(B), St::Reg(B, 0));
    t[0x2D] = e(Ld::RegI(W, 0), Op::Sub(W), St::Reg(W, 0));
    t[0x2E] = e(Ld::PreSeg(CS), Op::None, St::None);
    t[0x2F] = d(Dir::Das);
    t[0x30] = m(M::EbGb, Op::Xor(B), St::E(B));
    t[0x31] = m(M::EwGw, Op::Xor(W), St::E(W));
    t[0x32] = m(M::GbEb, Op::Xor(B), St::G(B));
    t[0x33] = m(M::GwEw, Op::Xor(W), St::G(W));
    t[0x34] = e(Ld::RegI(B, 0), Op::Xor(B), St::Reg(B, 0));
    t[0x35] = e(Ld::RegI(W, 0), Op::Xor(W), St::Reg(W, 0));
    t[0x36] = e(Ld::PreSeg(SS), Op::None, St::None);
    t[0x37] = d(Dir::Aaa);
    t[0x38] = m(M::EbGb, Op::Cmp(B), St::None);
    t[0x39] = m(M::EwGw, Op::Cmp(W), St::None);
    t[0x3A] = m(M::GbEb, Op::Cmp(B), St::None);
    t[0x3B] = m(M::GwEw, Op::Cmp(W), St::None);
    t[0x3C] = e(Ld::RegI(B, 0), Op::Cmp(B), St::None);
    t[0x3D] = e(Ld::RegI(W, 0), Op::Cmp(W), St::None);
    t[0x3E] = e(Ld::PreSeg(DS), Op::None, St::None);
    t[0x3F] = d(Dir::Aas);

    // INC/DEC/PUSH/POP r16.
    let mut r = 0;
    while r < 8 {
        t[0x40 + r] = e(Ld::Reg(W, r as u8), Op::Inc(W), St::Reg(W, r as u8));
        t[0x48 + r] = e(Ld::Reg(W, r as u8), Op::Dec(W), St::Reg(W, r as u8));
        t[0x50 + r] = e(Ld::Reg(W, r as u8), Op::None, St::Push(W));
        t[0x58 + r] = e(Ld::Pop(W), Op::None, St::Reg(W, r as u8));
        r += 1;
    }

    t[0x60] = d(Dir::Pusha(W));
    t[0x61] = d(Dir::Popa(W));
    t[0x62] = m(M::Gw, Op::Bound(W), St::None);
    t[0x63] = e(Ld::ModrmPm(M::EwGw), Op::Arpl, St::E(W));
    t[0x64] = e(Ld::PreSeg(FS), Op::None, St::None);
    t[0x65] = e(Ld::PreSeg(GS), Op::None, St::None);
    t[0x66] = e(Ld::PreOp, Op::None, St::None);
    t[0x67] = e(Ld::PreAdd, Op::None, St::None);
    t[0x68] = e(Ld::I(W), Op::None, St::Push(W));
    t[0x69] = m(M::EwxIwx, Op::ImulR(W), St::G(W));
    t[0x6A] = e(Ld::Ix(B), Op::None, St::Push(W));
    t[0x6B] = m(M::EwxIbx, Op::ImulR(W), St::G(W));
    t[0x6C] = e(Ld::Str(StringOp::Ins(B)), Op::None, St::None);
    t[0x6D] = e(Ld::Str(StringOp::Ins(W)), Op::None, St::None);
    t[0x6E] = e(Ld::Str(StringOp::Outs(B)), Op::None, St::None);
    t[0x6F] = e(Ld::Str(StringOp::Outs(W)), Op::None, St::None);

    // Jcc rel8.
    let mut cc = 0;
    while cc < 16 {
        t[0x70 + cc] = e(Ld::Ix(B), Op::Cond(CC[cc]), St::CondIp(W));
        cc += 1;
    }

    t[0x80] = m(M::Grp(0), Op::None, St::None);
    t[0x81] = m(M::Grp(1), Op::None, St::None);
    t[0x82] = m(M::Grp(0), Op::None, St::None);
    t[0x83] = m(M::Grp(3), Op::None, St::None);
    t[0x84] = m(M::EbGb, Op::Test(B), St::None);
    t[0x85] = m(M::EwGw, Op::Test(W), St::None);
    t[0x86] = m(M::GbEb, Op::None, St::EG(B));
    t[0x87] = m(M::GwEw, Op::None, St::EG(W));
    t[0x88] = m(M::Gb, Op::None, St::E(B));
    t[0x89] = m(M::Gw, Op::None, St::E(W));
    t[0x8A] = m(M::Eb, Op::None, St::G(B));
    t[0x8B] = m(M::Ew, Op::None, St::G(W));
    t[0x8C] = m(M::Seg, Op::None, St::E(W));
    t[0x8D] = m(M::Ea, Op::None, St::G(W));
    t[0x8E] = m(M::Ew, Op::None, St::SegM);
    t[0x8F] = e(Ld::PopRm(W, M::None), Op::None, St::E(W));

    t[0x90] = d(Dir::Nop);
    let mut r = 1;
    while r < 8 {
        t[0x90 + r] = e(Ld::Reg(W, r as u8), Op::XchgAcc(W), St::Reg(W, r as u8));
        r += 1;
    }
    t[0x98] = d(Dir::Cbw(W));
    t[0x99] = d(Dir::Cwd(W));
    t[0x9A] = e(Ld::If(W), Op::CallF(W), St::None);
    t[0x9B] = d(Dir::Wait);
    t[0x9C] = d(Dir::Pushf(W));
    t[0x9D] = d(Dir::Popf(W));
    t[0x9E] = d(Dir::Sahf);
    t[0x9F] = d(Dir::Lahf);

    t[0xA0] = e(Ld::Moffs, Op::LoadAcc(B), St::None);
    t[0xA1] = e(Ld::Moffs, Op::LoadAcc(W), St::None);
    t[0xA2] = e(Ld::Moffs, Op::StoreAcc(B), St::None);
    t[0xA3] = e(Ld::Moffs, Op::StoreAcc(W), St::None);
    t[0xA4] = e(Ld::Str(StringOp::Movs(B)), Op::None, St::None);
    t[0xA5] = e(Ld::Str(StringOp::Movs(W)), Op::None, St::None);
    t[0xA6] = e(Ld::Str(StringOp::Cmps(B)), Op::None, St::None);
    t[0xA7] = e(Ld::Str(StringOp::Cmps(W)), Op::None, St::None);
    t[0xA8] = e(Ld::RegI(B, 0), Op::Test(B), St::None);
    t[0xA9] = e(Ld::RegI(W, 0), Op::Test(W), St::None);
    t[0xAA] = e(Ld::Str(StringOp::Stos(B)), Op::None, St::None);
    t[0xAB] = e(Ld::Str(StringOp::Stos(W)), Op::None, St::None);
    t[0xAC] = e(Ld::Str(StringOp::Lods(B)), Op::None, St::None);
    t[0xAD] = e(Ld::Str(StringOp::Lods(W)), Op::None, St::None);
    t[0xAE] = e(Ld::Str(StringOp::Scas(B)), Op::None, St::None);
    t[0xAF] = e(Ld::Str(StringOp::Scas(W)), Op::None, St::None);

    // MOV r,imm.
    let mut r = 0;
    while r < 8 {
        t[0xB0 + r] = e(Ld::I(B), Op::None, St::Reg(B, r as u8));
        t[0xB8 + r] = e(Ld::I(W), Op::None, St::Reg(W, r as u8));
        r += 1;
    }

    t[0xC0] = m(M::GrpIb(5), Op::None, St::None);
    t[0xC1] = m(M::GrpIb(6), Op::None, St::None);
    t[0xC2] = e(Ld::Pop(W), Op::None, St::IpIw);
    t[0xC3] = e(Ld::Pop(W), Op::None, St::Ip);
    t[0xC4] = m(M::Efw, Op::LoadSeg(ES), St::SegG(W));
    t[0xC5] = m(M::Efw, Op::LoadSeg(DS), St::SegG(W));
    t[0xC6] = m(M::Ib, Op::None, St::E(B));
    t[0xC7] = m(M::Iw, Op::None, St::E(W));
    t[0xC8] = d(Dir::Enter(W));
    t[0xC9] = d(Dir::Leave(W));
    t[0xCA] = d(Dir::RetfIw(W));
    t[0xCB] = d(Dir::Retf(W));
    t[0xCC] = e(Ld::Val(3), Op::Int, St::None);
    t[0xCD] = e(Ld::I(B), Op::Int, St::None);
    t[0xCE] = e(Ld::Into, Op::Int, St::None);
    t[0xCF] = d(Dir::Iret(W));

    t[0xD0] = m(M::Grp1(5), Op::None, St::None);
    t[0xD1] = m(M::Grp1(6), Op::None, St::None);
    t[0xD2] = m(M::GrpCl(5), Op::None, St::None);
    t[0xD3] = m(M::GrpCl(6), Op::None, St::None);
    t[0xD4] = e(Ld::I(B), Op::Aam, St::None);
    t[0xD5] = e(Ld::I(B), Op::Aad, St::None);
    t[0xD6] = d(Dir::Setalc);
    t[0xD7] = d(Dir::Xlat);
    // FPU escapes resolve their ModRM operand and retire.
    let mut fpu = 0;
    while fpu < 8 {
        t[0xD8 + fpu] = m(M::Fpu(fpu as u8), Op::Fpu, St::None);
        t[0x2D8 + fpu] = m(M::Fpu(fpu as u8), Op::Fpu, St::None);
        fpu += 1;
    }

    t[0xE0] = e(Ld::Ix(B), Op::Loopnz, St::AddIp(W));
    t[0xE1] = e(Ld::Ix(B), Op::Loopz, St::AddIp(W));
    t[0xE2] = e(Ld::Ix(B), Op::Loop, St::AddIp(W));
    t[0xE3] = e(Ld::Ix(B), Op::Jcxz, St::AddIp(W));
    t[0xE4] = e(Ld::I(B), Op::In(B), St::None);
    t[0xE5] = e(Ld::I(B), Op::In(W), St::None);
    t[0xE6] = e(Ld::I(B), Op::Out(B), St::None);
    t[0xE7] = e(Ld::I(B), Op::Out(W), St::None);
    t[0xE8] = e(Ld::I(W), Op::CallN(W), St::AddIp(W));
    t[0xE9] = e(Ld::Ix(W), Op::None, St::AddIp(W));
    t[0xEA] = e(Ld::If(W), Op::JmpF(W), St::None);
    t[0xEB] = e(Ld::Ix(B), Op::None, St::AddIp(W));
    t[0xEC] = e(Ld::Reg(W, 2), Op::In(B), St::None);
    t[0xED] = e(Ld::Reg(W, 2), Op::In(W), St::None);
    t[0xEE] = e(Ld::Reg(W, 2), Op::Out(B), St::None);
    t[0xEF] = e(Ld::Reg(W, 2), Op::Out(W), St::None);

    t[0xF0] = d(Dir::Lock);
    t[0xF1] = d(Dir::Icebp);
    t[0xF2] = e(Ld::PreRep(false), Op::None, St::None);
    t[0xF3] = e(Ld::PreRep(true), Op::None, St::None);
    t[0xF4] = d(Dir::Hlt);
    t[0xF5] = d(Dir::Cmc);
    t[0xF6] = m(M::Grp(8), Op::None, St::None);
    t[0xF7] = m(M::Grp(9), Op::None, St::None);
    t[0xF8] = d(Dir::Clc);
    t[0xF9] = d(Dir::Stc);
    t[0xFA] = d(Dir::Cli);
    t[0xFB] = d(Dir::Sti);
    t[0xFC] = d(Dir::Cld);
    t[0xFD] = d(Dir::Std);
    t[0xFE] = m(M::Grp(0xB), Op::None, St::None);
    t[0xFF] = m(M::Grp(0xC), Op::None, St::None);

    // ------------------------------------------------------------------
    // Bank 0x100: 0F opcodes, 16-bit operand size.
    // ------------------------------------------------------------------

    t[0x100] = m(M::Ew, Op::Grp6(W), St::E(W));
    t[0x101] = m(M::Ew, Op::Grp7(W), St::E(W));
    t[0x102] = e(Ld::ModrmPm(M::EwGw), Op::Lar(W), St::G(W));
    t[0x103] = e(Ld::ModrmPm(M::EwGw), Op::Lsl(W), St::G(W));
    t[0x106] = d(Dir::Clts);
    t[0x120] = m(M::None, Op::MovFromCr, St::E(D));
    t[0x121] = m(M::None, Op::MovFromDr, St::E(D));
    t[0x122] = m(M::Ed, Op::MovToCr, St::None);
    t[0x123] = m(M::Ed, Op::MovToDr, St::None);
    t[0x124] = m(M::None, Op::MovFromTr, St::E(D));
    t[0x126] = m(M::Ed, Op::MovToTr, St::None);
    t[0x131] = d(Dir::Rdtsc);

    // Jcc rel16, SETcc.
    let mut cc = 0;
    while cc < 16 {
        t[0x180 + cc] = e(Ld::Ix(W), Op::Cond(CC[cc]), St::CondIp(W));
        t[0x190 + cc] = m(M::None, Op::Cond(CC[cc]), St::CondEb);
        t[0x380 + cc] = e(Ld::Ix(D), Op::Cond(CC[cc]), St::CondIp(D));
        t[0x390 + cc] = m(M::None, Op::Cond(CC[cc]), St::CondEb);
        cc += 1;
    }

    t[0x1A0] = e(Ld::Seg(FS), Op::None, St::Push(W));
    t[0x1A1] = d(Dir::PopSeg(FS, W));
    t[0x1A2] = d(Dir::Cpuid);
    t[0x1A3] = m(M::EwGwT, Op::Bt(W), St::E(W));
    t[0x1A4] = m(M::EwGwIb, Op::Dshl(W), St::E(W));
    t[0x1A5] = m(M::EwGwCl, Op::Dshl(W), St::E(W));
    t[0x1A8] = e(Ld::Seg(GS), Op::None, St::Push(W));
    t[0x1A9] = d(Dir::PopSeg(GS, W));
    t[0x1AB] = m(M::EwGwT, Op::Bts(W), St::E(W));
    t[0x1AC] = m(M::EwGwIb, Op::Dshr(W), St::E(W));
    t[0x1AD] = m(M::EwGwCl, Op::Dshr(W), St::E(W));
    t[0x1AF] = m(M::EwxGwx, Op::ImulR(W), St::G(W));
    t[0x1B2] = m(M::Efw, Op::LoadSeg(SS), St::SegG(W));
    t[0x1B3] = m(M::EwGwT, Op::Btr(W), St::E(W));
    t[0x1B4] = m(M::Efw, Op::LoadSeg(FS), St::SegG(W));
    t[0x1B5] = m(M::Efw, Op::LoadSeg(GS), St::SegG(W));
    t[0x1B6] = m(M::Eb, Op::None, St::G(W));
    t[0x1B7] = m(M::Ew, Op::None, St::G(W));
    t[0x1BA] = m(M::Grp(0xE), Op::None, St::None);
    t[0x1BB] = m(M::EwGwT, Op::Btc(W), St::E(W));
    t[0x1BC] = m(M::Ew, Op::Bsf(W), St::G(W));
    t[0x1BD] = m(M::Ew, Op::Bsr(W), St::G(W));
    t[0x1BE] = m(M::Ebx, Op::None, St::G(W));
    t[0x1BF] = m(M::Ewx, Op::None, St::G(W));
    t[0x1C0] = m(M::GbEb, Op::Xadd(B), St::EG(B));
    t[0x1C1] = m(M::GwEw, Op::Xadd(W), St::EG(W));
    let mut r = 0;
    while r < 8 {
        t[0x1C8 + r] = e(Ld::Reg(W, r as u8), Op::Bswap(W), St::Reg(W, r as u8));
        t[0x3C8 + r] = e(Ld::Reg(D, r as u8), Op::Bswap(D), St::Reg(D, r as u8));
        r += 1;
    }

    // ------------------------------------------------------------------
    // Bank 0x200: one-byte opcodes, 32-bit operand size.
    // ------------------------------------------------------------------

    t[0x200] = m(M::EbGb, Op::Add(B), St::E(B));
    t[0x201] = m(M::EdGd, Op::Add(D), St::E(D));
    t[0x202] = m(M::GbEb, Op::Add(B), St::G(B));
    t[0x203] = m(M::GdEd, Op::Add(D), St::G(D));
    t[0x204] = e(Ld::RegI(B, 0), Op::Add(B), St::Reg(B, 0));
    t[0x205] = e(Ld::RegI(D, 0), Op::Add(D), St::Reg(D, 0));
    t[0x206] = e(Ld::Seg(ES), Op::None, St::Push(D));
    t[0x207] = d(Dir::PopSeg(ES, D));
    t[0x208] = m(M::EbGb, Op::Or(B), St::E(B));
    t[0x209] = m(M::EdGd, Op::Or(D), St::E(D));
    t[0x20A] = m(M::GbEb, Op::Or(B), St::G(B));
    t[0x20B] = m(M::GdEd, Op::Or(D), St::G(D));
    t[0x20C] = e(Ld::RegI(B, 0), Op::Or(B), St::Reg(B, 0));
    t[0x20D] = e(Ld::RegI(D, 0), Op::Or(D), St::Reg(D, 0));
    t[0x20E] = e(Ld::Seg(CS), Op::None, St::Push(D));
    t[0x20F] = e(Ld::Double, Op::None, St::None);
    t[0x210] = m(M::EbGb, Op::Adc(B), St::E(B));
    t[0x211] = m(M::EdGd, Op::Adc(D), St::E(D));
    t[0x212] = m(M::GbEb, Op::Adc(B), St::G(B));
    t[0x213] = m(M::GdEd, Op::Adc(D), St::G(D));
    t[0x214] = e(Ld::RegI(B, 0), Op::Adc(B), St::Reg(B, 0));
    t[0x215] = e(Ld::RegI(D, 0), Op::Adc(D), St::Reg(D, 0));
    t[0x216] = e(Ld::Seg(SS), Op::None, St::Push(D));
    t[0x217] = d(Dir::PopSeg(SS, D));
    t[0x218] = m(M::EbGb, Op::Sbb(B), St::E(B));
    t[0x219] = m(M::EdGd, Op::Sbb(D), St::E(D));
    t[0x21A] = m(M::GbEb, Op::Sbb(B), St::G(B));
    t[0x21B] = m(M::GdEd, Op::Sbb(D), St::G(D));
    t[0x21C] = e(Ld::RegI(B, 0), Op::Sbb(B), St::Reg(B, 0));
    t[0x21D] = e(Ld::RegI(D, 0), Op::Sbb(D), St::Reg(D, 0));
    t[0x21E] = e(Ld::Seg(DS), Op::None, St::Push(D));
    t[0x21F] = d(Dir::PopSeg(DS, D));
    t[0x220] = m(M::EbGb, Op::And(B), St::E(B));
    t[0x221] = m(M::EdGd, Op::And(D), St::E(D));
    t[0x222] = m(M::GbEb, Op::And(B), St::G(B));
    t[0x223] = m(M::GdEd, Op::And(D), St::G(D));
    t[0x224] = e(Ld::RegI(B, 0), Op::And(B), St::Reg(B, 0));
    t[0x225] = e(Ld::RegI(D, 0), Op::And(D), St::Reg(D, 0));
    t[0x226] = e(Ld::PreSeg(ES), Op::None, St::None);
    t[0x227] = d(Dir::Daa);
    t[0x228] = m(M::EbGb, Op::Sub(B), St::E(B));
    t[0x229] = m(M::EdGd, Op::Sub(D), St::E(D));
    t[0x22A] = m(M::GbEb, Op::Sub(B), St::G(B));
    t[0x22B] = m(M::GdEd, Op::Sub(D), St::G(D));
    t[0x22C] = e(Ld::RegI(B, 0), Op::Sub(B), St::Reg(B, 0));
    t[0x22D] = e(Ld::RegI(D, 0), Op::Sub(D), St::Reg(D, 0));
    t[0x22E] = e(Ld::PreSeg(CS), Op::None, St::None);
    t[0x22F] = d(Dir::Das);
    t[0x230] = m(M::EbGb, Op::Xor(B), St::E(B));
    t[0x231] = m(M::EdGd, Op::Xor(D), St::E(D));
    t[0x232] = m(M::GbEb, Op::Xor(B), St::G(B));
    t[0x233] = m(M::GdEd, Op::Xor(D), St::G(D));
    t[0x234] = e(Ld::RegI(B, 0), Op::Xor(B), St::Reg(B, 0));
    t[0x235] = e(Ld::RegI(D, 0), Op::Xor(D), St::Reg(D, 0));
    t[0x236] = e(Ld::PreSeg(SS), Op::None, St::None);
    t[0x237] = d(Dir::Aaa);
    t[0x238] = m(M::EbGb, Op::Cmp(B), St::None);
    t[0x239] = m(M::EdGd, Op::Cmp(D), St::None);
    t[0x23A] = m(M::GbEb, Op::Cmp(B), St::None);
    t[0x23B] = m(M::GdEd, Op::Cmp(D), St::None);
    t[0x23C] = e(Ld::RegI(B, 0), Op::Cmp(B), St::None);
    t[0x23D] = e(Ld::RegI(D, 0), Op::Cmp(D), St::None);
    t[0x23E] = e(Ld::PreSeg(DS), Op::None, St::None);
    t[0x23F] = d(Dir::Aas);

    let mut r = 0;
    while r < 8 {
        t[0x240 + r] = e(Ld::Reg(D, r as u8), Op::Inc(D), St::Reg(D, r as u8));
        t[0x248 + r] = e(Ld::Reg(D, r as u8), Op::Dec(D), St::Reg(D, r as u8));
        t[0x250 + r] = e(Ld::Reg(D, r as u8), Op::None, St::Push(D));
        t[0x258 + r] = e(Ld::Pop(D), Op::None, St::Reg(D, r as u8));
        r += 1;
    }

    t[0x260] = d(Dir::Pusha(D));
    t[0x261] = d(Dir::Popa(D));
    t[0x262] = m(M::Gd, Op::Bound(D), St::None);
    t[0x264] = e(Ld::PreSeg(FS), Op::None, St::None);
    t[0x265] = e(Ld::PreSeg(GS), Op::None, St::None);
    t[0x266] = e(Ld::PreOp, Op::None, St::None);
    t[0x267] = e(Ld::PreAdd, Op::None, St::None);
    t[0x268] = e(Ld::I(D), Op::None, St::Push(D));
    t[0x269] = m(M::EdId, Op::ImulR(D), St::G(D));
    t[0x26A] = e(Ld::Ix(B), Op::None, St::Push(D));
    t[0x26B] = m(M::EdIbx, Op::ImulR(D), St::G(D));
    t[0x26C] = e(Ld::Str(StringOp::Ins(B)), Op::None, St::None);
    t[0x26D] = e(Ld::Str(StringOp::Ins(D)), Op::None, St::None);
    t[0x26E] = e(Ld::Str(StringOp::Outs(B)), Op::None, St::None);
    t[0x26F] = e(Ld::Str(StringOp::Outs(D)), Op::None, St::None);

    let mut cc = 0;
    while cc < 16 {
        t[0x270 + cc] = e(Ld::Ix(B), Op::Cond(CC[cc]), St::CondIp(D));
        cc += 1;
    }

    t[0x280] = m(M::Grp(0), Op::None, St::None);
    t[0x281] = m(M::Grp(2), Op::None, St::None);
    t[0x282] = m(M::Grp(0), Op::None, St::None);
    t[0x283] = m(M::Grp(4), Op::None, St::None);
    t[0x284] = m(M::EbGb, Op::Test(B), St::None);
    t[0x285] = m(M::EdGd, Op::Test(D), St::None);
    t[0x286] = m(M::GbEb, Op::None, St::EG(B));
    t[0x287] = m(M::GdEd, Op::None, St::EG(D));
    t[0x288] = m(M::Gb, Op::None, St::E(B));
    t[0x289] = m(M::Gd, Op::None, St::E(D));
    t[0x28A] = m(M::Eb, Op::None, St::G(B));
    t[0x28B] = m(M::Ed, Op::None, St::G(D));
    t[0x28C] = m(M::Seg, Op::None, St::EdMw);
    t[0x28D] = m(M::Ea, Op::None, St::G(D));
    t[0x28E] = m(M::Ew, Op::None, St::SegM);
    t[0x28F] = e(Ld::PopRm(D, M::None), Op::None, St::E(D));

    t[0x290] = d(Dir::Nop);
    let mut r = 1;
    while r < 8 {
        t[0x290 + r] = e(Ld::Reg(D, r as u8), Op::XchgAcc(D), St::Reg(D, r as u8));
        r += 1;
    }
    t[0x298] = d(Dir::Cbw(D));
    t[0x299] = d(Dir::Cwd(D));
    t[0x29A] = e(Ld::If(D), Op::CallF(D), St::None);
    t[0x29B] = d(Dir::Wait);
    t[0x29C] = d(Dir::Pushf(D));
    t[0x29D] = d(Dir::Popf(D));
    t[0x29E] = d(Dir::Sahf);
    t[0x29F] = d(Dir::Lahf);

    t[0x2A0] = e(Ld::Moffs, Op::LoadAcc(B), St::None);
    t[0x2A1] = e(Ld::Moffs, Op::LoadAcc(D), St::None);
    t[0x2A2] = e(Ld::Moffs, Op::StoreAcc(B), St::None);
    t[0x2A3] = e(Ld::Moffs, Op::StoreAcc(D), St::None);
    t[0x2A4] = e(Ld::Str(StringOp::Movs(B)), Op::None, St::None);
    t[0x2A5] = e(Ld::Str(StringOp::Movs(D)), Op::None, St::None);
    t[0x2A6] = e(Ld::Str(StringOp::Cmps(B)), Op::None, St::None);
    t[0x2A7] = e(Ld::Str(StringOp::Cmps(D)), Op::None, St::None);
    t[0x2A8] = e(Ld::RegI(B, 0), Op::Test(B), St::None);
    t[0x2A9] = e(Ld::RegI(D, 0), Op::Test(D), St::None);
    t[0x2AA] = e(Ld::Str(StringOp::Stos(B)), Op::None, St::None);
    t[0x2AB] = e(Ld::Str(StringOp::Stos(D)), Op::None, St::None);
    t[0x2AC] = e(Ld::Str(StringOp::Lods(B)), Op::None, St::None);
    t[0x2AD] = e(Ld::Str(StringOp::Lods(D)), Op::None, St::None);
    t[0x2AE] = e(Ld::Str(StringOp::Scas(B)), Op::None, St::None);
    t[0x2AF] = e(Ld::Str(StringOp::Scas(D)), Op::None, St::None);

    let mut r = 0;
    while r < 8 {
        t[0x2B0 + r] = e(Ld::I(B), Op::None, St::Reg(B, r as u8));
        t[0x2B8 + r] = e(Ld::I(D), Op::None, St::Reg(D, r as u8));
        r += 1;
    }

    t[0x2C0] = m(M::GrpIb(5), Op::None, St::None);
    t[0x2C1] = m(M::GrpIb(7), Op::None, St::None);
    t[0x2C2] = e(Ld::Pop(D), Op::None, St::IpIw);
    t[0x2C3] = e(Ld::Pop(D), Op::None, St::Ip);
    t[0x2C4] = m(M::Efd, Op::LoadSeg(ES), St::SegG(D));
    t[0x2C5] = m(M::Efd, Op::LoadSeg(DS), St::SegG(D));
    t[0x2C6] = m(M::Ib, Op::None, St::E(B));
    t[0x2C7] = m(M::Id, Op::None, St::E(D));
    t[0x2C8] = d(Dir::Enter(D));
    t[0x2C9] = d(Dir::Leave(D));
    t[0x2CA] = d(Dir::RetfIw(D));
    t[0x2CB] = d(Dir::Retf(D));
    t[0x2CC] = e(Ld::Val(3), Op::Int, St::None);
    t[0x2CD] = e(Ld::I(B), Op::Int, St::None);
    t[0x2CE] = e(Ld::Into, Op::Int, St::None);
    t[0x2CF] = d(Dir::Iret(D));

    t[0x2D0] = m(M::Grp1(5), Op::None, St::None);
    t[0x2D1] = m(M::Grp1(7), Op::None, St::None);
    t[0x2D2] = m(M::GrpCl(5), Op::None, St::None);
    t[0x2D3] = m(M::GrpCl(7), Op::None, St::None);
    t[0x2D4] = e(Ld::I(B), Op::Aam, St::None);
    t[0x2D5] = e(Ld::I(B), Op::Aad, St::None);
    t[0x2D6] = d(Dir::Setalc);
    t[0x2D7] = d(Dir::Xlat);

    t[0x2E0] = e(Ld::Ix(B), Op::Loopnz, St::AddIp(D));
    t[0x2E1] = e(Ld::Ix(B), Op::Loopz, St::AddIp(D));
    t[0x2E2] = e(Ld::Ix(B), Op::Loop, St::AddIp(D));
    t[0x2E3] = e(Ld::Ix(B), Op::Jcxz, St::AddIp(D));
    t[0x2E4] = e(Ld::I(B), Op::In(B), St::None);
    t[0x2E5] = e(Ld::I(B), Op::In(D), St::None);
    t[0x2E6] = e(Ld::I(B), Op::Out(B), St::None);
    t[0x2E7] = e(Ld::I(B), Op::Out(D), St::None);
    t[0x2E8] = e(Ld::I(D), Op::CallN(D), St::AddIp(D));
    t[0x2E9] = e(Ld::Ix(D), Op::None, St::AddIp(D));
    t[0x2EA] = e(Ld::If(D), Op::JmpF(D), St::None);
    t[0x2EB] = e(Ld::Ix(B), Op::None, St::AddIp(D));
    t[0x2EC] = e(Ld::Reg(W, 2), Op::In(B), St::None);
    t[0x2ED] = e(Ld::Reg(W, 2), Op::In(D), St::None);
    t[0x2EE] = e(Ld::Reg(W, 2), Op::Out(B), St::None);
    t[0x2EF] = e(Ld::Reg(W, 2), Op::Out(D), St::None);

    t[0x2F0] = d(Dir::Lock);
    t[0x2F1] = d(Dir::Icebp);
    t[0x2F2] = e(Ld::PreRep(false), Op::None, St::None);
    t[0x2F3] = e(Ld::PreRep(true), Op::None, St::None);
    t[0x2F4] = d(Dir::Hlt);
    t[0x2F5] = d(Dir::Cmc);
    t[0x2F6] = m(M::Grp(8), Op::None, St::None);
    t[0x2F7] = m(M::Grp(0xA), Op::None, St::None);
    t[0x2F8] = d(Dir::Clc);
    t[0x2F9] = d(Dir::Stc);
    t[0x2FA] = d(Dir::Cli);
    t[0x2FB] = d(Dir::Sti);
    t[0x2FC] = d(Dir::Cld);
    t[0x2FD] = d(Dir::Std);
    t[0x2FE] = m(M::Grp(0xB), Op::None, St::None);
    t[0x2FF] = m(M::Grp(0xD), Op::None, St::None);

    // ------------------------------------------------------------------
    // Bank 0x300: 0F opcodes, 32-bit operand size.
    // ------------------------------------------------------------------

    t[0x300] = m(M::Ew, Op::Grp6(D), St::E(W));
    t[0x301] = m(M::Ew, Op::Grp7(D), St::E(W));
    t[0x302] = e(Ld::ModrmPm(M::EdGd), Op::Lar(D), St::G(D));
    t[0x303] = e(Ld::ModrmPm(M::EdGd), Op::Lsl(D), St::G(D));
    t[0x306] = d(Dir::Clts);
    t[0x320] = m(M::None, Op::MovFromCr, St::E(D));
    t[0x321] = m(M::None, Op::MovFromDr, St::E(D));
    t[0x322] = m(M::Ed, Op::MovToCr, St::None);
    t[0x323] = m(M::Ed, Op::MovToDr, St::None);
    t[0x324] = m(M::None, Op::MovFromTr, St::E(D));
    t[0x326] = m(M::Ed, Op::MovToTr, St::None);
    t[0x331] = d(Dir::Rdtsc);

    t[0x3A0] = e(Ld::Seg(FS), Op::None, St::Push(D));
    t[0x3A1] = d(Dir::PopSeg(FS, D));
    t[0x3A2] = d(Dir::Cpuid);
    t[0x3A3] = m(M::EdGdT, Op::Bt(D), St::E(D));
    t[0x3A4] = m(M::EdGdIb, Op::Dshl(D), St::E(D));
    t[0x3A5] = m(M::EdGdCl, Op::Dshl(D), St::E(D));
    t[0x3A8] = e(Ld::Seg(GS), Op::None, St::Push(D));
    t[0x3A9] = d(Dir::PopSeg(GS, D));
    t[0x3AB] = m(M::EdGdT, Op::Bts(D), St::E(D));
    t[0x3AC] = m(M::EdGdIb, Op::Dshr(D), St::E(D));
    t[0x3AD] = m(M::EdGdCl, Op::Dshr(D), St::E(D));
    t[0x3AF] = m(M::EdxGdx, Op::ImulR(D), St::G(D));
    t[0x3B1] = m(M::Ed, Op::Cmpxchg, St::E(D));
    t[0x3B2] = m(M::Efd, Op::LoadSeg(SS), St::SegG(D));
    t[0x3B3] = m(M::EdGdT, Op::Btr(D), St::E(D));
    t[0x3B4] = m(M::Efd, Op::LoadSeg(FS), St::SegG(D));
    t[0x3B5] = m(M::Efd, Op::LoadSeg(GS), St::SegG(D));
    t[0x3B6] = m(M::Eb, Op::None, St::G(D));
    t[0x3B7] = m(M::Ew, Op::None, St::G(D));
    t[0x3BA] = m(M::Grp(0xF), Op::None, St::None);
    t[0x3BB] = m(M::EdGdT, Op::Btc(D), St::E(D));
    t[0x3BC] = m(M::Ed, Op::Bsf(D), St::G(D));
    t[0x3BD] = m(M::Ed, Op::Bsr(D), St::G(D));
    t[0x3BE] = m(M::Ebx, Op::None, St::G(D));
    t[0x3BF] = m(M::Ewx, Op::None, St::G(D));
    t[0x3C0] = m(M::GbEb, Op::Xadd(B), St::EG(B));
    t[0x3C1] = m(M::GdEd, Op::Xadd(D), St::EG(D));

    t
}

#[rustfmt::skip]
const fn build_group_table() -> [[MicroOps; 8]; 16] {
    let mut g = [[ILLEGAL; 8]; 16];

    // Groups 0-4: immediate ALU (80/81/83 and the 32-bit forms). The CMP
    // slot computes without a store.
    let alu_b = [Op::Add(B), Op::Or(B), Op::Adc(B), Op::Sbb(B), Op::And(B), Op::Sub(B), Op::Xor(B), Op::Cmp(B)];
    let alu_w = [Op::Add(W), Op::Or(W), Op::Adc(W), Op::Sbb(W), Op::And(W), Op::Sub(W), Op::Xor(W), Op::Cmp(W)];
    let alu_d = [Op::Add(D), Op::Or(D), Op::Adc(D), Op::Sbb(D), Op::And(D), Op::Sub(D), Op::Xor(D), Op::Cmp(D)];
    let mut i = 0;
    while i < 8 {
        let store_b = if i == 7 { St::None } else { St::E(B) };
        let store_w = if i == 7 { St::None } else { St::E(W) };
        let store_d = if i == 7 { St::None } else { St::E(D) };
        g[0][i] = m(M::EbIb, alu_b[i], store_b);
        g[1][i] = m(M::EwIw, alu_w[i], store_w);
        g[2][i] = m(M::EdId, alu_d[i], store_d);
        g[3][i] = m(M::EwIbx, alu_w[i], store_w);
        g[4][i] = m(M::EdIbx, alu_d[i], store_d);
        i += 1;
    }

    // Groups 5-7: shifts and rotates (slot 6 aliases SHL).
    let sh_b = [Op::Rol(B), Op::Ror(B), Op::Rcl(B), Op::Rcr(B), Op::Shl(B), Op::Shr(B), Op::Shl(B), Op::Sar(B)];
    let sh_w = [Op::Rol(W), Op::Ror(W), Op::Rcl(W), Op::Rcr(W), Op::Shl(W), Op::Shr(W), Op::Shl(W), Op::Sar(W)];
    let sh_d = [Op::Rol(D), Op::Ror(D), Op::Rcl(D), Op::Rcr(D), Op::Shl(D), Op::Shr(D), Op::Shl(D), Op::Sar(D)];
    let mut i = 0;
    while i < 8 {
        g[5][i] = m(M::Eb, sh_b[i], St::E(B));
        g[6][i] = m(M::Ew, sh_w[i], St::E(W));
        g[7][i] = m(M::Ed, sh_d[i], St::E(D));
        i += 1;
    }

    // Groups 8-A: TEST/NOT/NEG/MUL/IMUL/DIV/IDIV (F6/F7).
    g[0x8][0] = m(M::EbIb, Op::Test(B), St::None);
    g[0x8][1] = m(M::EbIb, Op::Test(B), St::None);
    g[0x8][2] = m(M::Eb, Op::Not, St::E(B));
    g[0x8][3] = m(M::Eb, Op::Neg(B), St::E(B));
    g[0x8][4] = m(M::Eb, Op::Mul(B), St::None);
    g[0x8][5] = m(M::Eb, Op::Imul(B), St::None);
    g[0x8][6] = m(M::Eb, Op::Div(B), St::None);
    g[0x8][7] = m(M::Eb, Op::Idiv(B), St::None);
    g[0x9][0] = m(M::EwIw, Op::Test(W), St::None);
    g[0x9][1] = m(M::EwIw, Op::Test(W), St::None);
    g[0x9][2] = m(M::Ew, Op::Not, St::E(W));
    g[0x9][3] = m(M::Ew, Op::Neg(W), St::E(W));
    g[0x9][4] = m(M::Ew, Op::Mul(W), St::None);
    g[0x9][5] = m(M::Ew, Op::Imul(W), St::None);
    g[0x9][6] = m(M::Ew, Op::Div(W), St::None);
    g[0x9][7] = m(M::Ew, Op::Idiv(W), St::None);
    g[0xA][0] = m(M::EdId, Op::Test(D), St::None);
    g[0xA][1] = m(M::EdId, Op::Test(D), St::None);
    g[0xA][2] = m(M::Ed, Op::Not, St::E(D));
    g[0xA][3] = m(M::Ed, Op::Neg(D), St::E(D));
    g[0xA][4] = m(M::Ed, Op::Mul(D), St::None);
    g[0xA][5] = m(M::Ed, Op::Imul(D), St::None);
    g[0xA][6] = m(M::Ed, Op::Div(D), St::None);
    g[0xA][7] = m(M::Ed, Op::Idiv(D), St::None);

    // Group B: FE (INC/DEC r/m8) plus the host-callback trap slot.
    g[0xB][0] = m(M::Eb, Op::Inc(B), St::E(B));
    g[0xB][1] = m(M::Eb, Op::Dec(B), St::E(B));
    g[0xB][7] = m(M::Iw, Op::Callback, St::None);

    // Groups C-D: FF (INC/DEC/CALL/JMP/PUSH r/m).
    g[0xC][0] = m(M::Ew, Op::Inc(W), St::E(W));
    g[0xC][1] = m(M::Ew, Op::Dec(W), St::E(W));
    g[0xC][2] = m(M::Ew, Op::CallN(W), St::Ip);
    g[0xC][3] = m(M::Efw, Op::CallF(W), St::None);
    g[0xC][4] = m(M::Ew, Op::None, St::Ip);
    g[0xC][5] = m(M::Efw, Op::JmpF(W), St::None);
    g[0xC][6] = m(M::Ew, Op::None, St::Push(W));
    g[0xD][0] = m(M::Ed, Op::Inc(D), St::E(D));
    g[0xD][1] = m(M::Ed, Op::Dec(D), St::E(D));
    g[0xD][2] = m(M::Ed, Op::CallN(D), St::Ip);
    g[0xD][3] = m(M::Efd, Op::CallF(D), St::None);
    g[0xD][4] = m(M::Ed, Op::None, St::Ip);
    g[0xD][5] = m(M::Efd, Op::JmpF(D), St::None);
    g[0xD][6] = m(M::Ed, Op::None, St::Push(D));

    // Groups E-F: BT group with immediate bit offset (0F BA).
    g[0xE][4] = m(M::EwIb, Op::Bt(W), St::E(W));
    g[0xE][5] = m(M::EwIb, Op::Bts(W), St::E(W));
    g[0xE][6] = m(M::EwIb, Op::Btr(W), St::E(W));
    g[0xE][7] = m(M::EwIb, Op::Btc(W), St::E(W));
    g[0xF][4] = m(M::EdIb, Op::Bt(D), St::E(D));
    g[0xF][5] = m(M::EdIb, Op::Bts(D), St::E(D));
    g[0xF][6] = m(M::EdIb, Op::Btr(D), St::E(D));
    g[0xF][7] = m(M::EdIb, Op::Btc(D), St::E(D));

    g
}

pub static OPCODE_TABLE: [MicroOps; 1024] = build_opcode_table();
pub static GROUP_TABLE: [[MicroOps; 8]; 16] = build_group_table();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{Ld, M, Op, St};

    #[test]
    fn banks_agree_on_byte_width_rows() {
        // Byte-operand instructions are identical across operand-size banks.
        assert_eq!(OPCODE_TABLE[0x00], OPCODE_TABLE[0x200]);
        assert_eq!(OPCODE_TABLE[0x88], OPCODE_TABLE[0x288]);
        assert_eq!(OPCODE_TABLE[0xC6], OPCODE_TABLE[0x2C6]);
    }

    #[test]
    fn add_accumulator_row() {
        let entry = OPCODE_TABLE[0x05];
        assert_eq!(entry.load, Ld::RegI(crate::cpu::flags::Width::Word, 0));
        assert_eq!(entry.op, Op::Add(crate::cpu::flags::Width::Word));
        assert_eq!(entry.store, St::Reg(crate::cpu::flags::Width::Word, 0));
    }

    #[test]
    fn group_redirect_slots() {
        assert_eq!(OPCODE_TABLE[0x80].load, Ld::Modrm(M::Grp(0)));
        assert_eq!(OPCODE_TABLE[0xFF].load, Ld::Modrm(M::Grp(0xC)));
        // Immediate-group CMP computes without a writeback.
        assert_eq!(GROUP_TABLE[0][7].store, St::None);
        assert_eq!(GROUP_TABLE[0][0].store, St::E(crate::cpu::flags::Width::Byte));
    }

    #[test]
    fn undefined_slots_raise_invalid_opcode() {
        assert_eq!(OPCODE_TABLE[0x104].load, Ld::Illegal);
        assert_eq!(OPCODE_TABLE[0x263].load, Ld::Illegal);
        // 16-bit CMPXCHG encoding is unassigned; only the 32-bit form exists.
        assert_eq!(OPCODE_TABLE[0x1B1].load, Ld::Illegal);
        assert_ne!(OPCODE_TABLE[0x3B1].load, Ld::Illegal);
        assert_eq!(GROUP_TABLE[0xE][0].load, Ld::Illegal);
    }
}
