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

    string.rs

    The string engine. A REP-prefixed instruction is a resumable loop: the
    index and count registers are written back after every iteration, each
    iteration spends one cycle of the run budget, and when the budget runs
    out before the count does, IP is rewound to the first prefix byte so
    the next run call picks up where this one stopped. A fault inside the
    loop propagates with the registers already reflecting the completed
    iterations, so the instruction resumes rather than repeats.

*/

use crate::{
    bus::Bus,
    cpu::{
        decode::{StringOp, PREFIX_ADDR, PREFIX_REP},
        flags::{Width, FLAG_DF, FLAG_IF},
        interrupt::EXCEPTION_GP,
        segments::SegReg,
        Cpu, Pipe, RunExit,
    },
    memerror::MemFault,
};

fn read_mem(bus: &mut impl Bus, addr: u32, width: Width) -> Result<u32, MemFault> {
    match width {
        Width::Byte => Ok(u32::from(bus.read_u8(addr)?)),
        Width::Word => Ok(u32::from(bus.read_u16(addr)?)),
        Width::Dword => bus.read_u32(addr),
    }
}

fn write_mem(bus: &mut impl Bus, addr: u32, width: Width, value: u32) -> Result<(), MemFault> {
    match width {
        Width::Byte => bus.write_u8(addr, value as u8),
        Width::Word => bus.write_u16(addr, value as u16),
        Width::Dword => bus.write_u32(addr, value),
    }
}

impl Cpu {
    pub(crate) fn run_string(
        &mut self,
        bus: &mut impl Bus,
        op: StringOp,
    ) -> Result<Pipe, MemFault> {
        let width = match op {
            StringOp::Ins(w)
            | StringOp::Outs(w)
            | StringOp::Movs(w)
            | StringOp::Lods(w)
            | StringOp::Stos(w)
            | StringOp::Scas(w)
            | StringOp::Cmps(w) => w,
        };
        let step = width.bytes();
        let advance = if self.flags.test(FLAG_DF) {
            step.wrapping_neg()
        }
        else {
            step
        };
        let add_mask: u32 = if self.inst.prefix & PREFIX_ADDR != 0 {
            0xFFFF_FFFF
        }
        else {
            0xFFFF
        };
        let rep = self.inst.prefix & PREFIX_REP != 0;
        let si_base = self.operand_base(SegReg::DS);
        // The destination segment of a string instruction cannot be
        // overridden.
        let di_base = self.segments.base(SegReg::ES);

        if matches!(op, StringOp::Ins(_) | StringOp::Outs(_)) {
            let port = self.regs.dx();
            if !bus.io_allowed(port, step) {
                self.exception(bus, EXCEPTION_GP)?;
                return Ok(Pipe::Retire);
            }
        }

        let mut count = if rep {
            self.regs.ecx() & add_mask
        }
        else {
            1
        };
        if count == 0 {
            return Ok(Pipe::Retire);
        }

        let mut complete = false;
        let mut yield_interrupt = false;
        loop {
            let si_index = self.regs.esi() & add_mask;
            let di_index = self.regs.edi() & add_mask;
            let mut bump_si = false;
            let mut bump_di = false;
            match op {
                StringOp::Movs(w) => {
                    let value = read_mem(bus, si_base.wrapping_add(si_index), w)?;
                    write_mem(bus, di_base.wrapping_add(di_index), w, value)?;
                    bump_si = true;
                    bump_di = true;
                }
                StringOp::Lods(w) => {
                    let value = read_mem(bus, si_base.wrapping_add(si_index), w)?;
                    self.set_acc(w, value);
                    bump_si = true;
                }
                StringOp::Stos(w) => {
                    write_mem(bus, di_base.wrapping_add(di_index), w, self.acc(w))?;
                    bump_di = true;
                }
                StringOp::Scas(w) => {
                    let value = read_mem(bus, di_base.wrapping_add(di_index), w)?;
                    self.inst.op1 = self.acc(w);
                    self.inst.op2 = value;
                    self.alu_cmp(w);
                    bump_di = true;
                }
                StringOp::Cmps(w) => {
                    let src = read_mem(bus, si_base.wrapping_add(si_index), w)?;
                    let dst = read_mem(bus, di_base.wrapping_add(di_index), w)?;
                    self.inst.op1 = src;
                    self.inst.op2 = dst;
                    self.alu_cmp(w);
                    bump_si = true;
                    bump_di = true;
                }
                StringOp::Ins(w) => {
                    let port = self.regs.dx();
                    let value = match w {
                        Width::Byte => u32::from(bus.io_read_u8(port)),
                        Width::Word => u32::from(bus.io_read_u16(port)),
                        Width::Dword => bus.io_read_u32(port),
                    };
                    write_mem(bus, di_base.wrapping_add(di_index), w, value)?;
                    bump_di = true;
                }
                StringOp::Outs(w) => {
                    let port = self.regs.dx();
                    let value = read_mem(bus, si_base.wrapping_add(si_index), w)?;
                    match w {
                        Width::Byte => bus.io_write_u8(port, value as u8),
                        Width::Word => bus.io_write_u16(port, value as u16),
                        Width::Dword => bus.io_write_u32(port, value),
                    }
                    bump_si = true;
                }
            }
            if bump_si {
                let esi = self.regs.esi();
                self.regs
                    .set_esi((esi & !add_mask) | (esi.wrapping_add(advance) & add_mask));
            }
            if bump_di {
                let edi = self.regs.edi();
                self.regs
                    .set_edi((edi & !add_mask) | (edi.wrapping_add(advance) & add_mask));
            }
            count -= 1;
            if rep {
                let ecx = self.regs.ecx();
                self.regs.set_ecx((ecx & !add_mask) | count);
            }
            if count == 0 {
                complete = true;
                break;
            }
            if rep
                && matches!(op, StringOp::Scas(_) | StringOp::Cmps(_))
                && self.flags.zf() != self.inst.repz
            {
                complete = true;
                break;
            }
            self.cycles -= 1;
            if self.cycles <= 0 {
                break;
            }
            if self.flags.test(FLAG_IF) && bus.int_pending() {
                yield_interrupt = true;
                break;
            }
        }

        if complete {
            Ok(Pipe::Retire)
        }
        else {
            // Budget exhausted mid-loop: rewind so the instruction resumes
            // on the next run call.
            self.set_ip(self.inst.start_ip);
            if yield_interrupt {
                Ok(Pipe::Exit(RunExit::None))
            }
            else {
                Ok(Pipe::Retire)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use crate::cpu::flags::FLAG_ZF;
    use interp86_common::CoreConfig;

    fn boot(code: &[u8]) -> (Cpu, FlatBus) {
        let mut cpu = Cpu::new(&CoreConfig::default());
        let mut bus = FlatBus::new(0x10_0000);
        cpu.segments.reload(SegReg::CS, 0x0100);
        cpu.segments.reload(SegReg::DS, 0x0200);
        cpu.segments.reload(SegReg::ES, 0x0400);
        cpu.segments.reload(SegReg::SS, 0x0300);
        cpu.regs.ip = 0;
        cpu.regs.set_esp(0x0200);
        bus.load(0x1000, code);
        (cpu, bus)
    }

    #[test]
    fn rep_movsb_copies_block() {
        // REP MOVSB; HLT
        let (mut cpu, mut bus) = boot(&[0xF3, 0xA4, 0xF4]);
        bus.load(0x2000, b"ABCDEFGH");
        cpu.regs.set_cx(8);
        cpu.run(&mut bus, 100).unwrap();
        assert_eq!(cpu.regs.cx(), 0);
        assert_eq!(cpu.regs.si(), 8);
        assert_eq!(cpu.regs.di(), 8);
        for (i, b) in b"ABCDEFGH".iter().enumerate() {
            assert_eq!(bus.read_u8(0x4000 + i as u32).unwrap(), *b);
        }
    }

    #[test]
    fn rep_movsb_suspends_on_budget_and_resumes() {
        // REP MOVSB; HLT
        let (mut cpu, mut bus) = boot(&[0xF3, 0xA4, 0xF4]);
        bus.load(0x2000, b"ABCDEFGH");
        cpu.regs.set_cx(8);

        let exit = cpu.run(&mut bus, 3).unwrap();
        assert_eq!(exit, RunExit::None);
        // Three transfers done, IP rewound to the REP prefix.
        assert_eq!(cpu.regs.cx(), 5);
        assert_eq!(cpu.regs.si(), 3);
        assert_eq!(cpu.regs.di(), 3);
        assert_eq!(cpu.regs.ip, 0);
        assert_eq!(bus.read_u8(0x4000 + 2).unwrap(), b'C');
        assert_eq!(bus.read_u8(0x4000 + 3).unwrap(), 0);

        let exit = cpu.run(&mut bus, 100).unwrap();
        assert_eq!(exit, RunExit::Halt);
        assert_eq!(cpu.regs.cx(), 0);
        assert_eq!(bus.read_u8(0x4000 + 7).unwrap(), b'H');
    }

    #[test]
    fn repne_scasb_stops_at_match() {
        // REPNE SCASB; HLT
        let (mut cpu, mut bus) = boot(&[0xF2, 0xAE, 0xF4]);
        bus.load(0x4000, b"XXQX");
        cpu.regs.set_al(b'Q');
        cpu.regs.set_cx(8);
        cpu.run(&mut bus, 100).unwrap();
        assert_eq!(cpu.regs.cx(), 5);
        assert_eq!(cpu.regs.di(), 3);
        assert!(cpu.flags.test(FLAG_ZF));
    }

    #[test]
    fn rep_stosw_fills_words() {
        // REP STOSW; HLT
        let (mut cpu, mut bus) = boot(&[0xF3, 0xAB, 0xF4]);
        cpu.regs.set_ax(0xABCD);
        cpu.regs.set_cx(4);
        cpu.regs.set_di(0x10);
        cpu.run(&mut bus, 100).unwrap();
        assert_eq!(cpu.regs.di(), 0x18);
        for i in 0..4 {
            assert_eq!(bus.read_u16(0x4000 + 0x10 + i * 2).unwrap(), 0xABCD);
        }
    }

    #[test]
    fn direction_flag_walks_backwards() {
        // STD; LODSB; HLT
        let (mut cpu, mut bus) = boot(&[0xFD, 0xAC, 0xF4]);
        bus.load(0x2000, b"abcdef");
        cpu.regs.set_si(5);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.al(), b'f');
        assert_eq!(cpu.regs.si(), 4);
    }

    #[test]
    fn movs_source_segment_override() {
        // ES: MOVSB; HLT -- source read from ES instead of DS.
        let (mut cpu, mut bus) = boot(&[0x26, 0xA4, 0xF4]);
        bus.load(0x2000, &[0x11]);
        bus.load(0x4000, &[0x22]);
        cpu.regs.set_di(0x20);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(bus.read_u8(0x4000 + 0x20).unwrap(), 0x22);
    }

    #[test]
    fn cmpsb_sets_compare_flags() {
        // CMPSB; HLT
        let (mut cpu, mut bus) = boot(&[0xA6, 0xF4]);
        bus.load(0x2000, &[0x30]);
        bus.load(0x4000, &[0x30]);
        cpu.run(&mut bus, 10).unwrap();
        assert!(cpu.flags.zf());
        assert_eq!(cpu.regs.si(), 1);
        assert_eq!(cpu.regs.di(), 1);
    }
}
