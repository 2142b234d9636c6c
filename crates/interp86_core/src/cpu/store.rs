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

    store.rs

    The Store phase: write the result slots back to their destinations.
    Results flow to the E or G operand, a fixed register, a segment
    register, the stack, or the instruction pointer.

*/

use crate::{
    bus::Bus,
    cpu::{
        decode::St,
        flags::Width,
        segments::SegReg,
        Cpu,
    },
    memerror::MemFault,
};

impl Cpu {
    pub(crate) fn store(&mut self, bus: &mut impl Bus) -> Result<(), MemFault> {
        match self.inst.code.store {
            St::None => {}
            St::E(w) => self.write_e(bus, w, self.inst.op1)?,
            St::G(w) => self.set_g_reg(w, self.inst.op1),
            St::EG(w) => {
                self.write_e(bus, w, self.inst.op1)?;
                self.set_g_reg(w, self.inst.op2);
            }
            St::EdMw => {
                // 32-bit segment-selector store: a register destination
                // takes the zero-extended selector, memory only 16 bits.
                if self.inst.rm_mod == 3 {
                    self.regs.set_r32(self.inst.rm_eai as usize, self.inst.op1);
                }
                else {
                    bus.write_u16(self.inst.rm_eaa, self.inst.op1 as u16)?;
                }
            }
            St::Reg(w, reg) => match w {
                Width::Byte => self.regs.set_r8(reg as usize, self.inst.op1 as u8),
                Width::Word => self.regs.set_r16(reg as usize, self.inst.op1 as u16),
                Width::Dword => self.regs.set_r32(reg as usize, self.inst.op1),
            },
            St::SegM => {
                // A CS destination is not encodable.
                match SegReg::from_index(self.inst.rm_index) {
                    Some(seg) if seg != SegReg::CS => {
                        self.segments.reload(seg, self.inst.op1 as u16);
                    }
                    _ => {
                        self.invalid(bus)?;
                    }
                }
            }
            St::SegG(w) => self.set_g_reg(w, self.inst.op1),
            St::Push(w) => self.push(bus, w, self.inst.op1)?,
            St::CondEb => {
                let value = u32::from(self.inst.cond);
                self.write_e(bus, Width::Byte, value)?;
            }
            St::CondIp(w) => {
                if self.inst.cond {
                    self.add_ip(w);
                }
            }
            St::AddIp(w) => self.add_ip(w),
            St::Ip => self.set_ip(self.inst.op1),
            St::IpIw => {
                let release = u32::from(self.fetch_u16(bus)?);
                self.stack_release(release);
                self.set_ip(self.inst.op1);
            }
        }
        Ok(())
    }

    /// Relative transfer: op1 is added to the IP following the instruction,
    /// truncated to the operand size.
    fn add_ip(&mut self, width: Width) {
        let ip_end = self
            .inst
            .cseip
            .wrapping_sub(self.segments.base(SegReg::CS));
        let mut target = ip_end.wrapping_add(self.inst.op1);
        if width != Width::Dword {
            target &= 0xFFFF;
        }
        self.set_ip(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use interp86_common::CoreConfig;

    fn boot(code: &[u8]) -> (Cpu, FlatBus) {
        let mut cpu = Cpu::new(&CoreConfig::default());
        let mut bus = FlatBus::new(0x10_0000);
        cpu.segments.reload(SegReg::CS, 0x0100);
        cpu.segments.reload(SegReg::DS, 0x0200);
        cpu.segments.reload(SegReg::SS, 0x0300);
        cpu.regs.ip = 0;
        cpu.regs.set_esp(0x0200);
        bus.load(0x1000, code);
        (cpu, bus)
    }

    #[test]
    fn xchg_register_with_memory() {
        // XCHG [0x0040], AX; HLT
        let (mut cpu, mut bus) = boot(&[0x87, 0x06, 0x40, 0x00, 0xF4]);
        bus.load(0x2000 + 0x0040, &[0xEF, 0xBE]);
        cpu.regs.set_ax(0x1234);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ax(), 0xBEEF);
        assert_eq!(bus.read_u16(0x2000 + 0x0040).unwrap(), 0x1234);
    }

    #[test]
    fn xadd_exchanges_and_accumulates() {
        // XADD CX, DX; HLT
        let config = CoreConfig {
            cpu_level: interp86_common::CpuLevel::Cpu486,
            ..CoreConfig::default()
        };
        let mut cpu = Cpu::new(&config);
        let mut bus = FlatBus::new(0x10_0000);
        cpu.segments.reload(SegReg::CS, 0x0100);
        cpu.regs.ip = 0;
        bus.load(0x1000, &[0x0F, 0xC1, 0xD1, 0xF4]);
        cpu.regs.set_cx(3);
        cpu.regs.set_dx(5);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.cx(), 8);
        assert_eq!(cpu.regs.dx(), 3);
    }

    #[test]
    fn mov_to_segment_register() {
        // MOV AX, 0x0800; MOV ES, AX; HLT
        let (mut cpu, mut bus) = boot(&[0xB8, 0x00, 0x08, 0x8E, 0xC0, 0xF4]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.segments.selector(SegReg::ES), 0x0800);
        assert_eq!(cpu.segments.base(SegReg::ES), 0x8000);
    }

    #[test]
    fn mov_to_cs_raises_invalid_opcode() {
        // MOV CS, AX; target byte increments BL so the vector is observable.
        let (mut cpu, mut bus) = boot(&[0x8E, 0xC8, 0xF4]);
        bus.load(6 * 4, &[0x00, 0x20, 0x00, 0x18]); // vector 6 -> 1800:2000
        bus.load(0x1_8000 + 0x2000, &[0xFE, 0xC3, 0xF4]); // INC BL; HLT
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.r8(3), 1);
    }

    #[test]
    fn ret_imm_releases_caller_arguments() {
        // CALL +3; HLT; NOP; NOP; RET 2
        let (mut cpu, mut bus) = boot(&[0xE8, 0x03, 0x00, 0xF4, 0x90, 0x90, 0xC2, 0x02, 0x00]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ip, 4);
        assert_eq!(cpu.regs.sp(), 0x0202);
    }

    #[test]
    fn relative_jump_wraps_at_operand_size() {
        // JMP -5 from IP 0: wraps to 0xFFFE in a 16-bit code segment.
        let (mut cpu, mut bus) = boot(&[0xE9, 0xFB, 0xFF]);
        bus.load(0x1000 + 0xFFFE, &[0xF4]);
        cpu.run(&mut bus, 10).unwrap();
        assert_eq!(cpu.regs.ip, 0xFFFF);
    }
}
