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

    interrupt.rs

    Real-mode interrupt delivery and the far control transfers. A software
    INT pushes the address of the following instruction; a fault-class
    exception first rewinds to the start of the faulting instruction so it
    re-executes after the handler returns.

*/

use crate::{
    bus::Bus,
    cpu::{
        flags::{Width, FLAG_IF, FLAG_TF},
        segments::SegReg,
        Cpu,
    },
    memerror::MemFault,
};

pub const EXCEPTION_DE: u8 = 0;
pub const EXCEPTION_DB: u8 = 1;
pub const EXCEPTION_BR: u8 = 5;
pub const EXCEPTION_UD: u8 = 6;
pub const EXCEPTION_GP: u8 = 13;

impl Cpu {
    /// Deliver an interrupt through the real-mode vector table. The return
    /// address pushed is the current fetch position, so for a software INT
    /// this is the instruction after the INT.
    pub(crate) fn interrupt(&mut self, bus: &mut impl Bus, vector: u8) -> Result<(), MemFault> {
        let flags_word = self.flags.fill();
        let entry = self.idt_base.wrapping_add(u32::from(vector) * 4);
        let offset = bus.read_u16(entry)?;
        let selector = bus.read_u16(entry.wrapping_add(2))?;

        let return_ip = self
            .inst
            .cseip
            .wrapping_sub(self.segments.base(SegReg::CS));
        self.push(bus, Width::Word, flags_word)?;
        self.push(bus, Width::Word, u32::from(self.segments.selector(SegReg::CS)))?;
        self.push(bus, Width::Word, return_ip)?;

        self.flags.set(FLAG_IF, false);
        self.flags.set(FLAG_TF, false);
        self.segments.reload(SegReg::CS, selector);
        self.set_ip(u32::from(offset));
        Ok(())
    }

    /// Fault-class exception: rewind to the start of the current
    /// instruction before vectoring so it restarts on return.
    pub(crate) fn exception(&mut self, bus: &mut impl Bus, vector: u8) -> Result<(), MemFault> {
        log::trace!(
            "exception {} at {:04X}:{:08X}",
            vector,
            self.segments.selector(SegReg::CS),
            self.inst.start_ip
        );
        self.set_ip(self.inst.start_ip);
        self.interrupt(bus, vector)
    }

    pub(crate) fn iret(&mut self, bus: &mut impl Bus, width: Width) -> Result<(), MemFault> {
        let new_ip;
        let new_cs;
        let new_flags;
        match width {
            Width::Dword => {
                new_ip = self.pop(bus, Width::Dword)?;
                new_cs = self.pop(bus, Width::Dword)? as u16;
                new_flags = self.pop(bus, Width::Dword)?;
            }
            _ => {
                new_ip = self.pop(bus, Width::Word)?;
                new_cs = self.pop(bus, Width::Word)? as u16;
                new_flags = self.pop(bus, Width::Word)?;
            }
        }
        self.flags
            .set_word(new_flags, crate::cpu::flags::FLAG_MASK_POP);
        self.segments.reload(SegReg::CS, new_cs);
        self.set_ip(new_ip);
        Ok(())
    }

    pub(crate) fn retf(
        &mut self,
        bus: &mut impl Bus,
        width: Width,
        release: u32,
    ) -> Result<(), MemFault> {
        let new_ip = self.pop(bus, width)?;
        let new_cs = self.pop(bus, width)? as u16;
        self.stack_release(release);
        self.segments.reload(SegReg::CS, new_cs);
        self.set_ip(new_ip);
        Ok(())
    }

    pub(crate) fn call_far(
        &mut self,
        bus: &mut impl Bus,
        width: Width,
        offset: u32,
        selector: u16,
    ) -> Result<(), MemFault> {
        let return_ip = self
            .inst
            .cseip
            .wrapping_sub(self.segments.base(SegReg::CS));
        self.push(bus, width, u32::from(self.segments.selector(SegReg::CS)))?;
        self.push(bus, width, return_ip)?;
        self.jmp_far(width, offset, selector);
        Ok(())
    }

    pub(crate) fn jmp_far(&mut self, width: Width, offset: u32, selector: u16) {
        self.segments.reload(SegReg::CS, selector);
        let offset = match width {
            Width::Dword => offset,
            _ => offset & 0xFFFF,
        };
        self.set_ip(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use interp86_common::CoreConfig;

    fn setup() -> (Cpu, FlatBus) {
        let mut cpu = Cpu::new(&CoreConfig::default());
        let mut bus = FlatBus::new(0x2_0000);
        cpu.segments.reload(SegReg::CS, 0x1000);
        cpu.segments.reload(SegReg::SS, 0x0800);
        cpu.regs.set_esp(0x0100);
        // Vector 0x21 -> 0x1800:0x0042.
        bus.load(0x21 * 4, &[0x42, 0x00, 0x00, 0x18]);
        (cpu, bus)
    }

    #[test]
    fn interrupt_vectors_through_ivt() {
        let (mut cpu, mut bus) = setup();
        cpu.inst.cseip = 0x1_0000 + 0x0207; // after a 2-byte INT at 0x205
        cpu.inst.start_ip = 0x0205;
        cpu.flags.set(FLAG_IF, true);
        cpu.interrupt(&mut bus, 0x21).unwrap();

        assert_eq!(cpu.segments.selector(SegReg::CS), 0x1800);
        assert_eq!(cpu.regs.ip, 0x0042);
        assert!(!cpu.flags.test(FLAG_IF));
        // Pushed frame: IP, CS, FLAGS from low to high address.
        assert_eq!(bus.read_u16(0x8000 + 0x00FA).unwrap(), 0x0207);
        assert_eq!(bus.read_u16(0x8000 + 0x00FC).unwrap(), 0x1000);
    }

    #[test]
    fn exception_rewinds_to_instruction_start() {
        let (mut cpu, mut bus) = setup();
        bus.load(0, &[0x10, 0x00, 0x00, 0x18]); // vector 0
        cpu.inst.start_ip = 0x0300;
        cpu.inst.cseip = 0x1_0000 + 0x0302;
        cpu.exception(&mut bus, EXCEPTION_DE).unwrap();
        // Return address on the stack is the faulting instruction itself.
        assert_eq!(bus.read_u16(0x8000 + 0x00FA).unwrap(), 0x0300);
    }

    #[test]
    fn iret_restores_frame_and_flags() {
        let (mut cpu, mut bus) = setup();
        cpu.inst.cseip = 0x1_0000 + 0x0207;
        cpu.flags.set(FLAG_IF, true);
        cpu.interrupt(&mut bus, 0x21).unwrap();
        cpu.iret(&mut bus, Width::Word).unwrap();

        assert_eq!(cpu.segments.selector(SegReg::CS), 0x1000);
        assert_eq!(cpu.regs.ip, 0x0207);
        assert!(cpu.flags.test(FLAG_IF));
        assert_eq!(cpu.regs.sp(), 0x0100);
    }

    #[test]
    fn far_call_and_return() {
        let (mut cpu, mut bus) = setup();
        cpu.inst.cseip = 0x1_0000 + 0x0105; // after a 5-byte CALL FAR
        cpu.call_far(&mut bus, Width::Word, 0x0040, 0x1800).unwrap();
        assert_eq!(cpu.segments.selector(SegReg::CS), 0x1800);
        assert_eq!(cpu.regs.ip, 0x0040);

        cpu.retf(&mut bus, Width::Word, 0).unwrap();
        assert_eq!(cpu.segments.selector(SegReg::CS), 0x1000);
        assert_eq!(cpu.regs.ip, 0x0105);
    }
}
