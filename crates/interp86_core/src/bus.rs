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

    bus.rs

    The interpreter's view of the outside world: guest memory, port I/O and
    the pending-interrupt line. Multi-byte accesses are composed from byte
    accesses by default so that a fault on any constituent byte propagates;
    embedders with linear backing stores can override the wide accessors.

*/

use crate::memerror::MemFault;

pub trait Bus {
    fn read_u8(&mut self, addr: u32) -> Result<u8, MemFault>;
    fn write_u8(&mut self, addr: u32, data: u8) -> Result<(), MemFault>;

    fn read_u16(&mut self, addr: u32) -> Result<u16, MemFault> {
        let lo = self.read_u8(addr)?;
        let hi = self.read_u8(addr.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32, MemFault> {
        let lo = self.read_u16(addr)?;
        let hi = self.read_u16(addr.wrapping_add(2))?;
        Ok((u32::from(hi) << 16) | u32::from(lo))
    }

    fn write_u16(&mut self, addr: u32, data: u16) -> Result<(), MemFault> {
        self.write_u8(addr, data as u8)?;
        self.write_u8(addr.wrapping_add(1), (data >> 8) as u8)
    }

    fn write_u32(&mut self, addr: u32, data: u32) -> Result<(), MemFault> {
        self.write_u16(addr, data as u16)?;
        self.write_u16(addr.wrapping_add(2), (data >> 16) as u16)
    }

    /// I/O permission check for IN/OUT/INS/OUTS. `width` is the access size
    /// in bytes. Returning false raises #GP in the guest.
    fn io_allowed(&mut self, _port: u16, _width: u32) -> bool {
        true
    }

    fn io_read_u8(&mut self, _port: u16) -> u8 {
        0xFF
    }

    fn io_read_u16(&mut self, port: u16) -> u16 {
        let lo = self.io_read_u8(port);
        let hi = self.io_read_u8(port.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn io_read_u32(&mut self, port: u16) -> u32 {
        let lo = self.io_read_u16(port);
        let hi = self.io_read_u16(port.wrapping_add(2));
        (u32::from(hi) << 16) | u32::from(lo)
    }

    fn io_write_u8(&mut self, _port: u16, _data: u8) {}

    fn io_write_u16(&mut self, port: u16, data: u16) {
        self.io_write_u8(port, data as u8);
        self.io_write_u8(port.wrapping_add(1), (data >> 8) as u8);
    }

    fn io_write_u32(&mut self, port: u16, data: u32) {
        self.io_write_u16(port, data as u16);
        self.io_write_u16(port.wrapping_add(2), (data >> 16) as u16);
    }

    /// Queried after IRET/POPF/STI re-enable interrupts; a true result makes
    /// `run` return so the embedder can deliver the interrupt.
    fn int_pending(&mut self) -> bool {
        false
    }
}

/// Flat RAM with no devices. Used by the test suite and by embedders that
/// need nothing more than a block of memory.
pub struct FlatBus {
    mem: Vec<u8>,
}

impl FlatBus {
    pub fn new(size: usize) -> FlatBus {
        FlatBus { mem: vec![0; size] }
    }

    pub fn load(&mut self, addr: u32, data: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + data.len()].copy_from_slice(data);
    }

    pub fn size(&self) -> usize {
        self.mem.len()
    }
}

impl Bus for FlatBus {
    fn read_u8(&mut self, addr: u32) -> Result<u8, MemFault> {
        self.mem
            .get(addr as usize)
            .copied()
            .ok_or_else(|| MemFault::read(addr))
    }

    fn write_u8(&mut self, addr: u32, data: u8) -> Result<(), MemFault> {
        match self.mem.get_mut(addr as usize) {
            Some(byte) => {
                *byte = data;
                Ok(())
            }
            None => Err(MemFault::write(addr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_access_is_little_endian() {
        let mut bus = FlatBus::new(0x100);
        bus.write_u16(0x10, 0x1234).unwrap();
        assert_eq!(bus.read_u8(0x10).unwrap(), 0x34);
        assert_eq!(bus.read_u8(0x11).unwrap(), 0x12);
        assert_eq!(bus.read_u32(0x0E).unwrap(), 0x1234_0000);
    }

    #[test]
    fn out_of_range_access_faults() {
        let mut bus = FlatBus::new(0x10);
        let fault = bus.read_u8(0x10).unwrap_err();
        assert_eq!(fault.address, 0x10);
        // A word read straddling the end faults on the second byte.
        let fault = bus.read_u16(0x0F).unwrap_err();
        assert_eq!(fault.address, 0x10);
    }
}
