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

    memerror.rs

    Memory fault signal raised by the bus and propagated out of `Cpu::run`.

*/

use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// A failed guest memory access. The interpreter rolls the instruction back
/// (flags and stack pointer restored, instruction pointer not advanced) and
/// returns this to the caller, which may resolve the fault and re-enter
/// `run` to restart the faulting instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind:?} fault at linear address {address:#010X} (error code {error_code:#06X})")]
pub struct MemFault {
    pub address: u32,
    pub kind: AccessKind,
    /// Page-fault style error code bits for the embedder's fault handler.
    pub error_code: u16,
}

impl MemFault {
    pub fn read(address: u32) -> MemFault {
        MemFault {
            address,
            kind: AccessKind::Read,
            error_code: 0,
        }
    }

    pub fn write(address: u32) -> MemFault {
        MemFault {
            address,
            kind: AccessKind::Write,
            error_code: 0x02,
        }
    }
}
