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

    lib.rs

    interp86_core is a table-driven x86 instruction interpreter. Every opcode
    is described by a (load, operate, store) micro-op triple looked up in a
    1024-entry dispatch table; the three phases run over a transient decode
    context, so adding or auditing an instruction means reading one table row
    rather than a bespoke handler. Arithmetic flags are computed lazily from
    the last recorded operation, and REP string instructions execute against
    the caller's cycle budget, suspending and resuming at iteration
    granularity.

    The crate is a library only: memory and port I/O are supplied by the
    embedder through the `Bus` trait, and the interpreter is driven by
    repeated calls to `Cpu::run` with a cycle budget.

*/

pub mod bus;
pub mod cpu;
pub mod memerror;

pub use bus::{Bus, FlatBus};
pub use cpu::{Cpu, RunExit};
pub use memerror::{AccessKind, MemFault};
