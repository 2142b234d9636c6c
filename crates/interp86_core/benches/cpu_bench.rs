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

    ---------------------------------------------------------------------------

    benches::cpu_bench.rs

    Benchmarks for the interpreter core

*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use interp86_common::CoreConfig;
use interp86_core::{Cpu, FlatBus};
use interp86_core::cpu::segments::SegReg;

fn make_cpu() -> (Cpu, FlatBus) {
    let mut cpu = Cpu::new(&CoreConfig::default());
    let bus = FlatBus::new(0x10_0000);
    cpu.segments.reload(SegReg::CS, 0x0100);
    cpu.segments.reload(SegReg::DS, 0x0200);
    cpu.segments.reload(SegReg::ES, 0x0400);
    cpu.segments.reload(SegReg::SS, 0x0300);
    cpu.regs.set_esp(0x0200);
    (cpu, bus)
}

pub fn alu_loop_bench(c: &mut Criterion) {
    let (mut cpu, mut bus) = make_cpu();

    // ADD AX, 1; LOOP -5; HLT
    bus.load(0x1000, &[0x05, 0x01, 0x00, 0xE2, 0xFB, 0xF4]);

    c.bench_function("alu_loop_bench", |b| {
        b.iter(|| {
            cpu.regs.ip = 0;
            cpu.regs.set_cx(1000);
            black_box(cpu.run(&mut bus, 100_000).unwrap());
        });
    });
}

pub fn rep_movs_bench(c: &mut Criterion) {
    let (mut cpu, mut bus) = make_cpu();

    // REP MOVSB; HLT
    bus.load(0x1000, &[0xF3, 0xA4, 0xF4]);

    c.bench_function("rep_movs_bench", |b| {
        b.iter(|| {
            cpu.regs.ip = 0;
            cpu.regs.set_si(0);
            cpu.regs.set_di(0);
            cpu.regs.set_cx(4096);
            black_box(cpu.run(&mut bus, 100_000).unwrap());
        });
    });
}

pub fn modrm_ea_bench(c: &mut Criterion) {
    let (mut cpu, mut bus) = make_cpu();

    // MOV AX, [BX+SI+0x10]; LOOP -6; HLT
    bus.load(0x1000, &[0x8B, 0x40, 0x10, 0xE2, 0xFB, 0xF4]);

    c.bench_function("modrm_ea_bench", |b| {
        b.iter(|| {
            cpu.regs.ip = 0;
            cpu.regs.set_cx(1000);
            black_box(cpu.run(&mut bus, 100_000).unwrap());
        });
    });
}

criterion_group!(cpu_benches, alu_loop_bench, rep_movs_bench, modrm_ea_bench);
criterion_main!(cpu_benches);
