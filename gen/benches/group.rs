use std::fmt::Write;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use isagen_gen::{encoding::Family, group, Spec, LEGACY_COMPONENTS, VEX_COMPONENTS};

fn legacy_table() -> String {
    let mut out = String::new();
    for opcode in 0..=0xffu32 {
        if opcode == 0x38 {
            continue;
        }
        writeln!(out, "OP{opcode:02X} ; Ev,Gv ; ; 0x0F 0x{opcode:02X} /r ; w:RW|R").unwrap();
    }
    for opcode in 0..=0xffu32 {
        for reg in 0..8 {
            writeln!(
                out,
                "GRP{opcode:02X}_{reg} ; Ev ; ; 0x0F 0x38 0x{opcode:02X} /{reg} ; w:RW"
            )
            .unwrap();
        }
    }
    out
}

fn vex_table() -> String {
    let mut out = String::new();
    for map in 1..=3 {
        for pp in 0..4 {
            for opcode in 0..=0xffu32 {
                writeln!(
                    out,
                    "V{map}{pp}_{opcode:02X} ; Vx,Hx,Wx ; ; vex m:{map} p:{pp} l:x w:i 0x{opcode:02X} /r ; w:W|R|R"
                )
                .unwrap();
            }
        }
    }
    out
}

fn group_bench(c: &mut Criterion) {
    let sources = [("legacy", legacy_table()), ("vex", vex_table())];

    let mut parse = c.benchmark_group("parse");
    for (name, source) in &sources {
        parse.throughput(Throughput::Bytes(source.len() as u64));
        parse.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| Spec::new().table_str(name, source).load().unwrap())
        });
    }
    parse.finish();

    let mut build = c.benchmark_group("group");
    for (name, source) in &sources {
        let spec = Spec::new().table_str(name, source).load().unwrap();
        let components = if *name == "vex" {
            VEX_COMPONENTS
        } else {
            LEGACY_COMPONENTS
        };
        let family = if *name == "vex" {
            Family::Vex
        } else {
            Family::Legacy
        };
        build.throughput(Throughput::Elements(spec.instructions().len() as u64));
        build.bench_with_input(BenchmarkId::from_parameter(name), &spec, |b, spec| {
            b.iter(|| group(spec.family(family), components).unwrap().depth())
        });
    }
    build.finish();
}

criterion_group!(benches, group_bench);
criterion_main!(benches);
