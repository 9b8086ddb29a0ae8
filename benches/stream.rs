// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use cellweave::engine::DEFAULT_CONTINUATION_CONTEXT_CHARS;
use cellweave::stream::{continuation_tail, is_complete, Feed, PartialAssembly};
use cellweave::validate::check_fragment;

mod fixtures;
mod profiler;

/// Cuts `markup` inside the tag of the first cell starting past its midpoint, the way a
/// length-limited reply stops mid-element.
fn cut_mid_cell(markup: &str) -> (&str, &str) {
    let from = markup.len() / 2;
    let at = markup[from..].find("<mxCell ").map_or(from, |hit| from + hit + "<mxCell ".len());
    markup.split_at(at)
}

fn benches_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream.is_complete");

    for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::LargeLongLabels] {
        let markup = fixtures::fragment(case);
        let cut = &markup[..markup.len() - 1];
        group.throughput(Throughput::Bytes(markup.len() as u64));
        group.bench_function(format!("{}/complete", case.id()), |b| {
            b.iter(|| black_box(is_complete(black_box(&markup))))
        });
        group.bench_function(format!("{}/cut", case.id()), |b| {
            b.iter(|| black_box(is_complete(black_box(cut))))
        });
    }

    group.finish();
}

fn benches_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream.assemble");

    for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::LargeLongLabels] {
        let markup = fixtures::fragment(case);
        let (head, tail) = cut_mid_cell(&markup);
        group.throughput(Throughput::Bytes(markup.len() as u64));
        group.bench_function(case.id(), |b| {
            b.iter_batched(
                PartialAssembly::new,
                |mut assembly| {
                    let first = assembly.begin(black_box(head));
                    let second = assembly.append(black_box(tail));
                    black_box((first == Feed::Incomplete, matches!(second, Ok(Feed::Complete(_)))))
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn benches_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream.validate");

    for case in [fixtures::Case::Small, fixtures::Case::Medium, fixtures::Case::LargeLongLabels] {
        let markup = fixtures::fragment(case);
        group.throughput(Throughput::Bytes(markup.len() as u64));
        group.bench_function(case.id(), |b| {
            b.iter(|| black_box(check_fragment(black_box(&markup)).map(|checked| checked.cells.len())))
        });
        group.bench_function(format!("{}/tail", case.id()), |b| {
            b.iter(|| black_box(continuation_tail(black_box(&markup), DEFAULT_CONTINUATION_CONTEXT_CHARS).len()))
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_completion, benches_assembly, benches_validate
}
criterion_main!(benches);
