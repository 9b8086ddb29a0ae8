// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

/// Reads a numeric knob from the environment, falling back to `default` when unset or unparsable.
fn knob<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse().ok()).unwrap_or(default)
}

/// Criterion preset with a flamegraph profiler attached (`cargo bench -- --profile-time <s>`).
///
/// `CELLWEAVE_PROFILE_FREQ`, `CELLWEAVE_BENCH_SAMPLES`, `CELLWEAVE_BENCH_WARMUP_SECS` and
/// `CELLWEAVE_BENCH_MEASURE_SECS` tune the run.
pub fn criterion() -> Criterion {
    let frequency = knob::<i32>("CELLWEAVE_PROFILE_FREQ", 100).clamp(1, 1000);
    let samples = knob::<usize>("CELLWEAVE_BENCH_SAMPLES", 50).clamp(10, 200);
    let warmup = knob::<u64>("CELLWEAVE_BENCH_WARMUP_SECS", 2).clamp(1, 60);
    let measure = knob::<u64>("CELLWEAVE_BENCH_MEASURE_SECS", 5).clamp(1, 120);

    Criterion::default()
        .sample_size(samples)
        .warm_up_time(Duration::from_secs(warmup))
        .measurement_time(Duration::from_secs(measure))
        .with_profiler(PProfProfiler::new(frequency, Output::Flamegraph(None)))
}
