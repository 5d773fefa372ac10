// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use galatea::compress::{compress_layout, compression_candidates};
use galatea::progress::{ProgressRange, SilentMonitor};
use galatea::repair::repair_layout;

mod fixtures;

// Benchmark identity (keep stable):
// - Group names in this file: `repair.layout`, `compress.candidates`
// - Case IDs (the string after the `/`) must remain stable across refactors so
//   results stay comparable over time (e.g. `small`, `medium_fan`,
//   `large_grid`).
// - If implementations move/deduplicate, update the wiring but do not rename
//   group or case IDs.
fn benches_repair(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("repair.layout");

        for (case_id, case) in [
            ("small", fixtures::Case::Small),
            ("medium_fan", fixtures::Case::MediumFan),
            ("large_grid", fixtures::Case::LargeGrid),
        ] {
            let (layout, facts) = fixtures::fixture(case);
            let trees = layout.trees().len() as u64;

            group.throughput(Throughput::Elements(trees));
            group.bench_function(case_id, |b| {
                b.iter_batched(
                    || layout.clone(),
                    |mut layout| {
                        let report = repair_layout(
                            &mut layout,
                            &facts,
                            &mut SilentMonitor,
                            ProgressRange::full(),
                        )
                        .expect("not cancelled");
                        black_box(report.trees_processed)
                    },
                    BatchSize::SmallInput,
                )
            });
        }

        group.finish();
    }

    {
        let mut group = c.benchmark_group("compress.candidates");

        for (case_id, case) in [
            ("small", fixtures::Case::Small),
            ("medium_fan", fixtures::Case::MediumFan),
            ("large_grid", fixtures::Case::LargeGrid),
        ] {
            let (mut layout, facts) = fixtures::fixture(case);
            repair_layout(&mut layout, &facts, &mut SilentMonitor, ProgressRange::full())
                .expect("not cancelled");

            group.bench_function(case_id, |b| {
                b.iter_batched(
                    || layout.clone(),
                    |mut layout| {
                        let (rows, cols) = compression_candidates(&layout, &facts);
                        let changes = compress_layout(
                            &mut layout,
                            &rows,
                            &cols,
                            &mut SilentMonitor,
                            ProgressRange::full(),
                        )
                        .expect("not cancelled");
                        black_box(changes.len())
                    },
                    BatchSize::SmallInput,
                )
            });
        }

        group.finish();
    }
}

criterion_group!(benches, benches_repair);
criterion_main!(benches);
