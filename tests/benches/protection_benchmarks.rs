//! # Validator Protection Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Encoded history write (`mark_attested_since_latest_written`) | < 1µs steady state |
//! | Full-period jump (clears a whole period) | < 5ms |
//! | Local attestation rules on a full history | < 1ms |
//! | Signing through the service (in-memory DB) | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use qc_18_validator_db::{EncodedHistory, HistoryData, ValidatorDb};
use qc_19_slashing_protection::{check_attestation, Protector, ProtectionService};
use shared_types::{
    AttestationData, Checkpoint, DomainResponse, IndexedAttestation, PublicKey,
    WEAK_SUBJECTIVITY_PERIOD,
};
use std::sync::Arc;

fn full_history() -> EncodedHistory {
    let mut history = EncodedHistory::new(0);
    for target in 1..=WEAK_SUBJECTIVITY_PERIOD {
        history.mark_attested_since_latest_written(target, &HistoryData::new(target - 1, [1; 32]));
    }
    history
}

fn bench_history_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-history-codec");
    let history = full_history();

    group.bench_function("mark_next_target", |b| {
        b.iter_batched(
            || history.clone(),
            |mut h| {
                let next = h.latest_epoch_written() + 1;
                h.mark_attested_since_latest_written(next, &HistoryData::new(next - 1, [2; 32]));
                black_box(h)
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("jump_full_period", |b| {
        b.iter_batched(
            || history.clone(),
            |mut h| {
                let far = h.latest_epoch_written() + 2 * WEAK_SUBJECTIVITY_PERIOD;
                h.mark_attested_since_latest_written(far, &HistoryData::new(far - 1, [3; 32]));
                black_box(h)
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_attestation_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-19-attestation-rules");
    let history = full_history();
    let latest = history.latest_epoch_written();

    group.bench_function("safe_next_target", |b| {
        b.iter(|| {
            black_box(check_attestation(
                &history,
                latest,
                latest,
                latest + 1,
                &[9; 32],
            ))
        })
    });

    group.finish();
}

fn bench_service_signing(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let service = ProtectionService::local_only(Arc::new(ValidatorDb::in_memory()));
    let key = PublicKey([1; 48]);
    let domain = DomainResponse::default();
    let mut target = 0u64;

    c.bench_function("qc-19-sign-attestation", |b| {
        b.iter(|| {
            target += 1;
            let att = IndexedAttestation {
                data: AttestationData {
                    source: Checkpoint {
                        epoch: target - 1,
                        root: [0; 32],
                    },
                    target: Checkpoint {
                        epoch: target,
                        root: [0; 32],
                    },
                    ..Default::default()
                },
                ..Default::default()
            };
            runtime
                .block_on(service.is_slashable_attestation(&att, key, &domain))
                .expect("safe attestation")
        })
    });
}

criterion_group!(
    benches,
    bench_history_codec,
    bench_attestation_rules,
    bench_service_signing
);
criterion_main!(benches);
