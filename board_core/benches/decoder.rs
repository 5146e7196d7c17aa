use board_core::calibration::{CalibrationSet, CornerCalibration};
use board_core::decoder::{RawReading, decode_corner, decode_total};
use board_core::mac;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

// Synthetic readings sweeping both calibration segments.
fn synth_readings(n: usize, seed: u32) -> Vec<RawReading> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        i32::try_from(x % 40_000).unwrap_or(0) - 10_000
    };
    (0..n)
        .map(|_| RawReading::new(next(), next(), next(), next()))
        .collect()
}

fn calibration() -> CalibrationSet {
    CalibrationSet::new([
        CornerCalibration::new(1_200, 8_900, 16_700),
        CornerCalibration::new(1_050, 8_700, 16_400),
        CornerCalibration::new(1_310, 9_020, 16_880),
        CornerCalibration::new(980, 8_650, 16_300),
    ])
}

pub fn bench_decode(c: &mut Criterion) {
    let cal = calibration();
    let readings = synth_readings(10_000, 0xBEEF);

    c.bench_function("decode_corner", |b| {
        let corner = CornerCalibration::new(1_200, 8_900, 16_700);
        b.iter(|| decode_corner(black_box(12_345), black_box(&corner)))
    });

    c.bench_function("decode_total_10k", |b| {
        b.iter_batched(
            || readings.clone(),
            |rs| {
                let mut acc = 0.0f64;
                for r in &rs {
                    if let Ok(w) = decode_total(r, &cal) {
                        acc += w;
                    }
                }
                black_box(acc)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("mac_encode", |b| {
        b.iter(|| mac::encode(black_box(Some("00:1B:7A:4C:2D:9E"))))
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
