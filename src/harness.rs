use std::hint::black_box;
use std::time::Instant;

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{BenchError, Result};
use crate::schema::{BenchmarkParameter, ResultRecord};
use crate::trackalloc;

const MIB: u64 = 1024 * 1024;

#[derive(Clone, Copy, Debug)]
pub enum Profile {
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub profile: Profile,
    pub seed: u64,
}

impl BenchConfig {
    /// Deterministic generator for payloads and messages. Key material still
    /// comes from the OS RNG inside the suite modules.
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    /// Repetitions for a symmetric op at the given payload size. Large
    /// payloads get fewer repetitions to keep the run bounded.
    pub fn symmetric_iters(&self, payload_bytes: u64) -> u64 {
        match (self.profile, payload_bytes < MIB) {
            (Profile::Quick, true) => 20,
            (Profile::Quick, false) => 2,
            (Profile::Full, true) => 100,
            (Profile::Full, false) => 5,
        }
    }

    /// Repetitions for asymmetric sign/verify (and cheap key generation).
    pub fn asymmetric_iters(&self) -> u64 {
        match self.profile {
            Profile::Quick => 20,
            Profile::Full => 100,
        }
    }
}

/// Derived throughput in MB/s, or `None` when the elapsed time is below the
/// timer's resolution (reporting infinity would be worse than reporting
/// nothing).
pub fn throughput_mb_s(payload_bytes: u64, iterations: u64, total_secs: f64) -> Option<f64> {
    if total_secs > 0.0 {
        let mb = (payload_bytes * iterations) as f64 / MIB as f64;
        Some(mb / total_secs)
    } else {
        None
    }
}

/// Execute `op` exactly `iterations` times back-to-back and build the result
/// record for `param`.
///
/// The timer brackets only the repetition loop; whatever setup the caller did
/// (key generation, cipher construction, nonces, payloads) stays outside it.
/// With `track_memory` the peak-allocation counter is reset just before the
/// loop and sampled just after it; this is meaningful only in binaries that
/// install [`trackalloc::TrackingAllocator`].
///
/// A failing `op` aborts the measurement immediately: no further calls, no
/// partial record, no retry.
pub fn run<T>(
    param: &BenchmarkParameter,
    iterations: u64,
    track_memory: bool,
    mut op: impl FnMut() -> Result<T>,
) -> Result<ResultRecord> {
    if iterations == 0 {
        return Err(BenchError::InvalidIterations);
    }

    if track_memory {
        trackalloc::reset_peak();
    }
    let start = Instant::now();
    for _ in 0..iterations {
        black_box(op()?);
    }
    let elapsed = start.elapsed();
    let peak_bytes = track_memory.then(|| trackalloc::peak_bytes() as u64);

    let total_secs = elapsed.as_secs_f64();
    let avg_secs = total_secs / iterations as f64;
    let throughput = param
        .payload_bytes
        .and_then(|bytes| throughput_mb_s(bytes, iterations, total_secs));

    Ok(ResultRecord {
        algorithm: param.algorithm.clone(),
        variant: param.variant.clone(),
        op: param.op,
        security: param.security.clone(),
        iterations,
        avg_secs,
        payload_bytes: param.payload_bytes,
        throughput_mb_s: throughput,
        peak_bytes,
        extra: param.extra.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OpKind;
    use std::time::Duration;

    fn param() -> BenchmarkParameter {
        BenchmarkParameter::new("X", "test", OpKind::Encrypt)
    }

    #[test]
    fn executes_exactly_n_times() {
        for n in [1u64, 2, 7, 100] {
            let mut calls = 0u64;
            let rec = run(&param(), n, false, || {
                calls += 1;
                Ok(())
            })
            .unwrap();
            assert_eq!(calls, n);
            assert_eq!(rec.iterations, n);
            assert!(rec.avg_secs >= 0.0);
        }
    }

    #[test]
    fn zero_iterations_rejected_before_any_call() {
        let mut calls = 0u64;
        let err = run(&param(), 0, false, || {
            calls += 1;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, BenchError::InvalidIterations));
        assert_eq!(calls, 0);
    }

    #[test]
    fn failure_propagates_and_stops_the_loop() {
        let mut calls = 0u64;
        let err = run(&param(), 10, false, || {
            calls += 1;
            if calls == 3 {
                Err(BenchError::Crypto("bad tag".to_string()))
            } else {
                Ok(())
            }
        })
        .unwrap_err();
        assert!(matches!(err, BenchError::Crypto(_)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn average_reflects_per_call_delay() {
        let rec = run(&param(), 50, false, || {
            std::thread::sleep(Duration::from_millis(1));
            Ok(())
        })
        .unwrap();
        // Scheduling jitter only pushes the average up.
        assert!(rec.avg_secs >= 0.0009, "avg {}", rec.avg_secs);
        assert!(rec.avg_secs < 0.05, "avg {}", rec.avg_secs);
    }

    #[test]
    fn throughput_present_only_with_payload() {
        let no_payload = run(&param(), 3, false, || Ok(())).unwrap();
        assert!(no_payload.throughput_mb_s.is_none());

        let with_payload = run(&param().payload_bytes(1024), 3, false, || {
            std::thread::sleep(Duration::from_micros(100));
            Ok(())
        })
        .unwrap();
        let tp = with_payload.throughput_mb_s.unwrap();
        assert!(tp > 0.0);
    }

    #[test]
    fn throughput_is_size_invariant_for_linear_cost() {
        // Same per-byte cost at 1 KB and 100 MB must derive the same rate.
        let per_byte_secs = 1e-9;
        let small = throughput_mb_s(1024, 100, 1024.0 * 100.0 * per_byte_secs).unwrap();
        let large =
            throughput_mb_s(104_857_600, 5, 104_857_600.0 * 5.0 * per_byte_secs).unwrap();
        let rel = (small - large).abs() / large;
        assert!(rel < 1e-9, "small {small} large {large}");
    }

    #[test]
    fn zero_elapsed_yields_no_throughput() {
        assert!(throughput_mb_s(1024, 1, 0.0).is_none());
    }

    #[test]
    fn quick_profile_scales_iterations_down() {
        let quick = BenchConfig {
            profile: Profile::Quick,
            seed: 0,
        };
        let full = BenchConfig {
            profile: Profile::Full,
            seed: 0,
        };
        assert!(quick.symmetric_iters(1024) < full.symmetric_iters(1024));
        assert!(quick.symmetric_iters(MIB) < quick.symmetric_iters(1024));
        assert!(quick.asymmetric_iters() < full.asymmetric_iters());
    }
}
