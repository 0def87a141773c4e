//! Peak-allocation sampling only means something when the counting
//! allocator is installed, and a global allocator can be installed once per
//! binary, so these tests get their own test binary.

use cipherbench::harness;
use cipherbench::schema::{BenchmarkParameter, OpKind};
use cipherbench::trackalloc::{self, TrackingAllocator};

#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

#[test]
fn peak_covers_allocations_inside_the_timed_region() {
    const BUF: usize = 1024 * 1024;
    let param = BenchmarkParameter::new("alloc", "1MiB", OpKind::Encrypt);
    let rec = harness::run(&param, 4, true, || {
        let buf = vec![0xa5u8; BUF];
        Ok(std::hint::black_box(buf.len()))
    })
    .unwrap();

    let peak = rec.peak_bytes.expect("memory tracking was requested");
    assert!(peak as usize >= BUF, "peak {peak} below buffer size");
}

#[test]
fn untracked_run_reports_no_peak() {
    let param = BenchmarkParameter::new("alloc", "none", OpKind::Encrypt);
    let rec = harness::run(&param, 2, false, || Ok(vec![0u8; 4096].len())).unwrap();
    assert!(rec.peak_bytes.is_none());
}

#[test]
fn counters_track_live_allocations() {
    // No reset here: tests share the process-global counters, and resetting
    // could race the tracked run above. Live bytes are a safe lower bound.
    let buf = vec![0u8; 256 * 1024];
    std::hint::black_box(&buf);
    assert!(trackalloc::current_bytes() >= buf.len());
    assert!(trackalloc::peak_bytes() >= buf.len());
}
