//! Counting allocator for peak-heap measurement.
//!
//! Wraps the system allocator and maintains live-byte and peak-byte counters
//! so the harness can bracket a timed region with [`reset_peak`] /
//! [`peak_bytes`]. Install it in the binary that wants the numbers:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: cipherbench::trackalloc::TrackingAllocator = TrackingAllocator;
//! ```
//!
//! Without the installation the counters stay at zero, which readers must
//! not confuse with "measured as zero"; the CLI always installs it.
//!
//! The counters are process-global. Bracketing is only meaningful for one
//! single-threaded measured region at a time; parallel workers must each own
//! their own process.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

pub struct TrackingAllocator;

fn record_alloc(size: usize) {
    let now = CURRENT.fetch_add(size, Ordering::Relaxed) + size;
    PEAK.fetch_max(now, Ordering::Relaxed);
}

fn record_dealloc(size: usize) {
    CURRENT.fetch_sub(size, Ordering::Relaxed);
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

/// Live heap bytes attributed to tracked allocations.
pub fn current_bytes() -> usize {
    CURRENT.load(Ordering::Relaxed)
}

/// High-water mark since the last [`reset_peak`].
pub fn peak_bytes() -> usize {
    PEAK.load(Ordering::Relaxed)
}

/// Collapse the peak to the current live level. Call immediately before the
/// region to measure.
pub fn reset_peak() {
    PEAK.store(CURRENT.load(Ordering::Relaxed), Ordering::Relaxed);
}
