//! Process memory diagnostics.
//!
//! The binary installs [`CountingAllocator`] as the global allocator so heap
//! usage can be reported without an external profiler. When it is not
//! installed (library tests, embedding) the heap counters simply stay at zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System as SysInfo};
use tracing::info;

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static TOTAL_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// System allocator wrapper that keeps running heap counters.
pub struct CountingAllocator;

fn record_alloc(size: usize) {
    ALLOCATED.fetch_add(size, Ordering::Relaxed);
    TOTAL_ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
    ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            record_alloc(new_size);
        }
        new_ptr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Heap bytes currently live.
    pub allocated: u64,
    /// Heap bytes allocated since start, never decreases.
    pub total_allocated: u64,
    /// Resident set size reported by the OS.
    pub system: u64,
    /// Number of allocations since start.
    pub allocations: u64,
}

impl MemorySnapshot {
    pub fn capture() -> Self {
        Self {
            allocated: ALLOCATED.load(Ordering::Relaxed) as u64,
            total_allocated: TOTAL_ALLOCATED.load(Ordering::Relaxed),
            system: resident_memory().unwrap_or(0),
            allocations: ALLOCATIONS.load(Ordering::Relaxed),
        }
    }
}

fn resident_memory() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = SysInfo::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    system.process(pid).map(|process| process.memory())
}

/// Format a byte count as MiB with three decimals.
pub fn to_mib(bytes: u64) -> String {
    format!("{:.3}", bytes as f64 / 1_048_576.0)
}

/// Log a memory snapshot. Purely observational.
pub fn log_memory_usage(label: &str) {
    let snapshot = MemorySnapshot::capture();
    info!(
        target: "memory",
        label,
        alloc_mib = %to_mib(snapshot.allocated),
        total_alloc_mib = %to_mib(snapshot.total_allocated),
        sys_mib = %to_mib(snapshot.system),
        allocations = snapshot.allocations,
        "memory usage"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mib() {
        assert_eq!(to_mib(0), "0.000");
        assert_eq!(to_mib(1_048_576), "1.000");
        assert_eq!(to_mib(1_572_864), "1.500");
        assert_eq!(to_mib(536_870_912), "512.000");
    }

    #[test]
    fn test_counters_track_allocations() {
        let before = ALLOCATIONS.load(Ordering::Relaxed);
        let layout = Layout::from_size_align(64, 8).unwrap();
        unsafe {
            let ptr = CountingAllocator.alloc(layout);
            assert!(!ptr.is_null());
            CountingAllocator.dealloc(ptr, layout);
        }
        assert!(ALLOCATIONS.load(Ordering::Relaxed) > before);
        assert!(TOTAL_ALLOCATED.load(Ordering::Relaxed) >= 64);
    }

    #[test]
    fn test_capture_and_log_snapshot() {
        let snapshot = MemorySnapshot::capture();
        assert!(snapshot.total_allocated >= snapshot.allocated);
        log_memory_usage("test");
    }
}
