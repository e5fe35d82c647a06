//! Heap monitoring and runtime diagnostics.
//!
//! [`HeapMonitor`] backs the periodic memory-reclaim cycle.  ESP-IDF's
//! allocator returns freed blocks immediately, so "reclaim" amounts to
//! sampling the free heap and tracking the low-water mark so slow leaks
//! show up in the log.  On the host there is no heap figure to report.

use log::{info, warn};

use crate::app::ports::MemoryPort;

/// Free heap below this is logged as a warning.
pub const LOW_HEAP_WARN_BYTES: usize = 16 * 1024;

/// Periodic heap sampler.
#[derive(Debug, Default)]
pub struct HeapMonitor {
    samples: u32,
    lowest: Option<usize>,
}

impl HeapMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest free-heap figure seen so far.
    pub fn lowest(&self) -> Option<usize> {
        self.lowest
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    #[cfg(target_os = "espidf")]
    fn platform_free_heap(&self) -> Option<usize> {
        // SAFETY: plain reads of allocator counters, callable from any task.
        let free = unsafe { esp_idf_svc::sys::esp_get_free_heap_size() };
        Some(free as usize)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_free_heap(&self) -> Option<usize> {
        None
    }

    /// Record one sample.  Split out so the bookkeeping is testable.
    fn record(&mut self, free: Option<usize>) -> Option<usize> {
        self.samples = self.samples.wrapping_add(1);
        if let Some(free) = free {
            self.lowest = Some(self.lowest.map_or(free, |l| l.min(free)));
            if free < LOW_HEAP_WARN_BYTES {
                warn!("MEM: free heap low: {} bytes", free);
            } else {
                info!("MEM: free heap {} bytes (lowest {:?})", free, self.lowest);
            }
        }
        free
    }
}

impl MemoryPort for HeapMonitor {
    fn reclaim(&mut self) -> Option<usize> {
        let free = self.platform_free_heap();
        self.record(free)
    }
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Log the panic reason before the default handler resets the chip.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let location = info
            .location()
            .map(|l| (l.file(), l.line()))
            .unwrap_or(("?", 0));
        log::error!("PANIC: {} at {}:{}", reason, location.0, location.1);
    }));
}
