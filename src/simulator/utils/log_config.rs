/// Global logging configuration
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flags for controlling log output per area
static ENABLE_COMPUTE_LOG: AtomicBool = AtomicBool::new(true);
static ENABLE_FETCH_LOG: AtomicBool = AtomicBool::new(true);
static ENABLE_MMIO_LOG: AtomicBool = AtomicBool::new(true);

/// Enable or disable compute engine logging
pub fn set_compute_log(enabled: bool) {
  ENABLE_COMPUTE_LOG.store(enabled, Ordering::Relaxed);
}

/// Enable or disable prefetch/router logging
pub fn set_fetch_log(enabled: bool) {
  ENABLE_FETCH_LOG.store(enabled, Ordering::Relaxed);
}

/// Enable or disable register interface logging
pub fn set_mmio_log(enabled: bool) {
  ENABLE_MMIO_LOG.store(enabled, Ordering::Relaxed);
}

/// Check if compute engine logging is enabled
pub fn is_compute_log_enabled() -> bool {
  ENABLE_COMPUTE_LOG.load(Ordering::Relaxed)
}

/// Check if prefetch/router logging is enabled
pub fn is_fetch_log_enabled() -> bool {
  ENABLE_FETCH_LOG.load(Ordering::Relaxed)
}

/// Check if register interface logging is enabled
pub fn is_mmio_log_enabled() -> bool {
  ENABLE_MMIO_LOG.load(Ordering::Relaxed)
}
