//! Monotonic millisecond clock
//!
//! Every time-dependent component takes `now_ms` explicitly (`*_at` methods) so
//! tests can drive time deterministically. Live callers use [`now_ms`].

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed since the first call in this process
pub fn now_ms() -> u64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_millis() as u64
}
