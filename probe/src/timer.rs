//! Wall clock readings in milliseconds.

use nix::time::{ClockId, clock_gettime};
use probe_types::{ProbeError, ProbeResult};

/// Milliseconds since the Unix epoch.
///
/// Reads `CLOCK_REALTIME`. A failed read is returned as [`ProbeError::Clock`]
/// instead of falling back to zero.
pub fn now_millis() -> ProbeResult<i64> {
    let ts = clock_gettime(ClockId::CLOCK_REALTIME)
        .map_err(|errno| ProbeError::Clock(errno.desc().to_string()))?;
    let micros = ts.tv_nsec() as i64 / 1_000;
    Ok(millis_from_parts(ts.tv_sec() as i64, micros))
}

/// `secs * 1000 + micros / 1000`
pub fn millis_from_parts(secs: i64, micros: i64) -> i64 {
    secs * 1_000 + micros / 1_000
}
