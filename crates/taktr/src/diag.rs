//! Diagnostics helpers, behind the `diagnostics` feature.
//!
//! The substrate itself only talks to the `log` facade; wiring a concrete
//! logger is the embedding's job. [`init_logger`] is the convenience
//! bootstrap for demos, tools, and tests that do not bring their own, and
//! [`log_frame_report`] turns the loop's stats plus the schedule's
//! per-system timings into one debug line per frame.

use crate::ecs::system::SystemTiming;
use crate::time::LoopStats;

/// Install `env_logger` as the process logger, configured from
/// `RUST_LOG`. Safe to call more than once; later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Log one debug line summarizing the frame: tick rate, last tick cost,
/// overrun count, and the per-system cost breakdown of the latest tick.
pub fn log_frame_report(stats: &LoopStats, timings: &[SystemTiming]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let breakdown: Vec<String> = timings
        .iter()
        .map(|t| format!("{} {:.1}us", t.name, t.duration_us))
        .collect();
    log::debug!(
        "tick #{} | {:.1} tps | last {:?} | overruns {} | {}",
        stats.ticks,
        stats.ticks_per_second,
        stats.last_tick_duration,
        stats.overruns,
        breakdown.join(", "),
    );
}
