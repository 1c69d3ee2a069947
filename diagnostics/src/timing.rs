//! Wall-time instrumentation for async regions.

use std::future::Future;
use std::time::Instant;

/// Await `future` and emit a debug event with its wall time.
pub async fn track_timing<F: Future>(event_name: &'static str, future: F) -> F::Output {
    let started = Instant::now();
    let output = future.await;
    let duration_ms = started.elapsed().as_millis() as u64;
    tracing::debug!(event = event_name, duration_ms, "timing");
    output
}

#[cfg(test)]
mod tests {
    use super::track_timing;

    #[tokio::test]
    async fn test_passes_output_through() {
        let value = track_timing("test.region", async { 41 + 1 }).await;
        assert_eq!(value, 42);
    }
}
