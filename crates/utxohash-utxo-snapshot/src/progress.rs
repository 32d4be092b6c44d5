use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_secs(5);

/// Periodic progress report of a long-running pass over the UTXO set.
pub(crate) struct Progress {
    total: Option<u64>,
    started: Instant,
    last_update: Instant,
}

impl Progress {
    pub(crate) fn new(total: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            total,
            started: now,
            last_update: now,
        }
    }

    pub(crate) fn update(&mut self, read: u64, skipped: u64) {
        if self.last_update.elapsed() > INTERVAL {
            self.report(read, skipped);
            self.last_update = Instant::now();
        }
    }

    fn report(&self, read: u64, skipped: u64) {
        let elapsed = self.started.elapsed().as_secs();
        match self.total {
            Some(total) if total > 0 => {
                let percent = read as f64 * 100.0 / total as f64;
                tracing::info!(
                    "Progress: {read}/{total} coins ({percent:.2}%), skipped: {skipped}, elapsed: {elapsed}s"
                );
            }
            _ => {
                tracing::info!("Progress: {read} coins, skipped: {skipped}, elapsed: {elapsed}s");
            }
        }
    }
}
