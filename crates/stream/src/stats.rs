use std::time::Duration;

/// Statistics for one `update_position` call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateStats {
    pub tiles_loaded: usize,
    pub tiles_unloaded: usize,
    pub total_resident: usize,
    /// Wall time of the whole update, listener dispatch included.
    pub update_time: Duration,
    /// Part of `update_time` spent synthesizing new tiles.
    pub generate_time: Duration,
    /// Part of `update_time` spent inside listeners.
    pub notify_time: Duration,
    /// The observer had not moved past the movement threshold; nothing ran.
    pub debounced: bool,
}

/// Running totals over every update since the manager was created or
/// disposed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamTotals {
    /// Updates that recomputed the resident set.
    pub processed: usize,
    /// Updates skipped by the movement threshold.
    pub debounced: usize,
    pub tiles_generated: usize,
    pub tiles_evicted: usize,
    pub update_time: Duration,
    pub generate_time: Duration,
    pub notify_time: Duration,
    pub slowest_update: Duration,
}

impl StreamTotals {
    pub fn record(&mut self, stats: &UpdateStats) {
        if stats.debounced {
            self.debounced += 1;
            return;
        }
        self.processed += 1;
        self.tiles_generated += stats.tiles_loaded;
        self.tiles_evicted += stats.tiles_unloaded;
        self.update_time += stats.update_time;
        self.generate_time += stats.generate_time;
        self.notify_time += stats.notify_time;
        self.slowest_update = self.slowest_update.max(stats.update_time);
    }

    /// Every `update_position` call that passed validation.
    pub fn calls(&self) -> usize {
        self.processed + self.debounced
    }

    /// Mean wall time of a processed update.
    pub fn mean_update_time(&self) -> Duration {
        mean(self.update_time, self.processed)
    }

    /// Mean synthesis time of one tile.
    pub fn mean_generate_time(&self) -> Duration {
        mean(self.generate_time, self.tiles_generated)
    }

    /// Fraction of calls absorbed by the movement threshold.
    pub fn debounce_ratio(&self) -> f64 {
        match self.calls() {
            0 => 0.0,
            calls => self.debounced as f64 / calls as f64,
        }
    }
}

fn mean(total: Duration, n: usize) -> Duration {
    match u32::try_from(n) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / n as f64),
    }
}

impl std::fmt::Display for StreamTotals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "updates={} debounced={} generated={} evicted={}",
            self.processed, self.debounced, self.tiles_generated, self.tiles_evicted,
        )?;
        write!(
            f,
            " mean={:?} slowest={:?} per-tile={:?} listeners={:?}",
            self.mean_update_time(),
            self.slowest_update,
            self.mean_generate_time(),
            self.notify_time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(loaded: usize, unloaded: usize, ms: u64) -> UpdateStats {
        UpdateStats {
            tiles_loaded: loaded,
            tiles_unloaded: unloaded,
            update_time: Duration::from_millis(ms),
            generate_time: Duration::from_millis(ms / 2),
            notify_time: Duration::from_millis(1),
            ..UpdateStats::default()
        }
    }

    #[test]
    fn debounced_calls_only_bump_their_counter() {
        let mut totals = StreamTotals::default();
        totals.record(&UpdateStats {
            debounced: true,
            update_time: Duration::from_millis(50),
            ..UpdateStats::default()
        });
        assert_eq!(totals.debounced, 1);
        assert_eq!(totals.processed, 0);
        assert_eq!(totals.update_time, Duration::ZERO);
        assert_eq!(totals.debounce_ratio(), 1.0);
    }

    #[test]
    fn processed_calls_accumulate_tiles_and_time() {
        let mut totals = StreamTotals::default();
        totals.record(&processed(12, 0, 40));
        totals.record(&processed(4, 3, 20));
        totals.record(&UpdateStats {
            debounced: true,
            ..UpdateStats::default()
        });

        assert_eq!(totals.calls(), 3);
        assert_eq!(totals.tiles_generated, 16);
        assert_eq!(totals.tiles_evicted, 3);
        assert_eq!(totals.mean_update_time(), Duration::from_millis(30));
        assert_eq!(totals.slowest_update, Duration::from_millis(40));
        // 30ms of synthesis over 16 tiles
        assert_eq!(totals.mean_generate_time(), Duration::from_micros(1875));
        assert_eq!(totals.notify_time, Duration::from_millis(2));
        assert!((totals.debounce_ratio() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_totals_report_zero() {
        let totals = StreamTotals::default();
        assert_eq!(totals.mean_update_time(), Duration::ZERO);
        assert_eq!(totals.mean_generate_time(), Duration::ZERO);
        assert_eq!(totals.debounce_ratio(), 0.0);
        assert!(totals.to_string().starts_with("updates=0 debounced=0"));
    }
}
