// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Counts sampling sweeps and reports the rate roughly once per second.
pub struct Throughput {
    window_start: Instant,
    sweeps: u64,
}

impl Throughput {
    pub fn new(now: Instant) -> Throughput {
        Throughput {
            window_start: now,
            sweeps: 0,
        }
    }

    /// Records a sweep. Returns the sweeps per second once a full window has passed and
    /// starts a new window.
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        self.sweeps += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < REPORT_INTERVAL {
            return None;
        }

        let rate = self.sweeps as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.sweeps = 0;
        Some(rate)
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use super::Throughput;

    #[test]
    fn test_reports_once_per_window() {
        let start = Instant::now();
        let mut throughput = Throughput::new(start);

        for i in 1..400 {
            assert_eq!(None, throughput.record(start + Duration::from_millis(i)));
        }
        let rate = throughput.record(start + Duration::from_secs(1));
        assert_eq!(Some(400.0), rate);

        // A new window has started.
        assert_eq!(
            None,
            throughput.record(start + Duration::from_millis(1500))
        );
        let rate = throughput.record(start + Duration::from_secs(3));
        assert_eq!(Some(1.0), rate);
    }
}
