use std::fmt::{self, Display};
use std::time::{Duration, Instant};

/// Runs the given closure and returns its result together with the elapsed
/// wall-clock time.
///
/// # Arguments
/// * `f` - The closure to measure.
pub fn time<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let t0 = Instant::now();
    let value = f();

    (value, t0.elapsed())
}

/// The duration and hit count of one query batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryReport {
    pub elapsed: Duration,
    pub hits: usize,
}

/// The measurements of one thread-count configuration of the sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepReport {
    pub num_threads: usize,
    pub rays: QueryReport,
    pub points: QueryReport,
}

/// The timings and hit counts of a full benchmark run: the scene generation
/// and build phases, followed by one entry per configured thread count.
#[derive(Debug, Default)]
pub struct BenchReport {
    pub generate: Duration,
    pub build: Duration,
    pub sweeps: Vec<SweepReport>,
}

impl BenchReport {
    /// Returns `true` if every sweep produced the same hit counts as the
    /// first one. The traversal result must not depend on the thread count.
    pub fn hits_agree(&self) -> bool {
        match self.sweeps.split_first() {
            Some((first, rest)) => rest
                .iter()
                .all(|s| s.rays.hits == first.rays.hits && s.points.hits == first.points.hits),
            None => true,
        }
    }
}

#[inline]
fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1e3f64
}

/// The speedup of `elapsed` relative to the first sweep of the run.
fn speedup(baseline: Duration, elapsed: Duration) -> f64 {
    if elapsed.is_zero() {
        1f64
    } else {
        baseline.as_secs_f64() / elapsed.as_secs_f64()
    }
}

impl Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "generate: {:.2} ms", ms(self.generate))?;
        writeln!(f, "build: {:.2} ms", ms(self.build))?;

        let baseline = match self.sweeps.first() {
            Some(first) => first,
            None => return Ok(()),
        };

        for sweep in self.sweeps.iter() {
            writeln!(
                f,
                "{:>2} threads: rays {:.2} ms (x{:.2}, {} hits), points {:.2} ms (x{:.2}, {} hits)",
                sweep.num_threads,
                ms(sweep.rays.elapsed),
                speedup(baseline.rays.elapsed, sweep.rays.elapsed),
                sweep.rays.hits,
                ms(sweep.points.elapsed),
                speedup(baseline.points.elapsed, sweep.points.elapsed),
                sweep.points.hits,
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn query(elapsed_ms: u64, hits: usize) -> QueryReport {
        QueryReport {
            elapsed: Duration::from_millis(elapsed_ms),
            hits,
        }
    }

    #[test]
    fn test_hits_agree() {
        let mut report = BenchReport::default();
        assert!(report.hits_agree());

        report.sweeps.push(SweepReport {
            num_threads: 1,
            rays: query(100, 10),
            points: query(50, 5),
        });
        report.sweeps.push(SweepReport {
            num_threads: 4,
            rays: query(30, 10),
            points: query(15, 5),
        });
        assert!(report.hits_agree());

        report.sweeps.push(SweepReport {
            num_threads: 8,
            rays: query(20, 11),
            points: query(10, 5),
        });
        assert!(!report.hits_agree());
    }

    #[test]
    fn test_display() {
        let report = BenchReport {
            generate: Duration::from_millis(10),
            build: Duration::from_millis(20),
            sweeps: vec![
                SweepReport {
                    num_threads: 1,
                    rays: query(100, 42),
                    points: query(50, 7),
                },
                SweepReport {
                    num_threads: 2,
                    rays: query(50, 42),
                    points: query(25, 7),
                },
            ],
        };

        let text = report.to_string();

        assert!(text.contains("build: 20.00 ms"));
        assert!(text.contains("x2.00"));
        assert!(text.contains("42 hits"));
    }
}
