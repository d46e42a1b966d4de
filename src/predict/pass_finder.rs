use chrono::{DateTime, Duration, Utc};

use super::observer::ObserverPosition;
use super::propagation::Propagator;
use super::types::{ElementSet, LookSample, PassCandidate};
use crate::error::TransitResult;

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement
const TRACE_STEP_SECONDS: i64 = 10;
const HORIZON_ELEVATION: f64 = 0.0;

/// Produces horizon-to-horizon pass candidates for an element set.
pub trait PassSource: Send + Sync {
    /// Passes overlapping `[start, end]`, in chronological order. Passes cut
    /// by either bound are truncated to it.
    fn transits(
        &self,
        elements: &ElementSet,
        observer: &ObserverPosition,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TransitResult<Vec<PassCandidate>>;
}

/// [`PassSource`] backed by SGP4 propagation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sgp4PassSource;

impl PassSource for Sgp4PassSource {
    fn transits(
        &self,
        elements: &ElementSet,
        observer: &ObserverPosition,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TransitResult<Vec<PassCandidate>> {
        let propagator = Propagator::from_element_set(elements)?;
        let finder = PassFinder {
            propagator: &propagator,
            observer,
        };
        finder.find(start, end)
    }
}

struct PassFinder<'a> {
    propagator: &'a Propagator,
    observer: &'a ObserverPosition,
}

impl PassFinder<'_> {
    fn find(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> TransitResult<Vec<PassCandidate>> {
        let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
        let mut passes = Vec::new();
        let mut cursor = start;
        let mut prev_visible = false;
        let mut pass_start: Option<DateTime<Utc>> = None;

        while cursor <= end {
            let visible = self.sample(cursor)?.elevation_deg >= HORIZON_ELEVATION;

            if visible && !prev_visible {
                // Already up when the window opens: the pass starts with it.
                let aos = if cursor == start {
                    start
                } else {
                    self.refine_crossing(cursor - coarse_step, cursor, true)?
                };
                pass_start = Some(aos);
            } else if !visible && prev_visible {
                if let Some(aos) = pass_start.take() {
                    let los = self.refine_crossing(cursor - coarse_step, cursor, false)?;
                    passes.push(self.trace(aos, los)?);
                }
            }

            prev_visible = visible;
            cursor += coarse_step;
        }

        // Pass still in progress when the window closes
        if let Some(aos) = pass_start {
            passes.push(self.trace(aos, end)?);
        }

        Ok(passes)
    }

    fn sample(&self, at: DateTime<Utc>) -> TransitResult<LookSample> {
        self.propagator.look_angle(self.observer, at)
    }

    /// Look angles from `aos` to `los` inclusive at a fixed cadence.
    fn trace(&self, aos: DateTime<Utc>, los: DateTime<Utc>) -> TransitResult<PassCandidate> {
        let step = Duration::seconds(TRACE_STEP_SECONDS);
        let mut samples = Vec::new();
        let mut cursor = aos;
        while cursor < los {
            samples.push(self.sample(cursor)?);
            cursor += step;
        }
        samples.push(self.sample(los)?);
        Ok(PassCandidate { samples })
    }

    /// Binary search for the horizon crossing between `before` and `after`.
    fn refine_crossing(
        &self,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        rising: bool,
    ) -> TransitResult<DateTime<Utc>> {
        let mut low = before;
        let mut high = after;

        while (high - low).num_seconds() > FINE_STEP_SECONDS {
            let mid = low + (high - low) / 2;
            let above = self.sample(mid)?.elevation_deg >= HORIZON_ELEVATION;
            if above == rising {
                high = mid;
            } else {
                low = mid;
            }
        }

        // Rising: first instant above. Setting: last instant above.
        Ok(if rising { high } else { low })
    }
}
