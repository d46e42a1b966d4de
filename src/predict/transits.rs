use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use super::observer::ObserverPosition;
use super::pass_finder::PassSource;
use super::types::{ElementSet, LookSample, PassCandidate, VisibilityWindow};
use crate::error::TransitResult;

pub const DEFAULT_MIN_ELEVATION_DEG: f64 = 10.0;
pub const LOOK_AHEAD_HOURS: i64 = 24;

/// Source of the weather summary attached to each window. Never fails; a
/// missing forecast is described in the returned text.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn forecast(&self, latitude: f64, longitude: f64, at: NaiveDateTime) -> String;
}

/// Visibility windows above `min_elevation` during the next
/// [`LOOK_AHEAD_HOURS`] from `now`, in the order the pass source produced
/// them. With `weather` set, each window carries the forecast at its peak.
pub async fn compute_transits(
    source: &dyn PassSource,
    weather: Option<&dyn WeatherLookup>,
    elements: &ElementSet,
    observer: &ObserverPosition,
    min_elevation: f64,
    now: DateTime<Utc>,
) -> TransitResult<Vec<VisibilityWindow>> {
    let end = now + Duration::hours(LOOK_AHEAD_HOURS);
    let candidates = source.transits(elements, observer, now, end)?;
    log::debug!(
        "{}: {} raw passes between {} and {}",
        elements.norad_id(),
        candidates.len(),
        now,
        end
    );

    let mut windows = visibility_windows(&candidates, min_elevation);

    if let Some(weather) = weather {
        for window in &mut windows {
            let summary = weather
                .forecast(
                    observer.latitude_deg,
                    observer.longitude_deg,
                    window.culmination_time,
                )
                .await;
            window.weather_forecast = Some(summary);
        }
    }

    Ok(windows)
}

/// Reduce raw passes to reportable windows. Passes that never rise above
/// `min_elevation`, or touch it only for an instant, are dropped.
pub fn visibility_windows(candidates: &[PassCandidate], min_elevation: f64) -> Vec<VisibilityWindow> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let clipped = clip_above(&candidate.samples, min_elevation)?;
            window_from_trace(&clipped)
        })
        .collect()
}

/// The stretch of `samples` around the highest sample where elevation is at
/// least `min_elevation`, with its ends moved onto the exact threshold
/// crossings.
pub fn clip_above(samples: &[LookSample], min_elevation: f64) -> Option<Vec<LookSample>> {
    let peak = peak_index(samples)?;
    if samples[peak].elevation_deg < min_elevation {
        return None;
    }

    let mut first = peak;
    while first > 0 && samples[first - 1].elevation_deg >= min_elevation {
        first -= 1;
    }
    let mut last = peak;
    while last + 1 < samples.len() && samples[last + 1].elevation_deg >= min_elevation {
        last += 1;
    }

    let mut clipped = Vec::with_capacity(last - first + 3);
    if first > 0 {
        let crossing = crossing(&samples[first - 1], &samples[first], min_elevation);
        if crossing.time < samples[first].time {
            clipped.push(crossing);
        }
    }
    clipped.extend_from_slice(&samples[first..=last]);
    if last + 1 < samples.len() {
        let crossing = crossing(&samples[last + 1], &samples[last], min_elevation);
        if crossing.time > samples[last].time {
            clipped.push(crossing);
        }
    }

    Some(clipped)
}

fn window_from_trace(samples: &[LookSample]) -> Option<VisibilityWindow> {
    let first = samples.first()?;
    let last = samples.last()?;
    let duration_seconds = (last.time - first.time).num_milliseconds() as f64 / 1000.0;
    if duration_seconds <= 0.0 {
        return None;
    }

    let peak = &samples[peak_index(samples)?];
    if peak.time <= first.time || peak.time >= last.time {
        log::debug!(
            "dropping window {} - {}: culmination at {} is on an edge",
            first.time,
            last.time,
            peak.time
        );
        return None;
    }

    Some(VisibilityWindow {
        start_time: first.time.naive_utc(),
        end_time: last.time.naive_utc(),
        duration_seconds,
        max_elevation: round2(peak.elevation_deg),
        culmination_time: peak.time.naive_utc(),
        start_azimuth: round2(first.azimuth_deg),
        max_elevation_azimuth: round2(peak.azimuth_deg),
        end_azimuth: round2(last.azimuth_deg),
        weather_forecast: None,
    })
}

/// Index of the first sample with the highest elevation.
fn peak_index(samples: &[LookSample]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, sample) in samples.iter().enumerate() {
        match best {
            Some(b) if samples[b].elevation_deg >= sample.elevation_deg => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Point where elevation reaches `threshold` between a sample below it
/// (`outside`) and one at or above it (`inside`), linearly interpolated.
fn crossing(outside: &LookSample, inside: &LookSample, threshold: f64) -> LookSample {
    let rise = inside.elevation_deg - outside.elevation_deg;
    let frac = if rise > 0.0 {
        ((threshold - outside.elevation_deg) / rise).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let span_ms = (inside.time - outside.time).num_milliseconds() as f64;
    let time = outside.time + Duration::milliseconds((span_ms * frac).round() as i64);

    // Shortest way round the compass
    let delta = (inside.azimuth_deg - outside.azimuth_deg + 540.0).rem_euclid(360.0) - 180.0;
    let azimuth_deg = (outside.azimuth_deg + delta * frac).rem_euclid(360.0);

    LookSample {
        time,
        elevation_deg: threshold,
        azimuth_deg,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
