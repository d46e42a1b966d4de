mod observer;
mod parsing;
mod pass_finder;
mod propagation;
mod transits;
mod types;

pub use observer::ObserverPosition;
pub use pass_finder::{PassSource, Sgp4PassSource};
pub use propagation::Propagator;
pub use transits::{
    clip_above, compute_transits, visibility_windows, WeatherLookup, DEFAULT_MIN_ELEVATION_DEG,
    LOOK_AHEAD_HOURS,
};
pub use types::{ElementSet, LookSample, PassCandidate, VisibilityWindow};
