use thiserror::Error;

use crate::geometry::Rect;

/// Everything that can go wrong while ticking the dashboard.
///
/// None of these are fatal once the panel is up: the tick loop logs them and
/// carries on with the next tick.
#[derive(Error, Debug)]
pub enum Error {
    #[error("telemetry unavailable: {reason}")]
    SampleUnavailable { reason: String },

    #[error("malformed touch sample ({x},{y}): {reason}")]
    TouchDecode { x: i32, y: i32, reason: &'static str },

    #[error("cannot map {rect} onto the panel: {reason}")]
    RegionMapping { rect: Rect, reason: &'static str },

    #[error("panel transport failed during {op}: {reason}")]
    Transport { op: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
