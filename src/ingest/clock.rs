//! Mapping between sampling positions and stream timestamps.
//!
//! Positions handed to `VideoSource::seek` are relative to the first picture
//! of the video track. Containers are free to start that track later than
//! zero (MPEG-TS commonly starts around 1.4s), so every conversion goes
//! through the track's start offset.

#![cfg_attr(not(feature = "ingest-file-ffmpeg"), allow(dead_code))]

/// Container-level seek units (`AV_TIME_BASE`).
pub(crate) const SEEK_UNITS_PER_SEC: f64 = 1_000_000.0;

/// Pictures this close before the requested position count as reached.
pub(crate) const POSITION_TOLERANCE_SECS: f64 = 1e-3;

/// Marker for an absent timestamp (`AV_NOPTS_VALUE`).
const NO_TIMESTAMP: i64 = i64::MIN;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StreamClock {
    time_base: f64,
    start_secs: f64,
}

impl StreamClock {
    /// `start_pts` is the track's start time in `time_base` units.
    pub(crate) fn new(time_base: f64, start_pts: i64) -> Self {
        let start_secs = if start_pts == NO_TIMESTAMP {
            0.0
        } else {
            start_pts as f64 * time_base
        };
        Self {
            time_base,
            start_secs,
        }
    }

    pub(crate) fn start_secs(&self) -> f64 {
        self.start_secs
    }

    /// Absolute container seek target for a relative position.
    pub(crate) fn seek_target(&self, position_secs: f64) -> i64 {
        ((self.start_secs + position_secs) * SEEK_UNITS_PER_SEC).round() as i64
    }

    /// Relative position of a picture timestamp.
    pub(crate) fn position_of(&self, pts: i64) -> f64 {
        pts as f64 * self.time_base - self.start_secs
    }

    /// Whether a decoded picture is at or past `position_secs`. Pictures
    /// without a timestamp are accepted as-is.
    pub(crate) fn reached(&self, pts: Option<i64>, position_secs: f64) -> bool {
        match pts {
            Some(pts) => self.position_of(pts) + POSITION_TOLERANCE_SECS >= position_secs,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MPEG_TS_TIME_BASE: f64 = 1.0 / 90_000.0;

    #[test]
    fn zero_start_maps_positions_directly() {
        let clock = StreamClock::new(1.0 / 1000.0, 0);
        assert_eq!(clock.start_secs(), 0.0);
        assert_eq!(clock.seek_target(2.5), 2_500_000);
        assert!((clock.position_of(2500) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn missing_start_is_treated_as_zero() {
        let clock = StreamClock::new(MPEG_TS_TIME_BASE, i64::MIN);
        assert_eq!(clock.start_secs(), 0.0);
        assert_eq!(clock.seek_target(1.0), 1_000_000);
    }

    #[test]
    fn late_start_offsets_seek_target() {
        // 1.4s start, 90kHz clock.
        let clock = StreamClock::new(MPEG_TS_TIME_BASE, 126_000);
        assert!((clock.start_secs() - 1.4).abs() < 1e-9);
        assert_eq!(clock.seek_target(0.0), 1_400_000);
        assert_eq!(clock.seek_target(1.0), 2_400_000);
    }

    #[test]
    fn first_picture_of_late_stream_only_satisfies_position_zero() {
        let clock = StreamClock::new(MPEG_TS_TIME_BASE, 126_000);
        let first = Some(126_000);
        assert!(clock.reached(first, 0.0));
        assert!(!clock.reached(first, 1.0));

        let one_second_in = Some(126_000 + 90_000);
        assert!(clock.reached(one_second_in, 1.0));
        assert!(!clock.reached(one_second_in, 2.0));
    }

    #[test]
    fn pictures_within_tolerance_count_as_reached() {
        let clock = StreamClock::new(1.0 / 10_000.0, 0);
        assert!(clock.reached(Some(19_995), 2.0));
        assert!(!clock.reached(Some(19_980), 2.0));
        assert!(clock.reached(None, 5.0));
    }
}
