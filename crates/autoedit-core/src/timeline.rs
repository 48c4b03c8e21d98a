//! Mapping between a horizontal track and media time.

/// Time under `pixel_offset` on a track `track_width` pixels wide.
///
/// The ratio is clamped to `[0, 1]`, so drags that start or end outside the
/// track still land inside `[0, duration]`.
pub fn position_from_offset(pixel_offset: f64, track_width: f64, duration: f64) -> f64 {
    if track_width <= 0.0 || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    let ratio = (pixel_offset / track_width).clamp(0.0, 1.0);
    if ratio.is_nan() {
        return 0.0;
    }
    ratio * duration
}

/// Inverse of [`position_from_offset`].
pub fn offset_from_position(seconds: f64, track_width: f64, duration: f64) -> f64 {
    if track_width <= 0.0 || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    (seconds / duration).clamp(0.0, 1.0) * track_width
}

/// Seek target for a track interaction, or `None` while nothing is loaded.
pub fn seek_target(pixel_offset: f64, track_width: f64, duration: f64) -> Option<f64> {
    if duration <= 0.0 || track_width <= 0.0 {
        return None;
    }
    Some(position_from_offset(pixel_offset, track_width, duration))
}

/// Fraction of the track covered by a `[start, end]` window, as
/// `(left, width)`, both in `[0, 1]`.
pub fn marker_span(start_time: f64, end_time: f64, duration: f64) -> Option<(f64, f64)> {
    if duration <= 0.0 || end_time <= start_time {
        return None;
    }
    let left = (start_time / duration).clamp(0.0, 1.0);
    let right = (end_time / duration).clamp(0.0, 1.0);
    Some((left, right - left))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_outside_the_track_are_clamped() {
        assert_eq!(position_from_offset(-50.0, 200.0, 120.0), 0.0);
        assert_eq!(position_from_offset(250.0, 200.0, 120.0), 120.0);
    }

    #[test]
    fn midpoint_maps_to_half_duration() {
        assert_eq!(position_from_offset(100.0, 200.0, 120.0), 60.0);
        assert_eq!(offset_from_position(60.0, 200.0, 120.0), 100.0);
    }

    #[test]
    fn zero_duration_rejects_seek() {
        assert_eq!(seek_target(100.0, 200.0, 0.0), None);
        assert_eq!(seek_target(100.0, 0.0, 50.0), None);
        assert_eq!(position_from_offset(100.0, 200.0, 0.0), 0.0);
    }

    #[test]
    fn marker_covers_window_fraction() {
        assert_eq!(marker_span(25.0, 50.0, 100.0), Some((0.25, 0.25)));
        let (left, width) = marker_span(90.0, 150.0, 100.0).unwrap();
        assert_eq!(left, 0.9);
        assert!((width - 0.1).abs() < 1e-9);
        assert_eq!(marker_span(5.0, 5.0, 100.0), None);
        assert_eq!(marker_span(1.0, 2.0, 0.0), None);
    }
}
