//! Fade-out curve for the end of a countdown
//!
//! Linear ramp from the original volume down to silence across the fade
//! window. Outside the window the original volume is returned unchanged.

/// Volume to apply with `remaining_ms` left on the clock
pub fn fade_volume(original_volume: f32, remaining_ms: u64, fade_window_ms: u64) -> f32 {
    let original_volume = original_volume.clamp(0.0, 1.0);
    if fade_window_ms == 0 || remaining_ms >= fade_window_ms {
        return original_volume;
    }

    let progress = remaining_ms as f64 / fade_window_ms as f64;
    (original_volume as f64 * progress).clamp(0.0, original_volume as f64) as f32
}

/// Whether `remaining_ms` falls inside the fade window
pub fn in_fade_window(remaining_ms: u64, fade_window_ms: u64) -> bool {
    fade_window_ms > 0 && remaining_ms <= fade_window_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_window_keeps_volume() {
        assert_eq!(fade_volume(0.8, 60_000, 30_000), 0.8);
        assert_eq!(fade_volume(0.8, 30_000, 30_000), 0.8);
    }

    #[test]
    fn test_linear_ramp() {
        assert!((fade_volume(0.8, 15_000, 30_000) - 0.4).abs() < 1e-6);
        assert!((fade_volume(1.0, 3_000, 30_000) - 0.1).abs() < 1e-6);
        assert_eq!(fade_volume(0.8, 0, 30_000), 0.0);
    }

    #[test]
    fn test_never_exceeds_original() {
        for remaining in (0..=30_000).step_by(250) {
            let volume = fade_volume(0.65, remaining, 30_000);
            assert!((0.0..=0.65).contains(&volume));
        }
    }

    #[test]
    fn test_zero_window_disables_fade() {
        assert_eq!(fade_volume(0.5, 0, 0), 0.5);
        assert!(!in_fade_window(0, 0));
    }

    #[test]
    fn test_out_of_range_volume_is_clamped() {
        assert_eq!(fade_volume(1.7, 60_000, 30_000), 1.0);
        assert_eq!(fade_volume(-0.3, 10_000, 30_000), 0.0);
    }
}
