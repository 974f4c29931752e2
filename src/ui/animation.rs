use std::time::{Duration, Instant};

/// Easing function for UI fades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed interpolation.
    Linear,
    /// Cubic ease-out: fast start, slow end (deceleration).
    EaseOut,
}

/// Apply an easing function to a linear progress value `t` in [0, 1].
fn ease(t: f32, easing: Easing) -> f32 {
    match easing {
        Easing::Linear => t,
        Easing::EaseOut => {
            // 1-(1-t)³
            let f = 1.0 - t;
            1.0 - f * f * f
        }
    }
}

/// Opacity ramp from 0 to 1 for whatever is currently shown, keyed by an
/// id so re-showing the same thing does not restart the fade.
///
/// Ticks on wall-clock time (Instant). Callers keep requesting frames while
/// `is_active` is true.
pub struct Fade {
    duration: Duration,
    easing: Easing,
    current: Option<(u64, Instant)>,
}

impl Fade {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            current: None,
        }
    }

    /// Show `key`. Restarts the ramp only if `key` differs from what is
    /// already showing.
    pub fn show(&mut self, key: u64, now: Instant) {
        match self.current {
            Some((k, _)) if k == key => {}
            _ => self.current = Some((key, now)),
        }
    }

    pub fn hide(&mut self) {
        self.current = None;
    }

    /// Current opacity; 0 when hidden.
    pub fn opacity(&self, now: Instant) -> f32 {
        let Some((_, start)) = self.current else {
            return 0.0;
        };
        let elapsed = now.saturating_duration_since(start);
        if self.duration.is_zero() || elapsed >= self.duration {
            return 1.0;
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        ease(t, self.easing)
    }

    /// True while a fade is still ramping up.
    pub fn is_active(&self, now: Instant) -> bool {
        match self.current {
            Some((_, start)) => {
                !self.duration.is_zero() && now.saturating_duration_since(start) < self.duration
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_linear() {
        assert!((ease(0.0, Easing::Linear)).abs() < 1e-6);
        assert!((ease(0.5, Easing::Linear) - 0.5).abs() < 1e-6);
        assert!((ease(1.0, Easing::Linear) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ease_out_monotonic() {
        let mut prev = 0.0_f32;
        for i in 1..=100 {
            let v = ease(i as f32 / 100.0, Easing::EaseOut);
            assert!(v >= prev, "ease_out must be monotonically increasing");
            prev = v;
        }
        assert!(ease(0.25, Easing::EaseOut) > 0.25);
    }

    #[test]
    fn fade_ramps_over_duration() {
        let mut fade = Fade::new(Duration::from_millis(200), Easing::Linear);
        let t0 = Instant::now();
        assert_eq!(fade.opacity(t0), 0.0);

        fade.show(7, t0);
        assert!(fade.opacity(t0).abs() < 1e-6);
        let mid = fade.opacity(t0 + Duration::from_millis(100));
        assert!((mid - 0.5).abs() < 0.01);
        assert!(fade.is_active(t0 + Duration::from_millis(100)));
        assert_eq!(fade.opacity(t0 + Duration::from_millis(200)), 1.0);
        assert!(!fade.is_active(t0 + Duration::from_millis(200)));
    }

    #[test]
    fn same_key_does_not_restart() {
        let mut fade = Fade::new(Duration::from_millis(200), Easing::Linear);
        let t0 = Instant::now();
        fade.show(1, t0);
        fade.show(1, t0 + Duration::from_millis(150));
        assert_eq!(fade.opacity(t0 + Duration::from_millis(200)), 1.0);

        fade.show(2, t0 + Duration::from_millis(200));
        assert!(fade.opacity(t0 + Duration::from_millis(200)) < 1e-6);
        assert!(fade.is_active(t0 + Duration::from_millis(200)));
    }

    #[test]
    fn hide_resets() {
        let mut fade = Fade::new(Duration::from_millis(200), Easing::EaseOut);
        let t0 = Instant::now();
        fade.show(1, t0);
        fade.hide();
        assert!(!fade.is_active(t0));
        assert_eq!(fade.opacity(t0 + Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn zero_duration_is_fully_visible() {
        let mut fade = Fade::new(Duration::ZERO, Easing::Linear);
        let t0 = Instant::now();
        fade.show(3, t0);
        assert_eq!(fade.opacity(t0), 1.0);
        assert!(!fade.is_active(t0));
    }
}
