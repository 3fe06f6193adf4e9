use virtual_window::Align;

/// Progress curve of an animated scroll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    #[default]
    SmoothStep,
    EaseInOutCubic,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` to eased progress; out-of-range input is clamped.
    pub fn ease(self, progress: f64) -> f64 {
        let t = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::EaseInOutCubic if t < 0.5 => 4.0 * t.powi(3),
            Self::EaseInOutCubic => 1.0 + 0.5 * (2.0 * t - 2.0).powi(3),
        }
    }
}

/// What an animated scroll is heading for.
///
/// Key targets are resolved again on every step, so the animation lands on the item even when
/// measurements move it while scrolling.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ScrollTarget<K> {
    Offset(f64),
    Key { key: K, align: Align },
}

/// An animated scroll in flight, owned by [`crate::Session`].
#[derive(Clone, Debug)]
pub(crate) struct ScrollTween<K> {
    pub(crate) target: ScrollTarget<K>,
    origin: f64,
    started_ms: u64,
    duration_ms: u64,
    easing: Easing,
}

impl<K> ScrollTween<K> {
    pub(crate) fn new(
        origin: f64,
        target: ScrollTarget<K>,
        started_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> Self {
        Self {
            target,
            origin,
            started_ms,
            duration_ms: duration_ms.max(1),
            easing,
        }
    }

    fn progress(&self, now_ms: u64) -> f64 {
        let elapsed = now_ms.saturating_sub(self.started_ms);
        (elapsed as f64 / self.duration_ms as f64).min(1.0)
    }

    pub(crate) fn is_finished(&self, now_ms: u64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    /// Offset at `now_ms` on the way from the origin to `resolved`.
    pub(crate) fn offset_at(&self, now_ms: u64, resolved: f64) -> f64 {
        if self.is_finished(now_ms) {
            return resolved;
        }
        let eased = self.easing.ease(self.progress(now_ms));
        self.origin + (resolved - self.origin) * eased
    }
}
