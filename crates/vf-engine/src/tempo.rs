use vf_core::config::EngineConfig;

/// Hints below this BPM are analyzer artifacts, not tempo.
pub const MIN_PLAUSIBLE_BPM: f32 = 40.0;
/// Hints above this BPM are analyzer artifacts, not tempo.
pub const MAX_PLAUSIBLE_BPM: f32 = 220.0;

/// Running BPM estimate blended from confident frame-level hints.
///
/// Confident hints pull the estimate proportionally to their confidence;
/// the tracker's own confidence decays once hints go stale.
///
/// # Example
/// ```
/// use vf_core::config::EngineConfig;
/// use vf_engine::tempo::TempoTracker;
/// let tracker = TempoTracker::new(&EngineConfig::default());
/// assert_eq!(tracker.bpm(), 120.0);
/// ```
pub struct TempoTracker {
    bpm: f32,
    confidence: f32,
    /// Seconds since the last accepted hint.
    since_accepted: f32,
    /// Implausible nonzero hints seen, for diagnostics.
    rejected_hints: u64,
    min_hint_confidence: f32,
    blend_rate: f32,
    staleness_window: f32,
    rise_tau: f32,
    decay_tau: f32,
}

impl TempoTracker {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            bpm: 120.0,
            confidence: 0.0,
            since_accepted: 0.0,
            rejected_hints: 0,
            min_hint_confidence: config.tempo_min_hint_confidence,
            blend_rate: config.tempo_blend_rate,
            staleness_window: config.tempo_staleness_window,
            rise_tau: config.tempo_confidence_rise,
            decay_tau: config.tempo_confidence_decay,
        }
    }

    /// Fold one frame's tempo hint into the estimate.
    ///
    /// Returns `(current_bpm, bpm_confidence)`. Hints outside the
    /// plausible range are ignored entirely; a zero hint means the
    /// analyzer had nothing to offer and is not counted as rejected.
    pub fn update(&mut self, bpm_hint: f32, hint_confidence: f32, dt: f32) -> (f32, f32) {
        let plausible = (MIN_PLAUSIBLE_BPM..=MAX_PLAUSIBLE_BPM).contains(&bpm_hint);
        if !plausible && bpm_hint > 0.0 {
            self.rejected_hints += 1;
        }

        if plausible && hint_confidence >= self.min_hint_confidence {
            // Higher-confidence hints move the estimate faster.
            let alpha = 1.0 - (-dt * self.blend_rate * hint_confidence).exp();
            self.bpm += (bpm_hint - self.bpm) * alpha;
            self.bpm = self.bpm.clamp(MIN_PLAUSIBLE_BPM, MAX_PLAUSIBLE_BPM);

            let rise = 1.0 - (-dt / self.rise_tau).exp();
            self.confidence += (hint_confidence - self.confidence) * rise;
            self.since_accepted = 0.0;
        } else {
            self.since_accepted += dt;
            if self.since_accepted > self.staleness_window {
                let decay = 1.0 - (-dt / self.decay_tau).exp();
                self.confidence -= self.confidence * decay;
            }
        }

        self.confidence = self.confidence.clamp(0.0, 1.0);
        (self.bpm, self.confidence)
    }

    /// Current BPM estimate.
    #[inline]
    #[must_use]
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Confidence of the estimate [0, 1].
    #[inline]
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Count of implausible nonzero hints seen since the last reset.
    #[inline]
    #[must_use]
    pub fn rejected_hints(&self) -> u64 {
        self.rejected_hints
    }
}
