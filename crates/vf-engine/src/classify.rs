use vf_core::config::EngineConfig;
use vf_core::frame::FeatureFrame;
use vf_core::vibe::{Vibe, VibePhase};

/// Hand-authored feature centroid characterizing one vibe.
struct VibeProfile {
    vibe: Vibe,
    /// Target point over (energy, brightness, vocality, space, density, valence).
    centroid: [f32; 6],
    /// Per-axis weights of the distance function.
    weights: [f32; 6],
    /// Preferred tempo band (BPM).
    bpm_lo: f32,
    bpm_hi: f32,
}

/// Profiles in `Vibe::PRIORITY` order, so a forward scan doubles as the
/// deterministic tie-break.
const PROFILES: [VibeProfile; 6] = [
    VibeProfile {
        vibe: Vibe::Hype,
        centroid: [0.90, 0.60, 0.50, 0.30, 0.85, 0.70],
        weights: [1.2, 0.8, 0.6, 0.5, 1.2, 0.7],
        bpm_lo: 120.0,
        bpm_hi: 160.0,
    },
    VibeProfile {
        vibe: Vibe::FastDrive,
        centroid: [0.78, 0.55, 0.20, 0.35, 0.75, 0.55],
        weights: [1.0, 0.7, 1.0, 0.5, 1.1, 0.6],
        bpm_lo: 125.0,
        bpm_hi: 185.0,
    },
    VibeProfile {
        vibe: Vibe::PopBright,
        centroid: [0.65, 0.70, 0.75, 0.40, 0.55, 0.75],
        weights: [0.8, 1.0, 1.2, 0.5, 0.7, 1.0],
        bpm_lo: 95.0,
        bpm_hi: 130.0,
    },
    VibeProfile {
        vibe: Vibe::PopMoody,
        centroid: [0.50, 0.38, 0.70, 0.60, 0.42, 0.35],
        weights: [0.8, 1.0, 1.2, 0.8, 0.7, 1.0],
        bpm_lo: 75.0,
        bpm_hi: 115.0,
    },
    VibeProfile {
        vibe: Vibe::Ambient,
        centroid: [0.25, 0.35, 0.20, 0.80, 0.15, 0.50],
        weights: [1.1, 0.7, 0.9, 1.0, 1.2, 0.5],
        bpm_lo: 40.0,
        bpm_hi: 90.0,
    },
    VibeProfile {
        vibe: Vibe::Neutral,
        centroid: [0.50, 0.50, 0.50, 0.50, 0.50, 0.50],
        weights: [1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        bpm_lo: 40.0,
        bpm_hi: 220.0,
    },
];

/// Share of the similarity carried by the six feature axes vs the tempo band.
const FEATURE_SHARE: f32 = 0.85;
const TEMPO_SHARE: f32 = 0.15;
/// BPM distance outside the band that zeroes the tempo term.
const TEMPO_FALLOFF_BPM: f32 = 60.0;

/// Similarity of a feature point (plus tempo) to one vibe's profile, in [0, 1].
///
/// 1.0 at the centroid with an in-band tempo, falling off linearly with
/// the weighted mean absolute distance per axis.
///
/// # Example
/// ```
/// use vf_core::vibe::Vibe;
/// use vf_engine::classify::similarity;
/// let hype = [0.90, 0.60, 0.50, 0.30, 0.85, 0.70];
/// assert!(similarity(Vibe::Hype, &hype, 130.0) > 0.99);
/// assert!(similarity(Vibe::Ambient, &hype, 130.0) < 0.6);
/// ```
#[must_use]
pub fn similarity(vibe: Vibe, features: &[f32; 6], bpm: f32) -> f32 {
    let profile = &PROFILES[Vibe::PRIORITY
        .iter()
        .position(|v| *v == vibe)
        .unwrap_or(PROFILES.len() - 1)];
    profile_similarity(profile, features, bpm)
}

fn profile_similarity(profile: &VibeProfile, features: &[f32; 6], bpm: f32) -> f32 {
    let mut dist = 0.0;
    let mut weight_sum = 0.0;
    for i in 0..6 {
        dist += profile.weights[i] * (features[i] - profile.centroid[i]).abs();
        weight_sum += profile.weights[i];
    }
    let feature_sim = 1.0 - dist / weight_sum;

    let band_dist = if bpm < profile.bpm_lo {
        profile.bpm_lo - bpm
    } else if bpm > profile.bpm_hi {
        bpm - profile.bpm_hi
    } else {
        0.0
    };
    let tempo_sim = 1.0 - (band_dist / TEMPO_FALLOFF_BPM).min(1.0);

    (FEATURE_SHARE * feature_sim + TEMPO_SHARE * tempo_sim).clamp(0.0, 1.0)
}

/// Evidence-accumulating classifier that locks one vibe per session.
///
/// Collecting: running exponentially-weighted means of the six feature
/// scores (plus the tempo estimate) are rescored against every profile
/// each frame. Locked: terminal, nothing moves again.
pub struct VibeClassifier {
    accum: [f32; 6],
    accum_bpm: f32,
    elapsed: f32,
    armed: bool,
    locked: Option<(Vibe, f32)>,
    collect_window: f32,
    lock_confidence: f32,
    tie_epsilon: f32,
    accum_tau: f32,
    fallback_deadline: f32,
}

impl VibeClassifier {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            accum: [0.0; 6],
            accum_bpm: 120.0,
            elapsed: 0.0,
            armed: false,
            locked: None,
            collect_window: config.collect_window,
            lock_confidence: config.lock_confidence,
            tie_epsilon: config.tie_epsilon,
            accum_tau: config.accum_tau,
            fallback_deadline: config.collect_window * config.fallback_factor,
        }
    }

    /// Fold one frame of evidence and return `(vibe, confidence, phase)`.
    pub fn update(&mut self, frame: &FeatureFrame, bpm: f32, dt: f32) -> (Vibe, f32, VibePhase) {
        if let Some((vibe, confidence)) = self.locked {
            return (vibe, confidence, VibePhase::Locked);
        }

        let point = [
            frame.energy,
            frame.brightness,
            frame.vocality,
            frame.space,
            frame.density,
            frame.valence,
        ];
        if self.armed {
            let alpha = 1.0 - (-dt / self.accum_tau).exp();
            for (mean, value) in self.accum.iter_mut().zip(point) {
                *mean += (value - *mean) * alpha;
            }
            self.accum_bpm += (bpm - self.accum_bpm) * alpha;
        } else {
            self.accum = point;
            self.accum_bpm = bpm;
            self.armed = true;
        }
        self.elapsed += dt;

        let (best, best_score) = self.best_match();

        if self.elapsed >= self.collect_window && best_score >= self.lock_confidence {
            self.locked = Some((best, best_score));
            log::debug!(
                "vibe locked: {best:?} at {best_score:.2} after {:.1}s",
                self.elapsed
            );
            return (best, best_score, VibePhase::Locked);
        }

        if self.elapsed >= self.fallback_deadline {
            self.locked = Some((Vibe::Neutral, 0.0));
            log::debug!(
                "no vibe reached {:.2} after {:.1}s, settling on Neutral",
                self.lock_confidence,
                self.elapsed
            );
            return (Vibe::Neutral, 0.0, VibePhase::Locked);
        }

        (best, best_score, VibePhase::Collecting)
    }

    /// Best-scoring profile under the deterministic tie-break: the first
    /// profile in priority order within `tie_epsilon` of the top score.
    fn best_match(&self) -> (Vibe, f32) {
        let mut scores = [0.0f32; 6];
        let mut top = 0.0f32;
        for (slot, profile) in scores.iter_mut().zip(&PROFILES) {
            *slot = profile_similarity(profile, &self.accum, self.accum_bpm);
            top = top.max(*slot);
        }
        for (score, profile) in scores.iter().zip(&PROFILES) {
            if *score >= top - self.tie_epsilon {
                return (profile.vibe, *score);
            }
        }
        (Vibe::Neutral, 0.0)
    }

    /// Seconds of evidence collected so far.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn frame_at(point: [f32; 6]) -> FeatureFrame {
        FeatureFrame {
            energy: point[0],
            brightness: point[1],
            vocality: point[2],
            space: point[3],
            density: point[4],
            valence: point[5],
            ..FeatureFrame::default()
        }
    }

    const HYPE_POINT: [f32; 6] = [0.90, 0.60, 0.50, 0.30, 0.85, 0.70];
    const AMBIENT_POINT: [f32; 6] = [0.25, 0.35, 0.20, 0.80, 0.15, 0.50];
    /// Matches nothing: extreme corners pull every profile's score down.
    const NOWHERE_POINT: [f32; 6] = [1.0, 0.0, 1.0, 0.0, 0.0, 1.0];

    #[test]
    fn similarity_peaks_at_the_centroid() {
        assert!(similarity(Vibe::Hype, &HYPE_POINT, 130.0) > 0.99);
        assert!(similarity(Vibe::Ambient, &AMBIENT_POINT, 70.0) > 0.99);
        // Off-centroid and out-of-band tempo both cost score.
        assert!(
            similarity(Vibe::Hype, &HYPE_POINT, 60.0) < similarity(Vibe::Hype, &HYPE_POINT, 130.0)
        );
        assert!(similarity(Vibe::Hype, &AMBIENT_POINT, 130.0) < 0.7);
    }

    #[test]
    fn sustained_hype_stream_locks_hype_at_window_end() {
        let mut classifier = VibeClassifier::new(&config());
        let frame = frame_at(HYPE_POINT);

        let mut t = 0.0f32;
        let mut phase = VibePhase::Collecting;
        let mut vibe = Vibe::Neutral;
        let mut confidence = 0.0;
        while t <= 10.01 {
            let (v, c, p) = classifier.update(&frame, 130.0, DT);
            vibe = v;
            confidence = c;
            phase = p;
            if t < 9.9 {
                assert_eq!(p, VibePhase::Collecting, "must not lock before the window");
            }
            t += DT;
        }
        assert_eq!(phase, VibePhase::Locked);
        assert_eq!(vibe, Vibe::Hype);
        assert!(
            confidence > 0.9,
            "a stream sitting on the centroid should lock near 1.0, got {confidence}"
        );
    }

    #[test]
    fn lock_is_monotone_terminal() {
        let mut classifier = VibeClassifier::new(&config());
        for _ in 0..(11.0 / DT) as usize {
            classifier.update(&frame_at(HYPE_POINT), 130.0, DT);
        }
        let (vibe, confidence, phase) = classifier.update(&frame_at(HYPE_POINT), 130.0, DT);
        assert_eq!(phase, VibePhase::Locked);

        // A long ambient tail must change nothing.
        for _ in 0..(5.0 / DT) as usize {
            let (v, c, p) = classifier.update(&frame_at(AMBIENT_POINT), 60.0, DT);
            assert_eq!(v, vibe);
            assert_eq!(c, confidence);
            assert_eq!(p, VibePhase::Locked);
        }
    }

    #[test]
    fn undecided_session_falls_back_to_neutral_zero() {
        let mut classifier = VibeClassifier::new(&config());
        let frame = frame_at(NOWHERE_POINT);
        let deadline = config().collect_window * config().fallback_factor;
        let mut last = (Vibe::Neutral, 1.0, VibePhase::Collecting);
        for _ in 0..((deadline + 1.0) / DT) as usize {
            last = classifier.update(&frame, 0.0, DT);
        }
        assert_eq!(last.2, VibePhase::Locked);
        assert_eq!(last.0, Vibe::Neutral);
        assert_eq!(last.1, 0.0, "fallback locks with zero confidence");
    }

    #[test]
    fn near_ties_resolve_by_priority_order() {
        // A wide-open epsilon turns the tie-break into pure priority:
        // several profiles score within 0.2 of the best on a mid-valued
        // stream, and the earliest of those must win deterministically.
        let mut cfg = config();
        cfg.tie_epsilon = 0.2;
        let mut wide = VibeClassifier::new(&cfg);
        let mut strict = VibeClassifier::new(&config());
        let frame = frame_at([0.5; 6]);
        for _ in 0..(11.0 / DT) as usize {
            wide.update(&frame, 100.0, DT);
            strict.update(&frame, 100.0, DT);
        }
        let (wide_vibe, _, _) = wide.update(&frame, 100.0, DT);
        let (strict_vibe, _, _) = strict.update(&frame, 100.0, DT);
        assert_eq!(strict_vibe, Vibe::Neutral, "tight epsilon keeps the true best");
        assert_eq!(
            wide_vibe,
            Vibe::FastDrive,
            "wide epsilon must pick the highest-priority candidate in range"
        );
    }

    #[test]
    fn collecting_phase_reports_running_best() {
        let mut classifier = VibeClassifier::new(&config());
        let (_, _, phase) = classifier.update(&frame_at(HYPE_POINT), 130.0, DT);
        assert_eq!(phase, VibePhase::Collecting);
        let (vibe, confidence, _) = classifier.update(&frame_at(HYPE_POINT), 130.0, DT);
        assert_eq!(vibe, Vibe::Hype, "the running best is visible while collecting");
        assert!(confidence > 0.9);
    }
}
