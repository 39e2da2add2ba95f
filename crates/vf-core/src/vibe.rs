use serde::{Deserialize, Serialize};

/// Coarse musical-mood classification driving the visual tuning.
///
/// Closed set: every consumer matches exhaustively, unknown labels cannot
/// exist at runtime.
///
/// # Example
/// ```
/// use vf_core::vibe::Vibe;
/// assert!(matches!(Vibe::default(), Vibe::Neutral));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Vibe {
    /// High-energy, dense, loud (EDM drops, festival sets).
    Hype,
    /// Fast, driving, instrumental (drum'n'bass, techno).
    FastDrive,
    /// Bright vocal pop.
    PopBright,
    /// Darker, spacious vocal pop / R&B.
    PopMoody,
    /// Sparse, reverberant, slow.
    Ambient,
    /// Fallback when nothing matches with confidence.
    #[default]
    Neutral,
}

impl Vibe {
    /// Deterministic tie-break order, strongest claim first.
    pub const PRIORITY: [Vibe; 6] = [
        Vibe::Hype,
        Vibe::FastDrive,
        Vibe::PopBright,
        Vibe::PopMoody,
        Vibe::Ambient,
        Vibe::Neutral,
    ];

    /// Resolve the immutable visual tuning bundle for this vibe.
    ///
    /// Pure lookup, no state, no failure mode.
    ///
    /// # Example
    /// ```
    /// use vf_core::vibe::Vibe;
    /// let t = Vibe::Hype.tuning();
    /// assert!(t.allow_particles);
    /// ```
    #[must_use]
    pub const fn tuning(self) -> &'static VibeTuning {
        match self {
            Vibe::Hype => &HYPE,
            Vibe::FastDrive => &FAST_DRIVE,
            Vibe::PopBright => &POP_BRIGHT,
            Vibe::PopMoody => &POP_MOODY,
            Vibe::Ambient => &AMBIENT,
            Vibe::Neutral => &NEUTRAL,
        }
    }
}

/// Classification phase of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum VibePhase {
    /// Accumulating evidence, label may still change.
    #[default]
    Collecting,
    /// Label frozen for the rest of the session.
    Locked,
}

/// Immutable bundle of visual tuning constants keyed by vibe.
///
/// Looked up through `Vibe::tuning()`, never mutated at runtime.
#[derive(Clone, Copy, Debug)]
pub struct VibeTuning {
    /// Upper bound for the speaker/bar magnitude [0.0, 1.0].
    pub speaker_cap: f32,
    /// Attack time constant for bar animation (seconds).
    pub bar_attack_time: f32,
    /// Release time constant for bar animation (seconds).
    pub bar_release_time: f32,
    /// Whether the particle layer may spawn.
    pub allow_particles: bool,
    /// Palette warmth bias [0.0 cold, 1.0 warm].
    pub palette_warmth: f32,
    /// Saturation multiplier applied to the palette.
    pub saturation_boost: f32,
    /// Strength of the vocal aura overlay [0.0, 1.0].
    pub vocal_aura_strength: f32,
    /// Vignette darkness [0.0, 1.0].
    pub vignette_darkness: f32,
}

const HYPE: VibeTuning = VibeTuning {
    speaker_cap: 1.0,
    bar_attack_time: 0.02,
    bar_release_time: 0.22,
    allow_particles: true,
    palette_warmth: 0.80,
    saturation_boost: 1.35,
    vocal_aura_strength: 0.55,
    vignette_darkness: 0.25,
};

const FAST_DRIVE: VibeTuning = VibeTuning {
    speaker_cap: 0.92,
    bar_attack_time: 0.03,
    bar_release_time: 0.18,
    allow_particles: true,
    palette_warmth: 0.55,
    saturation_boost: 1.20,
    vocal_aura_strength: 0.35,
    vignette_darkness: 0.35,
};

const POP_BRIGHT: VibeTuning = VibeTuning {
    speaker_cap: 0.85,
    bar_attack_time: 0.04,
    bar_release_time: 0.30,
    allow_particles: true,
    palette_warmth: 0.70,
    saturation_boost: 1.15,
    vocal_aura_strength: 0.80,
    vignette_darkness: 0.15,
};

const POP_MOODY: VibeTuning = VibeTuning {
    speaker_cap: 0.80,
    bar_attack_time: 0.06,
    bar_release_time: 0.40,
    allow_particles: false,
    palette_warmth: 0.35,
    saturation_boost: 0.95,
    vocal_aura_strength: 0.70,
    vignette_darkness: 0.50,
};

const AMBIENT: VibeTuning = VibeTuning {
    speaker_cap: 0.60,
    bar_attack_time: 0.12,
    bar_release_time: 0.80,
    allow_particles: false,
    palette_warmth: 0.45,
    saturation_boost: 0.85,
    vocal_aura_strength: 0.30,
    vignette_darkness: 0.60,
};

const NEUTRAL: VibeTuning = VibeTuning {
    speaker_cap: 0.75,
    bar_attack_time: 0.05,
    bar_release_time: 0.35,
    allow_particles: false,
    palette_warmth: 0.50,
    saturation_boost: 1.00,
    vocal_aura_strength: 0.50,
    vignette_darkness: 0.40,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_lookup_is_stable_and_distinct() {
        // Same vibe always yields the same bundle.
        assert!(std::ptr::eq(Vibe::Hype.tuning(), Vibe::Hype.tuning()));
        // A couple of spot checks that the bundles actually differ.
        assert!(Vibe::Hype.tuning().speaker_cap > Vibe::Ambient.tuning().speaker_cap);
        assert!(
            Vibe::Ambient.tuning().bar_release_time > Vibe::FastDrive.tuning().bar_release_time
        );
        assert!(!Vibe::Neutral.tuning().allow_particles);
    }

    #[test]
    fn priority_covers_every_variant_once() {
        let p = Vibe::PRIORITY;
        assert_eq!(p.len(), 6);
        for (i, a) in p.iter().enumerate() {
            for b in &p[i + 1..] {
                assert_ne!(a, b, "priority order must not repeat variants");
            }
        }
        assert_eq!(p[0], Vibe::Hype);
        assert_eq!(p[5], Vibe::Neutral);
    }
}
