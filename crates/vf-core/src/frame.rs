use serde::{Deserialize, Serialize};

/// Per-frame feature snapshot produced by the analysis front end.
///
/// Écrit par le thread d'analyse, consommé par le moteur.
/// Copy, taille fixe, zéro allocation.
///
/// All bounded scalars are expected in [0.0, 1.0]; `clamped()` enforces
/// the ranges before the engine touches them.
///
/// # Example
/// ```
/// use vf_core::frame::FeatureFrame;
/// let f = FeatureFrame::default();
/// assert_eq!(f.energy, 0.0);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct FeatureFrame {
    // === Feature scores (normalisés [0.0, 1.0]) ===
    /// Broadband loudness / drive.
    pub energy: f32,
    /// Spectral brightness of the timbre.
    pub brightness: f32,
    /// Vocal presence score.
    pub vocality: f32,
    /// Reverb / decay amount ("roominess").
    pub space: f32,
    /// Onset rate (rhythmic busyness).
    pub density: f32,
    /// Dynamic-range compression estimate.
    pub compression: f32,
    /// Emotional valence, 0.5 = neutral.
    pub valence: f32,

    // === Tempo ===
    /// Raw tempo hint in BPM (0.0 if the analyzer has none).
    pub bpm_hint: f32,
    /// Confidence of the tempo hint [0.0, 1.0].
    pub bpm_hint_confidence: f32,

    // === Horloge ===
    /// Monotonic timestamp in seconds, strictly increasing per stream.
    pub timestamp: f64,
}

impl FeatureFrame {
    /// Return a copy with every bounded field clamped to its declared range.
    ///
    /// A hostile or glitchy analyzer must not be able to push the engine
    /// out of bounds; out-of-range input is a clamp, never an error.
    ///
    /// # Example
    /// ```
    /// use vf_core::frame::FeatureFrame;
    /// let f = FeatureFrame { energy: 3.5, valence: -1.0, ..FeatureFrame::default() };
    /// let c = f.clamped();
    /// assert_eq!(c.energy, 1.0);
    /// assert_eq!(c.valence, 0.0);
    /// ```
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.energy = sanitize_unit(self.energy);
        self.brightness = sanitize_unit(self.brightness);
        self.vocality = sanitize_unit(self.vocality);
        self.space = sanitize_unit(self.space);
        self.density = sanitize_unit(self.density);
        self.compression = sanitize_unit(self.compression);
        self.valence = sanitize_unit(self.valence);
        self.bpm_hint = if self.bpm_hint.is_finite() {
            self.bpm_hint.max(0.0)
        } else {
            0.0
        };
        self.bpm_hint_confidence = sanitize_unit(self.bpm_hint_confidence);
        self
    }
}

/// Clamp to [0, 1], mapping NaN/infinite to 0.
#[inline(always)]
fn sanitize_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}
