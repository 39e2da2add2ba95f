use serde::{Deserialize, Serialize};

use crate::vibe::{Vibe, VibePhase};

/// Aggregate control output of the engine, published once per frame.
///
/// Un seul écrivain (la session), autant de lecteurs que nécessaire.
/// Readers treat a snapshot as valid until the next publication.
///
/// One-shot flags (`did_*`) are set during one update and cleared at the
/// start of the next; a consumer that misses a frame boundary loses the
/// event. No queueing.
///
/// # Example
/// ```
/// use vf_core::state::ControlState;
/// use vf_core::vibe::{Vibe, VibePhase};
/// let s = ControlState::default();
/// assert_eq!(s.current_bpm, 120.0);
/// assert_eq!(s.current_vibe, Vibe::Neutral);
/// assert_eq!(s.vibe_phase, VibePhase::Collecting);
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ControlState {
    // === Niveaux lissés [0.0, 1.0] ===
    /// Smoothed bass drive.
    pub bass_level: f32,
    /// Three smoothed mid bands.
    pub mid_levels: [f32; 3],
    /// Three smoothed high bands.
    pub high_levels: [f32; 3],
    /// Smoothed brightness.
    pub brightness: f32,
    /// Smoothed vocal presence.
    pub vocal_presence: f32,

    // === Modes (hystérésis) ===
    /// Committed chorus mode.
    pub is_chorus: bool,
    /// Committed build-up mode.
    pub is_build_up: bool,
    /// Seconds the chorus candidate has been On (reset on commit).
    pub chorus_hold_time: f32,
    /// Seconds the chorus candidate has been Off (reset on commit).
    pub chorus_off_time: f32,

    // === Événements one-shot (valables une seule frame) ===
    /// Rising-edge onset this frame.
    pub did_onset: bool,
    /// Energy drop after a sustained high-energy stretch.
    pub did_drop: bool,
    /// Two or more transient cues coincided this frame.
    pub did_section_boundary: bool,
    /// Brightness jumped well above its smoothed level.
    pub did_brightness_spike: bool,

    // === Tempo ===
    /// Current BPM estimate (>= 0).
    pub current_bpm: f32,
    /// Confidence of the BPM estimate [0.0, 1.0].
    pub bpm_confidence: f32,

    // === Vibe ===
    /// Current (or locked) vibe label.
    pub current_vibe: Vibe,
    /// Confidence of the vibe label [0.0, 1.0].
    pub vibe_confidence: f32,
    /// Collecting or Locked.
    pub vibe_phase: VibePhase,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            bass_level: 0.0,
            mid_levels: [0.0; 3],
            high_levels: [0.0; 3],
            brightness: 0.0,
            vocal_presence: 0.0,
            is_chorus: false,
            is_build_up: false,
            chorus_hold_time: 0.0,
            chorus_off_time: 0.0,
            did_onset: false,
            did_drop: false,
            did_section_boundary: false,
            did_brightness_spike: false,
            current_bpm: 120.0,
            bpm_confidence: 0.0,
            current_vibe: Vibe::Neutral,
            vibe_confidence: 0.0,
            vibe_phase: VibePhase::Collecting,
        }
    }
}

impl ControlState {
    /// Clear all one-shot event flags. Called at the start of every update.
    #[inline]
    pub fn clear_events(&mut self) {
        self.did_onset = false;
        self.did_drop = false;
        self.did_section_boundary = false;
        self.did_brightness_spike = false;
    }

    /// `true` if any one-shot event fired this frame.
    #[inline]
    #[must_use]
    pub fn any_event(&self) -> bool {
        self.did_onset || self.did_drop || self.did_section_boundary || self.did_brightness_spike
    }
}
