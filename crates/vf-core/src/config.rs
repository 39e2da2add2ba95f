use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Complete engine tuning, loadable from TOML.
///
/// Chaque champ a une valeur par défaut saine. Every constant that shapes
/// temporal behavior (time constants, thresholds, dwell and lock windows)
/// lives here so a deployment can retune without recompiling.
///
/// # Example
/// ```
/// use vf_core::config::EngineConfig;
/// let config = EngineConfig::default();
/// assert_eq!(config.collect_window, 10.0);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EngineConfig {
    // === Lissage (attack/release, secondes) ===
    /// Bass attack time constant.
    pub bass_attack: f32,
    /// Bass release time constant.
    pub bass_release: f32,
    /// Mid-band attack time constant.
    pub mid_attack: f32,
    /// Mid-band release time constant.
    pub mid_release: f32,
    /// High-band attack time constant.
    pub high_attack: f32,
    /// High-band release time constant.
    pub high_release: f32,
    /// Brightness attack time constant.
    pub brightness_attack: f32,
    /// Brightness release time constant.
    pub brightness_release: f32,
    /// Vocal-presence attack time constant.
    pub vocal_attack: f32,
    /// Vocal-presence release time constant.
    pub vocal_release: f32,

    // === Tempo ===
    /// Minimum hint confidence accepted by the tracker [0.0, 1.0].
    pub tempo_min_hint_confidence: f32,
    /// Blend speed toward accepted hints (per second, scaled by confidence).
    pub tempo_blend_rate: f32,
    /// Seconds without an accepted hint before confidence starts decaying.
    pub tempo_staleness_window: f32,
    /// Time constant for confidence rising toward the hint (seconds).
    pub tempo_confidence_rise: f32,
    /// Time constant for stale confidence decaying to zero (seconds).
    pub tempo_confidence_decay: f32,

    // === Événements ===
    /// Density level that must be crossed from below for an onset.
    pub onset_threshold: f32,
    /// Raw-minus-smoothed brightness delta that counts as a spike.
    pub brightness_spike_delta: f32,
    /// Single-frame energy fall that counts as a drop.
    pub drop_delta: f32,
    /// Energy floor defining the "sustained high-energy" condition.
    pub high_energy_floor: f32,
    /// Seconds above the floor required before a drop can fire.
    pub high_energy_hold: f32,

    // === Modes (hystérésis) ===
    /// Chorus enter threshold (strictly above exit).
    pub chorus_enter: f32,
    /// Chorus exit threshold.
    pub chorus_exit: f32,
    /// Build-up enter threshold (strictly above exit).
    pub buildup_enter: f32,
    /// Build-up exit threshold.
    pub buildup_exit: f32,
    /// Minimum dwell before a mode transition commits (seconds).
    pub mode_dwell_time: f32,
    /// Brightness slope (units/second) mapping to a full build-up drive.
    pub buildup_slope_scale: f32,

    // === Classificateur de vibe ===
    /// Minimum evidence-collection window before locking (seconds).
    pub collect_window: f32,
    /// Similarity the best category must reach to lock [0.0, 1.0].
    pub lock_confidence: f32,
    /// Scores within this of the best are tie-broken by priority.
    pub tie_epsilon: f32,
    /// Time constant of the running feature averages (seconds).
    pub accum_tau: f32,
    /// Multiple of `collect_window` after which an undecided session
    /// falls back to Neutral with confidence 0.
    pub fallback_factor: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bass_attack: 0.04,
            bass_release: 0.35,
            mid_attack: 0.05,
            mid_release: 0.30,
            high_attack: 0.03,
            high_release: 0.22,
            brightness_attack: 0.08,
            brightness_release: 0.45,
            vocal_attack: 0.10,
            vocal_release: 0.60,
            tempo_min_hint_confidence: 0.25,
            tempo_blend_rate: 2.0,
            tempo_staleness_window: 4.0,
            tempo_confidence_rise: 0.5,
            tempo_confidence_decay: 2.0,
            onset_threshold: 0.45,
            brightness_spike_delta: 0.25,
            drop_delta: 0.30,
            high_energy_floor: 0.60,
            high_energy_hold: 1.5,
            chorus_enter: 0.62,
            chorus_exit: 0.45,
            buildup_enter: 0.58,
            buildup_exit: 0.40,
            mode_dwell_time: 0.35,
            buildup_slope_scale: 2.0,
            collect_window: 10.0,
            lock_confidence: 0.70,
            tie_epsilon: 0.02,
            accum_tau: 2.5,
            fallback_factor: 1.5,
        }
    }
}

impl EngineConfig {
    /// Clamp all fields to their valid ranges.
    ///
    /// Called after TOML deserialization so an out-of-range file cannot
    /// destabilize the filters. Also restores the hysteresis invariant
    /// (exit strictly below enter).
    pub fn clamp_all(&mut self) {
        for tau in [
            &mut self.bass_attack,
            &mut self.bass_release,
            &mut self.mid_attack,
            &mut self.mid_release,
            &mut self.high_attack,
            &mut self.high_release,
            &mut self.brightness_attack,
            &mut self.brightness_release,
            &mut self.vocal_attack,
            &mut self.vocal_release,
        ] {
            *tau = tau.clamp(0.001, 5.0);
        }

        self.tempo_min_hint_confidence = self.tempo_min_hint_confidence.clamp(0.0, 1.0);
        self.tempo_blend_rate = self.tempo_blend_rate.clamp(0.05, 20.0);
        self.tempo_staleness_window = self.tempo_staleness_window.clamp(0.1, 60.0);
        self.tempo_confidence_rise = self.tempo_confidence_rise.clamp(0.01, 10.0);
        self.tempo_confidence_decay = self.tempo_confidence_decay.clamp(0.01, 30.0);

        self.onset_threshold = self.onset_threshold.clamp(0.05, 0.95);
        self.brightness_spike_delta = self.brightness_spike_delta.clamp(0.02, 1.0);
        self.drop_delta = self.drop_delta.clamp(0.02, 1.0);
        self.high_energy_floor = self.high_energy_floor.clamp(0.1, 0.95);
        self.high_energy_hold = self.high_energy_hold.clamp(0.1, 30.0);

        self.chorus_enter = self.chorus_enter.clamp(0.1, 0.98);
        self.buildup_enter = self.buildup_enter.clamp(0.1, 0.98);
        // Hysteresis band: exit must sit strictly below enter.
        self.chorus_exit = self.chorus_exit.clamp(0.0, self.chorus_enter - 0.01);
        self.buildup_exit = self.buildup_exit.clamp(0.0, self.buildup_enter - 0.01);
        self.mode_dwell_time = self.mode_dwell_time.clamp(0.05, 10.0);
        self.buildup_slope_scale = self.buildup_slope_scale.clamp(0.1, 20.0);

        self.collect_window = self.collect_window.clamp(0.5, 120.0);
        self.lock_confidence = self.lock_confidence.clamp(0.1, 0.99);
        self.tie_epsilon = self.tie_epsilon.clamp(0.0, 0.2);
        self.accum_tau = self.accum_tau.clamp(0.1, 30.0);
        self.fallback_factor = self.fallback_factor.clamp(1.0, 10.0);
    }

    /// Structural validation before clamping.
    ///
    /// TOML happily encodes `nan`/`inf`; a non-finite constant would poison
    /// every filter downstream, so it is rejected here instead of clamped.
    ///
    /// # Errors
    /// Returns `CoreError::Config` naming the first non-finite field.
    pub fn validate(&self) -> std::result::Result<(), CoreError> {
        for (name, value) in self.fields() {
            if !value.is_finite() {
                return Err(CoreError::Config(format!(
                    "champ non fini : {name} = {value}"
                )));
            }
        }
        Ok(())
    }

    fn fields(&self) -> [(&'static str, f32); 31] {
        [
            ("bass_attack", self.bass_attack),
            ("bass_release", self.bass_release),
            ("mid_attack", self.mid_attack),
            ("mid_release", self.mid_release),
            ("high_attack", self.high_attack),
            ("high_release", self.high_release),
            ("brightness_attack", self.brightness_attack),
            ("brightness_release", self.brightness_release),
            ("vocal_attack", self.vocal_attack),
            ("vocal_release", self.vocal_release),
            ("tempo_min_hint_confidence", self.tempo_min_hint_confidence),
            ("tempo_blend_rate", self.tempo_blend_rate),
            ("tempo_staleness_window", self.tempo_staleness_window),
            ("tempo_confidence_rise", self.tempo_confidence_rise),
            ("tempo_confidence_decay", self.tempo_confidence_decay),
            ("onset_threshold", self.onset_threshold),
            ("brightness_spike_delta", self.brightness_spike_delta),
            ("drop_delta", self.drop_delta),
            ("high_energy_floor", self.high_energy_floor),
            ("high_energy_hold", self.high_energy_hold),
            ("chorus_enter", self.chorus_enter),
            ("chorus_exit", self.chorus_exit),
            ("buildup_enter", self.buildup_enter),
            ("buildup_exit", self.buildup_exit),
            ("mode_dwell_time", self.mode_dwell_time),
            ("buildup_slope_scale", self.buildup_slope_scale),
            ("collect_window", self.collect_window),
            ("lock_confidence", self.lock_confidence),
            ("tie_epsilon", self.tie_epsilon),
            ("accum_tau", self.accum_tau),
            ("fallback_factor", self.fallback_factor),
        ]
    }
}

/// Structure TOML intermédiaire pour désérialisation avec sections optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    smoothing: Option<SmoothingSection>,
    tempo: Option<TempoSection>,
    events: Option<EventsSection>,
    modes: Option<ModesSection>,
    classifier: Option<ClassifierSection>,
}

/// Smoothing section, all fields optional for partial override.
#[derive(Deserialize)]
struct SmoothingSection {
    bass_attack: Option<f32>,
    bass_release: Option<f32>,
    mid_attack: Option<f32>,
    mid_release: Option<f32>,
    high_attack: Option<f32>,
    high_release: Option<f32>,
    brightness_attack: Option<f32>,
    brightness_release: Option<f32>,
    vocal_attack: Option<f32>,
    vocal_release: Option<f32>,
}

#[derive(Deserialize)]
struct TempoSection {
    min_hint_confidence: Option<f32>,
    blend_rate: Option<f32>,
    staleness_window: Option<f32>,
    confidence_rise: Option<f32>,
    confidence_decay: Option<f32>,
}

#[derive(Deserialize)]
struct EventsSection {
    onset_threshold: Option<f32>,
    brightness_spike_delta: Option<f32>,
    drop_delta: Option<f32>,
    high_energy_floor: Option<f32>,
    high_energy_hold: Option<f32>,
}

#[derive(Deserialize)]
struct ModesSection {
    chorus_enter: Option<f32>,
    chorus_exit: Option<f32>,
    buildup_enter: Option<f32>,
    buildup_exit: Option<f32>,
    dwell_time: Option<f32>,
    buildup_slope_scale: Option<f32>,
}

#[derive(Deserialize)]
struct ClassifierSection {
    collect_window: Option<f32>,
    lock_confidence: Option<f32>,
    tie_epsilon: Option<f32>,
    accum_tau: Option<f32>,
    fallback_factor: Option<f32>,
}

/// Parse a TOML string and merge over the defaults.
///
/// # Errors
/// Returns an error if the TOML cannot be parsed or a constant is non-finite.
#[allow(clippy::too_many_lines)]
pub fn from_toml_str(content: &str) -> Result<EngineConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = EngineConfig::default();

    if let Some(s) = file.smoothing {
        if let Some(v) = s.bass_attack {
            config.bass_attack = v;
        }
        if let Some(v) = s.bass_release {
            config.bass_release = v;
        }
        if let Some(v) = s.mid_attack {
            config.mid_attack = v;
        }
        if let Some(v) = s.mid_release {
            config.mid_release = v;
        }
        if let Some(v) = s.high_attack {
            config.high_attack = v;
        }
        if let Some(v) = s.high_release {
            config.high_release = v;
        }
        if let Some(v) = s.brightness_attack {
            config.brightness_attack = v;
        }
        if let Some(v) = s.brightness_release {
            config.brightness_release = v;
        }
        if let Some(v) = s.vocal_attack {
            config.vocal_attack = v;
        }
        if let Some(v) = s.vocal_release {
            config.vocal_release = v;
        }
    }

    if let Some(t) = file.tempo {
        if let Some(v) = t.min_hint_confidence {
            config.tempo_min_hint_confidence = v;
        }
        if let Some(v) = t.blend_rate {
            config.tempo_blend_rate = v;
        }
        if let Some(v) = t.staleness_window {
            config.tempo_staleness_window = v;
        }
        if let Some(v) = t.confidence_rise {
            config.tempo_confidence_rise = v;
        }
        if let Some(v) = t.confidence_decay {
            config.tempo_confidence_decay = v;
        }
    }

    if let Some(e) = file.events {
        if let Some(v) = e.onset_threshold {
            config.onset_threshold = v;
        }
        if let Some(v) = e.brightness_spike_delta {
            config.brightness_spike_delta = v;
        }
        if let Some(v) = e.drop_delta {
            config.drop_delta = v;
        }
        if let Some(v) = e.high_energy_floor {
            config.high_energy_floor = v;
        }
        if let Some(v) = e.high_energy_hold {
            config.high_energy_hold = v;
        }
    }

    if let Some(m) = file.modes {
        if let Some(v) = m.chorus_enter {
            config.chorus_enter = v;
        }
        if let Some(v) = m.chorus_exit {
            config.chorus_exit = v;
        }
        if let Some(v) = m.buildup_enter {
            config.buildup_enter = v;
        }
        if let Some(v) = m.buildup_exit {
            config.buildup_exit = v;
        }
        if let Some(v) = m.dwell_time {
            config.mode_dwell_time = v;
        }
        if let Some(v) = m.buildup_slope_scale {
            config.buildup_slope_scale = v;
        }
    }

    if let Some(c) = file.classifier {
        if let Some(v) = c.collect_window {
            config.collect_window = v;
        }
        if let Some(v) = c.lock_confidence {
            config.lock_confidence = v;
        }
        if let Some(v) = c.tie_epsilon {
            config.tie_epsilon = v;
        }
        if let Some(v) = c.accum_tau {
            config.accum_tau = v;
        }
        if let Some(v) = c.fallback_factor {
            config.fallback_factor = v;
        }
    }

    config.validate()?;
    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use vf_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = from_toml_str(&content).with_context(|| format!("dans {}", path.display()))?;
    log::info!("configuration chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_satisfy_their_own_clamps() {
        let mut config = EngineConfig::default();
        let before = format!("{config:?}");
        config.clamp_all();
        assert_eq!(before, format!("{config:?}"), "defaults must be in range");
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let src = r#"
            [modes]
            chorus_enter = 0.8
            dwell_time = 0.5

            [classifier]
            lock_confidence = 0.9
        "#;
        let config = match from_toml_str(src) {
            Ok(c) => c,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(config.chorus_enter, 0.8);
        assert_eq!(config.mode_dwell_time, 0.5);
        assert_eq!(config.lock_confidence, 0.9);
        // Untouched fields keep their defaults.
        assert_eq!(config.chorus_exit, EngineConfig::default().chorus_exit);
        assert_eq!(config.onset_threshold, EngineConfig::default().onset_threshold);
    }

    #[test]
    fn clamp_restores_hysteresis_band() {
        let mut config = EngineConfig {
            chorus_enter: 0.5,
            chorus_exit: 0.7,
            ..EngineConfig::default()
        };
        config.clamp_all();
        assert!(
            config.chorus_exit < config.chorus_enter,
            "exit must end up strictly below enter, got exit={} enter={}",
            config.chorus_exit,
            config.chorus_enter
        );
    }

    #[test]
    fn non_finite_constant_is_rejected() {
        let src = r#"
            [events]
            drop_delta = nan
        "#;
        assert!(from_toml_str(src).is_err(), "nan must fail validation");
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = match from_toml_str("") {
            Ok(c) => c,
            Err(e) => panic!("empty config should parse: {e}"),
        };
        assert_eq!(config.collect_window, EngineConfig::default().collect_window);
    }
}
