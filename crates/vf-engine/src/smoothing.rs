use vf_core::config::EngineConfig;
use vf_core::frame::FeatureFrame;
use vf_core::state::ControlState;

/// Floor for time constants, keeps the exponential well-conditioned.
pub(crate) const MIN_TAU: f32 = 0.001;

/// Asymmetric attack/release exponential step toward a raw target.
///
/// Moves with the attack time constant when the target is above the
/// previous value, with the release time constant otherwise:
/// `next = prev + (raw - prev) * (1 - exp(-dt / tau))`.
///
/// Output stays in [0, 1] for input in [0, 1] and never crosses the raw
/// target within a step.
///
/// # Example
/// ```
/// use vf_engine::smoothing::attack_release;
/// let next = attack_release(1.0, 0.0, 0.05, 0.3, 1.0 / 60.0);
/// assert!(next > 0.0 && next < 1.0);
/// ```
#[inline(always)]
#[must_use]
pub fn attack_release(raw: f32, previous: f32, attack: f32, release: f32, dt: f32) -> f32 {
    let tau = if raw > previous { attack } else { release };
    let alpha = 1.0 - (-dt / tau.max(MIN_TAU)).exp();
    (previous + (raw - previous) * alpha).clamp(0.0, 1.0)
}

/// Per-group attack/release pair (seconds).
#[derive(Clone, Copy)]
struct ArPair {
    attack: f32,
    release: f32,
}

/// Applies attack/release smoothing to every control level.
///
/// The input contract carries scalar feature scores, not spectrum bins;
/// the renderer-facing mid/high bands are fixed weighted mixes of those
/// scores, smoothed independently so each band keeps its own envelope.
pub struct LevelSmoother {
    bass: ArPair,
    mid: ArPair,
    high: ArPair,
    brightness: ArPair,
    vocal: ArPair,
    initialized: bool,
}

impl LevelSmoother {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            bass: ArPair {
                attack: config.bass_attack,
                release: config.bass_release,
            },
            mid: ArPair {
                attack: config.mid_attack,
                release: config.mid_release,
            },
            high: ArPair {
                attack: config.high_attack,
                release: config.high_release,
            },
            brightness: ArPair {
                attack: config.brightness_attack,
                release: config.brightness_release,
            },
            vocal: ArPair {
                attack: config.vocal_attack,
                release: config.vocal_release,
            },
            initialized: false,
        }
    }

    /// Smooth the frame's scores into the state's control levels.
    ///
    /// The first frame seeds the levels directly so a session does not
    /// ramp up from zero regardless of where the track starts.
    pub fn apply(&mut self, frame: &FeatureFrame, state: &mut ControlState, dt: f32) {
        let mids = mid_mixes(frame);
        let highs = high_mixes(frame);

        if !self.initialized {
            state.bass_level = frame.energy;
            state.mid_levels = mids;
            state.high_levels = highs;
            state.brightness = frame.brightness;
            state.vocal_presence = frame.vocality;
            self.initialized = true;
            return;
        }

        state.bass_level = step(frame.energy, state.bass_level, self.bass, dt);
        for (level, raw) in state.mid_levels.iter_mut().zip(mids) {
            *level = step(raw, *level, self.mid, dt);
        }
        for (level, raw) in state.high_levels.iter_mut().zip(highs) {
            *level = step(raw, *level, self.high, dt);
        }
        state.brightness = step(frame.brightness, state.brightness, self.brightness, dt);
        state.vocal_presence = step(frame.vocality, state.vocal_presence, self.vocal, dt);
    }
}

#[inline(always)]
fn step(raw: f32, previous: f32, pair: ArPair, dt: f32) -> f32 {
    attack_release(raw, previous, pair.attack, pair.release, dt)
}

/// Fixed mixes feeding the three mid bands: body, vocal core, groove.
#[inline(always)]
fn mid_mixes(frame: &FeatureFrame) -> [f32; 3] {
    [
        0.8 * frame.energy + 0.2 * frame.density,
        frame.vocality,
        0.5 * frame.vocality + 0.5 * frame.density,
    ]
}

/// Fixed mixes feeding the three high bands: sheen, sparkle, tick.
#[inline(always)]
fn high_mixes(frame: &FeatureFrame) -> [f32; 3] {
    [
        frame.brightness,
        0.6 * frame.brightness + 0.4 * frame.density,
        frame.density,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn converges_to_constant_input_without_overshoot() {
        let mut value = 0.0;
        // ~5 time constants of frames is plenty to converge.
        let frames = (5.0 * 0.05 / DT) as usize + 1;
        for _ in 0..frames {
            let next = attack_release(0.8, value, 0.05, 0.3, DT);
            assert!(next <= 0.8 + 1e-6, "must never overshoot the target");
            assert!(next >= value, "rising input must move monotonically up");
            value = next;
        }
        assert!(
            (value - 0.8).abs() < 1e-2,
            "should converge within 5 tau, got {value}"
        );
    }

    #[test]
    fn attack_is_faster_than_release() {
        let up = attack_release(1.0, 0.5, 0.05, 0.5, DT);
        let down = attack_release(0.0, 0.5, 0.05, 0.5, DT);
        let rise = up - 0.5;
        let fall = 0.5 - down;
        assert!(
            rise > fall,
            "attack tau 0.05 must move further than release tau 0.5 (rise={rise}, fall={fall})"
        );
    }

    #[test]
    fn output_bounded_for_bounded_input() {
        let mut value = 0.5;
        for i in 0..1000 {
            let raw = if i % 2 == 0 { 1.0 } else { 0.0 };
            value = attack_release(raw, value, 0.01, 0.01, DT);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn first_frame_seeds_levels_directly() {
        let config = EngineConfig::default();
        let mut smoother = LevelSmoother::new(&config);
        let mut state = ControlState::default();
        let frame = FeatureFrame {
            energy: 0.7,
            brightness: 0.6,
            vocality: 0.4,
            density: 0.3,
            ..FeatureFrame::default()
        };
        smoother.apply(&frame, &mut state, DT);
        assert_eq!(state.bass_level, 0.7, "first frame must not ramp from 0");
        assert_eq!(state.brightness, 0.6);
        assert_eq!(state.vocal_presence, 0.4);
    }

    #[test]
    fn bands_track_their_mixes() {
        let config = EngineConfig::default();
        let mut smoother = LevelSmoother::new(&config);
        let mut state = ControlState::default();
        let frame = FeatureFrame {
            energy: 1.0,
            brightness: 1.0,
            vocality: 1.0,
            density: 1.0,
            ..FeatureFrame::default()
        };
        let mut t = 0.0;
        for _ in 0..600 {
            t += f64::from(DT);
            smoother.apply(&FeatureFrame { timestamp: t, ..frame }, &mut state, DT);
        }
        for level in state.mid_levels.iter().chain(state.high_levels.iter()) {
            assert!(
                (*level - 1.0).abs() < 1e-2,
                "all-ones input must saturate every band, got {level}"
            );
        }
    }
}
