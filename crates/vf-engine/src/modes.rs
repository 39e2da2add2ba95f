use vf_core::config::EngineConfig;
use vf_core::frame::FeatureFrame;
use vf_core::state::ControlState;

use crate::smoothing::attack_release;

/// Internal smoothing for the density term of the build-up drive.
const DENSITY_ATTACK: f32 = 0.08;
const DENSITY_RELEASE: f32 = 0.50;

/// Two-threshold gate with a dwell requirement.
///
/// The candidate state is recomputed every frame from the drive signal:
/// On at or above the enter threshold, Off at or below the exit
/// threshold, unchanged inside the band. The committed state only flips
/// once the candidate has disagreed with it for the full dwell time.
/// A drive oscillating strictly inside the band can therefore never
/// toggle the committed state.
///
/// # Example
/// ```
/// use vf_engine::modes::HysteresisGate;
/// let mut gate = HysteresisGate::new(0.6, 0.4, 0.3);
/// assert!(!gate.update(0.5, 0.1));
/// ```
pub struct HysteresisGate {
    enter: f32,
    exit: f32,
    dwell: f32,
    on: bool,
    hold_time: f32,
    off_time: f32,
}

impl HysteresisGate {
    #[must_use]
    pub fn new(enter: f32, exit: f32, dwell: f32) -> Self {
        Self {
            enter,
            exit,
            dwell,
            on: false,
            hold_time: 0.0,
            off_time: 0.0,
        }
    }

    /// Advance the gate by one frame and return the committed state.
    pub fn update(&mut self, drive: f32, dt: f32) -> bool {
        let candidate_on = if drive >= self.enter {
            true
        } else if drive <= self.exit {
            false
        } else {
            self.on
        };

        if candidate_on {
            self.hold_time += dt;
            self.off_time = 0.0;
        } else {
            self.off_time += dt;
            self.hold_time = 0.0;
        }

        if candidate_on != self.on {
            let persisted = if candidate_on {
                self.hold_time
            } else {
                self.off_time
            };
            if persisted >= self.dwell {
                self.on = candidate_on;
                self.hold_time = 0.0;
                self.off_time = 0.0;
            }
        }

        self.on
    }

    /// Committed state.
    #[inline]
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Seconds the candidate has been On since the last commit.
    #[inline]
    #[must_use]
    pub fn hold_time(&self) -> f32 {
        self.hold_time
    }

    /// Seconds the candidate has been Off since the last commit.
    #[inline]
    #[must_use]
    pub fn off_time(&self) -> f32 {
        self.off_time
    }
}

/// Derives the chorus and build-up modes from the smoothed levels.
///
/// Chorus drive leans on energy and vocal presence; build-up drive on
/// rhythmic density plus a rising-brightness slope.
pub struct ModeClassifier {
    chorus: HysteresisGate,
    buildup: HysteresisGate,
    slope_scale: f32,
    smoothed_density: f32,
    prev_brightness: f32,
    armed: bool,
}

impl ModeClassifier {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            chorus: HysteresisGate::new(
                config.chorus_enter,
                config.chorus_exit,
                config.mode_dwell_time,
            ),
            buildup: HysteresisGate::new(
                config.buildup_enter,
                config.buildup_exit,
                config.mode_dwell_time,
            ),
            slope_scale: config.buildup_slope_scale,
            smoothed_density: 0.0,
            prev_brightness: 0.0,
            armed: false,
        }
    }

    /// Update both modes from the already-smoothed state and the raw frame.
    pub fn update(&mut self, state: &mut ControlState, frame: &FeatureFrame, dt: f32) {
        if self.armed {
            self.smoothed_density = attack_release(
                frame.density,
                self.smoothed_density,
                DENSITY_ATTACK,
                DENSITY_RELEASE,
                dt,
            );
        } else {
            self.smoothed_density = frame.density;
        }

        let chorus_drive = 0.6 * state.bass_level + 0.4 * state.vocal_presence;

        let slope = if self.armed {
            ((state.brightness - self.prev_brightness) / dt).max(0.0)
        } else {
            0.0
        };
        let slope_term = (slope / self.slope_scale).clamp(0.0, 1.0);
        let buildup_drive = 0.5 * self.smoothed_density + 0.5 * slope_term;

        self.prev_brightness = state.brightness;
        self.armed = true;

        state.is_chorus = self.chorus.update(chorus_drive, dt);
        state.is_build_up = self.buildup.update(buildup_drive, dt);
        state.chorus_hold_time = self.chorus.hold_time();
        state.chorus_off_time = self.chorus.off_time();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oscillation_inside_the_band_never_toggles() {
        // enter=0.6, exit=0.4, dwell=0.3s; 0.5/0.45 alternating every 50ms
        // sits strictly inside the band and must leave the gate Off.
        let mut gate = HysteresisGate::new(0.6, 0.4, 0.3);
        for i in 0..200 {
            let drive = if i % 2 == 0 { 0.5 } else { 0.45 };
            assert!(
                !gate.update(drive, 0.05),
                "in-band oscillation must never commit a transition (frame {i})"
            );
        }
    }

    #[test]
    fn enter_commits_only_after_dwell() {
        let mut gate = HysteresisGate::new(0.6, 0.4, 0.3);
        // 0.25s above enter: not yet.
        for _ in 0..5 {
            gate.update(0.8, 0.05);
        }
        assert!(!gate.is_on(), "dwell not yet satisfied");
        // Two more frames pass 0.3s.
        gate.update(0.8, 0.05);
        gate.update(0.8, 0.05);
        assert!(gate.is_on(), "0.35s above enter must commit On");
    }

    #[test]
    fn short_burst_does_not_commit() {
        let mut gate = HysteresisGate::new(0.6, 0.4, 0.3);
        // 0.2s burst above enter, then straight back below exit.
        for _ in 0..4 {
            gate.update(0.9, 0.05);
        }
        for _ in 0..20 {
            gate.update(0.1, 0.05);
        }
        assert!(!gate.is_on(), "a burst shorter than the dwell is noise");
    }

    #[test]
    fn exit_needs_its_own_dwell() {
        let mut gate = HysteresisGate::new(0.6, 0.4, 0.3);
        for _ in 0..10 {
            gate.update(0.9, 0.05);
        }
        assert!(gate.is_on());
        // A brief dip below exit does not release the gate.
        for _ in 0..3 {
            gate.update(0.1, 0.05);
        }
        assert!(gate.is_on(), "0.15s below exit is shorter than the dwell");
        for _ in 0..4 {
            gate.update(0.1, 0.05);
        }
        assert!(!gate.is_on(), "0.35s below exit must commit Off");
    }

    #[test]
    fn counters_reset_on_commit() {
        let mut gate = HysteresisGate::new(0.6, 0.4, 0.3);
        // Six 50ms frames: the dwell lands exactly on the sixth update.
        for _ in 0..6 {
            gate.update(0.9, 0.05);
        }
        assert!(gate.is_on());
        assert_eq!(gate.hold_time(), 0.0, "commit must reset both counters");
        assert_eq!(gate.off_time(), 0.0);
    }

    #[test]
    fn chorus_mode_follows_energy_and_vocals() {
        let config = EngineConfig::default();
        let mut modes = ModeClassifier::new(&config);
        let mut state = ControlState::default();
        let dt = 1.0 / 60.0;

        // Loud, vocal-heavy levels straight from the smoother.
        state.bass_level = 0.9;
        state.vocal_presence = 0.8;
        let frame = FeatureFrame {
            density: 0.2,
            ..FeatureFrame::default()
        };
        for _ in 0..(1.0 / dt) as usize {
            modes.update(&mut state, &frame, dt);
        }
        assert!(state.is_chorus, "drive 0.86 over enter 0.62 for 1s commits");

        // Energy collapses: chorus releases after the dwell.
        state.bass_level = 0.1;
        state.vocal_presence = 0.1;
        for _ in 0..(1.0 / dt) as usize {
            modes.update(&mut state, &frame, dt);
        }
        assert!(!state.is_chorus);
        assert!(
            state.chorus_off_time > 0.0 || !state.is_chorus,
            "off counter tracks the released mode"
        );
    }

    #[test]
    fn buildup_mode_needs_density_or_rising_brightness() {
        let config = EngineConfig::default();
        let mut modes = ModeClassifier::new(&config);
        let mut state = ControlState::default();
        let dt = 1.0 / 60.0;

        // Busy percussion with steadily rising brightness.
        let frame = FeatureFrame {
            density: 0.9,
            ..FeatureFrame::default()
        };
        for i in 0..(2.0 / dt) as usize {
            state.brightness = (i as f32 * dt * 0.8).min(1.0);
            modes.update(&mut state, &frame, dt);
        }
        assert!(state.is_build_up, "dense + brightening should read as a build-up");
    }
}
