use vf_core::config::EngineConfig;
use vf_core::frame::FeatureFrame;

/// One-shot event flags for a single frame.
///
/// Independent, not exclusive; all four may fire together.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Default)]
pub struct EventFlags {
    /// Density crossed the onset threshold from below.
    pub onset: bool,
    /// Energy fell sharply right after a sustained high-energy stretch.
    pub drop: bool,
    /// Two or more transient cues coincided.
    pub section_boundary: bool,
    /// Raw brightness jumped well above its smoothed level.
    pub brightness_spike: bool,
}

/// Edge detection over frame-to-frame deltas.
///
/// Every flag is recomputed from scratch each frame, so a flag observed
/// `true` is true for exactly one update cycle.
pub struct EventDetector {
    onset_threshold: f32,
    spike_delta: f32,
    drop_delta: f32,
    high_floor: f32,
    high_hold: f32,
    prev_density: f32,
    prev_energy: f32,
    prev_valence: f32,
    /// Seconds energy has continuously sat at or above the floor.
    high_energy_time: f32,
    /// First frame primes the prev_* fields without firing anything.
    armed: bool,
}

impl EventDetector {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            onset_threshold: config.onset_threshold,
            spike_delta: config.brightness_spike_delta,
            drop_delta: config.drop_delta,
            high_floor: config.high_energy_floor,
            high_hold: config.high_energy_hold,
            prev_density: 0.0,
            prev_energy: 0.0,
            prev_valence: 0.5,
            high_energy_time: 0.0,
            armed: false,
        }
    }

    /// Evaluate all four detectors against one frame.
    ///
    /// `smoothed_brightness` is the control level after this frame's
    /// smoothing pass; the spike detector measures how far the raw value
    /// runs ahead of it.
    pub fn update(
        &mut self,
        frame: &FeatureFrame,
        smoothed_brightness: f32,
        dt: f32,
    ) -> EventFlags {
        if !self.armed {
            self.prime(frame, dt);
            return EventFlags::default();
        }

        let onset = self.prev_density < self.onset_threshold
            && frame.density >= self.onset_threshold;

        let brightness_spike = frame.brightness - smoothed_brightness > self.spike_delta;

        // The sustained-high condition is judged on history up to the
        // previous frame: the drop frame itself is the moment energy leaves.
        let sustained_high = self.high_energy_time >= self.high_hold;
        let drop = sustained_high && self.prev_energy - frame.energy > self.drop_delta;

        let valence_flip = (self.prev_valence - 0.5) * (frame.valence - 0.5) < 0.0;

        let cues = u8::from(onset) + u8::from(brightness_spike) + u8::from(valence_flip);
        let section_boundary = cues >= 2;

        self.advance(frame, dt);

        EventFlags {
            onset,
            drop,
            section_boundary,
            brightness_spike,
        }
    }

    fn prime(&mut self, frame: &FeatureFrame, dt: f32) {
        self.advance(frame, dt);
        self.high_energy_time = 0.0;
        self.armed = true;
    }

    fn advance(&mut self, frame: &FeatureFrame, dt: f32) {
        if frame.energy >= self.high_floor {
            self.high_energy_time += dt;
        } else {
            self.high_energy_time = 0.0;
        }
        self.prev_density = frame.density;
        self.prev_energy = frame.energy;
        self.prev_valence = frame.valence;
    }
}
