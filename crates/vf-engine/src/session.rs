use std::sync::Arc;

use arc_swap::ArcSwap;

use vf_core::config::EngineConfig;
use vf_core::frame::FeatureFrame;
use vf_core::state::ControlState;
use vf_core::vibe::VibeTuning;

use crate::classify::VibeClassifier;
use crate::events::EventDetector;
use crate::modes::ModeClassifier;
use crate::smoothing::LevelSmoother;
use crate::tempo::TempoTracker;

/// Substitute step for non-monotonic or duplicate timestamps (seconds).
pub const MIN_DT: f32 = 0.001;
/// Ceiling on a single step, so a stalled stream cannot satisfy dwell or
/// collection windows in one frame (seconds).
pub const MAX_DT: f32 = 0.5;

/// One audio session: owns the control state and every sub-component,
/// consumes one `FeatureFrame` per `feed()` call.
///
/// Un seul écrivain; les lecteurs passent par `snapshot()` ou un
/// `SessionHandle` cloné. Publication is a whole-struct copy behind an
/// `ArcSwap`, so a reader can never observe a half-updated frame.
///
/// # Example
/// ```
/// use vf_core::config::EngineConfig;
/// use vf_core::frame::FeatureFrame;
/// use vf_engine::session::Session;
///
/// let mut session = Session::new(EngineConfig::default());
/// session.start();
/// session.feed(&FeatureFrame { energy: 0.8, timestamp: 0.016, ..FeatureFrame::default() });
/// let snap = session.snapshot();
/// assert!(snap.bass_level > 0.0);
/// ```
pub struct Session {
    config: EngineConfig,
    state: ControlState,
    smoother: LevelSmoother,
    tempo: TempoTracker,
    events: EventDetector,
    modes: ModeClassifier,
    classifier: VibeClassifier,
    last_timestamp: Option<f64>,
    timestamp_anomalies: u64,
    published: Arc<ArcSwap<ControlState>>,
}

impl Session {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            smoother: LevelSmoother::new(&config),
            tempo: TempoTracker::new(&config),
            events: EventDetector::new(&config),
            modes: ModeClassifier::new(&config),
            classifier: VibeClassifier::new(&config),
            config,
            state: ControlState::default(),
            last_timestamp: None,
            timestamp_anomalies: 0,
            published: Arc::new(ArcSwap::from_pointee(ControlState::default())),
        }
    }

    /// Initialize the session: defaults in, Collecting phase entered.
    pub fn start(&mut self) {
        self.rebuild();
        log::info!("session started");
    }

    /// Return to defaults mid-session. Treated as a special frame: the
    /// reset state is published through the same snapshot mechanism.
    pub fn reset(&mut self) {
        self.rebuild();
        log::info!("session reset");
    }

    fn rebuild(&mut self) {
        self.state = ControlState::default();
        self.smoother = LevelSmoother::new(&self.config);
        self.tempo = TempoTracker::new(&self.config);
        self.events = EventDetector::new(&self.config);
        self.modes = ModeClassifier::new(&self.config);
        self.classifier = VibeClassifier::new(&self.config);
        self.last_timestamp = None;
        self.timestamp_anomalies = 0;
        self.published.store(Arc::new(self.state));
    }

    /// The per-frame update. Clamps the input, runs every sub-component
    /// exactly once, publishes the new snapshot.
    pub fn feed(&mut self, frame: &FeatureFrame) {
        let frame = frame.clamped();
        let dt = self.step_dt(frame.timestamp);

        // One-shots from the previous frame die here, never queued.
        self.state.clear_events();

        self.smoother.apply(&frame, &mut self.state, dt);

        let (bpm, bpm_confidence) =
            self.tempo
                .update(frame.bpm_hint, frame.bpm_hint_confidence, dt);
        self.state.current_bpm = bpm;
        self.state.bpm_confidence = bpm_confidence;

        let flags = self.events.update(&frame, self.state.brightness, dt);
        self.state.did_onset = flags.onset;
        self.state.did_drop = flags.drop;
        self.state.did_section_boundary = flags.section_boundary;
        self.state.did_brightness_spike = flags.brightness_spike;

        self.modes.update(&mut self.state, &frame, dt);

        let (vibe, vibe_confidence, phase) = self.classifier.update(&frame, bpm, dt);
        self.state.current_vibe = vibe;
        self.state.vibe_confidence = vibe_confidence;
        self.state.vibe_phase = phase;

        self.published.store(Arc::new(self.state));
    }

    fn step_dt(&mut self, timestamp: f64) -> f32 {
        let dt = match self.last_timestamp {
            None => MIN_DT,
            Some(last) if timestamp <= last => {
                self.timestamp_anomalies += 1;
                if self.timestamp_anomalies == 1 || self.timestamp_anomalies.is_multiple_of(100) {
                    log::warn!(
                        "non-monotonic frame timestamp ({timestamp} after {last}), {} so far",
                        self.timestamp_anomalies
                    );
                }
                MIN_DT
            }
            Some(last) => ((timestamp - last) as f32).clamp(MIN_DT, MAX_DT),
        };
        self.last_timestamp = Some(timestamp);
        dt
    }

    /// Consistent read of the last published frame.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ControlState> {
        self.published.load_full()
    }

    /// Tuning bundle for the vibe currently held by the state.
    #[must_use]
    pub fn tuning(&self) -> &'static VibeTuning {
        self.state.current_vibe.tuning()
    }

    /// Cheap cloneable read handle for consumers on other threads.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            published: Arc::clone(&self.published),
        }
    }

    /// Frames whose timestamp was not strictly increasing.
    #[must_use]
    pub fn timestamp_anomalies(&self) -> u64 {
        self.timestamp_anomalies
    }

    /// Implausible tempo hints filtered out so far.
    #[must_use]
    pub fn rejected_tempo_hints(&self) -> u64 {
        self.tempo.rejected_hints()
    }
}

/// Read-only view of a session's published snapshots.
///
/// Clone freely; every clone sees the same publication stream.
#[derive(Clone)]
pub struct SessionHandle {
    published: Arc<ArcSwap<ControlState>>,
}

impl SessionHandle {
    /// Last published frame, complete by construction.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ControlState> {
        self.published.load_full()
    }

    /// Tuning bundle for the vibe in the last published frame.
    #[must_use]
    pub fn tuning(&self) -> &'static VibeTuning {
        self.snapshot().current_vibe.tuning()
    }
}
