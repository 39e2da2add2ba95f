use vf_core::config::EngineConfig;
use vf_core::frame::FeatureFrame;
use vf_core::vibe::{Vibe, VibePhase};

use crate::session::Session;

/// Summary of a full pre-recorded frame sequence run through a fresh
/// engine. Utilisé pour le tuning offline et les tests de régression.
#[derive(Clone, Copy, Debug)]
pub struct TimelineReport {
    /// Final vibe label.
    pub vibe: Vibe,
    /// Final vibe confidence.
    pub vibe_confidence: f32,
    /// Whether the session ended Locked or still Collecting.
    pub vibe_phase: VibePhase,
    /// Timestamp of the frame on which the lock committed, if any.
    pub lock_time: Option<f64>,
    /// One-shot event totals across the sequence.
    pub onset_count: u32,
    /// Drops observed.
    pub drop_count: u32,
    /// Section boundaries observed.
    pub section_count: u32,
    /// Brightness spikes observed.
    pub spike_count: u32,
    /// Fraction of frames spent in chorus mode.
    pub chorus_ratio: f32,
    /// Fraction of frames spent in build-up mode.
    pub build_up_ratio: f32,
    /// Mean BPM estimate over the sequence.
    pub mean_bpm: f32,
    /// Number of frames evaluated.
    pub frames: usize,
}

/// Run a recorded feature sequence through a fresh session and summarize.
///
/// Every frame goes through the same `feed()` path a live stream would,
/// so the report reflects exactly what a renderer would have seen.
///
/// # Example
/// ```
/// use vf_core::config::EngineConfig;
/// use vf_core::frame::FeatureFrame;
/// use vf_engine::timeline::evaluate;
/// let report = evaluate(EngineConfig::default(), &[FeatureFrame::default()]);
/// assert_eq!(report.frames, 1);
/// ```
#[must_use]
pub fn evaluate(config: EngineConfig, frames: &[FeatureFrame]) -> TimelineReport {
    let mut session = Session::new(config);
    session.start();

    let mut report = TimelineReport {
        vibe: Vibe::Neutral,
        vibe_confidence: 0.0,
        vibe_phase: VibePhase::Collecting,
        lock_time: None,
        onset_count: 0,
        drop_count: 0,
        section_count: 0,
        spike_count: 0,
        chorus_ratio: 0.0,
        build_up_ratio: 0.0,
        mean_bpm: 0.0,
        frames: frames.len(),
    };

    let mut chorus_frames = 0usize;
    let mut build_up_frames = 0usize;
    let mut bpm_sum = 0.0f64;

    for frame in frames {
        session.feed(frame);
        let s = session.snapshot();

        report.onset_count += u32::from(s.did_onset);
        report.drop_count += u32::from(s.did_drop);
        report.section_count += u32::from(s.did_section_boundary);
        report.spike_count += u32::from(s.did_brightness_spike);
        chorus_frames += usize::from(s.is_chorus);
        build_up_frames += usize::from(s.is_build_up);
        bpm_sum += f64::from(s.current_bpm);

        if report.lock_time.is_none() && s.vibe_phase == VibePhase::Locked {
            report.lock_time = Some(frame.timestamp);
        }
        report.vibe = s.current_vibe;
        report.vibe_confidence = s.vibe_confidence;
        report.vibe_phase = s.vibe_phase;
    }

    if !frames.is_empty() {
        let n = frames.len() as f32;
        report.chorus_ratio = chorus_frames as f32 / n;
        report.build_up_ratio = build_up_frames as f32 / n;
        report.mean_bpm = (bpm_sum / frames.len() as f64) as f32;
    }

    report
}
