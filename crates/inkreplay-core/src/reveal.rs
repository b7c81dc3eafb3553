//! Frame-driven progressive reveal of a recording.
//!
//! The host calls [`RevealScheduler::advance`] exactly once per frame. Two
//! policies share the scheduler:
//!
//! - [`IndexReveal`] shows one more point per frame, so playback takes
//!   exactly as many frames as the recording has points.
//! - [`ArcLengthReveal`] hides a shrinking fraction of the curve length,
//!   so playback takes the same number of frames for any point count.
//!
//! The two durations differ for the same recording. Neither is normalized
//! to wall time.

use crate::recording::{RecordingId, StrokeRecording};

/// Reference per-frame step for [`ArcLengthReveal`].
pub const DEFAULT_REVEAL_STEP: f64 = 0.003;

/// Snapshot of a reveal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealState {
    /// `revealed_count` of `total` points are visible.
    Index { revealed_count: usize, total: usize },
    /// The trailing `revealed_fraction` of the curve length is still hidden.
    /// 1.0 is fully hidden, 0.0 fully drawn.
    ArcLength { revealed_fraction: f64 },
}

impl RevealState {
    /// Number of visible points, for index reveals.
    pub fn revealed_count(&self) -> Option<usize> {
        match *self {
            RevealState::Index { revealed_count, .. } => Some(revealed_count),
            RevealState::ArcLength { .. } => None,
        }
    }

    /// Hidden length fraction, for arc-length reveals.
    pub fn revealed_fraction(&self) -> Option<f64> {
        match *self {
            RevealState::ArcLength { revealed_fraction } => Some(revealed_fraction),
            RevealState::Index { .. } => None,
        }
    }
}

/// A reveal parameterization.
pub trait RevealPolicy {
    /// Return to the zero-revealed state for a recording of `total` points.
    fn reset(&mut self, total: usize);

    /// Advance by one frame. Has no effect once complete.
    fn step(&mut self);

    fn is_complete(&self) -> bool;

    fn state(&self) -> RevealState;

    /// Frames a full playback of `total` points takes.
    fn estimated_frames(&self, total: usize) -> usize;
}

/// Reveals one point per frame.
#[derive(Debug, Clone, Default)]
pub struct IndexReveal {
    revealed_count: usize,
    total: usize,
}

impl IndexReveal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevealPolicy for IndexReveal {
    fn reset(&mut self, total: usize) {
        self.revealed_count = 0;
        self.total = total;
    }

    fn step(&mut self) {
        if self.revealed_count < self.total {
            self.revealed_count += 1;
        }
    }

    fn is_complete(&self) -> bool {
        self.revealed_count == self.total
    }

    fn state(&self) -> RevealState {
        RevealState::Index {
            revealed_count: self.revealed_count,
            total: self.total,
        }
    }

    fn estimated_frames(&self, total: usize) -> usize {
        total
    }
}

/// Reveals a fixed fraction of the curve length per frame.
#[derive(Debug, Clone)]
pub struct ArcLengthReveal {
    step: f64,
    ticks: usize,
    revealed_fraction: f64,
}

impl ArcLengthReveal {
    /// `step` is the fraction of curve length revealed per frame. Steps
    /// above 1 are clamped; non-positive or non-finite steps fall back to
    /// [`DEFAULT_REVEAL_STEP`].
    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step.min(1.0)
        } else {
            log::warn!("Invalid reveal step {}, using {}", step, DEFAULT_REVEAL_STEP);
            DEFAULT_REVEAL_STEP
        };
        Self {
            step,
            ticks: 0,
            revealed_fraction: 1.0,
        }
    }

    pub fn step_size(&self) -> f64 {
        self.step
    }
}

impl Default for ArcLengthReveal {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_STEP)
    }
}

impl RevealPolicy for ArcLengthReveal {
    fn reset(&mut self, _total: usize) {
        self.ticks = 0;
        self.revealed_fraction = 1.0;
    }

    fn step(&mut self) {
        if self.is_complete() {
            return;
        }
        self.ticks += 1;
        // Derived from the tick count so the step does not drift.
        self.revealed_fraction = (1.0 - self.ticks as f64 * self.step).max(0.0);
    }

    fn is_complete(&self) -> bool {
        self.revealed_fraction <= 0.0
    }

    fn state(&self) -> RevealState {
        RevealState::ArcLength {
            revealed_fraction: self.revealed_fraction,
        }
    }

    fn estimated_frames(&self, _total: usize) -> usize {
        (1.0 / self.step).ceil() as usize
    }
}

/// The reveal currently bound to a recording.
#[derive(Debug, Clone, Copy)]
struct RevealTask {
    recording: RecordingId,
    ticks: usize,
}

/// Drives one reveal policy for one display surface.
///
/// At most one task is active. Starting a new recording cancels the
/// previous task before the policy state is reset.
#[derive(Debug, Clone)]
pub struct RevealScheduler<P: RevealPolicy> {
    policy: P,
    task: Option<RevealTask>,
}

/// Scheduler used by the 2D renderer.
pub type IndexScheduler = RevealScheduler<IndexReveal>;

/// Scheduler used by the 3D ribbon.
pub type ArcLengthScheduler = RevealScheduler<ArcLengthReveal>;

impl<P: RevealPolicy> RevealScheduler<P> {
    pub fn new(policy: P) -> Self {
        Self { policy, task: None }
    }

    /// Begin revealing `recording` from the zero-revealed state.
    ///
    /// An empty recording schedules nothing.
    pub fn start(&mut self, recording: &StrokeRecording) {
        self.cancel();
        self.policy.reset(recording.len());

        if recording.is_empty() || self.policy.is_complete() {
            log::debug!("Recording {} has nothing to reveal", recording.id());
            return;
        }

        log::debug!(
            "Starting reveal of recording {} (~{} frames)",
            recording.id(),
            self.policy.estimated_frames(recording.len())
        );
        self.task = Some(RevealTask {
            recording: recording.id(),
            ticks: 0,
        });
    }

    /// Drop the active task. Policy state is left where it stopped.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            log::debug!(
                "Cancelled reveal of recording {} after {} frames",
                task.recording,
                task.ticks
            );
        }
    }

    /// Cancel the active task and return the policy to the zero-revealed
    /// state of an empty recording.
    pub fn reset(&mut self) {
        self.cancel();
        self.policy.reset(0);
    }

    /// Perform this frame's advance. Returns `false` when no task is active.
    pub fn advance(&mut self) -> bool {
        let Some(task) = self.task.as_mut() else {
            return false;
        };

        self.policy.step();
        task.ticks += 1;

        if self.policy.is_complete() {
            log::debug!(
                "Reveal of recording {} complete after {} frames",
                task.recording,
                task.ticks
            );
            self.task = None;
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        self.policy.is_complete()
    }

    /// Whether a task is scheduled for the next frame.
    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn state(&self) -> RevealState {
        self.policy.state()
    }

    /// Recording bound to the active task.
    pub fn recording_id(&self) -> Option<RecordingId> {
        self.task.map(|task| task.recording)
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl Default for IndexScheduler {
    fn default() -> Self {
        Self::new(IndexReveal::new())
    }
}

impl Default for ArcLengthScheduler {
    fn default() -> Self {
        Self::new(ArcLengthReveal::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RawSample;

    fn recording(n: usize) -> StrokeRecording {
        let samples = (0..n).map(|i| RawSample::new(i as f64, 0.0, i as i64 * 16, None));
        StrokeRecording::from_samples(samples, 100.0, 100.0).unwrap()
    }

    #[test]
    fn test_index_reveal_terminates_in_total_ticks() {
        let rec = recording(5);
        let mut scheduler = IndexScheduler::default();
        scheduler.start(&rec);
        assert_eq!(scheduler.state().revealed_count(), Some(0));

        let mut ticks = 0;
        let mut last = 0;
        while scheduler.advance() {
            ticks += 1;
            let count = scheduler.state().revealed_count().unwrap();
            assert_eq!(count, last + 1);
            last = count;
        }
        assert_eq!(ticks, 5);
        assert!(scheduler.is_complete());
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.state(), RevealState::Index { revealed_count: 5, total: 5 });
    }

    #[test]
    fn test_index_restart_resets_and_cancels() {
        let first = recording(10);
        let second = recording(3);
        let mut scheduler = IndexScheduler::default();

        scheduler.start(&first);
        scheduler.advance();
        scheduler.advance();
        assert_eq!(scheduler.recording_id(), Some(first.id()));

        scheduler.start(&second);
        assert_eq!(scheduler.recording_id(), Some(second.id()));
        assert_eq!(scheduler.state(), RevealState::Index { revealed_count: 0, total: 3 });

        let mut ticks = 0;
        while scheduler.advance() {
            ticks += 1;
        }
        assert_eq!(ticks, 3);
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let rec = recording(4);
        let mut scheduler = IndexScheduler::default();
        scheduler.start(&rec);
        scheduler.advance();
        scheduler.cancel();

        assert!(!scheduler.advance());
        assert_eq!(scheduler.state().revealed_count(), Some(1));
        assert!(!scheduler.is_complete());
    }

    #[test]
    fn test_empty_recording_schedules_nothing() {
        let rec = recording(0);
        let mut index = IndexScheduler::default();
        index.start(&rec);
        assert!(!index.is_active());
        assert!(!index.advance());

        let mut arc = ArcLengthScheduler::default();
        arc.start(&rec);
        assert!(!arc.is_active());
        assert!(!arc.advance());
    }

    #[test]
    fn test_arc_length_reveal_decreases_by_step() {
        let rec = recording(3);
        let mut scheduler = ArcLengthScheduler::new(ArcLengthReveal::new(0.25));
        scheduler.start(&rec);
        assert_eq!(scheduler.state(), RevealState::ArcLength { revealed_fraction: 1.0 });

        let mut previous = 1.0;
        let mut ticks = 0;
        while scheduler.advance() {
            ticks += 1;
            let fraction = scheduler.state().revealed_fraction().unwrap();
            assert!(fraction >= 0.0);
            assert!((previous - fraction - 0.25).abs() < 1e-12);
            previous = fraction;
        }
        assert_eq!(ticks, 4);
        assert!(scheduler.is_complete());
    }

    #[test]
    fn test_arc_length_clamps_at_zero() {
        let mut policy = ArcLengthReveal::new(0.3);
        policy.reset(2);
        let mut fractions = Vec::new();
        for _ in 0..6 {
            policy.step();
            fractions.push(policy.state().revealed_fraction().unwrap());
        }
        assert!((fractions[2] - 0.1).abs() < 1e-12);
        assert_eq!(fractions[3], 0.0);
        assert!(fractions.windows(2).all(|w| w[1] <= w[0]));
        assert!(fractions.iter().all(|f| *f >= 0.0));
    }

    #[test]
    fn test_reference_step_duration() {
        let rec = recording(2);
        let mut scheduler = ArcLengthScheduler::default();
        scheduler.start(&rec);
        let mut ticks = 0;
        while scheduler.advance() {
            ticks += 1;
        }
        assert_eq!(ticks, scheduler.policy().estimated_frames(2));
        assert_eq!(ticks, 334);
    }

    #[test]
    fn test_arc_length_step_is_guarded() {
        assert!((ArcLengthReveal::new(0.0).step_size() - DEFAULT_REVEAL_STEP).abs() < f64::EPSILON);
        assert!((ArcLengthReveal::new(-0.1).step_size() - DEFAULT_REVEAL_STEP).abs() < f64::EPSILON);
        assert!((ArcLengthReveal::new(f64::NAN).step_size() - DEFAULT_REVEAL_STEP).abs() < f64::EPSILON);
        assert!((ArcLengthReveal::new(4.0).step_size() - 1.0).abs() < f64::EPSILON);

        let mut policy = ArcLengthReveal::new(-0.5);
        policy.reset(3);
        let mut previous = 1.0;
        let mut ticks = 0;
        while !policy.is_complete() {
            policy.step();
            let fraction = policy.state().revealed_fraction().unwrap();
            assert!(fraction <= previous);
            previous = fraction;
            ticks += 1;
        }
        assert_eq!(ticks, policy.estimated_frames(3));
    }

    #[test]
    fn test_reset_returns_to_zero_revealed() {
        let rec = recording(4);
        let mut scheduler = ArcLengthScheduler::new(ArcLengthReveal::new(0.1));
        scheduler.start(&rec);
        scheduler.advance();
        scheduler.advance();

        scheduler.reset();
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.state(), RevealState::ArcLength { revealed_fraction: 1.0 });
    }

    #[test]
    fn test_durations_differ_per_policy() {
        let index = IndexReveal::new();
        let arc = ArcLengthReveal::default();
        assert_eq!(index.estimated_frames(50), 50);
        assert_eq!(index.estimated_frames(5000), 5000);
        assert_eq!(arc.estimated_frames(50), arc.estimated_frames(5000));
    }
}
