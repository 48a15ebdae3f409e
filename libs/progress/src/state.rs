/// Smoothed progress at or above which a finished session counts as complete.
pub const COMPLETE_THRESHOLD: f64 = 99.9;

/// Residual below which the animation stops chasing its target.
const RESIDUAL: f64 = 0.01;

/// The lifecycle of a progress session.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Phase {
    /// No session is running.
    #[default]
    Idle,
    /// Polling the progress file while the animation follows.
    Sampling,
    /// The final sample arrived; the animation is catching up.
    Animating,
    /// Progress reached 100 and is being held on screen.
    Complete,
}

/// Raw samples and the smoothed value that follows them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressState {
    phase: Phase,
    target: u8,
    current: f64,
    step: f64,
    completions: usize,
}

impl ProgressState {
    /// Creates an idle state whose animation closes `step` of the remaining
    /// distance on every tick.
    pub fn new(step: f64) -> Self {
        Self {
            phase: Phase::Idle,
            target: 0,
            current: 0.0,
            step: step.clamp(f64::EPSILON, 1.0),
            completions: 0,
        }
    }

    /// Begins a new session from zero.
    pub fn start(&mut self) {
        self.phase = Phase::Sampling;
        self.target = 0;
        self.current = 0.0;
    }

    /// Records a raw sample and returns whether sampling should continue.
    ///
    /// Samples are clamped to 100 and never lower the target.
    pub fn observe(&mut self, sample: u8) -> bool {
        if self.phase != Phase::Sampling {
            return false;
        }
        self.target = self.target.max(sample.min(100));
        if self.target == 100 {
            self.phase = Phase::Animating;
            return false;
        }
        true
    }

    /// Advances the animation by one frame.
    ///
    /// Returns `true` exactly when the session enters [`Phase::Complete`].
    pub fn tick(&mut self) -> bool {
        if !matches!(self.phase, Phase::Sampling | Phase::Animating) {
            return false;
        }
        let diff = f64::from(self.target) - self.current;
        if diff.abs() > RESIDUAL {
            self.current += diff * self.step;
        } else if self.target == 100 {
            self.current = 100.0;
        }
        if self.phase == Phase::Animating && self.current >= COMPLETE_THRESHOLD {
            self.current = 100.0;
            self.phase = Phase::Complete;
            self.completions += 1;
            return true;
        }
        false
    }

    /// Ends a completed session after its hold period.
    pub fn finish(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Abandons the session in whatever phase it is in.
    pub fn stop(&mut self) {
        self.phase = Phase::Idle;
    }

    /// The current phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The highest sample seen in this session.
    #[inline]
    pub fn target(&self) -> u8 {
        self.target
    }

    /// The smoothed percentage.
    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// How many times a session driven by this state reached [`Phase::Complete`].
    #[inline]
    pub fn completions(&self) -> usize {
        self.completions
    }
}

/// Parses the contents of a progress file.
///
/// The last non-blank line holds the latest percentage. Returns `None` if that
/// line is not a non-negative integer.
pub fn parse_sample(contents: &str) -> Option<u8> {
    let last = contents.lines().map(str::trim).rfind(|l| !l.is_empty())?;
    let value: i64 = last.parse().ok()?;
    if value < 0 {
        return None;
    }
    Some(value.min(100) as u8)
}
