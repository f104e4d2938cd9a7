/// Session countdown. `idle` until `setup`, then `start` begins counting;
/// `pause`/`resume` flip a flag without leaving `running`; `update` is a
/// no-op unless running-and-not-paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct Timer {
    state: TimerState,
    paused: bool,
    duration_ms: i64,
    time_ms: i64,
}

impl Timer {
    pub fn setup(duration_seconds: i64) -> Self {
        Timer {
            state: TimerState::Idle,
            paused: false,
            duration_ms: duration_seconds * 1000,
            time_ms: 0,
        }
    }

    pub fn start(&mut self) {
        self.state = TimerState::Running;
        self.paused = false;
        self.time_ms = 0;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
        self.time_ms = self.duration_ms;
    }

    pub fn is_stopped(&self) -> bool {
        self.state == TimerState::Stopped
    }

    /// Advances the clock by `delta_ms` while running-and-not-paused.
    /// Returns `true` the instant the timer auto-stops (fires `onTimesUp`).
    /// Unlike an explicit `stop()`, the overshoot past `duration_ms` is kept
    /// rather than clamped, so `get_time_remaining` reports how far past
    /// zero the expiring tick landed.
    pub fn update(&mut self, delta_ms: i64) -> bool {
        if self.state != TimerState::Running || self.paused {
            return false;
        }
        self.time_ms += delta_ms;
        if self.time_ms >= self.duration_ms {
            self.state = TimerState::Stopped;
            return true;
        }
        false
    }

    pub fn get_time_remaining(&self) -> i64 {
        self.duration_ms - self.time_ms
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.time_ms
    }
}
