// src/watch/debounce.rs

//! Pure debounce state machine for one watch binding.
//!
//! `Idle -> Debouncing -> Running -> Idle`. Change events arriving while
//! `Debouncing` are coalesced into the single run that starts on window
//! expiry. An event arriving while `Running` does not cancel the in-flight
//! run; it queues exactly one follow-up run (no coalescing across an active
//! run, to avoid serving partially-written output).
//!
//! The machine has no timers or IO of its own: the async shell owns the
//! window timer and the task execution, and drives transitions through
//! [`Debouncer::on_event`], [`Debouncer::on_timer`] and
//! [`Debouncer::on_run_finished`].

/// Current state of a binding's debounce loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Debouncing,
    Running { queued: bool },
}

/// What the shell should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceAction {
    /// Start the debounce window timer.
    StartTimer,
    /// Run the bound tasks now.
    TriggerRun,
    /// Nothing to do.
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    state: DebounceState,
}

impl Debouncer {
    pub fn new() -> Self {
        Self {
            state: DebounceState::Idle,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// A filesystem change event for this binding arrived.
    pub fn on_event(&mut self) -> DebounceAction {
        match self.state {
            DebounceState::Idle => {
                self.state = DebounceState::Debouncing;
                DebounceAction::StartTimer
            }
            DebounceState::Debouncing => DebounceAction::None,
            DebounceState::Running { .. } => {
                self.state = DebounceState::Running { queued: true };
                DebounceAction::None
            }
        }
    }

    /// The debounce window expired.
    pub fn on_timer(&mut self) -> DebounceAction {
        match self.state {
            DebounceState::Debouncing => {
                self.state = DebounceState::Running { queued: false };
                DebounceAction::TriggerRun
            }
            // Stale timer; ignore.
            DebounceState::Idle | DebounceState::Running { .. } => DebounceAction::None,
        }
    }

    /// The in-flight run finished (success or failure).
    pub fn on_run_finished(&mut self) -> DebounceAction {
        match self.state {
            DebounceState::Running { queued: true } => {
                self.state = DebounceState::Running { queued: false };
                DebounceAction::TriggerRun
            }
            DebounceState::Running { queued: false } => {
                self.state = DebounceState::Idle;
                DebounceAction::None
            }
            DebounceState::Idle | DebounceState::Debouncing => DebounceAction::None,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_within_window_coalesce_to_one_run() {
        let mut deb = Debouncer::new();
        assert_eq!(deb.on_event(), DebounceAction::StartTimer);
        // Two more events before the window expires: no new timers, no runs.
        assert_eq!(deb.on_event(), DebounceAction::None);
        assert_eq!(deb.on_event(), DebounceAction::None);

        assert_eq!(deb.on_timer(), DebounceAction::TriggerRun);
        assert_eq!(deb.state(), DebounceState::Running { queued: false });

        assert_eq!(deb.on_run_finished(), DebounceAction::None);
        assert_eq!(deb.state(), DebounceState::Idle);
    }

    #[test]
    fn spaced_events_produce_separate_runs() {
        let mut deb = Debouncer::new();

        for _ in 0..3 {
            assert_eq!(deb.on_event(), DebounceAction::StartTimer);
            assert_eq!(deb.on_timer(), DebounceAction::TriggerRun);
            assert_eq!(deb.on_run_finished(), DebounceAction::None);
            assert_eq!(deb.state(), DebounceState::Idle);
        }
    }

    #[test]
    fn events_while_running_queue_exactly_one_follow_up() {
        let mut deb = Debouncer::new();
        deb.on_event();
        deb.on_timer();

        // Several events while the run is in flight.
        assert_eq!(deb.on_event(), DebounceAction::None);
        assert_eq!(deb.on_event(), DebounceAction::None);
        assert_eq!(deb.state(), DebounceState::Running { queued: true });

        // One follow-up run, then idle.
        assert_eq!(deb.on_run_finished(), DebounceAction::TriggerRun);
        assert_eq!(deb.on_run_finished(), DebounceAction::None);
        assert_eq!(deb.state(), DebounceState::Idle);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut deb = Debouncer::new();
        assert_eq!(deb.on_timer(), DebounceAction::None);
        deb.on_event();
        deb.on_timer();
        // A second expiry while already running must not trigger again.
        assert_eq!(deb.on_timer(), DebounceAction::None);
    }
}
