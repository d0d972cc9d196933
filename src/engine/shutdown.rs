// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

/// Represents the current run state.
#[derive(PartialEq)]
enum State {
    Running,
    ShutDown,
}

/// A shutdown handle is shared between the control loop and whoever may stop it. It's the
/// loop's responsibility to check it between ticks.
#[derive(Clone)]
pub struct Shutdown {
    /// Set once the loop should stop.
    state: Arc<Mutex<State>>,
    /// Wakes the loop out of its end of tick sleep.
    condvar: Arc<Condvar>,
}

impl Shutdown {
    /// Creates a new shutdown handle.
    pub fn new() -> Shutdown {
        Shutdown {
            state: Arc::new(Mutex::new(State::Running)),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Returns true if the loop has been asked to stop.
    pub fn is_shut_down(&self) -> bool {
        *self.state.lock() == State::ShutDown
    }

    /// Sleeps for the given duration or until shut down, whichever comes first. Returns true
    /// if the handle was shut down.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut state = self.state.lock();
        while *state == State::Running {
            if self.condvar.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        *state == State::ShutDown
    }

    /// Asks the loop to stop.
    pub fn shut_down(&self) {
        let mut state = self.state.lock();
        if *state == State::Running {
            *state = State::ShutDown;
            self.condvar.notify_all();
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
