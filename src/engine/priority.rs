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
use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

/// Default priority for the control loop thread when DRUMTRIG_THREAD_PRIORITY is unset.
const DEFAULT_LOOP_THREAD_PRIORITY: u8 = 70;

const THREAD_PRIORITY_VAR: &str = "DRUMTRIG_THREAD_PRIORITY";
const DISABLE_RT_VAR: &str = "DRUMTRIG_DISABLE_RT";

/// Reads DRUMTRIG_THREAD_PRIORITY (0-99), falling back to the default for anything else.
pub fn loop_thread_priority() -> Option<ThreadPriorityValue> {
    let priority = std::env::var(THREAD_PRIORITY_VAR)
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|n| *n < 100)
        .unwrap_or(DEFAULT_LOOP_THREAD_PRIORITY);
    ThreadPriorityValue::try_from(priority).ok()
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

/// Returns whether we should attempt RT (SCHED_FIFO) scheduling for the control loop.
/// Default: enabled. Opt out with DRUMTRIG_DISABLE_RT=1.
pub fn rt_enabled() -> bool {
    !env_flag(DISABLE_RT_VAR)
}

/// Raises the priority of the calling thread. Failures are logged and otherwise ignored.
pub fn configure_loop_thread_priority() {
    let Some(priority) = loop_thread_priority() else {
        return;
    };
    let tp = ThreadPriority::Crossplatform(priority);
    if let Err(e) = set_current_thread_priority(tp) {
        warn!(err = ?e, "Failed to raise control loop thread priority");
    }

    #[cfg(unix)]
    if rt_enabled() {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        let tid = thread_native_id();
        match set_thread_priority_and_policy(
            tid,
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => {
                info!("Enabled RT SCHED_FIFO for control loop thread");
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to set RT SCHED_FIFO for control loop thread"
                );
            }
        }
    }
}
