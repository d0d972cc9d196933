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
use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::debug;

/// The slider that shows the volume pot.
pub const VOLUME_SLIDER: &str = "volume";

/// The rendering side of the device. The control loop drives it but owns none of its state.
pub trait Panel: Send {
    /// How long the UI can stay idle before it needs servicing again, in milliseconds.
    fn next_idle_budget(&mut self) -> u32;

    /// Sets the value of a slider.
    fn set_slider_value(&mut self, identifier: &str, value: i32);

    /// Highlights the panel of the given channel.
    fn highlight_panel(&mut self, index: usize);
}

/// What the headless panel has been asked to show. Shared so it can be inspected from
/// outside the control loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Display {
    pub sliders: HashMap<String, i32>,
    pub highlighted: Option<usize>,
}

/// A panel without a screen. Reports a fixed idle budget and remembers what it was told.
pub struct Headless {
    idle_budget: u32,
    display: Arc<Mutex<Display>>,
}

impl Headless {
    /// Creates a headless panel that always reports the given idle budget.
    pub fn new(idle_budget: Duration) -> Headless {
        Headless {
            idle_budget: u32::try_from(idle_budget.as_millis()).unwrap_or(u32::MAX),
            display: Arc::new(Mutex::new(Display::default())),
        }
    }

    /// A handle to what is currently shown.
    pub fn display(&self) -> Arc<Mutex<Display>> {
        self.display.clone()
    }
}

impl Panel for Headless {
    fn next_idle_budget(&mut self) -> u32 {
        self.idle_budget
    }

    fn set_slider_value(&mut self, identifier: &str, value: i32) {
        debug!(slider = identifier, value, "Slider updated.");
        self.display
            .lock()
            .sliders
            .insert(identifier.to_string(), value);
    }

    fn highlight_panel(&mut self, index: usize) {
        debug!(panel = index, "Panel highlighted.");
        self.display.lock().highlighted = Some(index);
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{Headless, Panel, VOLUME_SLIDER};

    #[test]
    fn test_headless() {
        let mut panel = Headless::new(Duration::from_millis(30));
        let display = panel.display();
        assert_eq!(30, panel.next_idle_budget());

        panel.set_slider_value(VOLUME_SLIDER, 80);
        panel.highlight_panel(4);
        assert_eq!(Some(&80), display.lock().sliders.get(VOLUME_SLIDER));
        assert_eq!(Some(4), display.lock().highlighted);
    }

    #[test]
    fn test_huge_idle_budget_saturates() {
        let mut panel = Headless::new(Duration::from_secs(u64::MAX));
        assert_eq!(u32::MAX, panel.next_idle_budget());
    }
}
