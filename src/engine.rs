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
    error::Error,
    time::{Duration, Instant},
};

use tokio::{
    sync::mpsc::{self, error::TryRecvError, Receiver},
    task::JoinHandle,
};
use tracing::{debug, error, info, span, warn, Level};

use crate::{
    adc::{self, Sequencer},
    channel::Channel,
    config,
    controller::{self, Event},
    dispatch::{udp, Dispatcher},
    panel::{Headless, Panel, VOLUME_SLIDER},
    sampler::{self, Sampler, Samples},
    sounds::SoundMap,
    trigger::{Detector, EventKind},
};

pub mod priority;
pub mod shutdown;
pub mod telemetry;

pub use shutdown::Shutdown;
use telemetry::Throughput;

/// Idle budgets above this are treated as bogus.
const MAX_IDLE_BUDGET_MS: u32 = 1000;

/// What a bogus idle budget is replaced with.
const FALLBACK_IDLE_BUDGET: Duration = Duration::from_millis(30);

/// How many input events can queue up between ticks.
const EVENT_QUEUE_SIZE: usize = 16;

/// Raw ADC counts per step of the volume pot.
const VOLUME_DIVISOR: i32 = 259;

/// Maps an ADC channel to the sound channel it drives. The pads are wired in reverse.
pub fn sound_channel(adc_channel: Channel) -> Channel {
    adc_channel.mirrored()
}

/// Converts the idle budget reported by the panel into the end of tick sleep.
pub fn idle_budget(reported_ms: u32) -> Duration {
    if reported_ms > MAX_IDLE_BUDGET_MS {
        FALLBACK_IDLE_BUDGET
    } else {
        Duration::from_millis(u64::from(reported_ms))
    }
}

/// Converts a volume pot sample into a 0-100 volume. The pot reads backwards.
pub fn volume_from_sample(sample: i16) -> i32 {
    (100 - i32::from(sample) / VOLUME_DIVISOR).clamp(0, 100)
}

/// Opens the ADC bus described by the config and makes sure both ADCs answer.
pub fn sequencer(config: &config::Adc) -> Result<Sequencer, Box<dyn Error>> {
    let bus = adc::open(config)?;
    let mut sequencer = Sequencer::new(
        bus,
        config.base_address(),
        config.data_rate()?,
        config.conversion_timeout()?,
        config.poll_interval()?,
    );
    sequencer.initialize()?;
    info!(sequencer = %sequencer, "ADCs initialized.");
    Ok(sequencer)
}

/// The per tick work: sample every channel, turn edges into OSC messages, keep the panel
/// up to date and apply input events. Owns the detector state and the sound map.
pub struct ControlLoop {
    sampler: Sampler,
    order: Vec<Channel>,
    detector: Detector,
    sounds: SoundMap,
    dispatcher: Dispatcher,
    panel: Box<dyn Panel>,
    volume_channel: Option<Channel>,
    volume: Option<i32>,
    events_rx: Option<Receiver<Event>>,
    throughput: Throughput,
}

impl ControlLoop {
    pub fn new(
        sampler: Sampler,
        sounds: SoundMap,
        dispatcher: Dispatcher,
        panel: Box<dyn Panel>,
        volume_channel: Option<Channel>,
        events_rx: Option<Receiver<Event>>,
    ) -> ControlLoop {
        ControlLoop {
            sampler,
            order: sampler::interleaved(),
            detector: Detector::new(),
            sounds,
            dispatcher,
            panel,
            volume_channel,
            volume: None,
            events_rx,
            throughput: Throughput::new(Instant::now()),
        }
    }

    /// The edge detector state, indexed by sound channel.
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn sounds(&self) -> &SoundMap {
        &self.sounds
    }

    /// Runs a single tick and returns how long to sleep before the next one.
    pub fn tick(&mut self) -> Duration {
        let idle = idle_budget(self.panel.next_idle_budget());

        let samples = self.sampler.sample_all(&self.order);
        self.detect(&samples);
        self.update_volume(&samples);
        self.drain_events();

        if let Some(sps) = self.throughput.record(Instant::now()) {
            info!(sps = format!("{:.1}", sps), "Sampling rate.");
        }

        idle
    }

    /// Ticks until the shutdown handle fires. A conversion that is under way when it fires
    /// still completes.
    pub fn run(mut self, shutdown: &Shutdown) {
        let span = span!(Level::INFO, "control loop");
        let _enter = span.enter();

        info!(
            dispatcher = %self.dispatcher,
            sounds = %self.sounds,
            "Control loop started."
        );

        while !shutdown.is_shut_down() {
            let idle = self.tick();
            if shutdown.sleep(idle) {
                break;
            }
        }

        info!("Control loop stopped.");
    }

    fn detect(&mut self, samples: &Samples) {
        for adc_channel in Channel::all() {
            if Some(adc_channel) == self.volume_channel {
                continue;
            }
            // No sample means no new information for the detector.
            let Some(sample) = samples.get(adc_channel) else {
                continue;
            };

            let channel = sound_channel(adc_channel);
            if let Some(event) = self.detector.update(channel, sample) {
                debug!(
                    adc_channel = adc_channel.index(),
                    channel = channel.index(),
                    sample,
                    event = %event.kind,
                    "Edge detected."
                );
                self.dispatch(channel, event.kind);
            }
        }
    }

    fn update_volume(&mut self, samples: &Samples) {
        let Some(sample) = self.volume_channel.and_then(|channel| samples.get(channel)) else {
            return;
        };

        let volume = volume_from_sample(sample);
        let moved = self
            .volume
            .map_or(true, |current| (volume - current).abs() > 1);
        if moved {
            self.volume = Some(volume);
            self.panel.set_slider_value(VOLUME_SLIDER, volume);
        }
    }

    fn drain_events(&mut self) {
        loop {
            let Some(events_rx) = self.events_rx.as_mut() else {
                return;
            };
            match events_rx.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    info!("Input closed.");
                    self.events_rx = None;
                    return;
                }
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        info!(event = format!("{:?}", event), "Received event.");
        match event {
            Event::Trigger(channel) => self.manual(channel, EventKind::Trigger),
            Event::Release(channel) => self.manual(channel, EventKind::Release),
            Event::Remap { channel, sound } => {
                if let Err(e) = self.sounds.set(channel, sound) {
                    warn!(channel, sound, err = %e, "Ignoring remap.");
                }
            }
            Event::Select(channel) => match Channel::new(channel) {
                Ok(channel) => self.panel.highlight_panel(channel.index()),
                Err(e) => warn!(err = %e, "Ignoring selection."),
            },
        }
    }

    /// Sends an event straight to the synthesizer. Detector state is left alone.
    fn manual(&mut self, channel: usize, kind: EventKind) {
        match Channel::new(channel) {
            Ok(channel) => self.dispatch(channel, kind),
            Err(e) => warn!(event = %kind, err = %e, "Ignoring manual event."),
        }
    }

    fn dispatch(&mut self, channel: Channel, kind: EventKind) {
        if let Err(e) = self.dispatcher.dispatch(&self.sounds, channel, kind) {
            error!(
                channel = channel.index(),
                event = %kind,
                err = %e,
                "Error dispatching event."
            );
        }
    }
}

/// The running kit: the control loop on its own thread plus the input driver.
pub struct Engine {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl Engine {
    /// Opens the bus and the OSC endpoint and starts the control loop. Any failure to open
    /// either is fatal. Must be called from within a tokio runtime.
    pub fn start(kit: &config::Kit) -> Result<Engine, Box<dyn Error>> {
        let sequencer = sequencer(kit.adc())?;

        let endpoint = kit.endpoint();
        let transport = udp::Transport::connect(endpoint.host(), endpoint.port())?;
        let dispatcher = Dispatcher::new(Box::new(transport), endpoint.namespace());

        let panel_config = kit.panel();
        let panel = Headless::new(panel_config.idle_budget()?);

        let events_rx = controller::driver(&kit.input()).map(|driver| {
            let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
            let input = driver.monitor_events(events_tx);
            tokio::spawn(async move {
                match input.await {
                    Ok(Ok(())) => info!("Input driver stopped."),
                    Ok(Err(e)) => warn!(err = %e, "Input driver stopped."),
                    Err(e) => error!(err = %e, "Error waiting for input driver."),
                }
            });
            events_rx
        });

        let control_loop = ControlLoop::new(
            Sampler::new(sequencer),
            kit.sound_map()?,
            dispatcher,
            Box::new(panel),
            panel_config.volume_channel()?,
            events_rx,
        );

        let shutdown = Shutdown::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::task::spawn_blocking(move || {
                priority::configure_loop_thread_priority();
                control_loop.run(&shutdown);
            })
        };

        Ok(Engine { shutdown, handle })
    }

    /// A handle that stops the control loop when shut down.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Stops the control loop at the end of the current tick.
    pub fn stop(&self) {
        self.shutdown.shut_down();
    }

    /// Waits until the control loop exits.
    pub async fn join(self) -> Result<(), Box<dyn Error>> {
        self.handle.await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, sync::Arc, thread, time::Duration};

    use parking_lot::Mutex;
    use rosc::{OscMessage, OscType};
    use tokio::sync::mpsc::{self, Sender};

    use crate::{
        adc::{self, DataRate, Sequencer},
        channel::Channel,
        config,
        controller::Event,
        dispatch::{self, Dispatcher},
        panel::{Display, Headless, VOLUME_SLIDER},
        sampler::Sampler,
        sounds::{Sound, SoundMap},
    };

    use super::*;

    struct Harness {
        control_loop: ControlLoop,
        bus: adc::mock::Bus,
        transport: dispatch::mock::Transport,
        display: Arc<Mutex<Display>>,
        events_tx: Sender<Event>,
    }

    fn setup(idle: Duration, volume_channel: Option<Channel>) -> Harness {
        let bus = adc::mock::Bus::new("mock", 0x48);
        let sequencer = Sequencer::new(
            Box::new(bus.clone()),
            0x48,
            DataRate::default(),
            Duration::from_millis(100),
            Duration::from_micros(100),
        );
        let transport = dispatch::mock::Transport::new();
        let panel = Headless::new(idle);
        let display = panel.display();
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);

        let control_loop = ControlLoop::new(
            Sampler::new(sequencer),
            SoundMap::default(),
            Dispatcher::new(Box::new(transport.clone()), "drumkit"),
            Box::new(panel),
            volume_channel,
            Some(events_rx),
        );

        Harness {
            control_loop,
            bus,
            transport,
            display,
            events_tx,
        }
    }

    fn message(addr: &str, value: f32) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args: vec![OscType::Float(value)],
        }
    }

    #[test]
    fn test_idle_budget() {
        assert_eq!(Duration::from_millis(0), idle_budget(0));
        assert_eq!(Duration::from_millis(5), idle_budget(5));
        assert_eq!(Duration::from_millis(1000), idle_budget(1000));
        assert_eq!(Duration::from_millis(30), idle_budget(1001));
        assert_eq!(Duration::from_millis(30), idle_budget(u32::MAX));
    }

    #[test]
    fn test_tick_returns_idle_budget() {
        let mut harness = setup(Duration::from_millis(10), None);
        assert_eq!(Duration::from_millis(10), harness.control_loop.tick());

        let mut harness = setup(Duration::from_secs(5), None);
        assert_eq!(Duration::from_millis(30), harness.control_loop.tick());
    }

    #[test]
    fn test_sound_channel_is_mirrored() -> Result<(), Box<dyn Error>> {
        assert_eq!(Channel::new(0)?, sound_channel(Channel::new(7)?));
        assert_eq!(Channel::new(4)?, sound_channel(Channel::new(3)?));
        assert_eq!(Channel::new(7)?, sound_channel(Channel::new(0)?));
        Ok(())
    }

    #[test]
    fn test_kick_hit() {
        let mut harness = setup(Duration::ZERO, None);
        // ADC channel 7 drives sound channel 0, which plays the kick by default.
        harness.bus.set_samples(7, &[0, 520]);

        harness.control_loop.tick();
        assert!(harness.transport.messages().is_empty());

        harness.control_loop.tick();
        assert_eq!(
            vec![message("/drumkit/Kick", 1.0)],
            harness.transport.messages()
        );

        harness.transport.clear();
        harness.bus.set_samples(7, &[100]);
        harness.control_loop.tick();
        assert_eq!(
            vec![message("/drumkit/Kick", 0.0)],
            harness.transport.messages()
        );
    }

    #[test]
    fn test_adc_channel_zero_plays_crash() {
        let mut harness = setup(Duration::ZERO, None);
        harness.bus.set_samples(0, &[900]);

        harness.control_loop.tick();
        assert_eq!(
            vec![message("/drumkit/Crash", 1.0)],
            harness.transport.messages()
        );
    }

    #[test]
    fn test_stuck_channel_keeps_state() -> Result<(), Box<dyn Error>> {
        let mut harness = setup(Duration::ZERO, None);
        for channel in 0..8 {
            harness.bus.set_samples(channel, &[600]);
        }
        harness.bus.set_stuck(3, true);

        harness.control_loop.tick();

        // Every channel but ADC channel 3 (sound channel 4) triggered.
        assert_eq!(7, harness.transport.messages().len());
        assert!(!harness
            .transport
            .messages()
            .contains(&message("/drumkit/BassTom", 1.0)));

        let detector = harness.control_loop.detector();
        for adc_channel in Channel::all() {
            let state = detector.state(sound_channel(adc_channel));
            if adc_channel.index() == 3 {
                assert_eq!(0, state.previous_sample);
                assert!(!state.triggered);
            } else {
                assert_eq!(600, state.previous_sample);
                assert!(state.triggered);
            }
        }

        // Once unstuck the channel catches up on the next tick.
        harness.bus.set_stuck(3, false);
        harness.transport.clear();
        harness.control_loop.tick();
        assert_eq!(
            vec![message("/drumkit/BassTom", 1.0)],
            harness.transport.messages()
        );
        assert!(harness
            .control_loop
            .detector()
            .state(Channel::new(4)?)
            .triggered);
        Ok(())
    }

    #[test]
    fn test_dispatch_failure_does_not_stop_loop() -> Result<(), Box<dyn Error>> {
        let mut harness = setup(Duration::ZERO, None);
        harness.transport.set_failing(true);
        harness.bus.set_samples(7, &[600]);

        harness.control_loop.tick();
        assert!(harness.transport.messages().is_empty());
        assert!(harness
            .control_loop
            .detector()
            .state(Channel::new(0)?)
            .triggered);

        harness.transport.set_failing(false);
        harness.bus.set_samples(7, &[0]);
        harness.control_loop.tick();
        assert_eq!(
            vec![message("/drumkit/Kick", 0.0)],
            harness.transport.messages()
        );
        Ok(())
    }

    #[test]
    fn test_volume_from_sample() {
        assert_eq!(100, volume_from_sample(0));
        assert_eq!(100, volume_from_sample(-500));
        assert_eq!(90, volume_from_sample(2590));
        assert_eq!(0, volume_from_sample(25900));
        assert_eq!(0, volume_from_sample(i16::MAX));
    }

    #[test]
    fn test_volume_pot() -> Result<(), Box<dyn Error>> {
        let mut harness = setup(Duration::ZERO, Some(Channel::new(5)?));
        harness.bus.set_samples(5, &[2590, 2849, 3108, 5180]);

        let slider = |harness: &Harness| harness.display.lock().sliders.get(VOLUME_SLIDER).copied();

        harness.control_loop.tick();
        assert_eq!(Some(90), slider(&harness));

        // 89 is within one step of 90.
        harness.control_loop.tick();
        assert_eq!(Some(90), slider(&harness));

        harness.control_loop.tick();
        assert_eq!(Some(88), slider(&harness));

        harness.control_loop.tick();
        assert_eq!(Some(80), slider(&harness));

        // The pot is not a pad.
        assert!(harness.transport.messages().is_empty());
        Ok(())
    }

    #[test]
    fn test_input_events() -> Result<(), Box<dyn Error>> {
        let mut harness = setup(Duration::ZERO, None);

        harness.events_tx.try_send(Event::Trigger(2))?;
        harness.events_tx.try_send(Event::Release(2))?;
        harness.control_loop.tick();
        assert_eq!(
            vec![
                message("/drumkit/Hihat", 1.0),
                message("/drumkit/Hihat", 0.0)
            ],
            harness.transport.messages()
        );
        // Manual events leave the detector alone.
        assert!(!harness
            .control_loop
            .detector()
            .state(Channel::new(2)?)
            .triggered);

        harness.transport.clear();
        harness.events_tx.try_send(Event::Remap {
            channel: 2,
            sound: 7,
        })?;
        harness.events_tx.try_send(Event::Remap {
            channel: 9,
            sound: 0,
        })?;
        harness.events_tx.try_send(Event::Remap {
            channel: 3,
            sound: 8,
        })?;
        harness.events_tx.try_send(Event::Trigger(2))?;
        harness.events_tx.try_send(Event::Trigger(8))?;
        harness.control_loop.tick();
        assert_eq!(
            vec![message("/drumkit/Crash", 1.0)],
            harness.transport.messages()
        );
        assert_eq!(Sound::Crash, harness.control_loop.sounds().get(Channel::new(2)?));
        assert_eq!(Sound::OpenHihat, harness.control_loop.sounds().get(Channel::new(3)?));

        harness.events_tx.try_send(Event::Select(3))?;
        harness.events_tx.try_send(Event::Select(12))?;
        harness.control_loop.tick();
        assert_eq!(Some(3), harness.display.lock().highlighted);
        Ok(())
    }

    #[test]
    fn test_closed_input() {
        let mut harness = setup(Duration::ZERO, None);
        drop(harness.events_tx);
        harness.control_loop.tick();
        assert!(harness.control_loop.events_rx.is_none());
        harness.control_loop.tick();
    }

    #[test]
    fn test_run_until_shut_down() {
        let Harness {
            control_loop,
            bus,
            transport,
            ..
        } = setup(Duration::from_millis(1), None);
        bus.set_samples(7, &[0, 0, 0, 700]);

        let shutdown = Shutdown::new();
        let join = {
            let shutdown = shutdown.clone();
            thread::spawn(move || control_loop.run(&shutdown))
        };

        crate::test::eventually(
            || transport.messages().contains(&message("/drumkit/Kick", 1.0)),
            "Kick never triggered",
        );
        shutdown.shut_down();
        assert!(join.join().is_ok());
    }

    #[test]
    fn test_sequencer_from_config() {
        assert!(sequencer(&config::Adc::new("mock")).is_ok());
        assert!(sequencer(&config::Adc::new("/dev/i2c-nonexistent")).is_err());
    }

    #[tokio::test]
    async fn test_engine_start_and_stop() -> Result<(), Box<dyn Error>> {
        let engine = Engine::start(&config::Kit::new(config::Adc::new("mock")))?;
        engine.stop();
        engine.join().await
    }
}
