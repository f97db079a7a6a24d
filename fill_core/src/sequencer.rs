use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use fill_config::{ConfigKey, Configuration};
use fill_hardware::{Command, HardwareHandle, SensorSnapshot};
use fill_traits::Clock;

use crate::button::{Button, BUTTON_QUEUE_CAPACITY};
use crate::context::SequencerContext;
use crate::dispense::second_pulse_ms;
use crate::error::SequencerError;
use crate::messages::{message_for, ProgressMessage};
use crate::state::{State, Transition};
use crate::timer::CountdownTimer;

pub const TICK: Duration = Duration::from_millis(100);

/// Arguments passed to a state handler for a single tick.
struct HandlerArgs<'a> {
    ctx: &'a mut SequencerContext,
    config: &'a Configuration,
    hw: &'a HardwareHandle,
    snapshot: SensorSnapshot,
    button: Option<Button>,
}

impl HandlerArgs<'_> {
    fn weight_g(&self) -> f64 {
        fill_hardware::units::cg_to_grams(self.snapshot.weight_cg)
    }

    fn is_tared(&self) -> bool {
        self.weight_g().abs() <= self.config.value_f64(ConfigKey::TareTolerance)
    }
}

type Handler = fn(&mut HandlerArgs) -> Transition;

/// Shared, externally-readable view of the sequencer, updated once per
/// tick. Lets the UI adapter (and anything else) read current state
/// without touching the sequencer thread's own data.
struct SharedView {
    state: State,
    message: ProgressMessage,
}

/// Cheaply-cloneable handle into the running sequencer. Mirrors the
/// hardware engine's handle/engine split: this is what callers hold, the
/// [`SequencerEngine`] owns the background thread.
#[derive(Clone)]
pub struct SequencerHandle {
    shared: Arc<Mutex<SharedView>>,
    buttons: Sender<Button>,
    config: Arc<Mutex<Configuration>>,
}

impl SequencerHandle {
    pub fn current_state(&self) -> State {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .state
    }

    pub fn current_message(&self) -> ProgressMessage {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .message
            .clone()
    }

    /// Enqueue an operator button event; drops and logs on a full queue.
    pub fn button(&self, event: Button) {
        if self.buttons.try_send(event).is_err() {
            tracing::warn!(?event, "button queue full; dropping");
        }
    }

    /// Shared configuration instance, for the setup screen's mutation
    /// path. Passed by reference into both this sequencer and the UI,
    /// per the single-owned-instance design.
    pub fn configuration(&self) -> Arc<Mutex<Configuration>> {
        self.config.clone()
    }
}

/// Owns the sequencer's background thread. Dropping it stops and joins
/// the thread.
pub struct SequencerEngine {
    handle: SequencerHandle,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl SequencerEngine {
    /// Verifies every declared [`State`] has a registered handler before
    /// starting the loop; a missing handler is a startup-time fatal
    /// error, not a runtime one.
    pub fn spawn(
        config: Arc<Mutex<Configuration>>,
        hw: HardwareHandle,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, SequencerError> {
        let handlers = build_handlers();
        verify_handler_coverage(&handlers)?;

        let (tx, rx) = crossbeam_channel::bounded(BUTTON_QUEUE_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let shared = Arc::new(Mutex::new(SharedView {
            state: State::Uninit,
            message: ProgressMessage {
                text: String::new(),
                enable: false,
            },
        }));

        let handle = SequencerHandle {
            shared: shared.clone(),
            buttons: tx,
            config: config.clone(),
        };

        let thread_stop = stop.clone();
        let thread_clock = clock.clone();
        let join = thread::Builder::new()
            .name("fill-sequencer".into())
            .spawn(move || {
                run(
                    handlers,
                    config,
                    hw,
                    rx,
                    shared,
                    thread_stop,
                    thread_clock,
                )
            })
            .expect("spawning the sequencer thread");

        Ok(Self {
            handle,
            stop,
            join: Some(join),
        })
    }

    pub fn handle(&self) -> SequencerHandle {
        self.handle.clone()
    }
}

impl Drop for SequencerEngine {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            match join.join() {
                Ok(()) => {}
                Err(_) => tracing::error!("sequencer thread panicked"),
            }
        }
    }
}

fn verify_handler_coverage(handlers: &HashMap<State, Handler>) -> Result<(), SequencerError> {
    for state in State::ALL {
        if !handlers.contains_key(state) {
            return Err(SequencerError::MissingHandler(*state));
        }
    }
    Ok(())
}

fn run(
    handlers: HashMap<State, Handler>,
    config: Arc<Mutex<Configuration>>,
    hw: HardwareHandle,
    buttons: Receiver<Button>,
    shared: Arc<Mutex<SharedView>>,
    stop: Arc<AtomicBool>,
    clock: Arc<dyn Clock + Send + Sync>,
) {
    tracing::debug!("sequencer thread running");
    let mut ctx = SequencerContext::new(CountdownTimer::new(clock.clone()));
    // Uninit's transition is unconditional and input-independent; settle it
    // before the loop starts so the first real tick never silently
    // consumes a button event meant for Standby.
    ctx.state = State::Standby;

    while !stop.load(Ordering::Acquire) {
        let button = buttons.try_recv().ok();
        let snapshot = hw.read_snapshot();
        let current_state = ctx.state;

        let transition = if current_state.is_fill_state()
            && (snapshot.stop_switch || matches!(button, Some(Button::Exit) | Some(Button::Abort)))
        {
            Transition::Goto(State::FillTerminate)
        } else {
            let handler = handlers
                .get(&current_state)
                .expect("handler coverage verified at startup");
            let cfg_guard = config.lock().unwrap_or_else(|e| e.into_inner());
            let mut args = HandlerArgs {
                ctx: &mut ctx,
                config: &cfg_guard,
                hw: &hw,
                snapshot,
                button,
            };
            handler(&mut args)
        };

        if let Transition::Goto(next) = transition {
            if next != current_state {
                tracing::debug!(from = ?current_state, to = ?next, "state transition");
            }
            ctx.state = next;
        }

        {
            let cfg_guard = config.lock().unwrap_or_else(|e| e.into_inner());
            let message = message_for(ctx.state, &ctx, &cfg_guard);
            let mut view = shared.lock().unwrap_or_else(|e| e.into_inner());
            view.state = ctx.state;
            view.message = message;
        }

        clock.sleep(TICK);
    }

    tracing::debug!("sequencer thread stopped");
}

fn build_handlers() -> HashMap<State, Handler> {
    let mut m: HashMap<State, Handler> = HashMap::new();
    m.insert(State::Uninit, handle_uninit);
    m.insert(State::Standby, handle_standby);
    m.insert(State::Diagnostics, handle_diagnostics);
    m.insert(State::Setup, handle_setup);
    m.insert(State::Clean, handle_clean);

    m.insert(State::FillPrep1, handle_fill_prep1);
    m.insert(State::FillPrep2, handle_fill_prep2);
    m.insert(State::FillResetStop, handle_fill_reset_stop);
    m.insert(State::FillPressurize, handle_fill_pressurize);
    m.insert(State::FillPurgeInit, handle_fill_purge_init);
    m.insert(State::FillPurgeSetup, handle_fill_purge_setup);
    m.insert(State::FillPurgeWait, handle_fill_purge_wait);
    m.insert(State::FillPurgeClearWait, handle_fill_purge_clear_wait);
    m.insert(State::FillPurgeResetWait, handle_fill_purge_reset_wait);
    m.insert(State::FillLoadBottle, handle_fill_load_bottle);
    m.insert(State::FillLoadBottleWait, handle_fill_load_bottle_wait);
    m.insert(State::FillReadySetup, handle_fill_ready_setup);
    m.insert(State::FillReadyWait, handle_fill_ready_wait);
    m.insert(State::FillInitFilling, handle_fill_init_filling);
    m.insert(State::FillInitFillingWait, handle_fill_init_filling_wait);
    m.insert(State::FillFillingWait, handle_fill_filling_wait);
    m.insert(State::FillClearBottle, handle_fill_clear_bottle);
    m.insert(State::FillInitFillingFailed, handle_fill_failed);
    m.insert(State::FillFillingFailed, handle_fill_failed);
    m.insert(State::FillTerminate, handle_fill_terminate);
    m.insert(State::Terminate, handle_terminate);
    m
}

fn handle_uninit(_: &mut HandlerArgs) -> Transition {
    Transition::Goto(State::Standby)
}

fn handle_standby(a: &mut HandlerArgs) -> Transition {
    match a.button {
        Some(Button::MainEnterFill) => Transition::Goto(State::FillPrep1),
        Some(Button::MainEnterClean) => Transition::Goto(State::Clean),
        Some(Button::MainEnterDiagnostics) => Transition::Goto(State::Diagnostics),
        _ => Transition::Stay,
    }
}

fn handle_diagnostics(a: &mut HandlerArgs) -> Transition {
    match a.button {
        Some(Button::DiagPressureOn) => {
            a.hw.post(Command::Pressurize);
            Transition::Stay
        }
        Some(Button::DiagPressureOff) => {
            a.hw.post(Command::Vent);
            Transition::Stay
        }
        Some(Button::DiagDispense) => {
            a.hw.post(Command::Dispense(a.ctx.diag_dispense_ms));
            Transition::Stay
        }
        Some(Button::DiagSetup) => Transition::Goto(State::Setup),
        Some(Button::Exit) => Transition::Goto(State::Standby),
        _ => Transition::Stay,
    }
}

fn handle_setup(a: &mut HandlerArgs) -> Transition {
    match a.button {
        Some(Button::Exit) => Transition::Goto(State::Diagnostics),
        _ => Transition::Stay,
    }
}

fn handle_clean(a: &mut HandlerArgs) -> Transition {
    match a.button {
        Some(Button::CleanPressureOn) => {
            a.hw.post(Command::Pressurize);
            Transition::Stay
        }
        Some(Button::CleanPressureOff) => {
            a.hw.post(Command::Vent);
            Transition::Stay
        }
        Some(Button::CleanDispense) => {
            let ms = a.config.value_i64(ConfigKey::CleanDispenseTime) as u32;
            a.hw.post(Command::Dispense(ms));
            Transition::Stay
        }
        Some(Button::Exit) | Some(Button::Abort) => {
            a.hw.post(Command::Abort);
            a.hw.post(Command::Vent);
            Transition::Goto(State::Standby)
        }
        _ => Transition::Stay,
    }
}

fn handle_fill_prep1(a: &mut HandlerArgs) -> Transition {
    if matches!(a.button, Some(Button::FillNext)) && a.is_tared() {
        Transition::Goto(State::FillPrep2)
    } else {
        Transition::Stay
    }
}

fn handle_fill_prep2(a: &mut HandlerArgs) -> Transition {
    a.ctx.weight_unloaded_g = a.weight_g();
    if matches!(a.button, Some(Button::FillNext)) {
        Transition::Goto(State::FillResetStop)
    } else {
        Transition::Stay
    }
}

fn handle_fill_reset_stop(a: &mut HandlerArgs) -> Transition {
    if !a.snapshot.stop_switch {
        Transition::Goto(State::FillPressurize)
    } else {
        Transition::Stay
    }
}

fn handle_fill_pressurize(a: &mut HandlerArgs) -> Transition {
    a.hw.post(Command::Pressurize);
    let min = a.config.value_f64(ConfigKey::FillPressureMinimum);
    if a.snapshot.pressure_psi >= min {
        Transition::Goto(State::FillPurgeInit)
    } else {
        Transition::Stay
    }
}

fn handle_fill_purge_init(a: &mut HandlerArgs) -> Transition {
    let _ = a.hw.try_consume_foot_switch();
    a.ctx.purge_count = 0;
    Transition::Goto(State::FillPurgeSetup)
}

fn handle_fill_purge_setup(a: &mut HandlerArgs) -> Transition {
    if a.hw.try_consume_foot_switch() {
        let max = a.config.value_i64(ConfigKey::MaxPurge) as u32;
        if a.ctx.purge_count >= max {
            Transition::Goto(State::FillPurgeResetWait)
        } else {
            let purge_ms = a.config.value_i64(ConfigKey::PurgeTime) as u32;
            a.hw.post(Command::Dispense(purge_ms));
            a.ctx.purge_count += 1;
            a.ctx.timer.start(Duration::from_secs(1));
            Transition::Goto(State::FillPurgeWait)
        }
    } else if matches!(a.button, Some(Button::FillNext)) {
        Transition::Goto(State::FillPurgeClearWait)
    } else {
        Transition::Stay
    }
}

fn handle_fill_purge_wait(a: &mut HandlerArgs) -> Transition {
    if a.ctx.timer.expired() {
        let _ = a.hw.try_consume_foot_switch();
        Transition::Goto(State::FillPurgeSetup)
    } else {
        Transition::Stay
    }
}

fn handle_fill_purge_clear_wait(a: &mut HandlerArgs) -> Transition {
    if a.is_tared() {
        Transition::Goto(State::FillLoadBottle)
    } else {
        Transition::Stay
    }
}

fn handle_fill_purge_reset_wait(a: &mut HandlerArgs) -> Transition {
    if a.is_tared() {
        Transition::Goto(State::FillPurgeInit)
    } else {
        Transition::Stay
    }
}

fn handle_fill_load_bottle(a: &mut HandlerArgs) -> Transition {
    let min = a.config.value_f64(ConfigKey::MinBottleWeight);
    if a.weight_g() >= min {
        Transition::Goto(State::FillLoadBottleWait)
    } else {
        Transition::Stay
    }
}

fn handle_fill_load_bottle_wait(a: &mut HandlerArgs) -> Transition {
    let min = a.config.value_f64(ConfigKey::MinBottleWeight);
    let weight = a.weight_g();
    if (a.snapshot.stable && weight >= min) || matches!(a.button, Some(Button::FillNext)) {
        a.ctx.weight_with_bottle_g = weight;
        Transition::Goto(State::FillReadySetup)
    } else {
        Transition::Stay
    }
}

fn handle_fill_ready_setup(a: &mut HandlerArgs) -> Transition {
    let _ = a.hw.try_consume_foot_switch();
    Transition::Goto(State::FillReadyWait)
}

fn handle_fill_ready_wait(a: &mut HandlerArgs) -> Transition {
    if a.hw.try_consume_foot_switch() {
        Transition::Goto(State::FillInitFilling)
    } else {
        Transition::Stay
    }
}

fn handle_fill_init_filling(a: &mut HandlerArgs) -> Transition {
    let t1_ms = a.config.value_i64(ConfigKey::FillInitDispenseTime) as u32;
    a.hw.post(Command::Dispense(t1_ms));
    a.ctx.timer.start(Duration::from_millis(u64::from(t1_ms)));
    // No explicit "clear stability" op exists on the hardware handle: the
    // weight history naturally falls out of the settle band once the
    // valve opens, so the stale `stable = true` from before the pulse
    // cannot be mistaken for post-pulse settling.
    Transition::Goto(State::FillInitFillingWait)
}

fn handle_fill_init_filling_wait(a: &mut HandlerArgs) -> Transition {
    if !(a.ctx.timer.expired() && a.snapshot.stable) {
        return Transition::Stay;
    }
    let d1 = a.weight_g() - a.ctx.weight_with_bottle_g;
    let min_initial = a.config.value_f64(ConfigKey::FillInitDispenseMin);
    if d1 < min_initial {
        return Transition::Goto(State::FillInitFillingFailed);
    }
    let target = a.config.value_f64(ConfigKey::FillWeight);
    let offset = a.config.value_f64(ConfigKey::DispenseOffset);
    let t1_ms = a.config.value_i64(ConfigKey::FillInitDispenseTime) as f64;
    let t2 = second_pulse_ms(d1, target, offset, t1_ms).max(0) as u32;
    a.ctx.final_dispense_ms = t2;
    a.hw.post(Command::Dispense(t2));
    a.ctx.timer.start(Duration::from_millis(u64::from(t2)));
    Transition::Goto(State::FillFillingWait)
}

fn handle_fill_filling_wait(a: &mut HandlerArgs) -> Transition {
    if !(a.ctx.timer.expired() && a.snapshot.stable) {
        return Transition::Stay;
    }
    let delivered = a.weight_g() - a.ctx.weight_with_bottle_g;
    let target = a.config.value_f64(ConfigKey::FillWeight);
    if delivered >= target {
        a.ctx.filled_count += 1;
        Transition::Goto(State::FillClearBottle)
    } else {
        Transition::Goto(State::FillFillingFailed)
    }
}

fn handle_fill_clear_bottle(a: &mut HandlerArgs) -> Transition {
    if a.is_tared() {
        Transition::Goto(State::FillLoadBottle)
    } else {
        Transition::Stay
    }
}

fn handle_fill_failed(a: &mut HandlerArgs) -> Transition {
    if matches!(a.button, Some(Button::FillNext)) {
        Transition::Goto(State::FillTerminate)
    } else {
        Transition::Stay
    }
}

fn handle_fill_terminate(a: &mut HandlerArgs) -> Transition {
    a.hw.post(Command::Abort);
    a.hw.post(Command::Vent);
    Transition::Goto(State::Standby)
}

fn handle_terminate(_: &mut HandlerArgs) -> Transition {
    Transition::Stay
}

#[cfg(test)]
mod tests {
    use super::*;
    use fill_hardware::{HardwareEngine, SimShadow, SimulationMode};
    use fill_traits::clock::test_clock::TestClock;

    fn config(dir: &tempfile::TempDir) -> Arc<Mutex<Configuration>> {
        let cfg = Configuration::load(dir.path().join("filler.ini"), "PRODUCT1").unwrap();
        Arc::new(Mutex::new(cfg))
    }

    #[test]
    fn handler_coverage_is_complete() {
        let handlers = build_handlers();
        assert!(verify_handler_coverage(&handlers).is_ok());
    }

    #[test]
    fn missing_handler_is_detected() {
        let mut handlers = build_handlers();
        handlers.remove(&State::FillPrep1);
        let err = verify_handler_coverage(&handlers).unwrap_err();
        assert_eq!(err, SequencerError::MissingHandler(State::FillPrep1));
    }

    #[test]
    fn standby_to_fill_prep1_on_main_enter_fill() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let cfg_guard = cfg.lock().unwrap();
        let mut ctx = SequencerContext::new(CountdownTimer::new(Arc::new(TestClock::new())));
        let shadow = SimShadow::new();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(TestClock::new());
        let engine =
            HardwareEngine::spawn(SimulationMode::Simulated(shadow.clone()), clock).unwrap();
        let hw = engine.handle();

        let mut args = HandlerArgs {
            ctx: &mut ctx,
            config: &cfg_guard,
            hw: &hw,
            snapshot: hw.read_snapshot(),
            button: Some(Button::MainEnterFill),
        };
        let t = handle_standby(&mut args);
        assert_eq!(t, Transition::Goto(State::FillPrep1));
    }

    #[test]
    fn max_purge_routes_to_reset_wait_without_dispense() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let cfg_guard = cfg.lock().unwrap();
        let mut ctx = SequencerContext::new(CountdownTimer::new(Arc::new(TestClock::new())));
        ctx.purge_count = 5; // == default max_purge
        let shadow = SimShadow::new();
        shadow.set_foot_switch(true);
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(TestClock::new());
        let engine =
            HardwareEngine::spawn(SimulationMode::Simulated(shadow.clone()), clock).unwrap();
        let hw = engine.handle();
        std::thread::sleep(Duration::from_millis(40));

        let mut args = HandlerArgs {
            ctx: &mut ctx,
            config: &cfg_guard,
            hw: &hw,
            snapshot: hw.read_snapshot(),
            button: None,
        };
        let t = handle_fill_purge_setup(&mut args);
        assert_eq!(t, Transition::Goto(State::FillPurgeResetWait));
    }

    #[test]
    fn initial_fill_shortfall_fails_without_second_pulse() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        let cfg_guard = cfg.lock().unwrap();
        let clock = Arc::new(TestClock::new());
        let mut ctx = SequencerContext::new(CountdownTimer::new(clock.clone()));
        ctx.weight_with_bottle_g = 50.00;
        ctx.timer.start(Duration::from_millis(1500));
        clock.advance(Duration::from_millis(1500));

        let shadow = SimShadow::new();
        shadow.set_weight_cg(5300); // 53.00 g -> d1 = 3.00 < fill_init_dispense_min (4.0)
        let dyn_clock: Arc<dyn Clock + Send + Sync> = clock.clone();
        let engine =
            HardwareEngine::spawn(SimulationMode::Simulated(shadow.clone()), dyn_clock).unwrap();
        let hw = engine.handle();
        // Push enough identical samples for the hardware engine's stability
        // window to settle before reading the snapshot.
        std::thread::sleep(Duration::from_millis(60));

        let mut args = HandlerArgs {
            ctx: &mut ctx,
            config: &cfg_guard,
            hw: &hw,
            snapshot: hw.read_snapshot(),
            button: None,
        };
        let t = handle_fill_init_filling_wait(&mut args);
        assert_eq!(t, Transition::Goto(State::FillInitFillingFailed));
    }
}
