#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! UI Adapter collaborator contract (C5). No actual display surface lives
//! here: this crate is the narrow set of calls a UI thread is allowed to
//! make into C3/C4, kept separate so the CLI binary can host a headless
//! operator loop without a widget toolkit dependency.
//!
//! Every method is fire-and-forget and non-blocking, matching the
//! "UI polls at 100 ms, no call blocks" contract.

use fill_core::{Button, ProgressMessage, SequencerHandle, State};
use fill_hardware::{HardwareHandle, SensorSnapshot};

/// The UI's only way to touch C3/C4. Holds cheap clones of both handles.
#[derive(Clone)]
pub struct UiAdapter {
    hw: HardwareHandle,
    sequencer: SequencerHandle,
}

impl UiAdapter {
    pub fn new(hw: HardwareHandle, sequencer: SequencerHandle) -> Self {
        Self { hw, sequencer }
    }

    pub fn snapshot_read(&self) -> SensorSnapshot {
        self.hw.read_snapshot()
    }

    pub fn sequencer_current_state(&self) -> State {
        self.sequencer.current_state()
    }

    pub fn sequencer_current_message(&self) -> ProgressMessage {
        self.sequencer.current_message()
    }

    pub fn sequencer_button(&self, event: Button) {
        self.sequencer.button(event);
    }

    /// Writes a simulated weight in grams; a no-op (logged) outside
    /// simulation mode.
    pub fn sim_set_weight_g(&self, grams: f64) {
        self.with_shadow(|shadow| {
            shadow.set_weight_cg(fill_hardware::units::grams_to_cg(grams));
        });
    }

    pub fn sim_set_pressure_raw(&self, raw: i32) {
        self.with_shadow(|shadow| shadow.set_pressure_raw(raw));
    }

    pub fn sim_set_stop_switch(&self, on: bool) {
        self.with_shadow(|shadow| shadow.set_stop_switch(on));
    }

    /// Twice in a row returns the stop switch to its prior value.
    pub fn sim_toggle_stop_switch(&self) {
        self.with_shadow(|shadow| shadow.toggle_stop_switch());
    }

    pub fn sim_set_foot_switch(&self, on: bool) {
        self.with_shadow(|shadow| shadow.set_foot_switch(on));
    }

    fn with_shadow(&self, f: impl FnOnce(&fill_hardware::SimShadow)) {
        match self.hw.simulation_mode() {
            fill_hardware::SimulationMode::Simulated(shadow) => f(shadow),
            fill_hardware::SimulationMode::Real => {
                tracing::warn!("sim_* setter called outside simulation mode; ignored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fill_core::SequencerEngine;
    use fill_config::Configuration;
    use fill_hardware::{HardwareEngine, SimShadow, SimulationMode};
    use fill_traits::clock::test_clock::TestClock;
    use fill_traits::Clock;
    use std::sync::{Arc, Mutex};

    fn adapter(dir: &tempfile::TempDir) -> (UiAdapter, HardwareEngine, SequencerEngine) {
        let cfg = Configuration::load(dir.path().join("filler.ini"), "PRODUCT1").unwrap();
        let config = Arc::new(Mutex::new(cfg));
        let shadow = SimShadow::new();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(TestClock::new());
        let hw_engine =
            HardwareEngine::spawn(SimulationMode::Simulated(shadow), clock.clone()).unwrap();
        let hw = hw_engine.handle();
        let seq_engine = SequencerEngine::spawn(config, hw.clone(), clock).unwrap();
        let sequencer = seq_engine.handle();
        (UiAdapter::new(hw, sequencer), hw_engine, seq_engine)
    }

    #[test]
    fn sim_setters_reach_the_shadow() {
        let dir = tempfile::tempdir().unwrap();
        let (ui, _hw_engine, _seq_engine) = adapter(&dir);
        ui.sim_set_weight_g(12.34);
        std::thread::sleep(std::time::Duration::from_millis(40));
        let snap = ui.snapshot_read();
        assert_eq!(snap.weight_cg, 1234);
    }

    #[test]
    fn button_reaches_the_sequencer() {
        let dir = tempfile::tempdir().unwrap();
        let (ui, _hw_engine, _seq_engine) = adapter(&dir);
        ui.sequencer_button(Button::MainEnterFill);
        std::thread::sleep(std::time::Duration::from_millis(250));
        assert_eq!(ui.sequencer_current_state(), State::FillPrep1);
    }
}
