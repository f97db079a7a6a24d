use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

/// Writable shadow fields for simulation mode. Cheaply cloneable handle;
/// the UI adapter's `sim_*` setters write through this, the engine reads
/// it each tick instead of parsing a serial frame.
#[derive(Debug, Clone, Default)]
pub struct SimShadow(Arc<SimShadowInner>);

#[derive(Debug, Default)]
struct SimShadowInner {
    weight_cg: AtomicI32,
    pressure_raw: AtomicI32,
    stop_switch: AtomicBool,
    foot_switch: AtomicBool,
}

impl SimShadow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_weight_cg(&self, weight_cg: i32) {
        self.0.weight_cg.store(weight_cg, Ordering::Release);
    }

    pub fn weight_cg(&self) -> i32 {
        self.0.weight_cg.load(Ordering::Acquire)
    }

    pub fn set_pressure_raw(&self, raw: i32) {
        self.0.pressure_raw.store(raw, Ordering::Release);
    }

    pub fn pressure_raw(&self) -> i32 {
        self.0.pressure_raw.load(Ordering::Acquire)
    }

    pub fn set_stop_switch(&self, on: bool) {
        self.0.stop_switch.store(on, Ordering::Release);
    }

    pub fn stop_switch(&self) -> bool {
        self.0.stop_switch.load(Ordering::Acquire)
    }

    /// Flips the simulated stop switch; calling this twice returns it to
    /// its prior value.
    pub fn toggle_stop_switch(&self) {
        self.0.stop_switch.fetch_xor(true, Ordering::AcqRel);
    }

    pub fn set_foot_switch(&self, on: bool) {
        self.0.foot_switch.store(on, Ordering::Release);
    }

    pub fn foot_switch(&self) -> bool {
        self.0.foot_switch.load(Ordering::Acquire)
    }
}

/// Replaces scattered `simulate*` booleans: readers select the backing
/// field by variant instead of consulting a flag alongside real data.
#[derive(Debug, Clone)]
pub enum SimulationMode {
    Real,
    Simulated(SimShadow),
}

impl SimulationMode {
    pub fn is_simulated(&self) -> bool {
        matches!(self, SimulationMode::Simulated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_is_idempotent() {
        let shadow = SimShadow::new();
        let before = shadow.stop_switch();
        shadow.toggle_stop_switch();
        shadow.toggle_stop_switch();
        assert_eq!(shadow.stop_switch(), before);
    }
}
