use crate::state::State;
use crate::timer::CountdownTimer;

/// Per-session/per-bottle bookkeeping the fill subgraph's handlers read
/// and write as they advance. Created once at startup alongside the
/// sequencer.
pub struct SequencerContext {
    pub state: State,
    pub timer: CountdownTimer,

    /// Tare reference captured before dispense (`FILL_LOAD_BOTTLE_WAIT`).
    pub weight_with_bottle_g: f64,
    /// Recorded in `FILL_PREP2`; kept for parity with the source but never
    /// consulted further (an acknowledged open question).
    pub weight_unloaded_g: f64,
    /// Computed duration for the second (adaptive) pulse, in ms.
    pub final_dispense_ms: u32,
    /// Purge pulses issued for the bottle currently being primed.
    pub purge_count: u32,
    /// Bottles successfully filled this session.
    pub filled_count: u32,
    /// Operator-entered dispense duration for the diagnostics screen.
    pub diag_dispense_ms: u32,
}

impl SequencerContext {
    pub fn new(timer: CountdownTimer) -> Self {
        Self {
            state: State::Uninit,
            timer,
            weight_with_bottle_g: 0.0,
            weight_unloaded_g: 0.0,
            final_dispense_ms: 0,
            purge_count: 0,
            filled_count: 0,
            diag_dispense_ms: 0,
        }
    }
}
