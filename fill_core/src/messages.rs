use fill_config::{ConfigKey, Configuration};

use crate::context::SequencerContext;
use crate::state::State;

/// `(text, enable)` read by the UI adapter on every refresh. `enable`
/// indicates whether the operator's advance button should be active;
/// `text` may embed runtime values such as purge count or a computed
/// dispense duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressMessage {
    pub text: String,
    pub enable: bool,
}

impl ProgressMessage {
    fn new(text: impl Into<String>, enable: bool) -> Self {
        Self {
            text: text.into(),
            enable,
        }
    }
}

/// Builds the message for the sequencer's current state. Kept as a pure
/// function of `(state, ctx, config)` rather than a static map, since
/// several messages embed values that only exist at runtime.
pub fn message_for(state: State, ctx: &SequencerContext, config: &Configuration) -> ProgressMessage {
    match state {
        State::Uninit => ProgressMessage::new("Starting up", false),
        State::Standby => ProgressMessage::new("Ready", true),
        State::Diagnostics => ProgressMessage::new("Diagnostics", true),
        State::Setup => ProgressMessage::new("Setup", true),
        State::Clean => ProgressMessage::new("Cleaning", true),

        State::FillPrep1 => ProgressMessage::new("Tare the scale, then press Next", true),
        State::FillPrep2 => ProgressMessage::new("Recording unloaded weight", false),
        State::FillResetStop => ProgressMessage::new("Release the stop switch", false),
        State::FillPressurize => {
            let target = config.value_f64(ConfigKey::FillPressureMinimum);
            ProgressMessage::new(format!("Pressurizing to {target:.1} psi"), false)
        }
        State::FillPurgeInit => ProgressMessage::new("Preparing to purge", false),
        State::FillPurgeSetup => {
            let max = config.value_i64(ConfigKey::MaxPurge);
            ProgressMessage::new(
                format!("Press pedal to purge ({}/{max}), or Next to load bottle", ctx.purge_count),
                true,
            )
        }
        State::FillPurgeWait => ProgressMessage::new("Purging", false),
        State::FillPurgeClearWait => ProgressMessage::new("Remove primed liquid, return scale to tare", false),
        State::FillPurgeResetWait => ProgressMessage::new("Max purges reached; empty vessel to continue", false),
        State::FillLoadBottle => ProgressMessage::new("Load bottle on scale", false),
        State::FillLoadBottleWait => ProgressMessage::new("Waiting for bottle to settle", true),
        State::FillReadySetup => ProgressMessage::new("Ready to fill", false),
        State::FillReadyWait => ProgressMessage::new("Press pedal to begin fill", false),
        State::FillInitFilling => ProgressMessage::new("Initial dispense", false),
        State::FillInitFillingWait => ProgressMessage::new("Measuring flow rate", false),
        State::FillFillingWait => {
            ProgressMessage::new(format!("Dispensing ({} ms)", ctx.final_dispense_ms), false)
        }
        State::FillClearBottle => ProgressMessage::new("Remove filled bottle", false),
        State::FillInitFillingFailed => {
            ProgressMessage::new("Initial dispense too small; press Next to abort fill", true)
        }
        State::FillFillingFailed => {
            ProgressMessage::new("Fill short of target; press Next to abort fill", true)
        }
        State::FillTerminate => ProgressMessage::new("Stopping", false),
        State::Terminate => ProgressMessage::new("Terminated", false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::CountdownTimer;
    use fill_traits::clock::test_clock::TestClock;
    use std::sync::Arc;

    fn ctx() -> SequencerContext {
        let clock: Arc<dyn fill_traits::Clock + Send + Sync> = Arc::new(TestClock::new());
        SequencerContext::new(CountdownTimer::new(clock))
    }

    #[test]
    fn purge_setup_message_embeds_counters() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::load(dir.path().join("filler.ini"), "PRODUCT1").unwrap();
        let mut c = ctx();
        c.purge_count = 2;
        let msg = message_for(State::FillPurgeSetup, &c, &config);
        assert!(msg.text.contains("2/5"));
        assert!(msg.enable);
    }

    #[test]
    fn every_state_has_a_message() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::load(dir.path().join("filler.ini"), "PRODUCT1").unwrap();
        let c = ctx();
        for state in State::ALL {
            let _ = message_for(*state, &c, &config);
        }
    }
}
