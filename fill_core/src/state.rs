/// Every state the Filling Sequencer can occupy. The machine is a flat
/// finite-state machine with named transition targets; "subgraph" and
/// "top level" in the component design are organisational groupings only,
/// not nested state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Uninit,
    Standby,
    Diagnostics,
    Setup,
    Clean,

    FillPrep1,
    FillPrep2,
    FillResetStop,
    FillPressurize,
    FillPurgeInit,
    FillPurgeSetup,
    FillPurgeWait,
    FillPurgeClearWait,
    FillPurgeResetWait,
    FillLoadBottle,
    FillLoadBottleWait,
    FillReadySetup,
    FillReadyWait,
    FillInitFilling,
    FillInitFillingWait,
    FillFillingWait,
    FillClearBottle,
    FillInitFillingFailed,
    FillFillingFailed,
    FillTerminate,

    /// Terminal state by convention; unused in normal operation since the
    /// machine runs forever. Reachable only via an explicit operator quit
    /// path outside the fill/clean/diagnostics cycle.
    Terminate,
}

impl State {
    /// Every declared state, in a fixed order, used by the startup
    /// handler-coverage check.
    pub const ALL: &'static [State] = &[
        State::Uninit,
        State::Standby,
        State::Diagnostics,
        State::Setup,
        State::Clean,
        State::FillPrep1,
        State::FillPrep2,
        State::FillResetStop,
        State::FillPressurize,
        State::FillPurgeInit,
        State::FillPurgeSetup,
        State::FillPurgeWait,
        State::FillPurgeClearWait,
        State::FillPurgeResetWait,
        State::FillLoadBottle,
        State::FillLoadBottleWait,
        State::FillReadySetup,
        State::FillReadyWait,
        State::FillInitFilling,
        State::FillInitFillingWait,
        State::FillFillingWait,
        State::FillClearBottle,
        State::FillInitFillingFailed,
        State::FillFillingFailed,
        State::FillTerminate,
        State::Terminate,
    ];

    /// True for any state in the fill subgraph, where the universal abort
    /// interlock applies.
    pub fn is_fill_state(self) -> bool {
        matches!(
            self,
            State::FillPrep1
                | State::FillPrep2
                | State::FillResetStop
                | State::FillPressurize
                | State::FillPurgeInit
                | State::FillPurgeSetup
                | State::FillPurgeWait
                | State::FillPurgeClearWait
                | State::FillPurgeResetWait
                | State::FillLoadBottle
                | State::FillLoadBottleWait
                | State::FillReadySetup
                | State::FillReadyWait
                | State::FillInitFilling
                | State::FillInitFillingWait
                | State::FillFillingWait
                | State::FillClearBottle
                | State::FillInitFillingFailed
                | State::FillFillingFailed
        )
    }
}

/// Outcome of a single handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Goto(State),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_every_variant_exactly_once() {
        let mut seen = std::collections::HashSet::new();
        for s in State::ALL {
            assert!(seen.insert(*s), "{s:?} listed more than once");
        }
        assert_eq!(seen.len(), State::ALL.len());
    }

    #[test]
    fn terminate_and_uninit_are_not_fill_states() {
        assert!(!State::Terminate.is_fill_state());
        assert!(!State::Uninit.is_fill_state());
        assert!(!State::Standby.is_fill_state());
    }

    #[test]
    fn fill_terminate_is_not_itself_a_fill_state() {
        // FILL_TERMINATE is the universal abort's target, not a state the
        // interlock re-triggers from.
        assert!(!State::FillTerminate.is_fill_state());
    }
}
