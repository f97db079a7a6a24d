/// Operator-triggered event pushed into the sequencer's bounded queue.
/// The UI adapter is the producer; each tick the sequencer consumes at
/// most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Exit,
    Abort,
    MainEnterFill,
    MainEnterClean,
    MainEnterDiagnostics,
    FillNext,
    CleanPressureOn,
    CleanPressureOff,
    CleanDispense,
    DiagPressureOn,
    DiagPressureOff,
    DiagDispense,
    DiagSetup,
}

/// Capacity of the button-event queue. Overflow drops and logs, matching
/// the command queue's overflow policy.
pub const BUTTON_QUEUE_CAPACITY: usize = 16;
