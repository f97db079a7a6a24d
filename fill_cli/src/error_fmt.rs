//! Human-readable error descriptions and stable exit codes for the two
//! genuinely fatal startup failures.

use fill_config::ConfigError;
use fill_core::SequencerError;
use fill_hardware::HwError;

pub fn humanize(err: &eyre::Report) -> String {
    if let Some(e) = err.downcast_ref::<SequencerError>() {
        return format!(
            "What happened: {e}.\nLikely causes: a state was added without a matching handler.\nHow to fix: register a handler for every fill_core::State variant."
        );
    }

    if let Some(e) = err.downcast_ref::<HwError>() {
        return match e {
            HwError::NoDevice(candidates) => format!(
                "What happened: no serial device found.\nLikely causes: the filling machine's microcontroller is not connected or not powered.\nHow to fix: check the cable, then verify one of {candidates:?} exists, or pass --simulate to run without hardware."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: serial device removed or permissions changed.\nHow to fix: reconnect the device and restart."
            ),
        };
    }

    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: {e}.\nLikely causes: the configuration file is missing, unreadable, or contains a value of the wrong type.\nHow to fix: check the --config path and its contents."
        );
    }

    format!("Something went wrong: {err}")
}

/// 0 is reserved for clean exit; these are the two fatal startup failures
/// named in the external interfaces list, everything else collapses to 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<SequencerError>().is_some() {
        return 10;
    }
    if let Some(HwError::NoDevice(_)) = err.downcast_ref::<HwError>() {
        return 11;
    }
    1
}
