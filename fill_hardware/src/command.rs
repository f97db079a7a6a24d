/// Outbound command posted by the sequencer onto the single-producer/
/// single-consumer queue into the hardware engine.
///
/// `Abort` is wire-equivalent to `Dispense(0)` but kept as a distinct
/// variant because it clarifies intent in logs and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Abort,
    Pressurize,
    Vent,
    Dispense(u32),
}

impl Command {
    /// ASCII, underscore-terminated wire encoding.
    pub fn encode(&self) -> String {
        match self {
            Command::Abort => "0_".to_string(),
            Command::Pressurize => "P_".to_string(),
            Command::Vent => "p_".to_string(),
            Command::Dispense(ms) => format!("{ms}_"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_per_wire_protocol() {
        assert_eq!(Command::Abort.encode(), "0_");
        assert_eq!(Command::Pressurize.encode(), "P_");
        assert_eq!(Command::Vent.encode(), "p_");
        assert_eq!(Command::Dispense(6036).encode(), "6036_");
    }

    #[test]
    fn abort_is_wire_equivalent_to_zero_dispense() {
        assert_eq!(Command::Abort.encode(), Command::Dispense(0).encode());
    }
}
