//! Sequencer errors. The only genuinely fatal case is a missing state
//! handler, caught at startup before the tick loop ever runs (see
//! `sequencer::Sequencer::verify_handler_coverage`).
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequencerError {
    #[error("no handler registered for state {0:?}")]
    MissingHandler(crate::state::State),
}

pub type Result<T> = std::result::Result<T, SequencerError>;
