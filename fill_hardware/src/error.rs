use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    /// Neither candidate serial device path exists. Fatal at startup.
    #[error("no serial device found (tried: {0:?})")]
    NoDevice(Vec<String>),
    #[error("serial port open failed: {0}")]
    Open(String),
    #[error("serial read timed out")]
    Timeout,
    #[error("malformed frame: {0:?}")]
    MalformedFrame(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
