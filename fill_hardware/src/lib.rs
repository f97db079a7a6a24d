#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions)]
//! Hardware I/O Engine: owns the serial link to the filling machine's
//! microcontroller, decodes sensor frames, and publishes a coherent
//! snapshot of the machine's sensed state.
//!
//! Runs on its own OS thread (see [`engine::HardwareEngine`]); all other
//! threads interact with it only through the cheaply-cloneable
//! [`engine::HardwareHandle`].
pub mod command;
pub mod engine;
pub mod error;
pub mod frame;
pub mod pressure;
pub mod sim;
pub mod snapshot;
pub mod units;

pub use command::Command;
pub use engine::{HardwareEngine, HardwareHandle};
pub use error::HwError;
pub use sim::{SimShadow, SimulationMode};
pub use snapshot::SensorSnapshot;
