//! Core data models: units, time values and extra defaults.

mod defaults;
mod time_value;
mod unit;

pub use defaults::*;
pub use time_value::*;
pub use unit::*;
