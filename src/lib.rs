//! # Countdown
//!
//! Renders time spans through small bracket templates such as
//! `"{z}{d}d {h}h {m}m"`, and parses rendered text back into a time value.
//!
//! ## Architecture
//!
//! - **models**: Units, time values and extra defaults
//! - **format**: Template compiler (flag table + normalized template)
//! - **render**: Substitutes unit values and decorators into a compiled template
//! - **parse**: Inverse of rendering, one regex per flag
//! - **countdown**: Convenience facade over compile/render/parse
//! - **config**: Configuration loading and validation

pub mod config;
pub mod countdown;
pub mod format;
pub mod models;
pub mod parse;
pub mod render;

pub use countdown::Countdown;
pub use format::{compile, CompiledFormat, TemplateError};
pub use models::*;
pub use parse::{parse, ParseError};
pub use render::{render, RenderError, RenderOptions};
