//! Presentation of recommendations
//!
//! Rendering only; nothing here feeds back into scoring.

pub mod formatter;

pub use formatter::{Formatter, FormatterFactory, JsonFormatter, OutputFormat, TextFormatter};
