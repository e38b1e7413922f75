//! Shared helpers: logger handles, line splitting and XML attribute access.

pub mod lines;
pub mod logging;
pub mod xml;
