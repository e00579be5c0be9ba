//! Order commands and input rules.

pub mod commands;
pub mod validation;
