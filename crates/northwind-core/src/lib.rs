//! Northwind Core: shared order model and persistence abstractions.
//!
//! This crate defines the record types, the persistence gateway traits and
//! the error type that the order manager and its adapters depend on. It
//! contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod gateway;
pub mod model;
