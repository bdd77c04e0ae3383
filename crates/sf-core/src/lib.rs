//! # sf-core
//!
//! Error taxonomy shared by the sfweights crates.
//!
//! Every lookup failure is raised where it is detected and propagated with
//! `?`. Lookups are deterministic, so nothing here is retried.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub use error::{Error, Result};
