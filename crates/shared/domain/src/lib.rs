//! # Domain Types
//!
//! Plain configuration and policy types shared by the arbor crates.
//! Keep it lean: `serde` only, no I/O and no behavior beyond defaults.

pub mod config;
