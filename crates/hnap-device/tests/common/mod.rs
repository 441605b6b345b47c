//! Common test utilities for the HNAP device integration
//!
//! Recording device clients, a scriptable platform loader, a fully wired
//! host harness, and log capture.

#![allow(dead_code)]

mod fake_client;
mod harness;
mod logs;

pub use fake_client::*;
pub use harness::*;
pub use logs::*;
