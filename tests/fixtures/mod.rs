//! Test fixtures for fabric-dispatch.
//!
//! Provides realistic test data including:
//! - A three-floor reference facility (Austin Fabric) with clusters and stock
//! - A mixed admin/technician ticket backlog

#![allow(dead_code)]

pub mod austin_fabric;

pub use austin_fabric::*;
