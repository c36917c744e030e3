//! Shared fixtures for the integration tests
//!
//! Each test binary pulls in the whole harness but uses only part of it.
#![allow(dead_code)]

pub mod arena;
pub mod config;
pub mod mock_backend;
pub mod server;
