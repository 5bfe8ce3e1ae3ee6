//! Library crate for riptide-back, exposing modules for binaries and integration tests.

pub mod ai;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
