//! Core types and utilities for studymate
//!
//! This crate provides the configuration, logging, transcript types and
//! client-local storage shared by the remote client, the session manager
//! and the CLI.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod storage;
pub mod utils;

pub use error::{Error, Result};
