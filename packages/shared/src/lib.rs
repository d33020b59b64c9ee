//! Shared utilities for Hiroba: logging bootstrap and time helpers.

pub mod logger;
pub mod time;
