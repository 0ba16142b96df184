//! Shared fixtures and setup for the end-to-end retention tests.

pub mod fixtures;
