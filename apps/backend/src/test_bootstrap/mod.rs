#![cfg(test)]

//! Shared test initialization for unit tests.

pub mod logging;
