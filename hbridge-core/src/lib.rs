//! H-bridge motor direction driver for no-std embedded platforms.
//!
//! A signed command in `[-1.0, 1.0]` is split across two unipolar outputs
//! with an optional enable output. For a runnable host demo, see
//! `hbridge-app/mock-bridge`.
#![no_std]

pub mod utils;
