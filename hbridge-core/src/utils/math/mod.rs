//! Math utilities for the H-bridge driver.
//!
//! This module provides the mapping from a signed command to the pair of
//! unipolar levels applied to the two half-bridges.

pub mod mapping;
