//! Utility modules for the Skycache API.
//!
//! - [`errors`]: Application error type and its HTTP response conversion

pub mod errors;
