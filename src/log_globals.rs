//! Global log stream instance.
//!
//! One stream per node: the main loop and both transport callbacks push,
//! the serial drain in the main loop pops.

use crate::logging::LogStream;

/// Node-wide diagnostics stream.
pub static LOG: LogStream = LogStream::new();
