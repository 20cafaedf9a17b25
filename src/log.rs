//! Conditional logging macros.
//!
//! When the `tracing` feature is enabled, these re-export `tracing` macros.
//! When disabled, `debug!` expands to nothing and `warn!` still reaches
//! stderr: extraction and re-render failures must always be visible on the
//! error stream, even in builds without a subscriber.

#[cfg(feature = "tracing")]
pub use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        eprintln!("Warning: {}", format_args!($($arg)*))
    };
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, warn};
