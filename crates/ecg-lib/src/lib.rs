pub mod clean;
pub mod config;
pub mod detectors;
pub mod diagnostics;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod plot;
pub mod signal;

pub use clean::*;
pub use detectors::*;
pub use error::{EcgError, Result};
pub use metrics::*;
pub use signal::*;
