pub mod error;
pub mod tracker;

pub use error::{JitterError, Result};
pub use tracker::{JitterTracker, DEFAULT_NAME};
