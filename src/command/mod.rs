//! Command-line construction for the producer executable.

mod builder;
mod options;
mod payload;

pub use builder::*;
pub use options::*;
pub use payload::*;
