//! Authentication variants and their command-line encoding.

mod encoder;
mod types;

pub use encoder::*;
pub use types::*;
