//! Producer output protocol: newline-delimited JSON records on stdout and stderr.

mod decoder;
mod record;
mod stream;

pub use decoder::*;
pub use record::*;
pub use stream::*;
