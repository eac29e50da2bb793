//! Producer process lifecycle: spawn, supervise output, resolve on exit.

mod process;
mod runner;
mod state;

pub use process::*;
pub use runner::*;
pub use state::*;
