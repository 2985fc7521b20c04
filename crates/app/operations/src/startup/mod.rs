//! Assembling the ante handler at process startup.

mod sequence;

pub use sequence::{apply_config, build_ante_handler, run_startup_sequence, StartupResult};
