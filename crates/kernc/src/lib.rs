mod pipeline;
pub mod stats;

pub use pipeline::{load_module, lower_file, lower_loaded, parse_arguments, run_file};
