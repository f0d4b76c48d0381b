pub mod config;
pub mod error;
pub mod handle;
pub mod line;
pub mod process;

pub use config::{parse_init_lines, EngineConfig};
pub use error::EngineError;
pub use handle::{EngineHandle, EngineName};
pub use line::EngineLine;
pub use process::{run_input_writer, run_output_reader, EngineProcess};
