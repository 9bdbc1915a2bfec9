//! CLI command implementations.

mod config;
mod create;
mod doctor;
mod lecture;
mod list;
mod process;
mod serve;
mod transcribe;

pub use config::run_config;
pub use create::run_create;
pub use doctor::run_doctor;
pub use lecture::{run_delete, run_show};
pub use list::run_list;
pub use process::run_process;
pub use serve::{router, run_serve};
pub use transcribe::run_transcribe;
