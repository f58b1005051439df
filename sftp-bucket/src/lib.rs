pub mod cli;
pub mod load_config;
pub mod secrets;
pub mod sftp;
pub mod storage;

pub use cli::{run, Cli, Commands};
