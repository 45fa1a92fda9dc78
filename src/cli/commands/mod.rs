//! CLI command implementations

pub mod calib;
pub mod completions;
pub mod config;
pub mod eqp;
pub mod flr;
pub mod init;
pub mod rdg;
pub mod report;
pub mod status;
pub mod validate;
