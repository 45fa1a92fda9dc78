//! MRT: Machine Reliability Toolkit
//!
//! A Unix-style toolkit for managing industrial asset records as plain
//! text files under git version control: vibration readings, failure
//! history, and the reliability analytics derived from them.

pub mod analytics;
pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod yaml;
