pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod report;
pub mod store;
pub mod testing;

pub use error::{Error, Result};
