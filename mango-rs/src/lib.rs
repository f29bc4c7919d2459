pub mod cli;
pub mod config;
pub mod script;
pub mod var;
