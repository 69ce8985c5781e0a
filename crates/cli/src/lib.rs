//! `cargobay` operator CLI: a thin surface over the warehouse services.

pub mod commands;
pub mod warehouse;

pub use commands::{Cli, Command, execute, run};
pub use warehouse::Warehouse;
