// Library exports for the Corral process supervisor

pub mod cli;
pub mod config;
pub mod error;
pub mod process;
