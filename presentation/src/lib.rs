pub mod cli;
pub mod display;
