pub mod automation;
pub mod config;
pub mod file_ops;
pub mod gui;
pub mod llm_client;
pub mod shell;
pub mod xdotool;
