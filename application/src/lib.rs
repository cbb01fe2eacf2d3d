pub mod controller;
pub mod parser;
pub mod pipeline;
