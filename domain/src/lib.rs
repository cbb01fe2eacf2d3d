pub mod command;
pub mod outcome;
pub mod planner;
pub mod safety_policy;
