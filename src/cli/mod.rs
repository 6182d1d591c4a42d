pub mod commands;
pub mod forms;
pub mod handlers;
pub mod output;
