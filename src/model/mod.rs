pub mod config;
pub mod project;
pub mod todo;

pub use config::*;
pub use project::*;
pub use todo::*;
