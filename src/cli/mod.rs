//! Terminal front end

pub mod prompts;

pub use prompts::{collect_request, ConsoleOperator, BANNER};
