// CLI layer - the interactive prompt and console output.

#[path = "prompt.rs"]
pub mod prompt;

#[path = "console.rs"]
pub mod console;

pub use console::ConsoleReporter;
pub use prompt::YesNoPrompt;
