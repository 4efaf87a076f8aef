// The core module contains all business logic.
// It knows nothing about HTTP, Google credentials or the terminal.

#[path = "conversion/mod.rs"]
pub mod conversion;
