// The infra module contains implementations of core traits.

#[path = "google_drive/mod.rs"]
pub mod google_drive;
