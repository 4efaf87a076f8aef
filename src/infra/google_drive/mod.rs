// =============================================================================
// GOOGLE DRIVE MODULE
// =============================================================================
//
// Google Drive v3 implementation of the core `DriveApi` trait.
//
// **Pieces:**
// - `service_account.rs` - JWT bearer authentication with a service account key
// - `drive_query.rs` - escaped `q` filter strings
// - `drive_client.rs` - the HTTP client plus `get_service`, the credential provider
//
// The core layer never sees any of this; it only knows `DriveApi`.

pub mod drive_client;
pub mod drive_query;
pub mod service_account;

#[allow(unused_imports)]
pub use drive_client::{get_service, GoogleDriveClient};
pub use service_account::DRIVE_SCOPE;
