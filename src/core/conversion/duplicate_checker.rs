use super::conversion_models::DuplicatePolicy;
use super::drive_api::DriveApi;

/// Answers "is there already a file with this name in any of these folders?"
pub struct DuplicateChecker {
    policy: DuplicatePolicy,
}

impl DuplicateChecker {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    /// Returns true iff at least one file named `name` exists under any of
    /// `parents`. Query faults never propagate; the policy picks the answer.
    pub async fn has_duplicate<D: DriveApi + ?Sized>(
        &self,
        drive: &D,
        name: &str,
        parents: &[String],
    ) -> bool {
        match drive.find_named(name, parents).await {
            Ok(matches) => {
                tracing::debug!(file_name = name, found = matches.len(), "Duplicate query finished");
                !matches.is_empty()
            }
            Err(e) => {
                let assume_duplicate = self.policy == DuplicatePolicy::FailClosed;
                tracing::warn!(
                    file_name = name,
                    error = %e,
                    assume_duplicate,
                    "Duplicate check failed, falling back to policy"
                );
                assume_duplicate
            }
        }
    }
}
