//! Human-in-the-loop approval for side-effecting tools.

/// What a side-effecting tool wants to do, phrased for a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    /// Short action label used in the denial message (e.g., "File write")
    pub action: String,

    /// The full prompt shown to the approver
    pub prompt: String,
}

impl ApprovalRequest {
    pub fn new(action: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            prompt: prompt.into(),
        }
    }

    /// The error text fed back to the model when the request is refused.
    pub fn denial_message(&self) -> String {
        format!("{} denied by user", self.action)
    }
}

/// Synchronous yes/no confirmation.
///
/// `confirm` blocks until a decision is made; the loop does nothing else
/// while it waits.
pub trait ApprovalGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves everything. For non-interactive runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Refuses everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl ApprovalGate for DenyAll {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
