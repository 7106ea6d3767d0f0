use banklink_core::{AccessCredential, Snapshot};

/// The persisted session fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// At most one credential is held at a time.
    pub credential: Option<AccessCredential>,
    pub accounts: Snapshot,
    pub transactions: Snapshot,
}

impl SessionState {
    pub fn is_linked(&self) -> bool {
        self.credential.is_some()
    }

    pub fn phase(&self, sync_in_flight: bool) -> SessionPhase {
        match (&self.credential, sync_in_flight) {
            (None, _) => SessionPhase::NoCredential,
            (Some(_), false) => SessionPhase::LinkedIdle,
            (Some(_), true) => SessionPhase::LinkedSyncing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoCredential,
    LinkedIdle,
    LinkedSyncing,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::NoCredential => write!(f, "no-credential"),
            SessionPhase::LinkedIdle => write!(f, "linked-idle"),
            SessionPhase::LinkedSyncing => write!(f, "linked-syncing"),
        }
    }
}
