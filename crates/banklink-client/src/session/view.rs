use std::fmt;

use super::state::SessionState;

/// Visibility and enablement of one user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordance {
    pub visible: bool,
    pub enabled: bool,
}

impl Affordance {
    fn new(visible: bool, enabled: bool) -> Self {
        Self { visible, enabled }
    }
}

/// Whether the link widget can be opened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkReadiness {
    /// No link token has been requested in this run.
    NotRequested,
    /// The token request is pending, or the widget has not taken the token yet.
    Waiting,
    /// The token request failed; linking is unavailable for this run.
    Unavailable,
    Ready,
}

/// What the user sees for a given session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Visible iff unlinked, enabled iff the link widget is ready.
    pub connect: Affordance,
    /// Visible iff linked, disabled while a sync is in flight.
    pub sync: Affordance,
    pub sync_busy: bool,
    pub clear_session: Affordance,
    pub link_readiness: LinkReadiness,
    pub credential_line: Option<String>,
    pub summary_line: Option<String>,
}

impl SessionView {
    pub fn new(state: &SessionState, link_readiness: LinkReadiness, sync_in_flight: bool) -> Self {
        let linked = state.is_linked();

        let credential_line = state
            .credential
            .as_ref()
            .map(|c| format!("Access Token: {}", c.redacted()));

        let summary_line = (!state.transactions.is_empty()).then(|| {
            format!(
                "Synced {} accounts and {} transactions",
                state.accounts.len(),
                state.transactions.len()
            )
        });

        Self {
            connect: Affordance::new(!linked, link_readiness == LinkReadiness::Ready),
            sync: Affordance::new(linked, !sync_in_flight),
            sync_busy: sync_in_flight,
            clear_session: Affordance::new(linked, true),
            link_readiness,
            credential_line,
            summary_line,
        }
    }
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.connect.visible {
            let note = match self.link_readiness {
                LinkReadiness::Ready => "",
                LinkReadiness::Waiting => " (waiting for link token)",
                LinkReadiness::NotRequested => " (link token not requested)",
                LinkReadiness::Unavailable => " (link unavailable)",
            };
            writeln!(f, "  connect   Connect a bank account{}", note)?;
        }
        if self.sync.visible {
            let label = if self.sync_busy { "Syncing..." } else { "Sync account" };
            writeln!(f, "  sync      {}", label)?;
        }
        if self.clear_session.visible {
            writeln!(f, "  reset     Clear session")?;
        }
        if let Some(line) = &self.credential_line {
            writeln!(f, "{}", line)?;
        }
        if let Some(line) = &self.summary_line {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
