use std::sync::OnceLock;

use banklink_core::{BankLinkError, InitToken, LinkWidget};
use tracing::warn;

/// Link widget for terminal use.
///
/// Opening it prints the link token so the hosted flow can be completed
/// elsewhere; its callbacks are then reported back through the shell.
#[derive(Debug, Default)]
pub struct ConsoleLinkWidget {
    token: OnceLock<InitToken>,
}

impl ConsoleLinkWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions shown when the widget is opened.
    pub fn instructions(token: &InitToken) -> String {
        format!(
            "Link token: {}\n\
             Complete the bank-linking flow with this token, then report how it ended:\n\
             \x20 success <public_token> [metadata-json]\n\
             \x20 event <name> [metadata-json]\n\
             \x20 exit [error-json]",
            token.as_str()
        )
    }
}

impl LinkWidget for ConsoleLinkWidget {
    fn attach(&self, token: InitToken) {
        if self.token.set(token).is_err() {
            warn!("Link widget already has a token, ignoring the new one");
        }
    }

    fn is_ready(&self) -> bool {
        self.token.get().is_some()
    }

    fn open(&self) -> Result<(), BankLinkError> {
        let token = self
            .token
            .get()
            .ok_or_else(|| BankLinkError::Widget("link widget is not ready".to_string()))?;
        println!("{}", Self::instructions(token));
        Ok(())
    }
}
