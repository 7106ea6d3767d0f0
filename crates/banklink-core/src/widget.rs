use crate::error::BankLinkError;
use crate::types::{InitToken, Metadata, PublicAuthorization};

/// Callback emitted by the link widget.
///
/// Each open/close cycle ends with exactly one `Success` or `Exit`, with any
/// number of intermediate `Event`s before it. Only `Success` may change
/// session state.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Success(PublicAuthorization),
    Event {
        name: String,
        metadata: Metadata,
    },
    Exit {
        error: Option<serde_json::Value>,
        metadata: Metadata,
    },
}

impl LinkEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LinkEvent::Success(_) => "success",
            LinkEvent::Event { .. } => "event",
            LinkEvent::Exit { .. } => "exit",
        }
    }
}

/// The externally hosted bank-linking flow.
///
/// The widget is operable only after it has been handed an `InitToken`.
pub trait LinkWidget: Send + Sync {
    /// Hand the widget its initialization token, making it ready.
    fn attach(&self, token: InitToken);

    /// Whether the widget can be opened.
    fn is_ready(&self) -> bool;

    /// Start the hosted flow. Fails if the widget is not ready.
    fn open(&self) -> Result<(), BankLinkError>;
}
