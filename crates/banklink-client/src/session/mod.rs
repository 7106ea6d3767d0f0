//! Session and sync state machine.
//!
//! States: `NoCredential` -> (exchange) -> `LinkedIdle` <-> (sync) <-> `LinkedSyncing`,
//! with reset returning to `NoCredential` from anywhere.

mod controller;
mod state;
mod view;

pub use controller::{ExchangeOutcome, LinkEventOutcome, SessionController, SyncOutcome};
pub use state::{SessionPhase, SessionState};
pub use view::{Affordance, LinkReadiness, SessionView};
