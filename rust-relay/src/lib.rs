//! Push relay - forwards GitHub push webhooks as repository dispatch events.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → POST /webhook → signature check → relay → POST /repos/{owner}/{repo}/dispatches × N
//! ```
//!
//! Only pushes to `refs/heads/main` are relayed. The webhook sender always
//! gets `200 {"status": "received"}` once the signature checks out.

pub mod config;
pub mod dispatch;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{relay_push, DispatchTarget, Dispatcher, PushEvent, RelayOutcome};
pub use web::{router, AppState};
