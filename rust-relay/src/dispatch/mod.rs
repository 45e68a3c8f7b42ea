//! Repository dispatch relay.
//!
//! Turns a verified push webhook into one `repository_dispatch` call per
//! configured target repository.
//!
//! ## Flow
//!
//! ```text
//! PushEvent → relay_push() → Dispatcher::dispatch() × N → RelayOutcome
//! ```

pub mod client;
pub mod event;
pub mod relay;
pub mod target;

pub use client::{DispatchError, Dispatcher};
pub use event::{ClientPayload, DispatchPayload, PushEvent, MAIN_REF};
pub use relay::{relay_push, RelayOutcome, TargetResult};
pub use target::DispatchTarget;
