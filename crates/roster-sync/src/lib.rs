//! Client-side synchronisation layer for the roster console.
//!
//! * [`cache`]: a generic single-flight query cache with staleness, retry
//!   and invalidation policies.
//! * [`queries`]: the process-wide user store built on that cache, plus the
//!   mutations that invalidate it.
//! * [`session`]: the authenticated-identity gate and its redirects.
//! * [`table`]: pagination, sorting and filtering state for the user list.
//! * [`forms`]: edit and create form controllers.
//!
//! Every store here is an explicit value with its own lifecycle; nothing is a
//! global. Dependencies on the remote API are injected through the
//! [`roster_core::service`] traits.

pub mod cache;
pub mod forms;
pub mod queries;
pub mod session;
pub mod table;

pub use cache::{QueryCache, QueryPolicy, QuerySnapshot, QueryStatus};
pub use queries::{UserKey, UserQueries, UsersKey};
pub use session::{LogoutPolicy, Navigator, Route, SessionGate};
pub use table::UsersTable;

#[cfg(test)]
mod fake;
