//! Auth Session Store
//!
//! Process-wide bearer token attached to every outbound API call.
//! Absence of a token is not an error at this layer; unauthenticated
//! calls simply fail with whatever status the server reports.

use std::sync::RwLock;

use log::{debug, warn};
use once_cell::sync::Lazy;

/// Lazily-initialized session token slot.
static SESSION_TOKEN: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

/// Stores the bearer token for subsequent API calls.
pub fn set_token(token: impl Into<String>) {
    match SESSION_TOKEN.write() {
        Ok(mut slot) => {
            *slot = Some(token.into());
            debug!("Session token updated");
        }
        Err(_) => warn!("Session token store poisoned, token not updated"),
    }
}

/// Clears the bearer token (logout).
pub fn clear_token() {
    if let Ok(mut slot) = SESSION_TOKEN.write() {
        *slot = None;
        debug!("Session token cleared");
    }
}

/// Returns the current bearer token, if any.
pub fn current_token() -> Option<String> {
    SESSION_TOKEN.read().ok().and_then(|slot| slot.clone())
}
