//! Session flash sink
//!
//! Tracked code snippets are handed to a session-backed flash slot for
//! one-time retrieval by a later rendering stage. The session itself is an
//! external collaborator; this module only defines the narrow write
//! interface and the two-step source resolution.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Result, TrackingError};

/// Flash slot key consumed by the rendering stage.
pub const FLASH_MESSAGE_BAG_KEY: &str = "fw_tracking_code_flash_message";

/// Write access to a request session's flash storage.
pub trait FlashSession: Send + Sync {
    /// Stores `value` under `key` for one-time retrieval. The mapping is
    /// keyed by tracker name and preserves registration order.
    fn set_flash_data(&self, key: &str, value: IndexMap<String, Vec<String>>);
}

/// Yields the session bound to the current request, if any.
pub trait SessionProvider: Send + Sync {
    /// `None` when no request is active (e.g. CLI or background context).
    fn current_session(&self) -> Option<Arc<dyn FlashSession>>;
}

/// Resolves the session that receives flash data.
///
/// Resolution order: the request-bound session from the provider first, the
/// held fallback session second. The held session path exists for callers
/// that still inject a session directly and will be removed once they
/// migrate to a [`SessionProvider`].
#[derive(Default)]
pub struct SessionSource {
    provider: Option<Arc<dyn SessionProvider>>,
    held: Option<Arc<dyn FlashSession>>,
}

impl SessionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_provider(&mut self, provider: Arc<dyn SessionProvider>) {
        self.provider = Some(provider);
    }

    #[deprecated(note = "inject a SessionProvider instead; removed once callers migrate")]
    pub fn set_held_session(&mut self, session: Arc<dyn FlashSession>) {
        self.held = Some(session);
    }

    /// Resolves the target session or fails with
    /// [`TrackingError::NoSession`] when neither source is available.
    pub fn resolve(&self) -> Result<Arc<dyn FlashSession>> {
        if let Some(provider) = &self.provider {
            if let Some(session) = provider.current_session() {
                return Ok(session);
            }
        }

        if let Some(held) = &self.held {
            warn!("No request-bound session available, falling back to the held session");
            return Ok(held.clone());
        }

        Err(TrackingError::NoSession)
    }
}
