//! Bus-side registration record for a tab.

use super::message::Message;
use thiserror::Error;

/// Sink invoked when a subscribed message is delivered.
pub type TabCallback = Box<dyn FnMut(&Message) -> Result<(), DeliveryError>>;

/// Why a delivery to one recipient failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The tab content was dropped while its handle was still registered
    #[error("tab content no longer exists")]
    TabDropped,

    /// The tab content is already borrowed higher up the stack
    #[error("tab content is busy")]
    TabBusy,

    /// The tab rejected or failed to process the message
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    /// The callback panicked
    #[error("callback panicked: {0}")]
    Panicked(String),
}

/// Registration record for one tab.
pub struct TabHandle {
    pub(super) tab_id: String,
    pub(super) tab_type: String,
    pub(super) callback: Option<TabCallback>,
    pub(super) is_active: bool,
    pub(super) message_count: u64,
    pub(super) last_activity: Option<String>,
}

impl TabHandle {
    pub(super) fn new(tab_id: String, tab_type: String, callback: Option<TabCallback>) -> Self {
        Self {
            tab_id,
            tab_type,
            callback,
            is_active: true,
            message_count: 0,
            last_activity: None,
        }
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn tab_type(&self) -> &str {
        &self.tab_type
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn last_activity(&self) -> Option<&str> {
        self.last_activity.as_deref()
    }

    /// Record a publish from this tab.
    pub(super) fn record_publish(&mut self, timestamp: &str) {
        self.message_count += 1;
        self.last_activity = Some(timestamp.to_string());
    }
}

impl std::fmt::Debug for TabHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabHandle")
            .field("tab_id", &self.tab_id)
            .field("tab_type", &self.tab_type)
            .field("has_callback", &self.callback.is_some())
            .field("is_active", &self.is_active)
            .field("message_count", &self.message_count)
            .finish()
    }
}
