//! Inter-tab data bus.
//!
//! A synchronous publish/subscribe router: tabs register a handle, subscribe
//! to `data_type` keys and publish [`Message`]s. Every publish is validated,
//! passed through the named filter chain, recorded in a bounded history and
//! then delivered, within the caller's stack frame, to every other active
//! subscriber in registration order.

mod handle;
mod message;
mod payload;
mod transforms;
mod validation;

pub use handle::{DeliveryError, TabCallback, TabHandle};
pub use message::{Message, SCHEMA_VERSION};
pub(crate) use message::now_iso8601;
pub use payload::{
    DataKind, FittingData, FittingResults, Payload, SerializedArray, SerializedTable,
    SourceColumns,
};
pub use transforms::{
    DataSummary, TransformError, data_summary, montecarlo_to_fitting, numerical_columns,
    spreadsheet_to_fitting,
};
pub use validation::{ValidationError, validate_message, validate_raw_message};

use crate::config::BusConfig;
use crate::events::EventEmitter;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Predicate gating every publish. Returning `false` vetoes the message.
pub type FilterFn = Box<dyn Fn(&Message) -> bool>;

/// Events emitted by the bus.
#[derive(Debug, Clone)]
pub enum BusEvent {
    TabRegistered { tab_id: String, tab_type: String },
    TabUnregistered { tab_id: String },
    /// A message passed validation and filters and was recorded
    DataPublished(Message),
    /// A message was delivered to `tab_id`
    DataReceived { tab_id: String, message: Message },
    /// Validation failure (scoped to the source) or delivery failure
    /// (scoped to the recipient)
    TransmissionError { tab_id: String, error: String },
    StatusChanged { is_active: bool },
    MessageValidated { data_type: String, valid: bool },
}

/// Snapshot of bus counters, computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusStatistics {
    pub is_active: bool,
    pub total_registered_tabs: usize,
    pub active_tabs: usize,
    pub total_messages_processed: u64,
    pub message_history_size: usize,
    pub active_filters: usize,
    pub total_subscriptions: usize,
}

/// Per-tab view returned by [`DataBus::registered_tabs`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredTabInfo {
    pub tab_id: String,
    pub tab_type: String,
    pub is_active: bool,
    pub message_count: u64,
    pub last_activity: Option<String>,
    pub subscriptions: Vec<String>,
}

pub struct DataBus {
    /// Registered handles in registration order (delivery order)
    handles: Vec<TabHandle>,
    subscriptions: HashMap<String, Vec<String>>,
    /// Named filters in registration order
    filters: Vec<(String, FilterFn)>,
    history: VecDeque<Message>,
    max_history: usize,
    enable_validation: bool,
    enable_logging: bool,
    is_active: bool,
    events: EventEmitter<BusEvent>,
}

impl Default for DataBus {
    fn default() -> Self {
        Self::new(&BusConfig::default())
    }
}

impl std::fmt::Debug for DataBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataBus")
            .field("handles", &self.handles)
            .field("filters", &self.filters.len())
            .field("history", &self.history.len())
            .field("is_active", &self.is_active)
            .finish()
    }
}

impl DataBus {
    /// Create an active bus.
    pub fn new(config: &BusConfig) -> Self {
        log::info!(
            "Data bus initialized (history={}, validation={})",
            config.max_message_history,
            config.enable_validation
        );
        Self {
            handles: Vec::new(),
            subscriptions: HashMap::new(),
            filters: Vec::new(),
            history: VecDeque::with_capacity(config.max_message_history),
            max_history: config.max_message_history.max(1),
            enable_validation: config.enable_validation,
            enable_logging: config.enable_logging,
            is_active: true,
            events: EventEmitter::new(),
        }
    }

    pub fn events(&mut self) -> &mut EventEmitter<BusEvent> {
        &mut self.events
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.events.emit(&BusEvent::StatusChanged { is_active: true });
        log::info!("Data bus activated");
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.events.emit(&BusEvent::StatusChanged { is_active: false });
        log::info!("Data bus deactivated");
    }

    pub fn set_validation_enabled(&mut self, enabled: bool) {
        self.enable_validation = enabled;
    }

    fn handle_index(&self, tab_id: &str) -> Option<usize> {
        self.handles.iter().position(|h| h.tab_id == tab_id)
    }

    pub fn is_registered(&self, tab_id: &str) -> bool {
        self.handle_index(tab_id).is_some()
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register a tab. Re-registering an id replaces its handle in place and
    /// keeps its subscriptions.
    pub fn register_tab(
        &mut self,
        tab_id: &str,
        tab_type: &str,
        callback: Option<TabCallback>,
    ) -> bool {
        if !self.is_active {
            log::error!("Cannot register tab {}: data bus not active", tab_id);
            return false;
        }

        let handle = TabHandle::new(tab_id.to_string(), tab_type.to_string(), callback);
        match self.handle_index(tab_id) {
            Some(idx) => {
                log::warn!("Tab {} already registered, updating registration", tab_id);
                self.handles[idx] = handle;
            }
            None => self.handles.push(handle),
        }
        self.subscriptions.entry(tab_id.to_string()).or_default();

        self.events.emit(&BusEvent::TabRegistered {
            tab_id: tab_id.to_string(),
            tab_type: tab_type.to_string(),
        });
        if self.enable_logging {
            log::info!("Tab registered: {} (type: {})", tab_id, tab_type);
        }
        true
    }

    /// Remove a tab, its subscriptions and every filter named `"{tab_id}_*"`.
    pub fn unregister_tab(&mut self, tab_id: &str) -> bool {
        let Some(idx) = self.handle_index(tab_id) else {
            log::warn!("Attempted to unregister non-existent tab: {}", tab_id);
            return false;
        };

        self.handles.remove(idx);
        self.subscriptions.remove(tab_id);
        let prefix = format!("{tab_id}_");
        self.filters.retain(|(id, _)| !id.starts_with(&prefix));

        self.events.emit(&BusEvent::TabUnregistered {
            tab_id: tab_id.to_string(),
        });
        if self.enable_logging {
            log::info!("Tab unregistered: {}", tab_id);
        }
        true
    }

    /// Pause or resume delivery to a tab. Paused tabs can still publish.
    pub fn set_tab_active(&mut self, tab_id: &str, active: bool) -> bool {
        match self.handles.iter_mut().find(|h| h.tab_id == tab_id) {
            Some(handle) => {
                handle.is_active = active;
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Subscriptions and filters
    // ---------------------------------------------------------------------

    pub fn subscribe(&mut self, tab_id: &str, data_type: &str) -> bool {
        if !self.is_registered(tab_id) {
            log::error!("Cannot subscribe: tab {} not registered", tab_id);
            return false;
        }

        let subs = self.subscriptions.entry(tab_id.to_string()).or_default();
        if subs.iter().any(|s| s == data_type) {
            return false;
        }
        subs.push(data_type.to_string());
        if self.enable_logging {
            log::debug!("Tab {} subscribed to data type: {}", tab_id, data_type);
        }
        true
    }

    pub fn unsubscribe(&mut self, tab_id: &str, data_type: &str) -> bool {
        let Some(subs) = self.subscriptions.get_mut(tab_id) else {
            return false;
        };
        let Some(pos) = subs.iter().position(|s| s == data_type) else {
            return false;
        };
        subs.remove(pos);
        if self.enable_logging {
            log::debug!("Tab {} unsubscribed from data type: {}", tab_id, data_type);
        }
        true
    }

    /// Subscriptions of one tab, in the order they were added.
    pub fn subscriptions(&self, tab_id: &str) -> &[String] {
        self.subscriptions
            .get(tab_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Add a named filter. An existing filter with the same id is replaced
    /// in place, keeping its evaluation position.
    pub fn add_filter(&mut self, filter_id: &str, predicate: impl Fn(&Message) -> bool + 'static) {
        let predicate: FilterFn = Box::new(predicate);
        match self.filters.iter_mut().find(|(id, _)| id == filter_id) {
            Some(slot) => slot.1 = predicate,
            None => self.filters.push((filter_id.to_string(), predicate)),
        }
        log::debug!("Data filter added: {}", filter_id);
    }

    pub fn has_filter(&self, filter_id: &str) -> bool {
        self.filters.iter().any(|(id, _)| id == filter_id)
    }

    pub fn remove_filter(&mut self, filter_id: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|(id, _)| id != filter_id);
        let removed = self.filters.len() != before;
        if removed {
            log::debug!("Data filter removed: {}", filter_id);
        }
        removed
    }

    // ---------------------------------------------------------------------
    // Publishing
    // ---------------------------------------------------------------------

    /// Publish a payload from a registered tab.
    ///
    /// Returns false when the bus is inactive, the source is unknown, the
    /// message fails validation or a filter vetoes it. Delivery failures do
    /// not affect the result.
    pub fn publish(
        &mut self,
        source_tab_id: &str,
        data_type: &str,
        payload: Payload,
        metadata: Option<Map<String, Value>>,
    ) -> bool {
        if !self.is_active {
            log::error!("Cannot publish data: data bus not active");
            return false;
        }
        let Some(source_idx) = self.handle_index(source_tab_id) else {
            log::error!("Cannot publish data: tab {} not registered", source_tab_id);
            return false;
        };

        let message = Message::new(
            source_tab_id,
            self.handles[source_idx].tab_type.clone(),
            data_type,
            payload,
            metadata,
        );

        if self.enable_validation {
            let errors = validate_message(&message);
            self.events.emit(&BusEvent::MessageValidated {
                data_type: data_type.to_string(),
                valid: errors.is_empty(),
            });
            if !errors.is_empty() {
                let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                let error = format!("Data validation failed: {}", joined.join(", "));
                log::error!("{} (source {})", error, source_tab_id);
                self.events.emit(&BusEvent::TransmissionError {
                    tab_id: source_tab_id.to_string(),
                    error,
                });
                return false;
            }
        }

        if let Some(filter_id) = self.vetoing_filter(&message) {
            log::debug!(
                "Data from {} filtered out by filter {}",
                source_tab_id,
                filter_id
            );
            return false;
        }

        self.handles[source_idx].record_publish(message.timestamp());
        if self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(message.clone());

        self.events.emit(&BusEvent::DataPublished(message.clone()));
        if self.enable_logging {
            log::info!(
                "Data published: {} -> {} ({})",
                source_tab_id,
                data_type,
                data_summary(message.payload())
            );
        }

        self.route(&message);
        true
    }

    /// First filter that rejects `message`. A panicking filter is logged and
    /// counts as a pass.
    fn vetoing_filter(&self, message: &Message) -> Option<&str> {
        self.filters.iter().find_map(|(filter_id, filter)| {
            match catch_unwind(AssertUnwindSafe(|| filter(message))) {
                Ok(true) => None,
                Ok(false) => Some(filter_id.as_str()),
                Err(panic) => {
                    log::error!(
                        "Error in data filter {}: {}",
                        filter_id,
                        panic_message(panic.as_ref())
                    );
                    None
                }
            }
        })
    }

    /// Deliver to every other active subscriber, in registration order.
    fn route(&mut self, message: &Message) {
        let data_type = message.data_type();
        let source = message.source_tab_id();

        for handle in self.handles.iter_mut() {
            if handle.tab_id == source || !handle.is_active {
                continue;
            }
            let subscribed = self
                .subscriptions
                .get(&handle.tab_id)
                .is_some_and(|subs| subs.iter().any(|s| s == data_type));
            if !subscribed {
                continue;
            }

            let result = match handle.callback.as_mut() {
                Some(callback) => match catch_unwind(AssertUnwindSafe(|| callback(message))) {
                    Ok(result) => result,
                    Err(panic) => Err(DeliveryError::Panicked(panic_message(panic.as_ref()))),
                },
                None => Ok(()),
            };

            match result {
                Ok(()) => {
                    self.events.emit(&BusEvent::DataReceived {
                        tab_id: handle.tab_id.clone(),
                        message: message.clone(),
                    });
                    if self.enable_logging {
                        log::debug!(
                            "Data delivered: {} -> {} ({})",
                            source,
                            handle.tab_id,
                            data_type
                        );
                    }
                }
                Err(e) => {
                    let error = format!("Error delivering data to {}: {}", handle.tab_id, e);
                    log::error!("{}", error);
                    self.events.emit(&BusEvent::TransmissionError {
                        tab_id: handle.tab_id.clone(),
                        error,
                    });
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn registered_tabs(&self) -> Vec<RegisteredTabInfo> {
        self.handles
            .iter()
            .map(|h| RegisteredTabInfo {
                tab_id: h.tab_id.clone(),
                tab_type: h.tab_type.clone(),
                is_active: h.is_active,
                message_count: h.message_count,
                last_activity: h.last_activity.clone(),
                subscriptions: self.subscriptions(&h.tab_id).to_vec(),
            })
            .collect()
    }

    pub fn handle(&self, tab_id: &str) -> Option<&TabHandle> {
        self.handles.iter().find(|h| h.tab_id == tab_id)
    }

    /// Recorded messages, oldest first. `limit` keeps only the most recent.
    pub fn history(&self, limit: Option<usize>) -> Vec<Message> {
        let skip = limit.map_or(0, |n| self.history.len().saturating_sub(n));
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        log::debug!("Message history cleared");
    }

    pub fn statistics(&self) -> BusStatistics {
        BusStatistics {
            is_active: self.is_active,
            total_registered_tabs: self.handles.len(),
            active_tabs: self.handles.iter().filter(|h| h.is_active).count(),
            total_messages_processed: self.handles.iter().map(|h| h.message_count).sum(),
            message_history_size: self.history.len(),
            active_filters: self.filters.len(),
            total_subscriptions: self.subscriptions.values().map(Vec::len).sum(),
        }
    }

    /// Unregister every tab, drop filters/history/subscriptions, deactivate.
    pub fn shutdown(&mut self) {
        log::info!("Shutting down data bus");

        let ids: Vec<String> = self.handles.iter().map(|h| h.tab_id.clone()).collect();
        for id in ids {
            self.unregister_tab(&id);
        }
        self.filters.clear();
        self.history.clear();
        self.subscriptions.clear();
        self.deactivate();

        log::info!("Data bus shutdown complete");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
