//! Tab content contracts and the per-window tab strip.
//!
//! The core never looks inside a tab: it talks to contents through
//! [`TabContent`] (identity, persisted state, display name) and, for tabs
//! that exchange data, the [`SupportsDataExchange`] capability.

mod home;
mod state;
pub mod strip;

pub use home::{HOME_TAB_ID, HOME_TAB_TYPE, HomeTab};
pub use state::TabState;
pub use strip::{StripMode, TabEntry, TabStrip};

use crate::bus::{DataBus, DeliveryError, Message, Payload, TabCallback};
use std::cell::RefCell;
use std::rc::Rc;

/// Stable tab identifier, unchanged across detach/reattach and restarts.
pub type TabId = String;

/// Shared handle to a tab's content.
pub type TabRef = Rc<RefCell<dyn TabContent>>;

/// What every tab content exposes to the core.
pub trait TabContent {
    fn tab_id(&self) -> &str;

    fn tab_type(&self) -> &str;

    /// Serializable state; must contain at least `type` and `tab_id`.
    fn state(&self) -> anyhow::Result<TabState>;

    fn display_name(&self) -> String;

    fn set_display_name(&mut self, name: &str);

    fn icon(&self) -> Option<String> {
        None
    }

    /// The Home tab is pinned to index 0 of the main window.
    fn is_home(&self) -> bool {
        false
    }

    /// Data-exchange capability, for tabs that publish or consume bus data.
    fn data_exchange(&mut self) -> Option<&mut dyn SupportsDataExchange> {
        None
    }
}

/// Capability of tabs that exchange data over the bus.
pub trait SupportsDataExchange {
    fn on_data_received(&mut self, message: &Message) -> anyhow::Result<()>;

    /// Data types this tab understands.
    fn supported_data_types(&self) -> Vec<String>;

    /// The tab's current exportable data as `(data_type, payload)`.
    fn exportable_data(&self) -> Option<(String, Payload)>;

    /// Data types subscribed automatically when the tab joins the bus.
    fn default_subscriptions(&self) -> Vec<String> {
        self.supported_data_types()
    }

    fn can_receive(&self, data_type: &str) -> bool {
        self.supported_data_types().iter().any(|t| t == data_type)
    }
}

/// Builds tab contents by type, fresh or from persisted state.
pub trait TabFactory {
    fn create(&self, tab_type: &str, tab_id: &str) -> anyhow::Result<TabRef>;

    fn restore(&self, state: &TabState) -> anyhow::Result<TabRef>;
}

/// Register a tab with the bus and subscribe its default data types.
///
/// The bus callback holds only a weak reference: a dropped tab reports
/// [`DeliveryError::TabDropped`] and a tab already borrowed further up the
/// stack reports [`DeliveryError::TabBusy`].
pub fn connect_to_bus(bus: &mut DataBus, tab: &TabRef) -> bool {
    let (tab_id, tab_type, subscriptions) = {
        let mut content = tab.borrow_mut();
        let subs = content
            .data_exchange()
            .map(|dx| dx.default_subscriptions())
            .unwrap_or_default();
        (
            content.tab_id().to_string(),
            content.tab_type().to_string(),
            subs,
        )
    };

    let weak = Rc::downgrade(tab);
    let callback: TabCallback = Box::new(move |message: &Message| {
        let tab = weak.upgrade().ok_or(DeliveryError::TabDropped)?;
        let mut content = tab.try_borrow_mut().map_err(|_| DeliveryError::TabBusy)?;
        match content.data_exchange() {
            Some(dx) if dx.can_receive(message.data_type()) => {
                dx.on_data_received(message)?;
                Ok(())
            }
            _ => Ok(()),
        }
    });

    if !bus.register_tab(&tab_id, &tab_type, Some(callback)) {
        return false;
    }
    for data_type in subscriptions {
        bus.subscribe(&tab_id, &data_type);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sink {
        id: String,
        received: Vec<String>,
        fail: bool,
    }

    impl TabContent for Sink {
        fn tab_id(&self) -> &str {
            &self.id
        }
        fn tab_type(&self) -> &str {
            "sink"
        }
        fn state(&self) -> anyhow::Result<TabState> {
            Ok(TabState::new("sink", &self.id))
        }
        fn display_name(&self) -> String {
            self.id.clone()
        }
        fn set_display_name(&mut self, _name: &str) {}
        fn data_exchange(&mut self) -> Option<&mut dyn SupportsDataExchange> {
            Some(self)
        }
    }

    impl SupportsDataExchange for Sink {
        fn on_data_received(&mut self, message: &Message) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("rejected");
            }
            self.received.push(message.data_type().to_string());
            Ok(())
        }
        fn supported_data_types(&self) -> Vec<String> {
            vec!["text".into(), "parameters".into()]
        }
        fn exportable_data(&self) -> Option<(String, Payload)> {
            None
        }
        fn default_subscriptions(&self) -> Vec<String> {
            vec!["text".into()]
        }
    }

    fn sink(id: &str, fail: bool) -> Rc<RefCell<Sink>> {
        Rc::new(RefCell::new(Sink {
            id: id.into(),
            received: Vec::new(),
            fail,
        }))
    }

    #[test]
    fn test_connect_subscribes_defaults_and_delivers() {
        let mut bus = DataBus::default();
        bus.register_tab("src", "x", None);
        let dst = sink("dst", false);
        let dst_ref: TabRef = dst.clone();
        assert!(connect_to_bus(&mut bus, &dst_ref));
        assert_eq!(bus.subscriptions("dst"), ["text".to_string()]);

        bus.publish("src", "text", Payload::Text("a".into()), None);
        assert_eq!(dst.borrow().received, vec!["text"]);
    }

    #[test]
    fn test_dropped_and_busy_tabs_report_errors() {
        let mut bus = DataBus::default();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let e = Rc::clone(&errors);
        bus.events().subscribe(move |ev| {
            if let crate::bus::BusEvent::TransmissionError { error, .. } = ev {
                e.borrow_mut().push(error.clone());
            }
        });
        bus.register_tab("src", "x", None);

        let busy = sink("busy", false);
        let busy_ref: TabRef = busy.clone();
        connect_to_bus(&mut bus, &busy_ref);
        {
            let dropped: TabRef = sink("gone", false);
            connect_to_bus(&mut bus, &dropped);
        }

        let _guard = busy.borrow_mut();
        bus.publish("src", "text", Payload::Text("a".into()), None);
        let errors = errors.borrow();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("busy"));
        assert!(errors[1].contains("no longer exists"));
    }

    #[test]
    fn test_handler_error_surfaces() {
        let mut bus = DataBus::default();
        bus.register_tab("src", "x", None);
        let bad: TabRef = sink("bad", true);
        connect_to_bus(&mut bus, &bad);
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        bus.events().subscribe(move |ev| {
            if matches!(ev, crate::bus::BusEvent::TransmissionError { .. }) {
                *c.borrow_mut() += 1;
            }
        });
        assert!(bus.publish("src", "text", Payload::Text("a".into()), None));
        assert_eq!(*count.borrow(), 1);
    }
}
