//! Data bus routing through tabs opened on a workbench.

mod common;

use common::{TestFactory, sample_table, test_workbench, test_workbench_with};
use std::cell::RefCell;
use std::rc::Rc;
use workbench::bus::{BusEvent, Payload};
use workbench::config::Config;

#[test]
fn test_published_table_reaches_every_subscriber_but_the_source() {
    let factory = TestFactory::new();
    let inboxes = factory.inboxes.clone();
    let (mut bench, _dir) = test_workbench(factory);

    let sheet = bench.open_tab("spreadsheet").unwrap();
    let fit = bench.open_tab("fitting").unwrap();
    let plot = bench.open_tab("plotting").unwrap();
    let notes = bench.open_tab("notes").unwrap();

    assert!(bench.publish_from(&sheet));

    assert_eq!(inboxes.count(&sheet), 0);
    assert_eq!(inboxes.count(&fit), 1);
    assert_eq!(inboxes.count(&plot), 1);
    assert_eq!(inboxes.count(&notes), 0);

    let received = &inboxes.messages(&fit)[0];
    assert_eq!(received.source_tab_id(), sheet);
    assert_eq!(received.source_tab_type(), "spreadsheet");
    assert_eq!(received.data_type(), "dataframe");
    assert_eq!(received.payload().as_table().unwrap().row_count(), 2);
}

#[test]
fn test_delivery_follows_registration_order() {
    let (mut bench, _dir) = test_workbench(TestFactory::new());
    let sheet = bench.open_tab("spreadsheet").unwrap();
    let first = bench.open_tab("fitting").unwrap();
    let second = bench.open_tab("plotting").unwrap();

    let order = Rc::new(RefCell::new(Vec::new()));
    let o = Rc::clone(&order);
    bench.bus_mut().events().subscribe(move |event| {
        if let BusEvent::DataReceived { tab_id, .. } = event {
            o.borrow_mut().push(tab_id.clone());
        }
    });

    bench.publish_from(&sheet);
    assert_eq!(*order.borrow(), vec![first, second]);
}

#[test]
fn test_unsubscribed_type_is_not_delivered() {
    let factory = TestFactory::new();
    let inboxes = factory.inboxes.clone();
    let (mut bench, _dir) = test_workbench(factory);
    let sheet = bench.open_tab("spreadsheet").unwrap();
    let fit = bench.open_tab("fitting").unwrap();

    assert!(bench.bus_mut().unsubscribe(&fit, "dataframe"));
    assert!(bench.publish_from(&sheet));
    assert_eq!(inboxes.count(&fit), 0);

    // Still recorded even with no recipient
    assert_eq!(bench.bus().history(None).len(), 1);
}

#[test]
fn test_inactive_tab_is_skipped_until_reactivated() {
    let factory = TestFactory::new();
    let inboxes = factory.inboxes.clone();
    let (mut bench, _dir) = test_workbench(factory);
    let sheet = bench.open_tab("spreadsheet").unwrap();
    let fit = bench.open_tab("fitting").unwrap();

    bench.bus_mut().set_tab_active(&fit, false);
    bench.publish_from(&sheet);
    assert_eq!(inboxes.count(&fit), 0);

    bench.bus_mut().set_tab_active(&fit, true);
    bench.publish_from(&sheet);
    assert_eq!(inboxes.count(&fit), 1);
}

#[test]
fn test_history_is_bounded_to_most_recent() {
    let mut config = Config::default();
    config.bus.max_message_history = 3;
    let (mut bench, _dir) = test_workbench_with(config, TestFactory::new());
    let sheet = bench.open_tab("spreadsheet").unwrap();

    for i in 0..5 {
        assert!(
            bench
                .bus_mut()
                .publish(&sheet, "note", Payload::Integer(i), None)
        );
    }

    let history = bench.bus().history(None);
    assert_eq!(history.len(), 3);
    let values: Vec<_> = history
        .iter()
        .map(|m| match m.payload() {
            Payload::Integer(n) => *n,
            other => panic!("unexpected payload {other:?}"),
        })
        .collect();
    assert_eq!(values, vec![2, 3, 4]);
    assert_eq!(bench.bus().history(Some(1)).len(), 1);
    assert_eq!(bench.bus().statistics().message_history_size, 3);
}

#[test]
fn test_closing_a_tab_removes_it_from_the_bus() {
    let factory = TestFactory::new();
    let inboxes = factory.inboxes.clone();
    let (mut bench, _dir) = test_workbench(factory);
    let sheet = bench.open_tab("spreadsheet").unwrap();
    let fit = bench.open_tab("fitting").unwrap();
    assert_eq!(bench.bus().statistics().total_registered_tabs, 2);
    let own_filter = format!("{fit}_range");
    bench.bus_mut().add_filter(&own_filter, |_| true);
    bench.bus_mut().add_filter("shared", |_| true);

    bench.close_tab(&fit).unwrap();

    assert!(!bench.bus().is_registered(&fit));
    assert!(bench.bus().subscriptions(&fit).is_empty());
    assert!(!bench.bus().has_filter(&own_filter));
    assert!(bench.bus().has_filter("shared"));
    assert_eq!(bench.bus().statistics().active_filters, 1);
    assert_eq!(bench.bus().statistics().total_registered_tabs, 1);
    assert!(bench.bus().statistics().is_active);

    // The closed id can no longer publish
    assert!(
        !bench
            .bus_mut()
            .publish(&fit, "note", Payload::Integer(1), None)
    );
    assert_eq!(bench.bus().statistics().total_messages_processed, 0);

    bench.publish_from(&sheet);
    assert_eq!(inboxes.count(&fit), 0);
}

#[test]
fn test_filter_veto_blocks_recording_and_delivery() {
    let factory = TestFactory::new();
    let inboxes = factory.inboxes.clone();
    let (mut bench, _dir) = test_workbench(factory);
    let sheet = bench.open_tab("spreadsheet").unwrap();
    let fit = bench.open_tab("fitting").unwrap();

    bench
        .bus_mut()
        .add_filter("no_tables", |m| m.data_type() != "dataframe");
    assert!(!bench.publish_from(&sheet));
    assert_eq!(inboxes.count(&fit), 0);
    assert!(bench.bus().history(None).is_empty());
    assert_eq!(bench.bus().statistics().total_messages_processed, 0);
    let source = bench.bus().handle(&sheet).unwrap();
    assert_eq!(source.message_count(), 0);
    assert!(source.last_activity().is_none());

    assert!(bench.bus_mut().remove_filter("no_tables"));
    assert!(bench.publish_from(&sheet));
    assert_eq!(inboxes.count(&fit), 1);
    assert_eq!(bench.bus().statistics().total_messages_processed, 1);
    assert_eq!(bench.bus().handle(&sheet).unwrap().message_count(), 1);
}

#[test]
fn test_invalid_payload_is_rejected_with_source_scoped_error() {
    let factory = TestFactory::new();
    let inboxes = factory.inboxes.clone();
    let (mut bench, _dir) = test_workbench(factory);
    let sheet = bench.open_tab("spreadsheet").unwrap();
    let fit = bench.open_tab("fitting").unwrap();

    let errors = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&errors);
    bench.bus_mut().events().subscribe(move |event| {
        if let BusEvent::TransmissionError { tab_id, .. } = event {
            e.borrow_mut().push(tab_id.clone());
        }
    });

    let accepted =
        bench
            .bus_mut()
            .publish(&sheet, "dataframe", Payload::Text("not a table".into()), None);
    assert!(!accepted);
    assert_eq!(*errors.borrow(), vec![sheet.clone()]);
    assert_eq!(inboxes.count(&fit), 0);

    bench.bus_mut().set_validation_enabled(false);
    assert!(
        bench
            .bus_mut()
            .publish(&sheet, "dataframe", Payload::Text("not a table".into()), None)
    );
    assert_eq!(inboxes.count(&fit), 1);
}

#[test]
fn test_unregistered_source_cannot_publish() {
    let (mut bench, _dir) = test_workbench(TestFactory::new());
    bench.open_tab("fitting").unwrap();
    assert!(!bench.bus_mut().publish("ghost", "dataframe", sample_table(), None));
    assert!(bench.bus().history(None).is_empty());
}

#[test]
fn test_statistics_track_publishes_and_subscriptions() {
    let (mut bench, _dir) = test_workbench(TestFactory::new());
    let sheet = bench.open_tab("spreadsheet").unwrap();
    bench.open_tab("fitting").unwrap();
    bench.open_tab("plotting").unwrap();
    bench.open_tab("notes").unwrap();

    bench.publish_from(&sheet);
    bench.publish_from(&sheet);

    let stats = bench.bus().statistics();
    assert!(stats.is_active);
    // Tabs without data exchange still join the bus, with no subscriptions
    assert_eq!(stats.total_registered_tabs, 4);
    assert_eq!(stats.active_tabs, 4);
    assert_eq!(stats.total_messages_processed, 2);
    assert_eq!(stats.total_subscriptions, 2);
    assert_eq!(stats.active_filters, 0);
}
