//! Connection lifecycle: lazy opens, exactly-once setup, finalize draining,
//! and unconditional cleanup under failure.

mod common;

use std::collections::BTreeMap;

use common::Recorder;
use rowport::backends::mem::{CellValue, MemFactory, MemStore};
use rowport::error::{BridgeError, ErrorKind};
use rowport::traits::OpenMode;
use rowport::DataBridge;
use rowport_common::{ElemType, Element, SetValue};

fn bridge_over(store: &MemStore) -> DataBridge<MemFactory> {
    DataBridge::new(MemFactory::new(store.clone()))
}

#[test]
fn declaring_a_connection_performs_no_backend_io() {
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    bridge
        .declare_connection("c1", "mem:", "create S1")
        .unwrap();
    assert!(store.open_log().is_empty());
    assert!(store.setup_log().is_empty());
}

#[test]
fn redeclaring_a_name_is_an_error() {
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    bridge.declare_connection("c1", "mem:", "").unwrap();
    let err = bridge.declare_connection("c1", "mem:", "").unwrap_err();
    assert_eq!(err.to_string(), "duplicate connection name c1");
    assert_eq!(err.kind(), ErrorKind::Declarative);
}

#[test]
fn first_read_opens_the_connection_once() {
    let store = MemStore::new();
    store.insert_table("T", vec![], vec![vec![CellValue::Int(1)]]);
    store.insert_table("U", vec![], vec![vec![CellValue::Int(2)]]);
    let mut bridge = bridge_over(&store);
    bridge.declare_connection("c1", "mem:", "").unwrap();

    let mut handler = Recorder::new();
    bridge
        .read_element("c1", "x", &ElemType::Int, "T", &mut handler)
        .unwrap();
    bridge
        .read_element("c1", "y", &ElemType::Int, "U", &mut handler)
        .unwrap();

    assert_eq!(store.open_log(), vec![("c1".to_string(), OpenMode::Read)]);
    assert_eq!(bridge.open_read_count(), 1);
    // Read opens never run setup statements.
    assert!(store.setup_log().is_empty());
}

#[test]
fn reading_through_an_undeclared_connection_fails() {
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    let mut handler = Recorder::new();
    let err = bridge
        .read_element("nope", "x", &ElemType::Int, "T", &mut handler)
        .unwrap_err();
    assert_eq!(err.to_string(), "no connection nope");
}

#[test]
fn publish_requires_a_declared_connection() {
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    let err = bridge.declare_publish("nope", "result", "S1").unwrap_err();
    assert!(matches!(err, BridgeError::UnknownConnection { .. }));
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn publishing_a_set_writes_rows_then_commits_then_closes() {
    // Declare c1, queue {1,2,3} to S1, finalize: three rows in iteration
    // order, one commit, connection closed.
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    bridge.declare_connection("c1", "mem:", "").unwrap();
    bridge.declare_publish("c1", "result", "S1").unwrap();
    assert!(store.open_log().is_empty());

    let mut elements = BTreeMap::new();
    elements.insert(
        "result".to_string(),
        Element::Set(SetValue::Int(vec![1, 2, 3])),
    );
    bridge.finalize_publishes(&elements).unwrap();

    assert_eq!(
        store.rows("S1").unwrap(),
        vec![
            vec![CellValue::Int(1)],
            vec![CellValue::Int(2)],
            vec![CellValue::Int(3)],
        ]
    );
    assert_eq!(store.commit_count("S1"), 1);
    assert_eq!(store.open_log(), vec![("c1".to_string(), OpenMode::Write)]);
    assert_eq!(store.close_log(), vec!["c1".to_string()]);
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn setup_statements_run_once_per_connection_even_for_many_publishes() {
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    bridge
        .declare_connection("c1", "mem:", "truncate S1; truncate S2")
        .unwrap();
    bridge.declare_publish("c1", "a", "S1").unwrap();
    bridge.declare_publish("c1", "b", "S2").unwrap();

    let mut elements = BTreeMap::new();
    elements.insert("a".to_string(), Element::Int(1));
    elements.insert("b".to_string(), Element::Int(2));
    bridge.finalize_publishes(&elements).unwrap();

    assert_eq!(
        store.setup_log(),
        vec!["truncate S1".to_string(), "truncate S2".to_string()]
    );
    assert_eq!(store.open_log(), vec![("c1".to_string(), OpenMode::Write)]);
}

#[test]
fn a_failing_publish_still_clears_the_queue_and_closes_the_pool() {
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    bridge.declare_connection("c1", "mem:", "").unwrap();
    bridge.declare_publish("c1", "first", "S1").unwrap();
    bridge.declare_publish("c1", "ghost", "S2").unwrap();
    bridge.declare_publish("c1", "last", "S3").unwrap();

    let mut elements = BTreeMap::new();
    elements.insert("first".to_string(), Element::Int(1));
    elements.insert("last".to_string(), Element::Int(3));
    let err = bridge.finalize_publishes(&elements).unwrap_err();
    assert_eq!(err.to_string(), "no element ghost");

    // The first publish landed, the failing one aborted the drain, and the
    // one after it was never attempted.
    assert_eq!(store.rows("S1").unwrap(), vec![vec![CellValue::Int(1)]]);
    assert!(store.table("S3").is_none());
    // Queue cleared, write pool closed despite the failure.
    assert_eq!(bridge.pending_count(), 0);
    assert_eq!(store.close_log(), vec!["c1".to_string()]);

    // A later cycle starts from a clean slate.
    bridge.declare_publish("c1", "last", "S3").unwrap();
    bridge.finalize_publishes(&elements).unwrap();
    assert_eq!(store.rows("S3").unwrap(), vec![vec![CellValue::Int(3)]]);
}

#[test]
fn close_reads_sweeps_the_whole_pool_despite_errors() {
    let store = MemStore::new();
    store.insert_table("T", vec![], vec![vec![CellValue::Int(1)]]);
    let mut bridge = bridge_over(&store);
    bridge.declare_connection("c1", "mem:", "").unwrap();
    bridge.declare_connection("c2", "mem:", "").unwrap();

    let mut handler = Recorder::new();
    bridge
        .read_element("c1", "x", &ElemType::Int, "T", &mut handler)
        .unwrap();
    bridge
        .read_element("c2", "y", &ElemType::Int, "T", &mut handler)
        .unwrap();
    assert_eq!(bridge.open_read_count(), 2);

    store.fail_close_of("c1");
    store.fail_close_of("c2");
    let err = bridge.close_read_connections().unwrap_err();
    // First error propagates, the sweep still visits every connection.
    assert_eq!(err.to_string(), "backend error: close failed for c1");
    assert_eq!(
        store.close_log(),
        vec!["c1".to_string(), "c2".to_string()]
    );
    assert_eq!(bridge.open_read_count(), 0);
}

#[test]
fn read_failures_do_not_leak_the_row_iterator() {
    // Asking for a missing table is an I/O error before any row arrives.
    let store = MemStore::new();
    let mut bridge = bridge_over(&store);
    bridge.declare_connection("c1", "mem:", "").unwrap();
    let mut handler = Recorder::new();
    let err = bridge
        .read_element("c1", "x", &ElemType::Int, "missing", &mut handler)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    // The connection itself stays pooled for the next read.
    assert_eq!(bridge.open_read_count(), 1);
}
