//! Flattened tuple reads through a row source: positional and name-based
//! binding against the in-memory backend.

mod common;

use common::{Event, Recorder, nested_schema};
use rowport::backends::mem::{CellValue, MemInput};
use rowport::error::{BridgeError, ErrorKind};
use rowport::traits::InputRows;

fn unnamed_row() -> Vec<Vec<CellValue>> {
    vec![vec![
        CellValue::Int(5),
        CellValue::Int(7),
        CellValue::Str("x".to_string()),
    ]]
}

#[test]
fn nested_tuple_from_one_unnamed_row() {
    // Scenario: t { a: int, b: { c: int, d: string } } from [5, 7, "x"].
    let mut input = MemInput::new(vec![], unnamed_row());
    let io = input.tuple_io(&nested_schema()).unwrap();
    let mut handler = Recorder::new();
    io.read("t", &mut handler, &mut input).unwrap();

    assert_eq!(
        handler.events,
        vec![
            Event::StartElement("t".to_string()),
            Event::StartTuple,
            Event::Int(5),
            Event::StartTuple,
            Event::Int(7),
            Event::Str("x".to_string()),
            Event::EndTuple,
            Event::EndTuple,
            Event::EndElement,
        ]
    );
}

#[test]
fn named_columns_in_arbitrary_permutation_bind_like_traversal_order() {
    // Same logical row, columns shuffled but all named.
    let permuted = vec![vec![
        CellValue::Str("x".to_string()),
        CellValue::Int(5),
        CellValue::Int(7),
    ]];
    let mut named = MemInput::new(
        vec![
            "b.d".to_string(),
            "a".to_string(),
            "b.c".to_string(),
        ],
        permuted,
    );
    let io = named.tuple_io(&nested_schema()).unwrap();
    let mut from_named = Recorder::new();
    io.read("t", &mut from_named, &mut named).unwrap();

    let mut unnamed = MemInput::new(vec![], unnamed_row());
    let io = unnamed.tuple_io(&nested_schema()).unwrap();
    let mut from_unnamed = Recorder::new();
    io.read("t", &mut from_unnamed, &mut unnamed).unwrap();

    assert_eq!(from_named.events, from_unnamed.events);
}

#[test]
fn single_named_column_is_rejected_at_every_position() {
    for named_at in 0..3 {
        let mut columns = vec![String::new(), String::new(), String::new()];
        columns[named_at] = "a".to_string();
        let mut input = MemInput::new(columns, unnamed_row());
        let err = input.tuple_io(&nested_schema()).unwrap_err();
        assert!(matches!(err, BridgeError::MixedColumnNaming));
        assert_eq!(err.kind(), ErrorKind::Declarative);
        assert_eq!(
            err.to_string(),
            "either all columns must be named or none"
        );
    }
}

#[test]
fn exhausted_source_names_the_missing_element() {
    let mut input = MemInput::new(vec![], vec![]);
    let io = input.tuple_io(&nested_schema()).unwrap();
    let mut handler = Recorder::new();
    let err = io.read("demand", &mut handler, &mut input).unwrap_err();
    assert_eq!(err.to_string(), "no data for element demand");
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn one_assign_consumes_exactly_one_row() {
    let rows = vec![
        vec![
            CellValue::Int(1),
            CellValue::Int(2),
            CellValue::Str("p".to_string()),
        ],
        vec![
            CellValue::Int(3),
            CellValue::Int(4),
            CellValue::Str("q".to_string()),
        ],
    ];
    let mut input = MemInput::new(vec![], rows);
    let io = input.tuple_io(&nested_schema()).unwrap();
    let mut handler = Recorder::new();

    assert!(input.advance().unwrap());
    io.assign(&mut handler, &mut input).unwrap();
    assert!(input.advance().unwrap());
    io.assign(&mut handler, &mut input).unwrap();
    assert!(!input.advance().unwrap());

    assert_eq!(
        handler.items(),
        vec![
            Event::Int(1),
            Event::Int(2),
            Event::Str("p".to_string()),
            Event::Int(3),
            Event::Int(4),
            Event::Str("q".to_string()),
        ]
    );
}
