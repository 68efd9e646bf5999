#![allow(dead_code)]

use rowport::error::BridgeError;
use rowport::traits::DataHandler;
use rowport_common::{ElemType, TupleField, TupleSchema};

/// One call observed on the structured-data builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartElement(String),
    EndElement,
    StartTuple,
    EndTuple,
    StartSet,
    EndSet,
    StartArray,
    EndArray,
    Int(i64),
    Num(f64),
    Str(String),
}

/// Builder double that records every call, so tests can assert the exact
/// bracketing and item sequence a read produced.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar items seen, ignoring brackets.
    pub fn items(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Int(_) | Event::Num(_) | Event::Str(_)))
            .cloned()
            .collect()
    }
}

impl DataHandler for Recorder {
    fn start_element(&mut self, name: &str) -> Result<(), BridgeError> {
        self.events.push(Event::StartElement(name.to_string()));
        Ok(())
    }
    fn end_element(&mut self) -> Result<(), BridgeError> {
        self.events.push(Event::EndElement);
        Ok(())
    }
    fn start_tuple(&mut self) -> Result<(), BridgeError> {
        self.events.push(Event::StartTuple);
        Ok(())
    }
    fn end_tuple(&mut self) -> Result<(), BridgeError> {
        self.events.push(Event::EndTuple);
        Ok(())
    }
    fn start_set(&mut self) -> Result<(), BridgeError> {
        self.events.push(Event::StartSet);
        Ok(())
    }
    fn end_set(&mut self) -> Result<(), BridgeError> {
        self.events.push(Event::EndSet);
        Ok(())
    }
    fn start_array(&mut self) -> Result<(), BridgeError> {
        self.events.push(Event::StartArray);
        Ok(())
    }
    fn end_array(&mut self) -> Result<(), BridgeError> {
        self.events.push(Event::EndArray);
        Ok(())
    }
    fn add_int(&mut self, value: i64) -> Result<(), BridgeError> {
        self.events.push(Event::Int(value));
        Ok(())
    }
    fn add_num(&mut self, value: f64) -> Result<(), BridgeError> {
        self.events.push(Event::Num(value));
        Ok(())
    }
    fn add_str(&mut self, value: &str) -> Result<(), BridgeError> {
        self.events.push(Event::Str(value.to_string()));
        Ok(())
    }
}

/// `t { a: int, b: { c: int, d: string } }`, the shape used across tests.
pub fn nested_schema() -> TupleSchema {
    TupleSchema::new(vec![
        TupleField::new("a", ElemType::Int),
        TupleField::new(
            "b",
            ElemType::Tuple(TupleSchema::new(vec![
                TupleField::new("c", ElemType::Int),
                TupleField::new("d", ElemType::Str),
            ])),
        ),
    ])
}
