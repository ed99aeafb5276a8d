//! Folds `(path, value)` steps into one nested JSON record.
//!
//! Intermediate containers are created on demand: an array when the next
//! segment is an index, an object otherwise. Arrays only grow up to the index
//! being written, padding with placeholders. End-of-list markers are ignored.
use serde_json::{Map, Value};

use crate::path::{Path, Segment};

#[derive(Debug, Clone)]
pub struct RecordBuilder {
    root: Value,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self { root: Value::Object(Map::new()) }
    }
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, path: &Path, value: Value) {
        let segments = path.segments();
        let Some((last, parents)) = segments.split_last() else {
            self.root = value;
            return;
        };
        if *last == Segment::End {
            return;
        }

        let mut cur = &mut self.root;
        for (i, segment) in parents.iter().enumerate() {
            let next_is_index = segments[i + 1].is_index();
            cur = descend(cur, segment, next_is_index);
        }
        place(cur, last, value);
    }

    pub fn build(self) -> Value {
        self.root
    }
}

fn container(list: bool) -> Value {
    if list { Value::Array(Vec::new()) } else { Value::Object(Map::new()) }
}

fn as_map(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("replaced with an object above"),
    }
}

fn as_list(value: &mut Value) -> &mut Vec<Value> {
    if !value.is_array() {
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("replaced with an array above"),
    }
}

fn descend<'a>(cur: &'a mut Value, segment: &Segment, next_is_index: bool) -> &'a mut Value {
    let slot = match segment {
        Segment::Name(name) => as_map(cur).entry(name.clone()).or_insert_with(|| container(next_is_index)),
        Segment::Index(n) => {
            let items = as_list(cur);
            while items.len() <= *n {
                items.push(container(next_is_index));
            }
            &mut items[*n]
        }
        // markers only ever end a path
        Segment::End => cur,
    };
    if slot.is_null() {
        *slot = container(next_is_index);
    }
    slot
}

fn place(cur: &mut Value, segment: &Segment, value: Value) {
    match segment {
        Segment::Name(name) => {
            as_map(cur).insert(name.clone(), value);
        }
        Segment::Index(n) => {
            let items = as_list(cur);
            while items.len() < *n {
                items.push(Value::Null);
            }
            if items.len() == *n {
                items.push(value);
            } else {
                items[*n] = value;
            }
        }
        Segment::End => {}
    }
}
