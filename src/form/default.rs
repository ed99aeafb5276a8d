//! Default providers: where a blank answer gets its value from.
use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

#[derive(Debug, Clone)]
pub enum DefaultProvider {
    /// Always the same value.
    Fixed(Value),
    /// The most recently accepted answer of a `remember_last` field.
    LastAnswer(Option<Value>),
    Sequence(Sequence),
    /// Read from a cell the caller writes, typically from an entry hook.
    Shared(SharedValue),
}

impl DefaultProvider {
    pub fn current(&self) -> Option<Value> {
        match self {
            DefaultProvider::Fixed(v) => Some(v.clone()),
            DefaultProvider::LastAnswer(v) => v.clone(),
            DefaultProvider::Sequence(seq) => seq.current(),
            DefaultProvider::Shared(cell) => cell.get(),
        }
    }

    /// Called once each time a blank answer accepted the current default.
    pub(crate) fn consume(&mut self) {
        if let DefaultProvider::Sequence(seq) = self {
            seq.advance();
        }
    }
}

/// A rotating list of defaults.
///
/// Each accepted use moves to the next member. Past the last member the
/// sequence wraps to the start; with `wrap == false` it yields nothing
/// once exhausted. An empty sequence never yields a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    members: Vec<Value>,
    cursor: usize,
    wrap: bool,
}

impl Sequence {
    pub fn new<I, V>(members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self { members: members.into_iter().map(Into::into).collect(), cursor: 0, wrap: true }
    }

    pub fn without_wrap(mut self) -> Self {
        self.wrap = false;
        self
    }

    pub fn current(&self) -> Option<Value> {
        self.members.get(self.cursor).cloned()
    }

    fn advance(&mut self) {
        if self.cursor >= self.members.len() {
            return;
        }
        self.cursor += 1;
        if self.cursor >= self.members.len() && self.wrap {
            self.cursor = 0;
        }
    }
}

/// Clonable handle onto a single optional value.
#[derive(Debug, Clone, Default)]
pub struct SharedValue(Rc<RefCell<Option<Value>>>);

impl SharedValue {
    pub fn new(initial: Option<Value>) -> Self {
        Self(Rc::new(RefCell::new(initial)))
    }

    pub fn set(&self, value: Option<Value>) {
        *self.0.borrow_mut() = value;
    }

    pub fn get(&self) -> Option<Value> {
        self.0.borrow().clone()
    }
}

impl From<Value> for DefaultProvider {
    fn from(value: Value) -> Self {
        DefaultProvider::Fixed(value)
    }
}

impl From<Sequence> for DefaultProvider {
    fn from(seq: Sequence) -> Self {
        DefaultProvider::Sequence(seq)
    }
}

impl From<SharedValue> for DefaultProvider {
    fn from(cell: SharedValue) -> Self {
        DefaultProvider::Shared(cell)
    }
}
