//! Shared State Store: dotted-path values with synchronous publish/subscribe
//!
//! The store is the only channel between the transition engine, the drawing
//! layer, and the tutorial sequencer. All mutation goes through `set`,
//! which notifies subscribers of the written path before returning.
//!
//! Single-threaded by design: handlers are plain `Fn` closures invoked on
//! the caller's stack. `set` releases every internal borrow before
//! notifying, so handlers are free to `get`, `set`, or `on` re-entrantly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::types::StoreEvent;

type Handler = Rc<dyn Fn(&StoreEvent)>;

/// Publish/subscribe state tree keyed by dotted paths
#[derive(Default)]
pub struct SharedStore {
    state: RefCell<Value>,
    subscribers: RefCell<HashMap<String, Vec<Handler>>>,
}

impl SharedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: RefCell::new(Value::Object(Map::new())),
            subscribers: RefCell::new(HashMap::new()),
        }
    }

    /// Clone of the full state tree
    pub fn get(&self) -> Value {
        self.state.borrow().clone()
    }

    /// Value at a dotted path, if present
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let root = self.state.borrow();
        let mut node = &*root;
        for segment in path.split('.') {
            node = node.as_object()?.get(segment)?;
        }
        Some(node.clone())
    }

    /// Write a value at a dotted path and synchronously notify subscribers
    /// of that exact path. Intermediate non-object nodes are replaced.
    pub fn set(&self, path: &str, value: Value) {
        let old_value = self.get_path(path);
        {
            let mut root = self.state.borrow_mut();
            let mut node = &mut *root;
            let mut segments = path.split('.').peekable();
            while let Some(segment) = segments.next() {
                if !node.is_object() {
                    *node = Value::Object(Map::new());
                }
                let map = node.as_object_mut().unwrap();
                if segments.peek().is_none() {
                    map.insert(segment.to_string(), value.clone());
                    break;
                }
                node = map
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
        }

        // Clone the handler list so handlers may subscribe or set while
        // we iterate
        let handlers: Vec<Handler> = self
            .subscribers
            .borrow()
            .get(path)
            .cloned()
            .unwrap_or_default();

        let event = StoreEvent {
            path: path.to_string(),
            old_value,
            new_value: value,
        };
        for handler in handlers {
            handler(&event);
        }
    }

    /// Subscribe to writes of an exact dotted path
    pub fn on(&self, path: &str, handler: impl Fn(&StoreEvent) + 'static) {
        self.subscribers
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push(Rc::new(handler));
    }

    /// Typed read: f64
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get_path(path)?.as_f64()
    }

    /// Typed read: u64
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get_path(path)?.as_u64()
    }

    /// Typed read: bool
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get_path(path)?.as_bool()
    }

    /// Typed read: owned string
    pub fn get_str(&self, path: &str) -> Option<String> {
        Some(self.get_path(path)?.as_str()?.to_string())
    }
}
