//! Shared fixtures for the integration tests

#![allow(dead_code)]

use limiting_pool::{FactoryError, ObjectFactory};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Instance handed out by [`RecordingFactory`]
#[derive(Debug, PartialEq, Eq)]
pub struct TestObject {
    pub serial: usize,
}

/// Factory that numbers its instances and records every lifecycle call
pub struct RecordingFactory {
    created: AtomicUsize,
    failing: bool,
    broken_disposal: bool,
    events: Mutex<Vec<String>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            created: AtomicUsize::new(0),
            failing: false,
            broken_disposal: false,
            events: Mutex::new(Vec::new()),
        }
    }

    /// A factory whose every construction attempt fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// A factory that records each decommission and then reports it failed
    pub fn broken_disposal() -> Self {
        Self {
            broken_disposal: true,
            ..Self::new()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

impl ObjectFactory for RecordingFactory {
    type Object = TestObject;

    fn new_instance(&self) -> Result<TestObject, FactoryError> {
        if self.failing {
            return Err(FactoryError::new("constructor refused"));
        }
        let serial = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        self.events.lock().push(format!("new_instance id:{serial}"));
        Ok(TestObject { serial })
    }

    fn decommission(&self, object: TestObject) -> Result<(), FactoryError> {
        self.events.lock().push(format!("decommission id:{}", object.serial));
        if self.broken_disposal {
            return Err(FactoryError::new("close failed"));
        }
        Ok(())
    }
}
