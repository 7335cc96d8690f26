//! Test doubles shared by the service tests

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use domain::{DecisionEvent, DecisionKind};
use parking_lot::Mutex;

use crate::error::ApplicationError;
use crate::ports::{CounterStorePort, DecisionSinkPort};
use crate::services::RandomSource;

/// Sink that keeps every emitted event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DecisionEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().clone()
    }

    pub fn reasons(&self) -> Vec<(DecisionKind, String)> {
        self.events
            .lock()
            .iter()
            .map(|e| (e.decision, e.reason.clone()))
            .collect()
    }

    pub fn last(&self) -> Option<DecisionEvent> {
        self.events.lock().last().cloned()
    }
}

impl DecisionSinkPort for RecordingSink {
    fn emit(&self, event: DecisionEvent) {
        self.events.lock().push(event);
    }
}

/// Random source replaying a fixed sequence of rolls, then `99`
#[derive(Debug, Default)]
pub struct SequenceRandom {
    rolls: Mutex<VecDeque<u8>>,
}

impl SequenceRandom {
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            rolls: Mutex::new(rolls.into_iter().collect()),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn roll_percent(&self) -> u8 {
        self.rolls.lock().pop_front().unwrap_or(99)
    }
}

/// Counter store whose keys never expire
#[derive(Debug, Default)]
pub struct StickyStore {
    values: Mutex<HashMap<String, i64>>,
}

#[async_trait]
impl CounterStorePort for StickyStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, ApplicationError> {
        Ok(self.values.lock().get(key).copied())
    }

    async fn set(&self, key: &str, value: i64, _ttl: Duration) -> Result<(), ApplicationError> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn decrement(&self, key: &str) -> Result<i64, ApplicationError> {
        let mut values = self.values.lock();
        let value = values.entry(key.to_string()).or_insert(0);
        *value -= 1;
        Ok(*value)
    }
}
