//! In-memory observation store.

use chrono::{DateTime, Utc};

use super::model::{Observation, truncate_to_micros};
use super::{ObservationStore, StoreError};

/// Observations kept in a `Vec` in id order. Lost on restart.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    observations: Vec<Observation>,
    next_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            observations: Vec::new(),
            next_id: 1,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObservationStore for MemoryStore {
    fn append(
        &mut self,
        category: &str,
        datetime: DateTime<Utc>,
        data: serde_json::Value,
    ) -> Result<Observation, StoreError> {
        let observation = Observation {
            id: self.next_id,
            category: category.to_string(),
            datetime: truncate_to_micros(datetime),
            data,
        };
        self.next_id += 1;
        self.observations.push(observation.clone());
        Ok(observation)
    }

    fn get(&self, id: u64) -> Result<Option<Observation>, StoreError> {
        Ok(self
            .observations
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|idx| self.observations[idx].clone()))
    }

    fn list(&self, category: &str) -> Result<Vec<Observation>, StoreError> {
        Ok(self
            .observations
            .iter()
            .rev()
            .filter(|o| o.category == category)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.observations.len())
    }

    fn delete(&mut self, id: u64) -> Result<bool, StoreError> {
        match self.observations.binary_search_by_key(&id, |o| o.id) {
            Ok(idx) => {
                self.observations.remove(idx);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    fn delete_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.observations.len();
        self.observations.retain(|o| o.datetime >= cutoff);
        Ok(before - self.observations.len())
    }
}
