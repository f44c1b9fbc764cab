use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use statusdb_events::{Trigger, TriggerDefinition};

use crate::error::HostError;

/// A trigger together with the definition it was registered under.
#[derive(Clone)]
pub struct RegisteredTrigger {
    pub definition: TriggerDefinition,
    pub trigger: Arc<dyn Trigger>,
}

impl core::fmt::Debug for RegisteredTrigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisteredTrigger")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Triggers registered on a collection, by id.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    triggers: RwLock<HashMap<String, RegisteredTrigger>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `trigger` under its own default definition.
    pub fn register_default(&self, trigger: Arc<dyn Trigger>) -> Result<(), HostError> {
        let definition = trigger.definition().clone();
        self.register(definition, trigger)
    }

    /// Register `trigger` under `definition`. Ids are unique.
    pub fn register(
        &self,
        definition: TriggerDefinition,
        trigger: Arc<dyn Trigger>,
    ) -> Result<(), HostError> {
        let mut triggers = self.write()?;
        if triggers.contains_key(&definition.id) {
            return Err(HostError::DuplicateTrigger(definition.id));
        }
        triggers.insert(
            definition.id.clone(),
            RegisteredTrigger {
                definition,
                trigger,
            },
        );
        Ok(())
    }

    /// Replace an already registered trigger.
    pub fn replace(
        &self,
        definition: TriggerDefinition,
        trigger: Arc<dyn Trigger>,
    ) -> Result<(), HostError> {
        let mut triggers = self.write()?;
        let Some(slot) = triggers.get_mut(&definition.id) else {
            return Err(HostError::UnknownTrigger(definition.id));
        };
        *slot = RegisteredTrigger {
            definition,
            trigger,
        };
        Ok(())
    }

    /// Register, or replace when the id is taken.
    pub fn upsert(
        &self,
        definition: TriggerDefinition,
        trigger: Arc<dyn Trigger>,
    ) -> Result<(), HostError> {
        let mut triggers = self.write()?;
        triggers.insert(
            definition.id.clone(),
            RegisteredTrigger {
                definition,
                trigger,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<RegisteredTrigger, HostError> {
        let triggers = self
            .triggers
            .read()
            .map_err(|_| HostError::Unavailable("trigger registry lock poisoned".to_string()))?;
        triggers
            .get(id)
            .cloned()
            .ok_or_else(|| HostError::UnknownTrigger(id.to_string()))
    }

    /// Definitions of all registered triggers, ordered by id.
    pub fn list(&self) -> Vec<TriggerDefinition> {
        let Ok(triggers) = self.triggers.read() else {
            return vec![];
        };
        let mut defs: Vec<TriggerDefinition> =
            triggers.values().map(|r| r.definition.clone()).collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, RegisteredTrigger>>, HostError> {
        self.triggers
            .write()
            .map_err(|_| HostError::Unavailable("trigger registry lock poisoned".to_string()))
    }
}
