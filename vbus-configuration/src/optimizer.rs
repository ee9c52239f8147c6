//! Configuration optimizer contract and the shared implementations
//!
//! Loading a configuration is an iterative exchange driven by the caller:
//!
//! 1. `complete_configuration()` expands the definition table
//! 2. `optimize_load_configuration()` marks the values to fetch next
//! 3. the caller fetches the pending values and marks them transceived
//! 4. repeat from 2 until nothing is pending
//!
//! Values whose relevance depends on another value are deferred until that
//! value is known, so irrelevant values are never requested.

use crate::value::{ConfigurationValueDefinition, ConfigurationValueState};
use async_trait::async_trait;
use std::collections::HashMap;
use vbus_core::{VbusError, VbusResult};

/// Per-device logic deciding which configuration values to transfer
#[async_trait]
pub trait ConfigurationOptimizer: Send + Sync {
    /// Bus address of the controller model this optimizer serves
    fn device_address(&self) -> u16;

    /// Definition table of the controller model
    fn configuration_data(&self) -> &[ConfigurationValueDefinition];

    /// Expand the definition table into a full set of value states
    ///
    /// Returns one pending entry per definition, in definition order. Values
    /// present in `partial` override the definition's default; entries of
    /// `partial` with unknown ids are ignored.
    async fn complete_configuration(
        &self,
        partial: Option<&[ConfigurationValueState]>,
    ) -> Vec<ConfigurationValueState> {
        complete_configuration(self.configuration_data(), partial)
    }

    /// Recompute which values must be read from the device next
    async fn optimize_load_configuration(
        &self,
        states: Vec<ConfigurationValueState>,
    ) -> VbusResult<Vec<ConfigurationValueState>>;

    /// Recompute which values of `new` must be written to the device
    async fn optimize_save_configuration(
        &self,
        new: Vec<ConfigurationValueState>,
        old: &[ConfigurationValueState],
    ) -> VbusResult<Vec<ConfigurationValueState>>;
}

pub fn complete_configuration(
    definitions: &[ConfigurationValueDefinition],
    partial: Option<&[ConfigurationValueState]>,
) -> Vec<ConfigurationValueState> {
    let overrides: HashMap<&str, Option<i32>> = partial
        .unwrap_or_default()
        .iter()
        .map(|state| (state.value_id.as_str(), state.value))
        .collect();

    definitions
        .iter()
        .map(|definition| {
            let value = overrides
                .get(definition.value_id.as_str())
                .copied()
                .unwrap_or(definition.default_value);
            ConfigurationValueState::new(definition, value)
        })
        .collect()
}

/// Optimizer for controllers without dependency rules
///
/// Both optimize operations hand back their input unchanged.
#[derive(Debug, Clone)]
pub struct NoopConfigurationOptimizer {
    device_address: u16,
    definitions: &'static [ConfigurationValueDefinition],
}

impl NoopConfigurationOptimizer {
    pub fn new(device_address: u16, definitions: &'static [ConfigurationValueDefinition]) -> Self {
        Self {
            device_address,
            definitions,
        }
    }
}

#[async_trait]
impl ConfigurationOptimizer for NoopConfigurationOptimizer {
    fn device_address(&self) -> u16 {
        self.device_address
    }

    fn configuration_data(&self) -> &[ConfigurationValueDefinition] {
        self.definitions
    }

    async fn optimize_load_configuration(
        &self,
        states: Vec<ConfigurationValueState>,
    ) -> VbusResult<Vec<ConfigurationValueState>> {
        Ok(states)
    }

    async fn optimize_save_configuration(
        &self,
        new: Vec<ConfigurationValueState>,
        _old: &[ConfigurationValueState],
    ) -> VbusResult<Vec<ConfigurationValueState>> {
        Ok(new)
    }
}

/// Optimizer driven by the dependencies in a device's definition table
///
/// A value with a dependency is only relevant once its prerequisite is
/// known and the dependency's predicate accepts the prerequisite's value.
#[derive(Debug, Clone)]
pub struct DependencyConfigurationOptimizer {
    device_address: u16,
    definitions: &'static [ConfigurationValueDefinition],
}

impl DependencyConfigurationOptimizer {
    pub fn new(device_address: u16, definitions: &'static [ConfigurationValueDefinition]) -> Self {
        Self {
            device_address,
            definitions,
        }
    }

    fn definitions_by_id(&self) -> HashMap<&str, &ConfigurationValueDefinition> {
        self.definitions
            .iter()
            .map(|definition| (definition.value_id.as_str(), definition))
            .collect()
    }

    /// Look up the definition of every state, rejecting unknown ids
    fn resolve<'a>(
        &self,
        definitions: &HashMap<&str, &'a ConfigurationValueDefinition>,
        states: &[ConfigurationValueState],
    ) -> VbusResult<Vec<&'a ConfigurationValueDefinition>> {
        states
            .iter()
            .map(|state| {
                definitions
                    .get(state.value_id.as_str())
                    .copied()
                    .ok_or_else(|| {
                        VbusError::InvalidData(format!(
                            "Unknown configuration value {} for device 0x{:04X}",
                            state.value_id, self.device_address
                        ))
                    })
            })
            .collect()
    }
}

#[async_trait]
impl ConfigurationOptimizer for DependencyConfigurationOptimizer {
    fn device_address(&self) -> u16 {
        self.device_address
    }

    fn configuration_data(&self) -> &[ConfigurationValueDefinition] {
        self.definitions
    }

    async fn optimize_load_configuration(
        &self,
        mut states: Vec<ConfigurationValueState>,
    ) -> VbusResult<Vec<ConfigurationValueState>> {
        let definitions = self.definitions_by_id();
        let resolved = self.resolve(&definitions, &states)?;

        // Prerequisites as (transceived, value) before this round changes anything
        let known: HashMap<String, (bool, Option<i32>)> = states
            .iter()
            .map(|state| (state.value_id.clone(), (state.transceived, state.value)))
            .collect();

        for (state, definition) in states.iter_mut().zip(resolved) {
            state.pending = if state.transceived {
                false
            } else {
                match &definition.dependency {
                    None => true,
                    Some(dependency) => match known.get(&dependency.value_id) {
                        Some(&(true, value)) => (dependency.predicate)(value),
                        _ => false,
                    },
                }
            };
        }

        log::debug!(
            "Device 0x{:04X}: {} of {} values pending for load",
            self.device_address,
            states.iter().filter(|state| state.pending).count(),
            states.len()
        );
        Ok(states)
    }

    async fn optimize_save_configuration(
        &self,
        mut new: Vec<ConfigurationValueState>,
        old: &[ConfigurationValueState],
    ) -> VbusResult<Vec<ConfigurationValueState>> {
        let definitions = self.definitions_by_id();
        let resolved = self.resolve(&definitions, &new)?;

        let old_values: HashMap<&str, Option<i32>> = old
            .iter()
            .map(|state| (state.value_id.as_str(), state.value))
            .collect();
        let new_values: HashMap<String, Option<i32>> = new
            .iter()
            .map(|state| (state.value_id.clone(), state.value))
            .collect();

        for (state, definition) in new.iter_mut().zip(resolved) {
            let changed = old_values
                .get(state.value_id.as_str())
                .is_none_or(|&old_value| old_value != state.value);
            let relevant = match &definition.dependency {
                None => true,
                Some(dependency) => match new_values.get(&dependency.value_id) {
                    Some(&value) => (dependency.predicate)(value),
                    None => true,
                },
            };
            state.pending = changed && relevant;
        }

        log::debug!(
            "Device 0x{:04X}: {} of {} values pending for save",
            self.device_address,
            new.iter().filter(|state| state.pending).count(),
            new.len()
        );
        Ok(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    fn is_enabled(value: Option<i32>) -> bool {
        value.is_none_or(|value| value != 0)
    }

    static DEFINITIONS: Lazy<Vec<ConfigurationValueDefinition>> = Lazy::new(|| {
        vec![
            ConfigurationValueDefinition::new("Pump_Enabled", 1).with_default(0),
            ConfigurationValueDefinition::new("Pump_Speed", 2)
                .with_default(50)
                .depends_on("Pump_Enabled", is_enabled),
            ConfigurationValueDefinition::new("Language", 3),
        ]
    });

    fn optimizer() -> DependencyConfigurationOptimizer {
        DependencyConfigurationOptimizer::new(0x1234, &DEFINITIONS)
    }

    fn pending_ids(states: &[ConfigurationValueState]) -> Vec<&str> {
        states
            .iter()
            .filter(|state| state.pending)
            .map(|state| state.value_id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_complete_configuration_applies_overrides() {
        let partial = vec![
            ConfigurationValueState::new(&DEFINITIONS[1], Some(80)),
            ConfigurationValueState {
                value_id: "Unknown".to_string(),
                value: Some(1),
                pending: false,
                transceived: true,
            },
        ];

        let states = optimizer().complete_configuration(Some(&partial)).await;

        let ids: Vec<&str> = states.iter().map(|state| state.value_id.as_str()).collect();
        assert_eq!(ids, ["Pump_Enabled", "Pump_Speed", "Language"]);
        assert_eq!(states[0].value, Some(0));
        assert_eq!(states[1].value, Some(80));
        assert_eq!(states[2].value, None);
        assert!(states.iter().all(|state| state.pending && !state.transceived));
    }

    #[tokio::test]
    async fn test_load_defers_dependent_values() {
        let optimizer = optimizer();
        let states = optimizer.complete_configuration(None).await;

        let mut states = optimizer.optimize_load_configuration(states).await.unwrap();
        assert_eq!(pending_ids(&states), ["Pump_Enabled", "Language"]);

        states[0].mark_transceived(Some(1));
        states[2].mark_transceived(Some(0));
        let states = optimizer.optimize_load_configuration(states).await.unwrap();
        assert_eq!(pending_ids(&states), ["Pump_Speed"]);
    }

    #[tokio::test]
    async fn test_load_skips_irrelevant_values() {
        let optimizer = optimizer();
        let mut states = optimizer.complete_configuration(None).await;
        for state in &mut states {
            if state.value_id != "Pump_Speed" {
                state.mark_transceived(Some(0));
            }
        }

        let states = optimizer.optimize_load_configuration(states).await.unwrap();
        assert!(pending_ids(&states).is_empty());
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_values() {
        let states = vec![ConfigurationValueState {
            value_id: "Unknown".to_string(),
            value: None,
            pending: true,
            transceived: false,
        }];

        let result = optimizer().optimize_load_configuration(states).await;
        assert!(matches!(result, Err(VbusError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_save_marks_changed_relevant_values() {
        let optimizer = optimizer();
        let mut old = optimizer.complete_configuration(None).await;
        for state in &mut old {
            let value = state.value;
            state.mark_transceived(value);
        }

        let mut new = old.clone();
        new[1].value = Some(70);
        new[2].value = Some(1);
        let saved = optimizer.optimize_save_configuration(new.clone(), &old).await.unwrap();
        // Pump_Speed changed but the pump is disabled
        assert_eq!(pending_ids(&saved), ["Language"]);

        new[0].value = Some(1);
        let saved = optimizer.optimize_save_configuration(new, &old).await.unwrap();
        assert_eq!(pending_ids(&saved), ["Pump_Enabled", "Pump_Speed", "Language"]);
    }

    #[tokio::test]
    async fn test_noop_returns_input() {
        let optimizer = NoopConfigurationOptimizer::new(0x1234, &DEFINITIONS);
        let mut states = optimizer.complete_configuration(None).await;
        states[0].mark_transceived(Some(1));

        let loaded = optimizer.optimize_load_configuration(states.clone()).await.unwrap();
        assert_eq!(loaded, states);
        let saved = optimizer.optimize_save_configuration(states.clone(), &[]).await.unwrap();
        assert_eq!(saved, states);
    }
}
