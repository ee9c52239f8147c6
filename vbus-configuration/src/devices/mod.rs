//! Definition tables and optimizers of the supported controllers
//!
//! Each device module exposes its `DEVICE_ADDRESS`, `NAME`,
//! `configuration_data()` and `create_optimizer()`.

pub mod deltasol_bx_plus;
pub mod deltasol_cs2;
pub mod deltasol_cs_plus;
pub mod deltasol_mx;
pub mod deltasol_slt;
pub mod deltatherm_hc;

use crate::value::{ConfigurationValueDefinition, Predicate};

/// Appends definitions with consecutive parameter indices
pub(crate) struct TableBuilder {
    definitions: Vec<ConfigurationValueDefinition>,
    next_index: i16,
}

impl TableBuilder {
    pub(crate) fn new(first_index: i16) -> Self {
        Self {
            definitions: Vec::new(),
            next_index: first_index,
        }
    }

    fn push(&mut self, definition: ConfigurationValueDefinition) -> &mut Self {
        self.definitions.push(definition);
        self.next_index += 1;
        self
    }

    pub(crate) fn value(&mut self, value_id: impl Into<String>, default_value: i32) -> &mut Self {
        let definition =
            ConfigurationValueDefinition::new(value_id, self.next_index).with_default(default_value);
        self.push(definition)
    }

    pub(crate) fn dependent(
        &mut self,
        value_id: impl Into<String>,
        default_value: i32,
        prerequisite: impl Into<String>,
        predicate: Predicate,
    ) -> &mut Self {
        let definition = ConfigurationValueDefinition::new(value_id, self.next_index)
            .with_default(default_value)
            .depends_on(prerequisite, predicate);
        self.push(definition)
    }

    pub(crate) fn build(&mut self) -> Vec<ConfigurationValueDefinition> {
        std::mem::take(&mut self.definitions)
    }
}

// Unknown prerequisite values count as relevant so nothing gets skipped.

pub(crate) fn is_nonzero(value: Option<i32>) -> bool {
    value.is_none_or(|value| value != 0)
}

pub(crate) fn is_zero(value: Option<i32>) -> bool {
    value.is_none_or(|value| value == 0)
}

pub(crate) fn is_one(value: Option<i32>) -> bool {
    value.is_none_or(|value| value == 1)
}

pub(crate) fn at_least_one(value: Option<i32>) -> bool {
    value.is_none_or(|value| value >= 1)
}

pub(crate) fn at_least_two(value: Option<i32>) -> bool {
    value.is_none_or(|value| value >= 2)
}

pub(crate) fn at_least_three(value: Option<i32>) -> bool {
    value.is_none_or(|value| value >= 3)
}

/// Predicate for "count is at least `n`"
///
/// Controllers have at most three heating circuits or extension modules, so
/// only `n` in `1..=3` is meaningful. Debug builds reject anything else;
/// release builds clamp to that range.
pub(crate) fn at_least(n: usize) -> Predicate {
    debug_assert!((1..=3).contains(&n), "at_least({}) is out of range", n);
    match n {
        0 | 1 => at_least_one,
        2 => at_least_two,
        _ => at_least_three,
    }
}
