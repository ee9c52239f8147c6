//! RESOL DeltaSol CS2
//!
//! Single-relay controller, all values are independent.

use super::TableBuilder;
use crate::optimizer::{ConfigurationOptimizer, NoopConfigurationOptimizer};
use crate::value::ConfigurationValueDefinition;
use once_cell::sync::Lazy;

pub const DEVICE_ADDRESS: u16 = 0x1121;
pub const NAME: &str = "DeltaSol CS2";

static CONFIGURATION_DATA: Lazy<Vec<ConfigurationValueDefinition>> = Lazy::new(|| {
    TableBuilder::new(0x0100)
        .value("Language", 0)
        .value("Temperature_Unit", 0)
        .value("Solar_Tmax", 600)
        .value("Solar_DeltaTon", 60)
        .value("Solar_DeltaToff", 40)
        .value("Relay_R1_MinSpeed", 30)
        .value("Relay_R1_Manual", 2)
        .value("Sensor_S1_Type", 1)
        .value("Sensor_S2_Type", 1)
        .build()
});

pub fn configuration_data() -> &'static [ConfigurationValueDefinition] {
    &CONFIGURATION_DATA
}

pub fn create_optimizer() -> Box<dyn ConfigurationOptimizer> {
    Box::new(NoopConfigurationOptimizer::new(DEVICE_ADDRESS, configuration_data()))
}
