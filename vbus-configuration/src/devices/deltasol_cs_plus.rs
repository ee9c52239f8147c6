//! RESOL DeltaSol CS Plus

use super::TableBuilder;
use crate::optimizer::{ConfigurationOptimizer, NoopConfigurationOptimizer};
use crate::value::ConfigurationValueDefinition;
use once_cell::sync::Lazy;

pub const DEVICE_ADDRESS: u16 = 0x2211;
pub const NAME: &str = "DeltaSol CS Plus";

static CONFIGURATION_DATA: Lazy<Vec<ConfigurationValueDefinition>> = Lazy::new(|| {
    let mut table = TableBuilder::new(0x0100);
    table
        .value("System_Scheme", 1)
        .value("Language", 0)
        .value("Temperature_Unit", 0)
        .value("Solar_Tmax", 600)
        .value("Solar_DeltaTon", 60)
        .value("Solar_DeltaToff", 40);
    for relay in 1..=2 {
        table
            .value(format!("Relay_R{}_MinSpeed", relay), 30)
            .value(format!("Relay_R{}_Manual", relay), 2);
    }
    for sensor in 1..=4 {
        table.value(format!("Sensor_S{}_Type", sensor), 1);
    }
    table.build()
});

pub fn configuration_data() -> &'static [ConfigurationValueDefinition] {
    &CONFIGURATION_DATA
}

pub fn create_optimizer() -> Box<dyn ConfigurationOptimizer> {
    Box::new(NoopConfigurationOptimizer::new(DEVICE_ADDRESS, configuration_data()))
}
