//! RESOL DeltaSol BX Plus

use super::{TableBuilder, is_nonzero, is_one};
use crate::optimizer::{ConfigurationOptimizer, DependencyConfigurationOptimizer};
use crate::value::ConfigurationValueDefinition;
use once_cell::sync::Lazy;

pub const DEVICE_ADDRESS: u16 = 0x7112;
pub const NAME: &str = "DeltaSol BX Plus";

const RELAY_COUNT: usize = 4;
const SENSOR_COUNT: usize = 4;

static CONFIGURATION_DATA: Lazy<Vec<ConfigurationValueDefinition>> = Lazy::new(|| {
    let mut table = TableBuilder::new(0x0100);
    table.value("System_Scheme", 1);

    for relay in 1..=RELAY_COUNT {
        let function = format!("Relay_R{}_Function", relay);
        table
            .value(&function, 0)
            .dependent(format!("Relay_R{}_MinSpeed", relay), 30, &function, is_nonzero);
    }
    for sensor in 1..=SENSOR_COUNT {
        table.value(format!("Sensor_S{}_Type", sensor), 1);
    }

    table
        .value("Solar_Tmax", 600)
        .value("Solar_DeltaTon", 60)
        .value("Solar_DeltaToff", 40)
        .value("Backup_Heating_Enabled", 0)
        .dependent("Backup_Heating_Ton", 450, "Backup_Heating_Enabled", is_one)
        .dependent("Backup_Heating_Toff", 500, "Backup_Heating_Enabled", is_one)
        .value("Solar_Cooling_Mode", 0)
        .dependent("Solar_Cooling_Tmax", 900, "Solar_Cooling_Mode", is_nonzero);

    table.build()
});

pub fn configuration_data() -> &'static [ConfigurationValueDefinition] {
    &CONFIGURATION_DATA
}

pub fn create_optimizer() -> Box<dyn ConfigurationOptimizer> {
    Box::new(DependencyConfigurationOptimizer::new(DEVICE_ADDRESS, configuration_data()))
}
