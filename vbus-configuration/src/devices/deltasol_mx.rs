//! RESOL DeltaSol MX
//!
//! Relays R1..R6 are on the controller, further relays live on extension
//! modules.

use super::{TableBuilder, at_least, is_nonzero, is_zero};
use crate::optimizer::{ConfigurationOptimizer, DependencyConfigurationOptimizer};
use crate::value::ConfigurationValueDefinition;
use once_cell::sync::Lazy;

pub const DEVICE_ADDRESS: u16 = 0x7E11;
pub const NAME: &str = "DeltaSol MX";

const RELAY_COUNT: usize = 6;
const SENSOR_COUNT: usize = 6;
const MODULE_COUNT: usize = 2;
const HEATING_CIRCUIT_COUNT: usize = 3;

static CONFIGURATION_DATA: Lazy<Vec<ConfigurationValueDefinition>> = Lazy::new(|| {
    let mut table = TableBuilder::new(0x1000);

    for relay in 1..=RELAY_COUNT {
        let function = format!("Relay_R{}_Function", relay);
        table
            .value(&function, 0)
            .dependent(format!("Relay_R{}_MinSpeed", relay), 30, &function, is_nonzero);
    }
    for sensor in 1..=SENSOR_COUNT {
        table.value(format!("Sensor_S{}_Type", sensor), 1);
    }

    table.value("Module_Count", 0);
    for module in 1..=MODULE_COUNT {
        table.dependent(
            format!("Module_M{}_Address", module),
            module as i32,
            "Module_Count",
            at_least(module),
        );
    }

    table.value("Heating_Circuit_Count", 0);
    for circuit in 1..=HEATING_CIRCUIT_COUNT {
        let curve = format!("HeatingCircuit_HC{}_Curve", circuit);
        table
            .dependent(&curve, 10, "Heating_Circuit_Count", at_least(circuit))
            .dependent(format!("HeatingCircuit_HC{}_CurvePoint1", circuit), 0, &curve, is_zero);
    }

    table.build()
});

pub fn configuration_data() -> &'static [ConfigurationValueDefinition] {
    &CONFIGURATION_DATA
}

pub fn create_optimizer() -> Box<dyn ConfigurationOptimizer> {
    Box::new(DependencyConfigurationOptimizer::new(DEVICE_ADDRESS, configuration_data()))
}
