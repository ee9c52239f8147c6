//! RESOL DeltaSol SLT

use super::{TableBuilder, at_least, is_nonzero, is_one, is_zero};
use crate::optimizer::{ConfigurationOptimizer, DependencyConfigurationOptimizer};
use crate::value::ConfigurationValueDefinition;
use once_cell::sync::Lazy;

pub const DEVICE_ADDRESS: u16 = 0x1001;
pub const NAME: &str = "DeltaSol SLT";

const RELAY_COUNT: usize = 4;
const SENSOR_COUNT: usize = 6;
const HEATING_CIRCUIT_COUNT: usize = 2;
const CURVE_POINT_COUNT: usize = 3;

static CONFIGURATION_DATA: Lazy<Vec<ConfigurationValueDefinition>> = Lazy::new(|| {
    let mut table = TableBuilder::new(0x0100);
    table
        .value("System_Scheme", 1)
        .value("System_Variant", 0)
        .value("Language", 0)
        .value("Temperature_Unit", 0);

    for relay in 1..=RELAY_COUNT {
        let function = format!("Relay_R{}_Function", relay);
        table
            .value(&function, 0)
            .value(format!("Relay_R{}_Manual", relay), 2)
            .dependent(format!("Relay_R{}_MinSpeed", relay), 30, &function, is_nonzero)
            .dependent(format!("Relay_R{}_MaxSpeed", relay), 100, &function, is_nonzero);
    }

    for sensor in 1..=SENSOR_COUNT {
        table
            .value(format!("Sensor_S{}_Type", sensor), 1)
            .value(format!("Sensor_S{}_Offset", sensor), 0);
    }

    // Temperatures in 0.1 K
    table
        .value("Solar_Tmax", 600)
        .value("Solar_DeltaTon", 60)
        .value("Solar_DeltaToff", 40);

    table.value("Heating_Circuit_Count", 0);
    for circuit in 1..=HEATING_CIRCUIT_COUNT {
        let curve = format!("HeatingCircuit_HC{}_Curve", circuit);
        table
            .dependent(&curve, 10, "Heating_Circuit_Count", at_least(circuit))
            .dependent(
                format!("HeatingCircuit_HC{}_DayCorrection", circuit),
                0,
                "Heating_Circuit_Count",
                at_least(circuit),
            )
            .dependent(
                format!("HeatingCircuit_HC{}_NightCorrection", circuit),
                -50,
                "Heating_Circuit_Count",
                at_least(circuit),
            );
        // Curve 0 selects the custom curve
        for point in 1..=CURVE_POINT_COUNT {
            table.dependent(
                format!("HeatingCircuit_HC{}_CurvePoint{}", circuit, point),
                0,
                &curve,
                is_zero,
            );
        }
    }

    table
        .value("Heat_Quantity_Enabled", 0)
        .dependent("Heat_Quantity_FlowRate", 0, "Heat_Quantity_Enabled", is_one)
        .dependent("Heat_Quantity_Antifreeze", 1, "Heat_Quantity_Enabled", is_one)
        .dependent("Heat_Quantity_Concentration", 45, "Heat_Quantity_Enabled", is_one);

    table.build()
});

pub fn configuration_data() -> &'static [ConfigurationValueDefinition] {
    &CONFIGURATION_DATA
}

pub fn create_optimizer() -> Box<dyn ConfigurationOptimizer> {
    Box::new(DependencyConfigurationOptimizer::new(DEVICE_ADDRESS, configuration_data()))
}
