//! RESOL DeltaTherm HC

use super::{TableBuilder, at_least, is_nonzero, is_one, is_zero};
use crate::optimizer::{ConfigurationOptimizer, DependencyConfigurationOptimizer};
use crate::value::ConfigurationValueDefinition;
use once_cell::sync::Lazy;

pub const DEVICE_ADDRESS: u16 = 0x5400;
pub const NAME: &str = "DeltaTherm HC";

const SENSOR_COUNT: usize = 6;
const HEATING_CIRCUIT_COUNT: usize = 2;

static CONFIGURATION_DATA: Lazy<Vec<ConfigurationValueDefinition>> = Lazy::new(|| {
    let mut table = TableBuilder::new(0x0200);
    table
        .value("Language", 0)
        .value("Temperature_Unit", 0)
        .value("Summer_Time_Enabled", 1)
        .value("Heating_Circuit_Count", 1)
        .value("Boiler_Type", 0)
        .value("DHW_Enabled", 1);
    for sensor in 1..=SENSOR_COUNT {
        table.value(format!("Sensor_S{}_Type", sensor), 1);
    }

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
            )
            .dependent(format!("HeatingCircuit_HC{}_CurvePoint1", circuit), 0, &curve, is_zero)
            .dependent(format!("HeatingCircuit_HC{}_CurvePoint2", circuit), 0, &curve, is_zero);
    }

    // Modulating boilers only
    table
        .dependent("Boiler_Modulation_Min", 20, "Boiler_Type", is_nonzero)
        .dependent("Boiler_Modulation_Max", 100, "Boiler_Type", is_nonzero)
        .dependent("DHW_Tset", 550, "DHW_Enabled", is_one)
        .dependent("DHW_Hysteresis", 50, "DHW_Enabled", is_one);

    table.build()
});

pub fn configuration_data() -> &'static [ConfigurationValueDefinition] {
    &CONFIGURATION_DATA
}

pub fn create_optimizer() -> Box<dyn ConfigurationOptimizer> {
    Box::new(DependencyConfigurationOptimizer::new(DEVICE_ADDRESS, configuration_data()))
}
