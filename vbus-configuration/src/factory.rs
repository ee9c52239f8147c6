//! Registry of configuration optimizers by device address

use crate::devices::{
    deltasol_bx_plus, deltasol_cs2, deltasol_cs_plus, deltasol_mx, deltasol_slt, deltatherm_hc,
};
use crate::optimizer::ConfigurationOptimizer;
use crate::value::ConfigurationValueDefinition;
use once_cell::sync::Lazy;
use std::fmt;

/// One registered controller model
pub struct OptimizerRegistration {
    pub device_address: u16,
    pub name: &'static str,
    /// Definition table of the model
    pub configuration_data: fn() -> &'static [ConfigurationValueDefinition],
    create: fn() -> Box<dyn ConfigurationOptimizer>,
}

impl OptimizerRegistration {
    /// Instantiate the model's optimizer
    pub fn create_optimizer(&self) -> Box<dyn ConfigurationOptimizer> {
        (self.create)()
    }
}

impl fmt::Debug for OptimizerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizerRegistration")
            .field("device_address", &format_args!("0x{:04X}", self.device_address))
            .field("name", &self.name)
            .finish()
    }
}

macro_rules! registration {
    ($device:ident) => {
        OptimizerRegistration {
            device_address: $device::DEVICE_ADDRESS,
            name: $device::NAME,
            configuration_data: $device::configuration_data,
            create: $device::create_optimizer,
        }
    };
}

static REGISTRY: Lazy<Vec<OptimizerRegistration>> = Lazy::new(|| {
    vec![
        registration!(deltasol_slt),
        registration!(deltasol_cs2),
        registration!(deltasol_cs_plus),
        registration!(deltatherm_hc),
        registration!(deltasol_bx_plus),
        registration!(deltasol_mx),
    ]
});

/// Resolves the optimizer for a controller found on the bus
pub struct ConfigurationOptimizerFactory;

impl ConfigurationOptimizerFactory {
    /// All registered controller models
    pub fn registrations() -> &'static [OptimizerRegistration] {
        &REGISTRY
    }

    /// Find the registration for `address`
    pub fn find_registration(address: u16) -> Option<&'static OptimizerRegistration> {
        REGISTRY
            .iter()
            .find(|registration| registration.device_address == address)
    }

    /// Create the optimizer for the controller at `address`
    ///
    /// Returns `None` if no optimizer is registered for that address.
    pub async fn create_optimizer_by_device_address(
        address: u16,
    ) -> Option<Box<dyn ConfigurationOptimizer>> {
        match Self::find_registration(address) {
            Some(registration) => {
                log::debug!(
                    "Using {} optimizer for device 0x{:04X}",
                    registration.name,
                    address
                );
                Some(registration.create_optimizer())
            }
            None => {
                log::debug!("No configuration optimizer for device 0x{:04X}", address);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_addresses_are_unique() {
        let mut seen = HashSet::new();
        for registration in ConfigurationOptimizerFactory::registrations() {
            assert!(registration.device_address > 0);
            assert!(
                seen.insert(registration.device_address),
                "duplicate registration {:?}",
                registration
            );
        }
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_device() {
        assert!(
            ConfigurationOptimizerFactory::create_optimizer_by_device_address(0x0050)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_every_registration_creates_optimizer() {
        for registration in ConfigurationOptimizerFactory::registrations() {
            let optimizer = ConfigurationOptimizerFactory::create_optimizer_by_device_address(
                registration.device_address,
            )
            .await
            .unwrap();
            assert_eq!(optimizer.device_address(), registration.device_address);
            assert_eq!(
                optimizer.configuration_data().len(),
                (registration.configuration_data)().len()
            );
        }
    }

    #[tokio::test]
    async fn test_known_devices() {
        for address in [0x7112, 0x2211, 0x7E11, 0x1001, 0x5400, 0x1121] {
            assert!(
                ConfigurationOptimizerFactory::create_optimizer_by_device_address(address)
                    .await
                    .is_some(),
                "0x{:04X}",
                address
            );
        }
    }

    #[test]
    fn test_definition_ids_are_unique() {
        for registration in ConfigurationOptimizerFactory::registrations() {
            let mut ids = HashSet::new();
            for definition in (registration.configuration_data)() {
                assert!(ids.insert(definition.value_id.as_str()), "{}", definition.value_id);
            }
        }
    }

    #[test]
    fn test_dependencies_reference_defined_values() {
        for registration in ConfigurationOptimizerFactory::registrations() {
            let data = (registration.configuration_data)();
            for definition in data {
                if let Some(dependency) = &definition.dependency {
                    assert!(
                        data.iter().any(|other| other.value_id == dependency.value_id),
                        "{} depends on undefined {}",
                        definition.value_id,
                        dependency.value_id
                    );
                }
            }
        }
    }
}
