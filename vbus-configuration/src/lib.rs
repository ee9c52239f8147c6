//! Configuration optimizers for RESOL VBus controllers
//!
//! Reading or writing a controller's configuration one value at a time is
//! slow. The optimizers in this crate decide, round trip by round trip,
//! which values still have to be transferred, skipping values made
//! irrelevant by other settings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vbus_configuration::ConfigurationOptimizerFactory;
//!
//! # async fn example() -> vbus_core::VbusResult<()> {
//! if let Some(optimizer) =
//!     ConfigurationOptimizerFactory::create_optimizer_by_device_address(0x7E11).await
//! {
//!     let mut config = optimizer.complete_configuration(None).await;
//!     loop {
//!         config = optimizer.optimize_load_configuration(config).await?;
//!         if !config.iter().any(|value| value.pending) {
//!             break;
//!         }
//!         for value in config.iter_mut().filter(|value| value.pending) {
//!             // read the value from the controller here
//!             value.mark_transceived(None);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod devices;
pub mod factory;
pub mod optimizer;
pub mod value;

pub use factory::{ConfigurationOptimizerFactory, OptimizerRegistration};
pub use optimizer::{
    ConfigurationOptimizer, DependencyConfigurationOptimizer, NoopConfigurationOptimizer,
    complete_configuration,
};
pub use value::{ConfigurationValueDefinition, ConfigurationValueState, Dependency, Predicate};
pub use vbus_core::{VbusError, VbusResult};
