use vbus_configuration::{
    ConfigurationOptimizer, ConfigurationOptimizerFactory, ConfigurationValueState,
};

async fn optimizer(address: u16) -> Box<dyn ConfigurationOptimizer> {
    ConfigurationOptimizerFactory::create_optimizer_by_device_address(address)
        .await
        .unwrap()
}

fn pending_count(config: &[ConfigurationValueState]) -> usize {
    config.iter().filter(|value| value.pending).count()
}

/// Run the load loop, answering every request with `read`, and collect the
/// pending count of each round
async fn load_rounds(
    optimizer: &dyn ConfigurationOptimizer,
    read: impl Fn(&str) -> Option<i32>,
) -> Vec<usize> {
    let mut config = optimizer.complete_configuration(None).await;
    let mut rounds = Vec::new();
    loop {
        config = optimizer.optimize_load_configuration(config).await.unwrap();
        let pending = pending_count(&config);
        rounds.push(pending);
        if pending == 0 {
            break;
        }
        assert!(rounds.len() <= 10, "no convergence: {:?}", rounds);
        for value in config.iter_mut().filter(|value| value.pending) {
            let read_value = read(&value.value_id);
            value.mark_transceived(read_value);
        }
    }
    rounds
}

#[tokio::test]
async fn test_slt_complete_configuration() {
    let optimizer = optimizer(0x1001).await;
    let config = optimizer.complete_configuration(None).await;

    assert_eq!(config.len(), 52);
    for (value, definition) in config.iter().zip(optimizer.configuration_data()) {
        assert_eq!(value.value_id, definition.value_id);
        assert_eq!(value.value, definition.default_value);
        assert!(value.pending);
        assert!(!value.transceived);
    }
}

#[tokio::test]
async fn test_slt_converges_with_unknown_values() {
    let optimizer = optimizer(0x1001).await;
    let rounds = load_rounds(optimizer.as_ref(), |_| None).await;
    assert_eq!(rounds, [29, 17, 6, 0]);
}

#[tokio::test]
async fn test_slt_skips_unused_features() {
    let optimizer = optimizer(0x1001).await;
    let rounds = load_rounds(optimizer.as_ref(), |value_id| match value_id {
        "Relay_R1_Function" => Some(1),
        "Heating_Circuit_Count" => Some(1),
        "HeatingCircuit_HC1_Curve" => Some(5),
        _ => Some(0),
    })
    .await;

    // R1 speeds and the first heating circuit, no custom curve points
    assert_eq!(rounds, [29, 5, 0]);
}

#[tokio::test]
async fn test_slt_custom_curve_points() {
    let optimizer = optimizer(0x1001).await;
    let rounds = load_rounds(optimizer.as_ref(), |value_id| match value_id {
        "Heating_Circuit_Count" => Some(2),
        "HeatingCircuit_HC2_Curve" => Some(7),
        _ => Some(0),
    })
    .await;

    assert_eq!(rounds, [29, 6, 3, 0]);
}

#[tokio::test]
async fn test_rule_driven_devices_converge() {
    for (address, expected) in [
        (0x5400, vec![12, 10, 4, 0]),
        (0x7112, vec![14, 7, 0]),
        (0x7E11, vec![14, 11, 3, 0]),
    ] {
        let optimizer = optimizer(address).await;
        let rounds = load_rounds(optimizer.as_ref(), |_| None).await;
        assert_eq!(rounds, expected, "0x{:04X}", address);
        assert!(rounds.windows(2).all(|pair| pair[0] > pair[1]));
    }
}

#[tokio::test]
async fn test_noop_devices_keep_everything_pending() {
    for address in [0x1121, 0x2211] {
        let optimizer = optimizer(address).await;
        let config = optimizer.complete_configuration(None).await;
        let total = config.len();

        let config = optimizer.optimize_load_configuration(config).await.unwrap();
        assert_eq!(pending_count(&config), total);
    }
}

#[tokio::test]
async fn test_partial_configuration_overrides_defaults() {
    let optimizer = optimizer(0x7E11).await;
    let mut partial = optimizer.complete_configuration(None).await;
    partial.retain(|value| value.value_id == "Module_Count");
    partial[0].value = Some(2);

    let config = optimizer.complete_configuration(Some(&partial)).await;
    let module_count = config
        .iter()
        .find(|value| value.value_id == "Module_Count")
        .unwrap();
    assert_eq!(module_count.value, Some(2));
    assert_eq!(config.len(), optimizer.configuration_data().len());
}
