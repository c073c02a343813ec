//! Config file to plugin properties, through the registry
//!
//! Run with: cargo test -p obs-storage --test plugins

use anyhow::{Context, Result};
use obs_connect::{ConnectConfig, ConnectorError, LineageRecorder, PluginRegistry, PluginType};
use obs_storage::connection::{OBS_ACCESS_KEY, OBS_ENCRYPTION_TYPE, OBS_END_POINT, OBS_SECRET_KEY};

const CONFIG: &str = r#"
version: "1.0"
connections:
  lake:
    connector: obs
    config:
      accessKey: AK
      secretKey: SK
      endPoint: obs.cn-north-4.myhuaweicloud.com
sources:
  orders:
    plugin: obs
    connection: lake
    config:
      referenceName: orders
      path: obs://sales/orders/
      format: csv
      skipHeader: true
  pending:
    plugin: obs
    connection: lake
    config:
      referenceName: pending
      path: "${secure(pending-path)}"
sinks:
  exports:
    plugin: obs
    config:
      referenceName: exports
      path: obs://sales/exports/
      format: json
      authenticationMethod: IAM
      enableEncryption: true
  broken:
    plugin: obs
    config:
      path: obs://sales/broken/
"#;

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    obs_storage::register_all(&mut registry);
    registry
}

#[test]
fn test_source_through_named_connection() -> Result<()> {
    let config = ConnectConfig::from_yaml(CONFIG)?;
    let registry = registry();

    let orders = &config.sources["orders"];
    let resolved = config.resolved_plugin_config(orders)?;
    let source = registry
        .sources
        .get(&orders.plugin)
        .context("obs source not registered")?
        .create(&resolved)?;

    assert_eq!(source.plugin_type(), PluginType::BatchSource);
    assert!(source.should_infer_schema());

    let properties = source.prepare_run("orders")?;
    assert_eq!(properties[OBS_ACCESS_KEY], "AK");
    assert_eq!(properties[OBS_SECRET_KEY], "SK");
    assert_eq!(properties[OBS_END_POINT], "obs.cn-north-4.myhuaweicloud.com");
    assert_eq!(properties["path.tracking.copy.header"], "true");

    let mut lineage = LineageRecorder::new(source.reference_name().unwrap_or_default());
    source.record_lineage(&mut lineage, &["id".to_string()]);
    assert_eq!(lineage.reference_name(), "orders");
    assert_eq!(lineage.operations().len(), 1);
    Ok(())
}

#[test]
fn test_deferred_source_path() -> Result<()> {
    let config = ConnectConfig::from_yaml(CONFIG)?;
    let registry = registry();

    let pending = &config.sources["pending"];
    let source = registry
        .sources
        .get("obs")
        .context("obs source not registered")?
        .create(&config.resolved_plugin_config(pending)?)?;

    assert!(!source.should_infer_schema());
    let properties = source.prepare_run("pending")?;
    assert!(!properties.contains_key(OBS_ACCESS_KEY));
    Ok(())
}

#[test]
fn test_sinks() -> Result<()> {
    let config = ConnectConfig::from_yaml(CONFIG)?;
    let registry = registry();
    let factory = registry.sinks.get("obs").context("obs sink not registered")?;

    let exports = factory.create(&config.resolved_plugin_config(&config.sinks["exports"])?)?;
    let properties = exports.prepare_run("exports")?;
    assert_eq!(properties[OBS_ENCRYPTION_TYPE], "sse-kms");
    assert!(!properties.contains_key(OBS_ACCESS_KEY));

    let broken = factory.create(&config.resolved_plugin_config(&config.sinks["broken"])?)?;
    match broken.prepare_run("broken") {
        Err(ConnectorError::Validation(e)) => {
            // reference name plus the three credentials
            assert_eq!(e.failures.len(), 4);
        }
        other => panic!("expected validation failures, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_specs_carry_schemas() {
    let registry = registry();
    let specs = registry.specs();
    assert_eq!(specs.len(), 3);
    for spec in specs {
        assert_eq!(spec.connector_type, "obs");
        let schema = spec.config_schema.expect("schema");
        assert!(schema.to_string().contains("path") || spec.plugin_type == PluginType::Connector);
    }
}
