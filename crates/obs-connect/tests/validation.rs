//! Validation flow as a host drives it: parse, validate, summarize
//!
//! Run with: cargo test -p obs-connect --test validation

use obs_connect::{
    BrowseDetail, BrowseEntity, BrowseEntityPropertyValue, CheckResult, ConfigValue, ConnectorError,
    FailureCollector, FileFormat, FileSinkProperties, FileSourceProperties, PropertyType,
};

#[test]
fn test_failures_become_check_result() {
    let props: FileSourceProperties = serde_yaml::from_str(
        r#"
referenceName: "bad name!"
format: delimited
"#,
    )
    .unwrap();

    let mut collector = FailureCollector::new("orders");
    props.validate(&mut collector);
    assert_eq!(collector.failures().len(), 3);

    let result = CheckResult::from_failures("configuration", &collector);
    assert!(!result.is_success());
    assert_eq!(result.failed_checks().count(), 3);

    let err: ConnectorError = collector.get_or_throw().unwrap_err().into();
    assert!(err.to_string().starts_with("3 validation failure(s)"));
}

#[test]
fn test_clean_config_passes() {
    let props: FileSinkProperties = serde_json::from_str(
        r#"{
            "referenceName": "exports",
            "path": "obs://sales/exports/",
            "format": "parquet",
            "suffix": "yyyy-MM-dd"
        }"#,
    )
    .unwrap();

    let mut collector = FailureCollector::new("exports");
    props.validate(&mut collector);
    assert!(collector.get_or_throw().is_ok());
    assert!(CheckResult::from_failures("configuration", &collector).is_success());
    assert_eq!(props.format, ConfigValue::Present(FileFormat::Parquet));
}

#[test]
fn test_browse_detail_wire_shape() {
    let detail = BrowseDetail::builder()
        .total_count(1)
        .entity(
            BrowseEntity::builder("a.csv", "sales/a.csv", "file")
                .can_sample(true)
                .property(
                    "Size",
                    BrowseEntityPropertyValue::new("10", PropertyType::SizeBytes),
                )
                .build(),
        )
        .build();

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["totalCount"], 1);
    let entity = &json["entities"][0];
    assert_eq!(entity["type"], "file");
    assert_eq!(entity["canBrowse"], false);
    assert_eq!(entity["canSample"], true);
    assert_eq!(entity["properties"]["Size"]["type"], "SIZE_BYTES");
}
