//! Loading `GridConfig` from TOML and JSON documents.

use gridflow_grid::{GridConfig, GridError, Virtualization};

#[test]
fn toml_overrides_defaults() {
    let config = GridConfig::from_toml_str(
        r#"
        row_height = 28.0
        page_size = 50

        [virtualization]
        mode = "auto"
        threshold = 200
        "#,
    )
    .unwrap();

    assert_eq!(config.row_height, 28.0);
    assert_eq!(config.buffer, 5);
    assert_eq!(config.page_size, Some(50));
    assert_eq!(config.virtualization, Virtualization::Auto { threshold: 200 });
}

#[test]
fn empty_documents_yield_defaults() {
    assert_eq!(GridConfig::from_toml_str("").unwrap(), GridConfig::default());
    assert_eq!(GridConfig::from_json_str("{}").unwrap(), GridConfig::default());
}

#[test]
fn json_unit_variants() {
    let config =
        GridConfig::from_json_str(r#"{ "buffer": 0, "virtualization": { "mode": "never" } }"#)
            .unwrap();
    assert_eq!(config.buffer, 0);
    assert_eq!(config.virtualization, Virtualization::Never);
}

#[test]
fn parse_errors_are_typed() {
    assert!(matches!(
        GridConfig::from_toml_str("row_height = \"tall\""),
        Err(GridError::ConfigToml(_))
    ));
    assert!(matches!(
        GridConfig::from_json_str("{ nope"),
        Err(GridError::ConfigJson(_))
    ));
}

#[test]
fn loaded_values_are_validated() {
    assert!(matches!(
        GridConfig::from_json_str(r#"{ "row_height": -4.0 }"#),
        Err(GridError::InvalidConfig {
            field: "row_height",
            ..
        })
    ));
    assert!(matches!(
        GridConfig::from_toml_str("page_size = 0"),
        Err(GridError::InvalidConfig {
            field: "page_size",
            ..
        })
    ));
}
