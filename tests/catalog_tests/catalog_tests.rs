//! Tests for the type catalog
//!
//! These tests verify:
//! - Schema line serialization in both directions
//! - Name, key ordinal and field type validation
//! - Value checks against a schema
//! - Catalog file load/save

use std::fs;

use strata::catalog::{validate_name, Catalog, FieldDef, FieldType, TypeSchema};
use strata::index::{IndexKey, KeyKind};
use strata::StrataError;
use tempfile::TempDir;

fn person() -> TypeSchema {
    TypeSchema::new(
        "Person",
        vec![
            FieldDef::new("id", FieldType::Int),
            FieldDef::new("name", FieldType::Str),
            FieldDef::new("age", FieldType::Int),
        ],
        1,
        "Person_1.seg",
    )
    .unwrap()
}

// =============================================================================
// Schema Tests
// =============================================================================

#[test]
fn test_schema_line_roundtrip() {
    let schema = person();
    let line = schema.to_line();

    assert_eq!(line, "Person,3,1,id,int,name,str,age,int,Person_1.seg");
    assert_eq!(TypeSchema::from_line(&line).unwrap(), schema);
}

#[test]
fn test_schema_key_kind_follows_declared_type() {
    let by_id = person();
    assert_eq!(by_id.key_kind(), KeyKind::Int);

    let by_name = TypeSchema::from_line("Person,2,2,id,int,name,string,Person_3.seg").unwrap();
    assert_eq!(by_name.key_kind(), KeyKind::Text);
    assert_eq!(by_name.primary_key_field().name, "name");
    assert_eq!(by_name.active_segment, "Person_3.seg");
}

#[test]
fn test_primary_key_of_values() {
    let schema = person();

    assert_eq!(schema.primary_key_of(&["42", "ann", "30"]).unwrap(), IndexKey::Int(42));
    assert!(schema.primary_key_of(&["x", "ann", "30"]).is_err());
}

#[test]
fn test_check_values() {
    let schema = person();

    assert!(schema.check_values(&["1", "ann", "30"]).is_ok());
    assert!(matches!(
        schema.check_values(&["1", "ann"]),
        Err(StrataError::SchemaMismatch {
            expected: 3,
            actual: 2
        })
    ));
    assert!(matches!(
        schema.check_values(&["1", "ann", "old"]),
        Err(StrataError::InvalidField(_))
    ));
    assert!(matches!(
        schema.check_values(&["1", "a,b", "30"]),
        Err(StrataError::InvalidField(_))
    ));
    assert!(matches!(
        schema.check_values(&["1", "", "30"]),
        Err(StrataError::InvalidField(_))
    ));
}

#[test]
fn test_schema_rejects_bad_definitions() {
    let fields = || vec![FieldDef::new("id", FieldType::Int)];

    assert!(TypeSchema::new("Person", fields(), 0, "Person_1.seg").is_err());
    assert!(TypeSchema::new("Person", fields(), 2, "Person_1.seg").is_err());
    assert!(TypeSchema::new("Person", Vec::new(), 1, "Person_1.seg").is_err());
    assert!(TypeSchema::new("9lives", fields(), 1, "9lives_1.seg").is_err());

    let twice = vec![
        FieldDef::new("id", FieldType::Int),
        FieldDef::new("id", FieldType::Str),
    ];
    assert!(TypeSchema::new("Person", twice, 1, "Person_1.seg").is_err());
}

#[test]
fn test_from_line_rejects_malformed_lines() {
    assert!(TypeSchema::from_line("Person,3,1").is_err());
    assert!(TypeSchema::from_line("Person,x,1,id,int,Person_1.seg").is_err());
    assert!(TypeSchema::from_line("Person,2,1,id,int,Person_1.seg").is_err());
    assert!(TypeSchema::from_line("Person,1,1,id,float,Person_1.seg").is_err());
}

#[test]
fn test_field_type_parsing() {
    assert_eq!("INT".parse::<FieldType>().unwrap(), FieldType::Int);
    assert_eq!("integer".parse::<FieldType>().unwrap(), FieldType::Int);
    assert_eq!("Str".parse::<FieldType>().unwrap(), FieldType::Str);
    assert_eq!("text".parse::<FieldType>().unwrap(), FieldType::Str);
    assert!("blob".parse::<FieldType>().is_err());
}

#[test]
fn test_validate_name() {
    assert!(validate_name("Person").is_ok());
    assert!(validate_name("_hidden2").is_ok());
    assert!(validate_name("").is_err());
    assert!(validate_name("2fast").is_err());
    assert!(validate_name("a-b").is_err());
    assert!(validate_name("a,b").is_err());
}

// =============================================================================
// Catalog File Tests
// =============================================================================

#[test]
fn test_missing_catalog_is_empty() {
    let temp = TempDir::new().unwrap();
    let catalog = Catalog::new(temp.path().join("catalog.csv"));

    assert!(catalog.load().unwrap().is_empty());
}

#[test]
fn test_catalog_save_and_load() {
    let temp = TempDir::new().unwrap();
    let catalog = Catalog::new(temp.path().join("catalog.csv"));
    let planet = TypeSchema::from_line("Planet,2,2,mass,int,name,str,Planet_4.seg").unwrap();

    catalog.save([&person(), &planet]).unwrap();

    let text = fs::read_to_string(catalog.path()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert_eq!(catalog.load().unwrap(), vec![person(), planet]);
}

#[test]
fn test_catalog_skips_blank_lines() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.csv");
    fs::write(&path, "\nPerson,3,1,id,int,name,str,age,int,Person_1.seg\n\n").unwrap();

    let schemas = Catalog::new(&path).load().unwrap();
    assert_eq!(schemas, vec![person()]);
}

#[test]
fn test_catalog_rejects_duplicate_types() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.csv");
    let line = person().to_line();
    fs::write(&path, format!("{}\n{}\n", line, line)).unwrap();

    let result = Catalog::new(&path).load();
    assert!(matches!(result, Err(StrataError::Catalog(_))));
}
