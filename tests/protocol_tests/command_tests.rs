//! Tests for command parsing
//!
//! These tests verify:
//! - Every command form parses into the right variant
//! - Keywords are case-insensitive
//! - Malformed lines are rejected with parse errors
//! - Filter predicates in both orientations

use std::cmp::Ordering;

use strata::catalog::{FieldDef, FieldType};
use strata::protocol::{Command, CommandType, CompareOp, Predicate, Response, Status};
use strata::StrataError;

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_parse_create_type() {
    let cmd = Command::parse("CREATE TYPE Person 3 1 id int name str age int").unwrap();

    assert_eq!(
        cmd,
        Command::CreateType {
            name: "Person".to_string(),
            primary_key: 1,
            fields: vec![
                FieldDef::new("id", FieldType::Int),
                FieldDef::new("name", FieldType::Str),
                FieldDef::new("age", FieldType::Int),
            ],
        }
    );
    assert_eq!(cmd.command_type(), CommandType::CreateType);
}

#[test]
fn test_parse_create_type_field_count_mismatch() {
    let result = Command::parse("create type Person 3 1 id int name str");
    assert!(matches!(result, Err(StrataError::Parse(_))));
}

#[test]
fn test_parse_create_type_unknown_field_type() {
    assert!(Command::parse("create type Person 1 1 id decimal").is_err());
}

#[test]
fn test_parse_record_commands() {
    assert_eq!(
        Command::parse("create record Person 1 ann 30").unwrap(),
        Command::CreateRecord {
            type_name: "Person".to_string(),
            values: vec!["1".to_string(), "ann".to_string(), "30".to_string()],
        }
    );
    assert_eq!(
        Command::parse("Delete Record Person 1").unwrap(),
        Command::DeleteRecord {
            type_name: "Person".to_string(),
            key: "1".to_string(),
        }
    );
    assert_eq!(
        Command::parse("UPDATE RECORD Person 1 1 bob 31").unwrap(),
        Command::UpdateRecord {
            type_name: "Person".to_string(),
            key: "1".to_string(),
            values: vec!["1".to_string(), "bob".to_string(), "31".to_string()],
        }
    );
    assert_eq!(
        Command::parse("search record Person 7").unwrap(),
        Command::SearchRecord {
            type_name: "Person".to_string(),
            key: "7".to_string(),
        }
    );
    assert_eq!(
        Command::parse("list record Person").unwrap(),
        Command::ListRecords {
            type_name: "Person".to_string(),
        }
    );
}

#[test]
fn test_parse_type_commands() {
    assert_eq!(Command::parse("  LIST TYPE  ").unwrap(), Command::ListTypes);
    assert_eq!(
        Command::parse("delete type Person").unwrap(),
        Command::DeleteType {
            name: "Person".to_string()
        }
    );
}

#[test]
fn test_parse_rejects_malformed_lines() {
    for line in [
        "",
        "LIST",
        "FETCH RECORD Person 1",
        "LIST TYPE extra",
        "DELETE RECORD Person",
        "SEARCH RECORD Person 1 2",
        "UPDATE RECORD Person 1",
        "CREATE RECORD",
        "FILTER RECORD Person",
        "FILTER RECORD Person id",
    ] {
        assert!(
            matches!(Command::parse(line), Err(StrataError::Parse(_))),
            "'{}' should not parse",
            line
        );
    }
}

#[test]
fn test_parse_filter_joins_spaced_predicate() {
    let compact = Command::parse("FILTER RECORD Person id>5").unwrap();
    let spaced = Command::parse("filter record Person id > 5").unwrap();

    assert_eq!(compact, spaced);
    assert_eq!(compact.command_type(), CommandType::FilterRecords);
}

// =============================================================================
// Predicate Tests
// =============================================================================

#[test]
fn test_predicate_parse() {
    let p: Predicate = "id<10".parse().unwrap();

    assert_eq!(p.lhs, "id");
    assert_eq!(p.op, CompareOp::Less);
    assert_eq!(p.rhs, "10");
    assert_eq!(p.to_string(), "id<10");
}

#[test]
fn test_predicate_resolves_either_orientation() {
    let forward: Predicate = "id>5".parse().unwrap();
    let reversed: Predicate = "5<id".parse().unwrap();
    let equal: Predicate = "7=id".parse().unwrap();

    assert_eq!(forward.resolve("id"), Some((CompareOp::Greater, "5")));
    assert_eq!(reversed.resolve("id"), Some((CompareOp::Greater, "5")));
    assert_eq!(equal.resolve("id"), Some((CompareOp::Equal, "7")));
    assert_eq!(forward.resolve("name"), None);
}

#[test]
fn test_predicate_rejects_malformed() {
    for text in ["id", ">5", "id<", "id<<5", "id<5=3"] {
        assert!(text.parse::<Predicate>().is_err(), "'{}' should not parse", text);
    }
}

#[test]
fn test_compare_op_semantics() {
    assert!(CompareOp::Less.holds(Ordering::Less));
    assert!(!CompareOp::Less.holds(Ordering::Equal));
    assert!(CompareOp::Greater.holds(Ordering::Greater));
    assert!(CompareOp::Equal.holds(Ordering::Equal));
    assert_eq!(CompareOp::Less.flip(), CompareOp::Greater);
    assert_eq!(CompareOp::Equal.flip(), CompareOp::Equal);
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_response_constructors() {
    assert_eq!(Response::from_bool(true).status, Status::Success);
    assert_eq!(Response::from_bool(false).status, Status::Failure);
    assert!(Response::failure().lines.is_empty());
    assert_eq!(Status::Success.to_string(), "success");
    assert_eq!(Status::Failure.to_string(), "failure");
}
