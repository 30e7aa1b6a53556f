//! Type schemas
//!
//! One schema per record type, serialized as a single catalog line:
//! `type_name,field_count,pk_ordinal,field_1,type_1,...,active_segment`

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StrataError};
use crate::index::{IndexKey, KeyKind};

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Signed 64-bit integer
    Int,

    /// Free text
    Str,
}

impl FieldType {
    /// Key ordering used when this field is the primary key
    pub fn key_kind(&self) -> KeyKind {
        match self {
            FieldType::Int => KeyKind::Int,
            FieldType::Str => KeyKind::Text,
        }
    }
}

impl FromStr for FieldType {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(FieldType::Int),
            "str" | "string" | "text" => Ok(FieldType::Str),
            other => Err(StrataError::InvalidField(format!(
                "unknown field type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => f.write_str("int"),
            FieldType::Str => f.write_str("str"),
        }
    }
}

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Schema of one record type plus its active segment pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
    /// 1-based ordinal of the primary key field
    pub primary_key: usize,
    /// File name of the segment receiving new records
    pub active_segment: String,
}

impl TypeSchema {
    /// Build and validate a schema
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDef>,
        primary_key: usize,
        active_segment: impl Into<String>,
    ) -> Result<Self> {
        let schema = Self {
            name: name.into(),
            fields,
            primary_key,
            active_segment: active_segment.into(),
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn primary_key_field(&self) -> &FieldDef {
        &self.fields[self.primary_key - 1]
    }

    pub fn key_kind(&self) -> KeyKind {
        self.primary_key_field().field_type.key_kind()
    }

    /// Parse the primary key out of a full set of field values
    pub fn primary_key_of<S: AsRef<str>>(&self, values: &[S]) -> Result<IndexKey> {
        let raw = values.get(self.primary_key - 1).ok_or(StrataError::SchemaMismatch {
            expected: self.field_count(),
            actual: values.len(),
        })?;
        self.key_kind().parse(raw.as_ref())
    }

    /// Check a record's values against the field count and declared types
    pub fn check_values<S: AsRef<str>>(&self, values: &[S]) -> Result<()> {
        if values.len() != self.field_count() {
            return Err(StrataError::SchemaMismatch {
                expected: self.field_count(),
                actual: values.len(),
            });
        }

        for (field, value) in self.fields.iter().zip(values) {
            let value = value.as_ref();
            if value.is_empty() || value.contains(',') || value.contains(char::is_whitespace) {
                return Err(StrataError::InvalidField(format!(
                    "value '{}' for field '{}' must be a non-empty token without commas",
                    value, field.name
                )));
            }
            if field == self.primary_key_field() && value.contains(['<', '>', '=']) {
                return Err(StrataError::InvalidField(format!(
                    "primary key '{}' may not contain '<', '>' or '='",
                    value
                )));
            }
            if field.field_type == FieldType::Int && value.parse::<i64>().is_err() {
                return Err(StrataError::InvalidField(format!(
                    "value '{}' for int field '{}' is not an integer",
                    value, field.name
                )));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.fields.is_empty() {
            return Err(StrataError::Catalog(format!(
                "type '{}' declares no fields",
                self.name
            )));
        }
        if self.primary_key == 0 || self.primary_key > self.fields.len() {
            return Err(StrataError::Catalog(format!(
                "primary key ordinal {} outside 1..={}",
                self.primary_key,
                self.fields.len()
            )));
        }
        for (i, field) in self.fields.iter().enumerate() {
            validate_name(&field.name)?;
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(StrataError::Catalog(format!(
                    "field '{}' declared twice in type '{}'",
                    field.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Serialize as one catalog line (no trailing newline)
    pub fn to_line(&self) -> String {
        let mut parts = vec![
            self.name.clone(),
            self.field_count().to_string(),
            self.primary_key.to_string(),
        ];
        for field in &self.fields {
            parts.push(field.name.clone());
            parts.push(field.field_type.to_string());
        }
        parts.push(self.active_segment.clone());
        parts.join(",")
    }

    /// Parse one catalog line
    pub fn from_line(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        if parts.len() < 4 {
            return Err(StrataError::Catalog(format!("truncated catalog line '{}'", line)));
        }

        let field_count: usize = parts[1]
            .parse()
            .map_err(|_| StrataError::Catalog(format!("bad field count in '{}'", line)))?;
        let primary_key: usize = parts[2]
            .parse()
            .map_err(|_| StrataError::Catalog(format!("bad key ordinal in '{}'", line)))?;

        if parts.len() != 3 + field_count * 2 + 1 {
            return Err(StrataError::Catalog(format!(
                "catalog line for '{}' declares {} fields but has {} columns",
                parts[0],
                field_count,
                parts.len()
            )));
        }

        let fields = parts[3..3 + field_count * 2]
            .chunks_exact(2)
            .map(|pair| -> Result<FieldDef> { Ok(FieldDef::new(pair[0], pair[1].parse()?)) })
            .collect::<Result<Vec<_>>>()?;

        Self::new(parts[0], fields, primary_key, parts[3 + field_count * 2])
    }
}

/// Type and field names: ASCII letters, digits, and '_', not starting with a digit
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StrataError::InvalidName(name.to_string()))
    }
}
