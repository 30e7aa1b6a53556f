//! Command definitions
//!
//! One command per script line. Keywords are case-insensitive; operands are
//! whitespace-separated tokens.

use std::str::FromStr;

use crate::catalog::FieldDef;
use crate::error::{Result, StrataError};

use super::predicate::Predicate;

/// Command kinds, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    CreateType,
    DeleteType,
    ListTypes,
    CreateRecord,
    DeleteRecord,
    UpdateRecord,
    SearchRecord,
    ListRecords,
    FilterRecords,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `CREATE TYPE <name> <field_count> <pk_ordinal> <field> <type> ...`
    CreateType {
        name: String,
        primary_key: usize,
        fields: Vec<FieldDef>,
    },

    /// `DELETE TYPE <name>`
    DeleteType { name: String },

    /// `LIST TYPE`
    ListTypes,

    /// `CREATE RECORD <type> <value> ...`
    CreateRecord { type_name: String, values: Vec<String> },

    /// `DELETE RECORD <type> <pk>`
    DeleteRecord { type_name: String, key: String },

    /// `UPDATE RECORD <type> <pk> <value> ...`
    UpdateRecord {
        type_name: String,
        key: String,
        values: Vec<String>,
    },

    /// `SEARCH RECORD <type> <pk>`
    SearchRecord { type_name: String, key: String },

    /// `LIST RECORD <type>`
    ListRecords { type_name: String },

    /// `FILTER RECORD <type> <predicate>`
    FilterRecords { type_name: String, predicate: Predicate },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::CreateType { .. } => CommandType::CreateType,
            Command::DeleteType { .. } => CommandType::DeleteType,
            Command::ListTypes => CommandType::ListTypes,
            Command::CreateRecord { .. } => CommandType::CreateRecord,
            Command::DeleteRecord { .. } => CommandType::DeleteRecord,
            Command::UpdateRecord { .. } => CommandType::UpdateRecord,
            Command::SearchRecord { .. } => CommandType::SearchRecord,
            Command::ListRecords { .. } => CommandType::ListRecords,
            Command::FilterRecords { .. } => CommandType::FilterRecords,
        }
    }

    /// Parse one script line
    pub fn parse(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.len() < 2 {
            return Err(StrataError::Parse(format!("incomplete command '{}'", line.trim())));
        }

        let verb = words[0].to_ascii_uppercase();
        let noun = words[1].to_ascii_uppercase();
        let args = &words[2..];

        match (verb.as_str(), noun.as_str()) {
            ("CREATE", "TYPE") => parse_create_type(args),
            ("DELETE", "TYPE") => {
                let [name] = exact::<1>(args, "DELETE TYPE <name>")?;
                Ok(Command::DeleteType { name: name.to_string() })
            }
            ("LIST", "TYPE") => {
                let [] = exact::<0>(args, "LIST TYPE")?;
                Ok(Command::ListTypes)
            }
            ("CREATE", "RECORD") => {
                let (type_name, values) = split_first(args, "CREATE RECORD <type> <values...>")?;
                Ok(Command::CreateRecord { type_name, values })
            }
            ("DELETE", "RECORD") => {
                let [type_name, key] = exact::<2>(args, "DELETE RECORD <type> <pk>")?;
                Ok(Command::DeleteRecord {
                    type_name: type_name.to_string(),
                    key: key.to_string(),
                })
            }
            ("UPDATE", "RECORD") => {
                if args.len() < 3 {
                    return Err(usage("UPDATE RECORD <type> <pk> <values...>"));
                }
                Ok(Command::UpdateRecord {
                    type_name: args[0].to_string(),
                    key: args[1].to_string(),
                    values: owned(&args[2..]),
                })
            }
            ("SEARCH", "RECORD") => {
                let [type_name, key] = exact::<2>(args, "SEARCH RECORD <type> <pk>")?;
                Ok(Command::SearchRecord {
                    type_name: type_name.to_string(),
                    key: key.to_string(),
                })
            }
            ("LIST", "RECORD") => {
                let [type_name] = exact::<1>(args, "LIST RECORD <type>")?;
                Ok(Command::ListRecords {
                    type_name: type_name.to_string(),
                })
            }
            ("FILTER", "RECORD") => {
                let (type_name, rest) = split_first(args, "FILTER RECORD <type> <predicate>")?;
                if rest.is_empty() {
                    return Err(usage("FILTER RECORD <type> <predicate>"));
                }
                // "id > 5" and "id>5" both parse
                let predicate = rest.concat().parse()?;
                Ok(Command::FilterRecords { type_name, predicate })
            }
            _ => Err(StrataError::Parse(format!(
                "unknown command '{} {}'",
                words[0], words[1]
            ))),
        }
    }
}

impl FromStr for Command {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        Command::parse(s)
    }
}

fn parse_create_type(args: &[&str]) -> Result<Command> {
    const USAGE: &str = "CREATE TYPE <name> <field_count> <pk_ordinal> <field> <type> ...";
    if args.len() < 3 {
        return Err(usage(USAGE));
    }

    let name = args[0].to_string();
    let field_count: usize = args[1]
        .parse()
        .map_err(|_| StrataError::Parse(format!("bad field count '{}'", args[1])))?;
    let primary_key: usize = args[2]
        .parse()
        .map_err(|_| StrataError::Parse(format!("bad primary key ordinal '{}'", args[2])))?;

    let defs = &args[3..];
    if defs.len() != field_count * 2 {
        return Err(StrataError::Parse(format!(
            "type '{}' declares {} fields but lists {} name/type tokens",
            name,
            field_count,
            defs.len()
        )));
    }

    let fields = defs
        .chunks_exact(2)
        .map(|pair| -> Result<FieldDef> { Ok(FieldDef::new(pair[0], pair[1].parse()?)) })
        .collect::<Result<Vec<_>>>()?;

    Ok(Command::CreateType {
        name,
        primary_key,
        fields,
    })
}

fn exact<'a, const N: usize>(args: &[&'a str], form: &str) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| usage(form))
}

fn split_first(args: &[&str], form: &str) -> Result<(String, Vec<String>)> {
    match args.split_first() {
        Some((first, rest)) => Ok((first.to_string(), owned(rest))),
        None => Err(usage(form)),
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

fn usage(form: &str) -> StrataError {
    StrataError::Parse(format!("usage: {}", form))
}
