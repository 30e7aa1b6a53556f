//! Engine Module
//!
//! The façade that coordinates the catalog, one B+ tree index per type, and
//! one page store per type.
//!
//! ## Responsibilities
//! - Type lifecycle: create, delete, list
//! - Record CRUD: every write touches the page store first, then the index
//! - Keep the catalog's active segment pointers current across rollovers
//! - Load index snapshots at startup and persist them at checkpoint/close

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, FieldDef, TypeSchema};
use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::index::{BPlusTree, IndexKey, IndexSnapshot, TreeStats};
use crate::protocol::{Command, CompareOp, Predicate, Response};
use crate::storage::{segment, Address, PageStore, RecordCodec, SegmentLayout};

/// Index type used for every record type
pub type RecordIndex = BPlusTree<IndexKey, Address>;

/// Per-type runtime state
struct TypeEntry {
    schema: TypeSchema,
    index: RecordIndex,
    store: PageStore,
    codec: RecordCodec,
}

impl TypeEntry {
    fn read_record(&self, address: &Address) -> Result<Vec<String>> {
        let block = self.store.read(address)?;
        self.codec.decode(&block)
    }

    /// Validate `values` and return the primary key exactly as it will be stored
    ///
    /// An over-length key is refused whatever the overflow policy, so no two
    /// records can share a truncated key.
    fn record_key<S: AsRef<str>>(&self, values: &[S]) -> Result<IndexKey> {
        self.schema.check_values(values)?;
        let raw = values[self.schema.primary_key - 1].as_ref();
        let width = self.codec.field_width();
        if raw.len() > width {
            return Err(StrataError::FieldTooLong {
                field: raw.to_string(),
                width,
            });
        }
        self.schema.primary_key_of(values)
    }
}

/// The main database engine
///
/// Single-threaded: every operation runs to completion before the next
/// begins, and segment files are opened only for the span of one call.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Catalog file handle
    catalog: Catalog,

    /// Registry of open types, keyed by type name
    types: BTreeMap<String, TypeEntry>,
}

impl Engine {
    const INDEX_EXTENSION: &'static str = "idx";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data, segment and index directories
    /// 2. Load the catalog
    /// 3. Open every type's page store at its active segment
    /// 4. Rebuild every type's index from its snapshot
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir)?;
        fs::create_dir_all(config.segment_dir())?;
        fs::create_dir_all(config.index_dir())?;

        let catalog = Catalog::new(config.catalog_path());
        let mut types = BTreeMap::new();

        for schema in catalog.load()? {
            let entry = Self::open_type(&config, schema)?;
            types.insert(entry.schema.name.clone(), entry);
        }

        info!(
            data_dir = %config.data_dir.display(),
            types = types.len(),
            "engine opened"
        );

        Ok(Self {
            config,
            catalog,
            types,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.data_dir = path.to_path_buf();
        Self::open(config)
    }

    fn open_type(config: &Config, schema: TypeSchema) -> Result<TypeEntry> {
        let layout = Self::layout_for(config, schema.field_count())?;
        let store = PageStore::open(
            &config.segment_dir(),
            &schema.name,
            layout,
            &schema.active_segment,
        )?;

        let snapshot_path = Self::snapshot_path_in(config, &schema.name);
        let index: RecordIndex = if snapshot_path.exists() {
            let index: RecordIndex = IndexSnapshot::load(&snapshot_path, config.effective_fanout())?;
            let kind = schema.key_kind();
            if let Some(key) = index.iter().map(|(k, _)| k).find(|k| k.kind() != kind) {
                return Err(StrataError::Snapshot(format!(
                    "key {} in snapshot of '{}' is not of kind {:?}",
                    key, schema.name, kind
                )));
            }
            info!(type_name = %schema.name, records = index.len(), "index loaded");
            index
        } else {
            warn!(type_name = %schema.name, "no index snapshot, starting empty");
            BPlusTree::new(config.effective_fanout())
        };

        let codec = RecordCodec::new(
            schema.field_count(),
            config.field_width,
            config.overflow_policy,
        );

        Ok(TypeEntry {
            schema,
            index,
            store,
            codec,
        })
    }

    fn layout_for(config: &Config, field_count: usize) -> Result<SegmentLayout> {
        SegmentLayout::new(
            config.page_size,
            config.pages_per_segment,
            field_count,
            config.field_width,
        )
    }

    // =========================================================================
    // Type Operations
    // =========================================================================

    /// Register a new type with `primary_key` as the 1-based key ordinal
    ///
    /// Returns `Ok(false)` if the type already exists.
    pub fn create_type(
        &mut self,
        name: &str,
        primary_key: usize,
        fields: Vec<FieldDef>,
    ) -> Result<bool> {
        if self.types.contains_key(name) {
            return Ok(false);
        }

        let schema = TypeSchema::new(name, fields, primary_key, segment::segment_name(name, 1))?;
        let layout = Self::layout_for(&self.config, schema.field_count())?;
        let store = PageStore::create(&self.config.segment_dir(), name, layout)?;
        let index: RecordIndex = BPlusTree::new(self.config.effective_fanout());
        IndexSnapshot::write(&self.snapshot_path(name), &index)?;

        let codec = RecordCodec::new(
            schema.field_count(),
            self.config.field_width,
            self.config.overflow_policy,
        );

        self.types.insert(
            name.to_string(),
            TypeEntry {
                schema,
                index,
                store,
                codec,
            },
        );
        self.save_catalog()?;

        info!(type_name = %name, "type created");
        Ok(true)
    }

    /// Drop a type with its segments, snapshot and catalog line
    ///
    /// Returns `Ok(false)` if the type does not exist.
    pub fn delete_type(&mut self, name: &str) -> Result<bool> {
        let Some(entry) = self.types.remove(name) else {
            return Ok(false);
        };

        let removed = entry.store.destroy()?;
        let snapshot_path = self.snapshot_path(name);
        if snapshot_path.exists() {
            fs::remove_file(&snapshot_path)?;
        }
        self.save_catalog()?;

        info!(type_name = %name, segments = removed, "type deleted");
        Ok(true)
    }

    /// Names of all registered types, sorted
    pub fn list_types(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Store a new record
    ///
    /// Returns `Ok(false)` for an unknown type or a duplicate primary key;
    /// nothing is written in either case.
    pub fn create_record<S: AsRef<str>>(&mut self, type_name: &str, values: &[S]) -> Result<bool> {
        let Some(entry) = self.types.get_mut(type_name) else {
            return Ok(false);
        };

        let key = entry.record_key(values)?;
        if entry.index.contains_key(&key) {
            debug!(type_name, key = %key, "duplicate key rejected");
            return Ok(false);
        }

        let record = entry.codec.encode(values)?;
        let address = entry.store.allocate(&record)?;
        entry.index.insert(key, address);

        if entry.store.active_segment() != entry.schema.active_segment {
            entry.schema.active_segment = entry.store.active_segment().to_string();
            self.save_catalog()?;
        }
        Ok(true)
    }

    /// Remove the record with primary key `key`
    ///
    /// Returns `Ok(false)` if the type or key does not exist.
    pub fn delete_record(&mut self, type_name: &str, key: &str) -> Result<bool> {
        let Some(entry) = self.types.get_mut(type_name) else {
            return Ok(false);
        };
        let Ok(key) = entry.schema.key_kind().parse(key) else {
            return Ok(false);
        };
        let Some(address) = entry.index.query(&key).cloned() else {
            return Ok(false);
        };

        entry.store.free(&address)?;
        entry.index.delete(&key);
        Ok(true)
    }

    /// Overwrite the record with primary key `key` in place
    ///
    /// The key field of `values` must equal `key`.
    pub fn update_record<S: AsRef<str>>(
        &mut self,
        type_name: &str,
        key: &str,
        values: &[S],
    ) -> Result<bool> {
        let Some(entry) = self.types.get(type_name) else {
            return Ok(false);
        };
        let Ok(key) = entry.schema.key_kind().parse(key) else {
            return Ok(false);
        };
        let Some(address) = entry.index.query(&key) else {
            return Ok(false);
        };

        let new_key = entry.record_key(values)?;
        if new_key != key {
            return Err(StrataError::InvalidField(format!(
                "update of {} cannot change primary key '{}' to {}",
                key,
                entry.schema.primary_key_field().name,
                new_key
            )));
        }

        let record = entry.codec.encode(values)?;
        entry.store.write(address, &record)?;
        Ok(true)
    }

    /// Fetch one record's field values
    pub fn search_record(&self, type_name: &str, key: &str) -> Result<Option<Vec<String>>> {
        let Some(entry) = self.types.get(type_name) else {
            return Ok(None);
        };
        let Ok(key) = entry.schema.key_kind().parse(key) else {
            return Ok(None);
        };
        match entry.index.query(&key) {
            Some(address) => Ok(Some(entry.read_record(address)?)),
            None => Ok(None),
        }
    }

    /// All records of a type in ascending key order, `None` if unknown
    pub fn list_records(&self, type_name: &str) -> Result<Option<Vec<Vec<String>>>> {
        let Some(entry) = self.types.get(type_name) else {
            return Ok(None);
        };
        let records = entry
            .index
            .iter()
            .map(|(_, address)| entry.read_record(address))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(records))
    }

    /// Records whose primary key satisfies `predicate`, ascending
    ///
    /// The predicate must name the primary key on one side; `None` means the
    /// type is unknown.
    pub fn filter_records(
        &self,
        type_name: &str,
        predicate: &Predicate,
    ) -> Result<Option<Vec<Vec<String>>>> {
        let Some(entry) = self.types.get(type_name) else {
            return Ok(None);
        };

        let key_field = &entry.schema.primary_key_field().name;
        let (op, literal) = predicate.resolve(key_field).ok_or_else(|| {
            StrataError::InvalidField(format!(
                "filter '{}' does not compare primary key '{}'",
                predicate, key_field
            ))
        })?;
        let bound = entry.schema.key_kind().parse(literal)?;

        let mut records = Vec::new();
        for (key, address) in entry.index.iter() {
            let ordering = key.cmp(&bound);
            if op.holds(ordering) {
                records.push(entry.read_record(address)?);
            } else if op != CompareOp::Greater && ordering.is_ge() {
                // Keys only grow along the leaf chain
                break;
            }
        }
        Ok(Some(records))
    }

    // =========================================================================
    // Command Dispatch
    // =========================================================================

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers and shapes their output lines.
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        match command {
            Command::CreateType {
                name,
                primary_key,
                fields,
            } => Ok(Response::from_bool(self.create_type(&name, primary_key, fields)?)),
            Command::DeleteType { name } => Ok(Response::from_bool(self.delete_type(&name)?)),
            Command::ListTypes => {
                let names = self.list_types();
                if names.is_empty() {
                    Ok(Response::failure())
                } else {
                    Ok(Response::success(names))
                }
            }
            Command::CreateRecord { type_name, values } => {
                Ok(Response::from_bool(self.create_record(&type_name, &values)?))
            }
            Command::DeleteRecord { type_name, key } => {
                Ok(Response::from_bool(self.delete_record(&type_name, &key)?))
            }
            Command::UpdateRecord {
                type_name,
                key,
                values,
            } => Ok(Response::from_bool(
                self.update_record(&type_name, &key, &values)?,
            )),
            Command::SearchRecord { type_name, key } => {
                match self.search_record(&type_name, &key)? {
                    Some(values) => Ok(Response::success(vec![values.join(" ")])),
                    None => Ok(Response::failure()),
                }
            }
            Command::ListRecords { type_name } => match self.list_records(&type_name)? {
                Some(records) if !records.is_empty() => Ok(Response::success(join_rows(records))),
                _ => Ok(Response::failure()),
            },
            Command::FilterRecords {
                type_name,
                predicate,
            } => match self.filter_records(&type_name, &predicate)? {
                Some(records) => Ok(Response::success(join_rows(records))),
                None => Ok(Response::failure()),
            },
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persist every index snapshot and the catalog
    pub fn checkpoint(&self) -> Result<()> {
        let mut records = 0;
        for (name, entry) in &self.types {
            records += IndexSnapshot::write(&self.snapshot_path(name), &entry.index)?;
        }
        self.save_catalog()?;
        info!(types = self.types.len(), records, "checkpoint written");
        Ok(())
    }

    /// Close the engine gracefully
    pub fn close(self) -> Result<()> {
        self.checkpoint()?;
        info!("engine closed");
        Ok(())
    }

    fn save_catalog(&self) -> Result<()> {
        self.catalog.save(self.types.values().map(|entry| &entry.schema))
    }

    fn snapshot_path(&self, type_name: &str) -> PathBuf {
        Self::snapshot_path_in(&self.config, type_name)
    }

    fn snapshot_path_in(config: &Config, type_name: &str) -> PathBuf {
        config
            .index_dir()
            .join(format!("{}.{}", type_name, Self::INDEX_EXTENSION))
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Schema of a registered type
    pub fn schema(&self, type_name: &str) -> Option<&TypeSchema> {
        self.types.get(type_name).map(|entry| &entry.schema)
    }

    /// Index of a registered type
    pub fn tree(&self, type_name: &str) -> Option<&RecordIndex> {
        self.types.get(type_name).map(|entry| &entry.index)
    }

    /// Structural counters of a type's index
    pub fn stats(&self, type_name: &str) -> Option<TreeStats> {
        self.types.get(type_name).map(|entry| entry.index.stats())
    }

    /// Storage address of the record with primary key `key`
    pub fn address_of(&self, type_name: &str, key: &str) -> Option<Address> {
        let entry = self.types.get(type_name)?;
        let key = entry.schema.key_kind().parse(key).ok()?;
        entry.index.query(&key).cloned()
    }

    /// Number of registered types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

fn join_rows(records: Vec<Vec<String>>) -> Vec<String> {
    records.into_iter().map(|values| values.join(" ")).collect()
}
