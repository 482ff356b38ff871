use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Missing, Result, TrackerError};
use crate::models::{Field, FieldValue, Fields, Record, RecordKind};

/// Flat-file store for all records of one kind.
///
/// Holds each record twice: as the raw field mapping read from or written to
/// the file, and as a typed [`Record`]. The typed records are the source of
/// truth; `save()` rebuilds the raw rows from them.
#[derive(Debug, Clone)]
pub struct RecordStore {
    kind: RecordKind,
    path: PathBuf,
    rows: Vec<Fields>,
    records: Vec<Record>,
}

impl RecordStore {
    /// Creates an empty store backed by `path`. Nothing is read until `load()`.
    pub fn new<P: AsRef<Path>>(kind: RecordKind, path: P) -> Self {
        Self {
            kind,
            path: path.as_ref().to_path_buf(),
            rows: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn projects<P: AsRef<Path>>(path: P) -> Self {
        Self::new(RecordKind::Project, path)
    }

    pub fn tasks<P: AsRef<Path>>(path: P) -> Self {
        Self::new(RecordKind::Task, path)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row of the backing file, replacing the in-memory contents.
    ///
    /// Fails with `NotFound` when the file is absent and with `Empty` when it
    /// holds no records. On failure the store is left empty.
    pub fn load(&mut self) -> Result<&[Record]> {
        self.rows.clear();
        self.records.clear();

        if !self.path.exists() {
            return Err(TrackerError::NotFound {
                kind: self.kind,
                missing: Missing::File(self.path.clone()),
            });
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row?;
            let fields: Fields = headers
                .iter()
                .zip(row.iter())
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect();
            rows.push(fields);
        }

        if rows.is_empty() {
            return Err(TrackerError::Empty {
                kind: self.kind,
                path: self.path.clone(),
            });
        }

        let records = rows
            .iter()
            .map(|fields| Record::from_fields(self.kind, fields))
            .collect::<Result<Vec<_>>>()?;

        debug!(kind = %self.kind, path = %self.path.display(), count = records.len(), "loaded records");
        self.rows = rows;
        self.records = records;
        Ok(&self.records)
    }

    /// Like `load()`, but an absent or empty file is just an empty store
    pub fn load_or_empty(&mut self) -> Result<&[Record]> {
        match self.load() {
            Ok(_) => {}
            Err(e) if e.is_absent() => {}
            Err(e) => return Err(e),
        }
        Ok(&self.records)
    }

    /// Writes all records to the backing file, header first.
    ///
    /// Creates the parent directory if needed. Fails with `NothingToSave` and
    /// leaves the file untouched when there are no records; use `truncate()`
    /// to empty the file on purpose.
    pub fn save(&mut self) -> Result<()> {
        self.rows = self.records.iter().map(Record::to_fields).collect();
        if self.rows.is_empty() {
            return Err(TrackerError::NothingToSave { kind: self.kind });
        }

        self.ensure_parent_dir()?;

        let columns = self.kind.columns();
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(columns.iter().map(|field| field.column()))?;
        for row in &self.rows {
            writer.write_record(
                columns
                    .iter()
                    .map(|field| row.get(field.column()).map(String::as_str).unwrap_or("")),
            )?;
        }
        writer.flush()?;

        debug!(kind = %self.kind, path = %self.path.display(), count = self.rows.len(), "saved records");
        Ok(())
    }

    /// Empties the backing file. A later `load()` reports `Empty`.
    pub fn truncate(&mut self) -> Result<()> {
        self.rows.clear();
        self.records.clear();
        self.ensure_parent_dir()?;
        fs::write(&self.path, "")?;
        debug!(kind = %self.kind, path = %self.path.display(), "truncated store");
        Ok(())
    }

    /// Saves, falling back to `truncate()` when the last record was removed
    pub fn save_or_truncate(&mut self) -> Result<()> {
        match self.save() {
            Err(TrackerError::NothingToSave { .. }) => self.truncate(),
            other => other,
        }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Raw field mappings as of the last load or save
    pub fn rows(&self) -> &[Fields] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a record in memory; call `save()` to persist it
    pub fn insert(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Record> {
        let id = id.trim();
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| self.missing_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Result<&mut Record> {
        let id = id.trim();
        match self.records.iter().position(|r| r.id == id) {
            Some(idx) => Ok(&mut self.records[idx]),
            None => Err(self.missing_id(id)),
        }
    }

    /// First record whose `field` contains `value`
    pub fn find_by_field_contains(&self, field: Field, value: &str) -> Result<&Record> {
        self.records
            .iter()
            .find(|r| r.field_contains(field, value))
            .ok_or_else(|| TrackerError::NotFound {
                kind: self.kind,
                missing: Missing::FieldValue {
                    field,
                    value: value.to_string(),
                },
            })
    }

    /// The project whose task list holds `task_id`
    pub fn find_project_by_task_id(&self, task_id: &str) -> Result<&Record> {
        self.find_by_field_contains(Field::TaskList, task_id)
    }

    /// The first task linked to `project_id`
    pub fn find_task_by_linked_project(&self, project_id: &str) -> Result<&Record> {
        self.find_by_field_contains(Field::LinkedProject, project_id)
    }

    /// Ids of every task linked to `project_id`
    pub fn tasks_linked_to(&self, project_id: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.linked_project() == Some(project_id))
            .map(|r| r.id.clone())
            .collect()
    }

    /// Removes a record from memory and returns it; call `save()` to persist
    pub fn remove(&mut self, id: &str) -> Result<Record> {
        let id = id.trim();
        match self.records.iter().position(|r| r.id == id) {
            Some(idx) => Ok(self.records.remove(idx)),
            None => Err(self.missing_id(id)),
        }
    }

    /// Every id that parses as a positive integer, ascending
    pub fn all_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .records
            .iter()
            .filter_map(|r| r.id.parse().ok())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Each record's value for `field`, skipping records that lack it
    pub fn all_values_of(&self, field: Field) -> Vec<FieldValue> {
        self.records
            .iter()
            .filter_map(|r| r.field_value(field))
            .collect()
    }

    /// Task ids listed by any project in this store
    pub fn claimed_task_ids(&self) -> Vec<String> {
        self.all_values_of(Field::TaskList)
            .into_iter()
            .flat_map(FieldValue::into_items)
            .collect()
    }

    fn missing_id(&self, id: &str) -> TrackerError {
        TrackerError::NotFound {
            kind: self.kind,
            missing: Missing::Id(id.to_string()),
        }
    }
}
