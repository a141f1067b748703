use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use roster_core::document::{self, Records};
use roster_core::record::check_grade;
use roster_core::{DocumentError, PersistenceError, Record, RecordPatch, SchemaError, StoreError};
use tracing::{debug, info};

use crate::atomic::atomic_write;

/// Student records kept in memory and mirrored to a JSON file.
///
/// The file is read once when the store is opened. Every successful
/// mutation rewrites the whole file before returning, so the in-memory
/// records always match the last successful save. A mutation whose save
/// fails is rolled back in memory before the error is returned.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    records: Records,
}

impl Store {
    /// Open the store at `path`, loading existing records if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self::empty(path);
        store.load()?;
        Ok(store)
    }

    /// A store bound to `path` without reading it.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Records::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace in-memory records with the file contents.
    ///
    /// A missing file yields an empty store. Records are left untouched on error.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file, starting empty");
                self.records.clear();
                return Ok(());
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };

        self.records = document::parse(&content).map_err(|e| match e {
            DocumentError::Json(source) => StoreError::Persistence(PersistenceError::Decode {
                path: self.path.clone(),
                source,
            }),
            DocumentError::Schema(source) => StoreError::Schema {
                path: self.path.clone(),
                source,
            },
        })?;
        debug!(path = %self.path.display(), records = self.records.len(), "loaded store");
        Ok(())
    }

    /// Overwrite the file with every record.
    pub fn save(&self) -> Result<(), StoreError> {
        let text = document::render(&self.records).map_err(|source| PersistenceError::Encode {
            path: self.path.clone(),
            source,
        })?;
        atomic_write(&self.path, text.as_bytes())?;
        debug!(path = %self.path.display(), records = self.records.len(), "saved store");
        Ok(())
    }

    /// Insert a new record. Returns `false` without touching anything if `id` exists.
    ///
    /// A NaN or infinite grade is refused before anything changes.
    pub fn add(&mut self, id: &str, name: &str, grade: f64) -> Result<bool, StoreError> {
        if self.records.contains_key(id) {
            return Ok(false);
        }
        check_grade(grade).map_err(|source| self.schema_error(source))?;
        self.records.insert(id.to_string(), Record::new(id, name, grade));

        if let Err(e) = self.save() {
            self.records.shift_remove(id);
            return Err(e);
        }
        info!(id, "added student");
        Ok(true)
    }

    /// Overwrite the fields `patch` supplies. Returns `false` if `id` is absent.
    pub fn update(&mut self, id: &str, patch: RecordPatch) -> Result<bool, StoreError> {
        if !self.records.contains_key(id) {
            return Ok(false);
        }
        if let Some(grade) = patch.grade {
            check_grade(grade).map_err(|source| self.schema_error(source))?;
        }
        let Some(record) = self.records.get_mut(id) else {
            return Ok(false);
        };
        let previous = record.clone();
        record.apply(patch);

        if let Err(e) = self.save() {
            if let Some(record) = self.records.get_mut(id) {
                *record = previous;
            }
            return Err(e);
        }
        info!(id, "updated student");
        Ok(true)
    }

    /// Remove a record. Returns `false` if `id` is absent.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some((index, key, record)) = self.records.shift_remove_full(id) else {
            return Ok(false);
        };

        if let Err(e) = self.save() {
            self.records.shift_insert(index, key, record);
            return Err(e);
        }
        info!(id, "deleted student");
        Ok(true)
    }

    /// Snapshot of all records in insertion order.
    pub fn list(&self) -> Vec<Record> {
        self.records.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn schema_error(&self, source: SchemaError) -> StoreError {
        StoreError::Schema {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("students.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_missing_file_is_empty() {
        let (dir, store) = temp_store();
        assert!(store.is_empty());
        assert!(!dir.path().join("students.json").exists());
    }

    #[test]
    fn add_then_duplicate_keeps_original() {
        let (_dir, mut store) = temp_store();
        assert!(store.add("S1", "Ann", 8.5).unwrap());
        assert!(!store.add("S1", "Bob", 9.0).unwrap());
        assert_eq!(store.list(), vec![Record::new("S1", "Ann", 8.5)]);
    }

    #[test]
    fn add_persists_immediately() {
        let (dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        let reopened = Store::open(dir.path().join("students.json")).unwrap();
        assert_eq!(reopened.get("S1"), Some(&Record::new("S1", "Ann", 8.5)));
    }

    #[test]
    fn update_grade_only_keeps_name() {
        let (_dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        assert!(store.update("S1", RecordPatch::new().grade(9.5)).unwrap());
        assert_eq!(store.list(), vec![Record::new("S1", "Ann", 9.5)]);
    }

    #[test]
    fn update_name_only_keeps_grade() {
        let (_dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        assert!(store.update("S1", RecordPatch::new().name("Anne")).unwrap());
        assert_eq!(store.get("S1"), Some(&Record::new("S1", "Anne", 8.5)));
    }

    #[test]
    fn update_to_empty_name_is_honored() {
        let (dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        assert!(store.update("S1", RecordPatch::new().name("")).unwrap());
        let reopened = Store::open(dir.path().join("students.json")).unwrap();
        assert_eq!(reopened.get("S1").unwrap().name, "");
    }

    #[test]
    fn update_absent_returns_false() {
        let (dir, mut store) = temp_store();
        assert!(!store.update("S9", RecordPatch::new().grade(1.0)).unwrap());
        assert!(!dir.path().join("students.json").exists());
    }

    #[test]
    fn delete_twice() {
        let (_dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        assert!(store.delete("S1").unwrap());
        assert!(!store.delete("S1").unwrap());
        assert!(store.list().is_empty());
    }

    #[test]
    fn delete_absent_mutates_nothing() {
        let (dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        let before = std::fs::read_to_string(dir.path().join("students.json")).unwrap();
        assert!(!store.delete("S2").unwrap());
        let after = std::fs::read_to_string(dir.path().join("students.json")).unwrap();
        assert_eq!(before, after);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insertion_order_survives_delete_and_reload() {
        let (dir, mut store) = temp_store();
        for (id, name) in [("C", "Cy"), ("A", "Al"), ("B", "Bea")] {
            store.add(id, name, 5.0).unwrap();
        }
        store.delete("A").unwrap();
        store.add("D", "Di", 6.0).unwrap();

        let reopened = Store::open(dir.path().join("students.json")).unwrap();
        let ids: Vec<_> = reopened.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["C", "B", "D"]);
    }

    #[test]
    fn save_then_load_round_trips() {
        let (dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        store.add("S2", "Bob", -3.0).unwrap();
        store.add("S3", "Cy", 1e6).unwrap();
        store.save().unwrap();

        let mut fresh = Store::empty(dir.path().join("students.json"));
        fresh.load().unwrap();
        assert_eq!(fresh.list(), store.list());
    }

    #[test]
    fn file_is_pretty_printed() {
        let (dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        let text = std::fs::read_to_string(dir.path().join("students.json")).unwrap();
        assert!(text.starts_with("{\n  \"S1\": {\n    \"id\": \"S1\""));
    }

    #[test]
    fn malformed_json_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Store::open(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Persistence(PersistenceError::Decode { .. })
        ));
    }

    #[test]
    fn missing_field_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.json");
        std::fs::write(&path, r#"{"S1": {"id": "S1", "name": "Ann"}}"#).unwrap();
        let err = Store::open(&path).unwrap_err();
        let StoreError::Schema { source, .. } = err else {
            panic!("expected schema error, got {err:?}");
        };
        assert!(matches!(source, SchemaError::InRecord { .. }));
    }

    #[test]
    fn unreadable_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.json");
        std::fs::create_dir(&path).unwrap();
        let err = Store::open(&path).unwrap_err();
        assert!(
            matches!(err, StoreError::Persistence(PersistenceError::Read { .. })),
            "expected read error, got {err:?}"
        );
    }

    #[test]
    fn add_rejects_nan_grade() {
        let (dir, mut store) = temp_store();
        let err = store.add("S1", "Ann", f64::NAN).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Schema {
                source: SchemaError::InvalidField { field: "grade", .. },
                ..
            }
        ));
        assert!(store.is_empty());
        assert!(!dir.path().join("students.json").exists());
    }

    #[test]
    fn update_rejects_infinite_grade() {
        let (dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        let path = dir.path().join("students.json");
        let before = std::fs::read_to_string(&path).unwrap();

        let patch = RecordPatch::new().name("Anne").grade(f64::INFINITY);
        assert!(store.update("S1", patch).is_err());
        assert_eq!(store.get("S1"), Some(&Record::new("S1", "Ann", 8.5)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.list(), store.list());
    }

    #[test]
    fn update_absent_with_bad_grade_returns_false() {
        let (_dir, mut store) = temp_store();
        assert!(!store.update("S9", RecordPatch::new().grade(f64::NAN)).unwrap());
    }

    #[test]
    fn failed_load_keeps_records() {
        let (dir, mut store) = temp_store();
        store.add("S1", "Ann", 8.5).unwrap();
        std::fs::write(dir.path().join("students.json"), "[").unwrap();
        assert!(store.load().is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failed_save_rolls_back_add() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::empty(dir.path().join("gone").join("students.json"));
        let err = store.add("S1", "Ann", 8.5).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn failed_save_rolls_back_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let mut store = Store::open(data_dir.join("students.json")).unwrap();
        store.add("S1", "Ann", 8.5).unwrap();
        store.add("S2", "Bob", 7.0).unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();

        assert!(store.update("S1", RecordPatch::new().grade(1.0)).is_err());
        assert_eq!(store.get("S1"), Some(&Record::new("S1", "Ann", 8.5)));

        assert!(store.delete("S1").is_err());
        let ids: Vec<_> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["S1", "S2"]);
    }
}
