use crate::types::Record;

use super::StoreError;

/// Persistent keyed collection of [`Record`]s with insert-if-absent writes.
///
/// Implementations serialize writers internally; callers may share one instance across
/// any number of concurrent cycles.
pub trait Store {
    /// Insert `record` unless its id is already present. Returns whether a row was inserted.
    fn upsert_one(&self, record: &Record) -> Result<bool, StoreError>;

    /// Insert every absent record in order and return how many rows were added.
    ///
    /// Not atomic: on error, rows inserted before the failing record stay committed.
    fn upsert_batch(&self, records: &[Record]) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for record in records {
            if self.upsert_one(record)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn get(&self, id: i64) -> Result<Option<Record>, StoreError>;

    /// All records ordered by id.
    fn list(&self) -> Result<Vec<Record>, StoreError>;

    fn count(&self) -> Result<u64, StoreError>;

    /// Manual insertion with a store-assigned id.
    fn insert_new(&self, user_id: i64, title: &str, body: &str) -> Result<i64, StoreError>;

    fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Minimal in-memory store to check the default batch behaviour.
    struct MapStore {
        rows: Mutex<BTreeMap<i64, Record>>,
        fail_on: Option<i64>,
    }

    impl Store for MapStore {
        fn upsert_one(&self, record: &Record) -> Result<bool, StoreError> {
            if self.fail_on == Some(record.id) {
                return Err(StoreError::Write("disk full".into()));
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&record.id) {
                return Ok(false);
            }
            rows.insert(record.id, record.clone());
            Ok(true)
        }

        fn get(&self, id: i64) -> Result<Option<Record>, StoreError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        fn list(&self) -> Result<Vec<Record>, StoreError> {
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        fn count(&self) -> Result<u64, StoreError> {
            Ok(self.rows.lock().unwrap().len() as u64)
        }

        fn insert_new(&self, _user_id: i64, _title: &str, _body: &str) -> Result<i64, StoreError> {
            unimplemented!()
        }

        fn delete(&self, _id: i64) -> Result<bool, StoreError> {
            unimplemented!()
        }
    }

    #[test]
    fn upsert_batch_counts_only_new_rows() {
        let store = MapStore {
            rows: Mutex::new(BTreeMap::new()),
            fail_on: None,
        };
        store.upsert_one(&Record::new(2, 1, "OLD", "")).unwrap();

        let batch = vec![
            Record::new(1, 1, "a", ""),
            Record::new(2, 1, "NEW", ""),
            Record::new(1, 1, "dup", ""),
        ];
        assert_eq!(store.upsert_batch(&batch).unwrap(), 1);
        assert_eq!(store.get(2).unwrap().unwrap().title, "OLD");
        assert_eq!(store.get(1).unwrap().unwrap().title, "a");
    }

    #[test]
    fn upsert_batch_keeps_rows_written_before_a_failure() {
        let store = MapStore {
            rows: Mutex::new(BTreeMap::new()),
            fail_on: Some(3),
        };
        let batch = vec![
            Record::new(1, 1, "a", ""),
            Record::new(2, 1, "b", ""),
            Record::new(3, 1, "c", ""),
            Record::new(4, 1, "d", ""),
        ];
        let err = store.upsert_batch(&batch).unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
        assert_eq!(store.count().unwrap(), 2);
    }
}
