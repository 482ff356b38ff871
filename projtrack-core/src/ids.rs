//! Id allocation.
//!
//! Ids are the smallest positive integer not in use, so an id freed by a
//! deletion is handed out again before any larger one.

use crate::storage::RecordStore;

/// Smallest positive integer missing from `ids`
pub fn first_free_id(ids: &[u32]) -> u32 {
    let mut candidate = 1;
    while ids.contains(&candidate) {
        candidate += 1;
    }
    candidate
}

/// Next id for a record added to `store`
pub fn mint_id(store: &RecordStore) -> String {
    first_free_id(&store.all_ids()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, RecordKind};
    use chrono::NaiveDate;

    fn store_with(ids: &[&str]) -> RecordStore {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut store = RecordStore::projects("unused.csv");
        for id in ids {
            store.insert(Record::new(RecordKind::Project, *id, date));
        }
        store
    }

    #[test]
    fn test_mint_fills_gap() {
        assert_eq!(mint_id(&store_with(&["1", "3", "4"])), "2");
    }

    #[test]
    fn test_mint_empty_store() {
        assert_eq!(mint_id(&store_with(&[])), "1");
    }

    #[test]
    fn test_mint_after_contiguous_ids() {
        assert_eq!(mint_id(&store_with(&["2", "1", "3"])), "4");
    }

    #[test]
    fn test_mint_reuses_deleted_id() {
        let mut store = store_with(&["1", "2", "3"]);
        store.remove("2").unwrap();
        assert_eq!(mint_id(&store), "2");
    }

    #[test]
    fn test_mint_ignores_non_numeric_ids() {
        assert_eq!(mint_id(&store_with(&["abc", "1"])), "2");
    }
}
