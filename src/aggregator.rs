//! Post-processes one processing cycle's flat record list, merging
//! leaf-granularity updates that belong to the same logical row.
//!
//! Aggregation is stable (the first record for a key establishes the
//! output slot) and idempotent (P4): running the output back through
//! `aggregate` is a no-op, since every slot's fields are already the
//! "last non-zero" value and merging a record into itself changes nothing.

use crate::record::AnyRecord;

pub fn aggregate(records: Vec<AnyRecord>) -> Vec<AnyRecord> {
    let mut slots: Vec<AnyRecord> = Vec::with_capacity(records.len());
    // Keyed by (table_name, aggregation key) -> slot index. A linear scan
    // rather than a hash map, since the key embeds `Value::F64` fields
    // which have no total `Eq`/`Hash` impl; batches are small enough
    // (hundreds of records) that this costs nothing in practice.
    let mut keys: Vec<(&'static str, Vec<crate::record::Value>, usize)> = Vec::new();

    for record in records {
        if !record.aggregates() {
            slots.push(record);
            continue;
        }

        let key = (record.table_name(), record.aggregation_key());
        match keys.iter().find(|(name, k, _)| *name == key.0 && *k == key.1) {
            Some(&(_, _, idx)) => slots[idx].merge_from(&record),
            None => {
                let idx = slots.len();
                slots.push(record);
                keys.push((key.0, key.1, idx));
            }
        }
    }

    slots
}
