use crate::domain::suggestion::SuggestionRecord;
use std::collections::HashSet;

/// Combines batches in the given priority order, keeping the first record seen
/// for each dedup key and dropping records whose key is empty.
pub fn merge<I>(batches: I) -> Vec<SuggestionRecord>
where
    I: IntoIterator<Item = Vec<SuggestionRecord>>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for batch in batches {
        for record in batch {
            let key = record.dedup_key();
            if key.is_empty() {
                continue;
            }
            if seen.insert(key) {
                out.push(record);
            }
        }
    }
    out
}

/// Appends `incoming` to an accumulated result set, e.g. for "fetch more".
pub fn extend(
    accumulated: Vec<SuggestionRecord>,
    incoming: Vec<SuggestionRecord>,
) -> Vec<SuggestionRecord> {
    merge([accumulated, incoming])
}
