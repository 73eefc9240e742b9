//! Inventor and assignee aggregation.
//!
//! Names are compared by exact string equality. "Acme Corp" and
//! "ACME Corp" are counted separately; this is a known limitation.

use crate::models::{AggregateSummary, PatentRecord, RankedName};
use std::collections::HashMap;

/// Count every name, ordered by descending count with ties kept in
/// first-appearance order. Nothing is truncated.
pub fn count_table<'a, I>(names: I) -> Vec<RankedName>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut table: Vec<RankedName> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for name in names {
        match index.get(name) {
            Some(&pos) => table[pos].count += 1,
            None => {
                index.insert(name, table.len());
                table.push(RankedName::new(name, 1));
            }
        }
    }

    // sort_by_key is stable, which preserves first-seen order among ties
    table.sort_by_key(|entry| std::cmp::Reverse(entry.count));
    table
}

/// The `n` most frequent names.
pub fn top_names<'a, I>(names: I, n: usize) -> Vec<RankedName>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut table = count_table(names);
    table.truncate(n);
    table
}

/// All inventor mentions across records, in record order.
pub fn inventor_mentions(records: &[PatentRecord]) -> impl Iterator<Item = &str> {
    records
        .iter()
        .flat_map(|r| r.inventors.iter().map(String::as_str))
}

/// All assignee mentions across records, in record order.
pub fn assignee_mentions(records: &[PatentRecord]) -> impl Iterator<Item = &str> {
    records
        .iter()
        .flat_map(|r| r.assignees.iter().map(String::as_str))
}

/// Compute the top inventors and assignees across a record set.
pub fn summarize(records: &[PatentRecord], top_n: usize) -> AggregateSummary {
    AggregateSummary {
        top_inventors: top_names(inventor_mentions(records), top_n),
        top_assignees: top_names(assignee_mentions(records), top_n),
    }
}
