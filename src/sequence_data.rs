//! Batch configuration carried in the `title` of a `.formish-sequencedata`
//! holder, e.g. `batch_add_count=2,min_start_fields=1,addremove=True`.

use std::collections::BTreeMap;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceData {
    pub batch_add_count: Option<usize>,
    pub min_start_fields: Option<usize>,
    pub min_empty_start_fields: Option<usize>,
    pub addremove: Option<bool>,
    pub sortable: Option<bool>,
    pub extra: BTreeMap<String, String>,
}

impl SequenceData {
    /// Parses a holder title. Only `batch_add_count` is strict; any other bare
    /// token or known key with an unreadable value is kept in `extra`.
    pub fn parse(title: &str) -> Result<Self> {
        let mut data = Self::default();
        for pair in title.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let (key, value) = (key.trim(), value.trim());
            let known = match key {
                "batch_add_count" => {
                    data.batch_add_count = Some(parse_count(value).ok_or_else(|| {
                        Error::SequenceData(format!(
                            "batch_add_count must be a count, got {value:?}"
                        ))
                    })?);
                    true
                }
                "min_start_fields" => store(&mut data.min_start_fields, parse_count(value)),
                "min_empty_start_fields" => store(&mut data.min_empty_start_fields, parse_count(value)),
                "addremove" => store(&mut data.addremove, parse_flag(value)),
                "sortable" => store(&mut data.sortable, parse_flag(value)),
                _ => false,
            };
            if !known {
                data.extra.insert(key.to_string(), value.to_string());
            }
        }
        Ok(data)
    }

    /// Number of items a single add action inserts.
    pub fn required_batch_add_count(&self) -> Result<usize> {
        self.batch_add_count
            .ok_or_else(|| Error::SequenceData("batch_add_count is missing".into()))
    }
}

fn store<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    let parsed = value.is_some();
    if parsed {
        *slot = value;
    }
    parsed
}

fn parse_count(value: &str) -> Option<usize> {
    value.parse::<usize>().ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
