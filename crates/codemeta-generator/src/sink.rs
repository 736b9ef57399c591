/*!
 * Field access for the metadata form.
 *
 * The generator and importer only see the form through [`FieldSink`]: flat
 * text fields addressed by id, repeated groups whose entries are numbered
 * from 1, and the list of selected licenses. [`MemorySink`] is the in-memory
 * implementation, serialisable so a form can be kept in a file between runs.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fields::{FieldKind, field_kind};

pub trait FieldSink {
    /// Raw value of a field, `None` when absent.
    fn get_field(&self, id: &str) -> Option<String>;

    /// Writes a field. The empty string clears it.
    fn set_field(&mut self, id: &str, value: &str);

    /// Number of entries in a repeated group.
    fn group_count(&self, group: &str) -> usize;

    /// Appends an entry to `group` and returns its 1-based index.
    fn add_group_entry(&mut self, group: &str) -> usize;

    /// Drops the last entry of `group` together with every field it holds.
    fn remove_last_group_entry(&mut self, group: &str);

    fn license_selections(&self) -> Vec<String>;

    fn set_license_selections(&mut self, licenses: Vec<String>);

    /// Trimmed value of a field, `None` when absent or blank.
    fn field_value(&self, id: &str) -> Option<String> {
        self.get_field(id)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Ids of fields whose content breaks their input constraint.
    fn invalid_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }

    /// Adds or removes trailing entries until `group` has `count` of them.
    fn set_group_count(&mut self, group: &str, count: usize) {
        while self.group_count(group) < count {
            self.add_group_entry(group);
        }
        while self.group_count(group) > count {
            self.remove_last_group_entry(group);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySink {
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default)]
    groups: BTreeMap<String, usize>,
    #[serde(default)]
    licenses: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every non-empty field, ordered by id.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Swaps every field of entries `a` and `b` of `group`, including their
    /// nested groups. Indexes out of range are ignored.
    pub fn swap_group_entries(&mut self, group: &str, a: usize, b: usize) {
        let count = self.group_count(group);
        if a == b || a == 0 || b == 0 || a > count || b > count {
            return;
        }
        let prefix_a = format!("{group}_{a}_");
        let prefix_b = format!("{group}_{b}_");
        self.fields = swap_prefixed(std::mem::take(&mut self.fields), &prefix_a, &prefix_b);
        self.groups = swap_prefixed(std::mem::take(&mut self.groups), &prefix_a, &prefix_b);
    }
}

impl FieldSink for MemorySink {
    fn get_field(&self, id: &str) -> Option<String> {
        self.fields.get(id).cloned()
    }

    fn set_field(&mut self, id: &str, value: &str) {
        if value.is_empty() {
            self.fields.remove(id);
        } else {
            self.fields.insert(id.to_string(), value.to_string());
        }
    }

    fn group_count(&self, group: &str) -> usize {
        self.groups.get(group).copied().unwrap_or(0)
    }

    fn add_group_entry(&mut self, group: &str) -> usize {
        let count = self.groups.entry(group.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn remove_last_group_entry(&mut self, group: &str) {
        let count = self.group_count(group);
        if count == 0 {
            return;
        }
        let prefix = format!("{group}_{count}_");
        self.fields.retain(|id, _| !id.starts_with(&prefix));
        self.groups.retain(|id, _| !id.starts_with(&prefix));
        if count == 1 {
            self.groups.remove(group);
        } else {
            self.groups.insert(group.to_string(), count - 1);
        }
    }

    fn license_selections(&self) -> Vec<String> {
        self.licenses.clone()
    }

    fn set_license_selections(&mut self, licenses: Vec<String>) {
        self.licenses = licenses;
    }

    fn invalid_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(id, value)| !satisfies(field_kind(id), value.trim()))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

fn swap_prefixed<V>(map: BTreeMap<String, V>, a: &str, b: &str) -> BTreeMap<String, V> {
    map.into_iter()
        .map(|(key, value)| {
            let key = if let Some(rest) = key.strip_prefix(a) {
                format!("{b}{rest}")
            } else if let Some(rest) = key.strip_prefix(b) {
                format!("{a}{rest}")
            } else {
                key
            };
            (key, value)
        })
        .collect()
}

/// Input constraint check for one field value.
fn satisfies(kind: FieldKind, value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    match kind {
        FieldKind::Text => true,
        FieldKind::Url => url::Url::parse(value).is_ok(),
        FieldKind::UrlLines => value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .all(|line| url::Url::parse(line).is_ok()),
        FieldKind::Date => is_iso_date(value),
        FieldKind::Email => value
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty()),
    }
}

/// `YYYY-MM-DD` with a month in 1..=12 and a day in 1..=31.
pub(crate) fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = &value[range];
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    matches!(
        (digits(0..4), digits(5..7), digits(8..10)),
        (Some(_), Some(1..=12), Some(1..=31))
    )
}
