//! Per-group collection of entries, safe to feed from many threads.

use crate::entry::{resolve_group, Entry};
use dashmap::DashMap;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Entries of one group, sorted by source location once assembly is over
pub type GroupEntries = Vec<Entry>;

/// The entries of one group
#[derive(Debug, Default)]
pub struct Doc {
    entries: Mutex<Vec<Entry>>,
}

impl Doc {
    fn push(&self, entry: Entry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Group name -> entries of that group.
///
/// Group creation briefly locks one shard of the map; adding an entry locks
/// only the [`Doc`] of its group, so workers filling different groups never
/// wait on each other.
#[derive(Debug, Default)]
pub struct DocumentSet {
    groups: DashMap<String, Arc<Doc>>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `entry` under its group, creating the group on first use.
    pub fn assemble(&self, entry: Entry) {
        let group = resolve_group(entry.group()).to_string();
        let doc = self.doc(&group);
        debug!(
            "{}:{}: entry added to group {}",
            entry.location().file.display(),
            entry.location().line,
            group
        );
        doc.push(entry);
    }

    /// The doc of `group`; the map shard is released before the caller locks the doc
    fn doc(&self, group: &str) -> Arc<Doc> {
        if let Some(doc) = self.groups.get(group) {
            return Arc::clone(doc.value());
        }
        Arc::clone(self.groups.entry(group.to_string()).or_default().value())
    }

    /// Number of entries filed under `group`
    pub fn group_len(&self, group: &str) -> usize {
        self.groups.get(group).map(|doc| doc.len()).unwrap_or(0)
    }

    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.iter().map(|g| g.key().clone()).collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consumes the set, returning every group's entries sorted by file, then line.
    pub fn into_groups(self) -> BTreeMap<String, GroupEntries> {
        self.groups
            .into_iter()
            .map(|(name, doc)| {
                let mut entries = match Arc::try_unwrap(doc) {
                    Ok(doc) => doc.entries.into_inner().unwrap_or_else(PoisonError::into_inner),
                    Err(shared) => shared
                        .entries
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .clone(),
                };
                entries.sort_by(|a, b| a.location().cmp(b.location()));
                (name, entries)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{InfoEntry, SourceLocation, DEFAULT_GROUP};
    use std::path::PathBuf;
    use std::thread;

    fn info(group: &str, file: &str, line: usize) -> Entry {
        Entry::Info(InfoEntry {
            group: group.to_string(),
            location: SourceLocation {
                file: PathBuf::from(file),
                line,
            },
            ..InfoEntry::default()
        })
    }

    #[test]
    fn test_empty_group_goes_to_default() {
        let set = DocumentSet::new();
        set.assemble(info("", "a.go", 1));
        set.assemble(info("users", "a.go", 5));

        assert_eq!(set.group_names(), vec![DEFAULT_GROUP.to_string(), "users".to_string()]);
        assert_eq!(set.group_len(DEFAULT_GROUP), 1);
        assert_eq!(set.group_len("users"), 1);
        assert_eq!(set.group_len("missing"), 0);
    }

    #[test]
    fn test_into_groups_sorts_by_file_then_line() {
        let set = DocumentSet::new();
        set.assemble(info("g", "b.go", 1));
        set.assemble(info("g", "a.go", 30));
        set.assemble(info("g", "a.go", 2));

        let groups = set.into_groups();
        let order: Vec<(String, usize)> = groups["g"]
            .iter()
            .map(|e| (e.location().file.display().to_string(), e.location().line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.go".to_string(), 2),
                ("a.go".to_string(), 30),
                ("b.go".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_concurrent_assembly_loses_nothing() {
        let set = DocumentSet::new();

        thread::scope(|scope| {
            for worker in 0..8 {
                let set = &set;
                scope.spawn(move || {
                    for line in 0..100 {
                        let group = if line % 2 == 0 { "even" } else { "" };
                        set.assemble(info(group, &format!("w{}.go", worker), line));
                    }
                });
            }
        });

        assert_eq!(set.group_len("even"), 400);
        assert_eq!(set.group_len(DEFAULT_GROUP), 400);
        let groups = set.into_groups();
        assert_eq!(groups.len(), 2);
    }
}
