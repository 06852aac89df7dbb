use std::cmp::Reverse;

use chrono::NaiveDateTime;

use crate::types::BackupVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    LargestFirst,
}

impl SortOrder {
    pub fn next(&self) -> Self {
        match self {
            SortOrder::NewestFirst => SortOrder::OldestFirst,
            SortOrder::OldestFirst => SortOrder::LargestFirst,
            SortOrder::LargestFirst => SortOrder::NewestFirst,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "newest first",
            SortOrder::OldestFirst => "oldest first",
            SortOrder::LargestFirst => "largest first",
        }
    }
}

#[derive(Debug, Default)]
pub struct VersionList {
    versions: Vec<BackupVersion>,
    cursor: usize,
    order: SortOrder,
}

impl VersionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, versions: Vec<BackupVersion>) {
        let keep = self.current().map(|v| v.id.clone());
        self.versions = versions;
        self.sort();
        self.cursor = keep
            .and_then(|id| self.position(&id))
            .unwrap_or(0)
            .min(self.versions.len().saturating_sub(1));
    }

    pub fn cycle_sort(&mut self) -> SortOrder {
        let keep = self.current().map(|v| v.id.clone());
        self.order = self.order.next();
        self.sort();
        if let Some(idx) = keep.and_then(|id| self.position(&id)) {
            self.cursor = idx;
        }
        self.order
    }

    fn sort(&mut self) {
        match self.order {
            SortOrder::NewestFirst => self.versions.sort_by_cached_key(|v| Reverse(age_key(v))),
            SortOrder::OldestFirst => self.versions.sort_by_cached_key(age_key),
            SortOrder::LargestFirst => self
                .versions
                .sort_by_key(|v| Reverse(v.size.bytes().unwrap_or(0))),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.versions.iter().position(|v| v.id == id)
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor < self.versions.len().saturating_sub(1) {
            self.cursor += 1;
        }
    }

    pub fn current(&self) -> Option<&BackupVersion> {
        self.versions.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn versions(&self) -> &[BackupVersion] {
        &self.versions
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Parsed time first; stamps that do not parse rank below every parsed one and
/// fall back to text order among themselves.
fn age_key(version: &BackupVersion) -> (Option<NaiveDateTime>, String) {
    (version.parsed_timestamp(), version.timestamp.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;

    fn version(id: &str, timestamp: &str, bytes: u64) -> BackupVersion {
        BackupVersion {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            size: Size::Bytes(bytes),
            notes: None,
            paths: Vec::new(),
        }
    }

    fn sample() -> Vec<BackupVersion> {
        vec![
            version("old", "20230105-080000", 300),
            version("new", "20240301-093000", 100),
            version("mid", "20231111-220000", 200),
        ]
    }

    #[test]
    fn test_newest_first_by_default() {
        let mut list = VersionList::new();
        list.replace(sample());
        let ids: Vec<&str> = list.versions().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(list.current().unwrap().id, "new");
    }

    #[test]
    fn test_sorts_display_and_epoch_stamps_by_time() {
        let mut list = VersionList::new();
        list.replace(vec![
            version("old", "January 05, 2023 at 10:00 AM", 1),
            version("new", "February 01, 2024 at 09:00 AM", 1),
        ]);
        let ids: Vec<&str> = list.versions().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);

        list.replace(vec![
            version("early", "999", 1),
            version("late", "1000", 1),
            version("undated", "unknown", 1),
        ]);
        let ids: Vec<&str> = list.versions().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "early", "undated"]);

        list.cycle_sort();
        let ids: Vec<&str> = list.versions().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["undated", "early", "late"]);
    }

    #[test]
    fn test_cycle_sort_keeps_cursor_on_version() {
        let mut list = VersionList::new();
        list.replace(sample());
        list.move_down();
        assert_eq!(list.current().unwrap().id, "mid");

        assert_eq!(list.cycle_sort(), SortOrder::OldestFirst);
        assert_eq!(list.current().unwrap().id, "mid");
        assert_eq!(list.cursor(), 1);

        assert_eq!(list.cycle_sort(), SortOrder::LargestFirst);
        assert_eq!(list.versions()[0].id, "old");
        assert_eq!(list.current().unwrap().id, "mid");
    }

    #[test]
    fn test_navigation_saturates() {
        let mut list = VersionList::new();
        list.replace(sample());

        list.move_up();
        assert_eq!(list.cursor(), 0);
        list.move_down();
        list.move_down();
        list.move_down();
        assert_eq!(list.cursor(), 2);
    }

    #[test]
    fn test_replace_with_fewer_versions_clamps_cursor() {
        let mut list = VersionList::new();
        list.replace(sample());
        list.move_down();
        list.move_down();

        list.replace(vec![version("only", "20240101-000000", 1)]);
        assert_eq!(list.cursor(), 0);
        assert_eq!(list.current().unwrap().id, "only");

        list.replace(Vec::new());
        assert!(list.current().is_none());
        assert!(list.is_empty());
    }
}
