use std::collections::VecDeque;

use crate::types::ConflictResolution;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConflict {
    pub path: String,
    pub resolution: ConflictResolution,
}

/// Conflicts reported for one restore attempt. A blanket resolution only
/// lives as long as the attempt does.
#[derive(Debug, Default)]
pub struct ConflictQueue {
    pending: VecDeque<String>,
    resolved: Vec<ResolvedConflict>,
    blanket: Option<ConflictResolution>,
}

impl ConflictQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues newly reported conflicts. Under a blanket resolution they are settled on arrival.
    pub fn load<I>(&mut self, paths: I) -> Vec<ResolvedConflict>
    where
        I: IntoIterator<Item = String>,
    {
        match self.blanket {
            Some(resolution) => {
                let settled: Vec<ResolvedConflict> = paths
                    .into_iter()
                    .map(|path| ResolvedConflict { path, resolution })
                    .collect();
                self.resolved.extend(settled.iter().cloned());
                settled
            }
            None => {
                self.pending.extend(paths);
                Vec::new()
            }
        }
    }

    pub fn resolve(
        &mut self,
        resolution: ConflictResolution,
        apply_to_all: bool,
    ) -> Vec<ResolvedConflict> {
        let settled: Vec<ResolvedConflict> = if apply_to_all {
            self.blanket = Some(resolution);
            self.pending
                .drain(..)
                .map(|path| ResolvedConflict { path, resolution })
                .collect()
        } else {
            self.pending
                .pop_front()
                .map(|path| ResolvedConflict { path, resolution })
                .into_iter()
                .collect()
        };
        self.resolved.extend(settled.iter().cloned());
        settled
    }

    pub fn current(&self) -> Option<&str> {
        self.pending.front().map(String::as_str)
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn resolved(&self) -> &[ResolvedConflict] {
        &self.resolved
    }

    pub fn blanket(&self) -> Option<ConflictResolution> {
        self.blanket
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.resolved.clear();
        self.blanket = None;
    }
}
