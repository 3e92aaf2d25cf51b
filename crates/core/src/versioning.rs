//! Clone-on-revise bookkeeping for quote versions.
//!
//! A clone walks a fixed sequence of stages. The database layer runs the
//! whole walk in one transaction and reports the stage reached when a step
//! fails; [`IdRemap`] carries old-to-new deliverable ids between the
//! deliverable and milestone copy steps.

use std::collections::HashMap;
use std::fmt;

use crate::types::DbId;

/// Progress of a version clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CloneStage {
    LoadedSource,
    VersionCreated,
    DeliverablesCopied,
    MilestonesCopied,
    Done,
}

impl CloneStage {
    /// The stage that follows this one. `Done` is absorbing.
    pub fn next(self) -> Self {
        match self {
            Self::LoadedSource => Self::VersionCreated,
            Self::VersionCreated => Self::DeliverablesCopied,
            Self::DeliverablesCopied => Self::MilestonesCopied,
            Self::MilestonesCopied => Self::Done,
            Self::Done => Self::Done,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadedSource => "loaded_source",
            Self::VersionCreated => "version_created",
            Self::DeliverablesCopied => "deliverables_copied",
            Self::MilestonesCopied => "milestones_copied",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CloneStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from source deliverable ids to their freshly created copies.
#[derive(Debug, Default, Clone)]
pub struct IdRemap {
    map: HashMap<DbId, DbId>,
}

impl IdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `old` was copied to `new`.
    ///
    /// Returns an error if `old` was already mapped; every source row is
    /// copied exactly once.
    pub fn insert(&mut self, old: DbId, new: DbId) -> Result<(), String> {
        if self.map.insert(old, new).is_some() {
            return Err(format!("Deliverable {old} was copied more than once"));
        }
        Ok(())
    }

    /// The new id for `old`, if it was copied.
    pub fn get(&self, old: DbId) -> Option<DbId> {
        self.map.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The sort order a new row receives when none is given: one past the
/// highest order in its scope, or 1 for an empty scope.
pub fn next_sort_order(max_existing: Option<i32>) -> i32 {
    max_existing.unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order() {
        let mut stage = CloneStage::LoadedSource;
        let mut seen = vec![stage];
        while stage != CloneStage::Done {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                CloneStage::LoadedSource,
                CloneStage::VersionCreated,
                CloneStage::DeliverablesCopied,
                CloneStage::MilestonesCopied,
                CloneStage::Done,
            ]
        );
        assert_eq!(CloneStage::Done.next(), CloneStage::Done);
    }

    #[test]
    fn stage_display_is_snake_case() {
        assert_eq!(CloneStage::DeliverablesCopied.to_string(), "deliverables_copied");
    }

    #[test]
    fn remap_links_old_to_new() {
        let mut remap = IdRemap::new();
        remap.insert(10, 110).unwrap();
        remap.insert(11, 111).unwrap();
        assert_eq!(remap.get(10), Some(110));
        assert_eq!(remap.get(11), Some(111));
        assert_eq!(remap.get(12), None);
        assert_eq!(remap.len(), 2);
    }

    #[test]
    fn remap_rejects_duplicate_source() {
        let mut remap = IdRemap::new();
        remap.insert(10, 110).unwrap();
        assert!(remap.insert(10, 120).is_err());
    }

    #[test]
    fn sort_order_for_empty_scope_is_one() {
        assert_eq!(next_sort_order(None), 1);
        assert_eq!(next_sort_order(Some(7)), 8);
    }
}
