use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachmentPhase {
    Pasted,
    Uploading,
    Resolved,
    Deleted,
}

impl AttachmentPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttachmentPhase::Resolved | AttachmentPhase::Deleted)
    }

    fn can_become(self, next: AttachmentPhase) -> bool {
        use AttachmentPhase::*;
        matches!(
            (self, next),
            (Pasted, Uploading) | (Pasted, Deleted) | (Uploading, Resolved) | (Uploading, Deleted)
        )
    }
}

/// Lifecycle phase of every attachment an editor has seen
#[derive(Debug, Clone, Default)]
pub struct AttachmentTracker {
    phases: BTreeMap<String, AttachmentPhase>,
}

impl AttachmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, id: &str) -> Option<AttachmentPhase> {
        self.phases.get(id).copied()
    }

    pub fn ids_in(&self, phase: AttachmentPhase) -> Vec<&str> {
        self.phases
            .iter()
            .filter(|(_, p)| **p == phase)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Apply a transition. Returns `false` (and changes nothing) when the
    /// transition is not allowed from the current phase.
    pub fn advance(&mut self, id: &str, next: AttachmentPhase) -> bool {
        let allowed = match self.phases.get(id) {
            None => next == AttachmentPhase::Pasted,
            Some(current) => current.can_become(next),
        };

        if allowed {
            self.phases.insert(id.to_string(), next);
        } else {
            debug!(id, ?next, current = ?self.phase(id), "ignored attachment transition");
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttachmentPhase::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = AttachmentTracker::new();
        assert!(tracker.advance("a", Pasted));
        assert!(tracker.advance("a", Uploading));
        assert!(tracker.advance("a", Resolved));
        assert_eq!(tracker.phase("a"), Some(Resolved));
    }

    #[test]
    fn test_terminal_phases_are_sticky() {
        let mut tracker = AttachmentTracker::new();
        tracker.advance("a", Pasted);
        tracker.advance("a", Uploading);
        assert!(tracker.advance("a", Deleted));

        assert!(!tracker.advance("a", Resolved));
        assert!(!tracker.advance("a", Uploading));
        assert_eq!(tracker.phase("a"), Some(Deleted));
        assert_eq!(tracker.ids_in(Deleted), vec!["a"]);
    }

    #[test]
    fn test_unknown_id_must_start_pasted() {
        let mut tracker = AttachmentTracker::new();
        assert!(!tracker.advance("b", Uploading));
        assert!(tracker.is_empty());
    }
}
