//! Nested undo ledger used for speculative encoding.
//!
//! Every stateful component (the model, the range encoder, the bit writer)
//! owns a [`Ledger`] parameterized by its own closed undo-record enum. While
//! at least one checkpoint is open, each mutation pushes a record describing
//! how to reverse it. [`Ledger::rewind`] hands back the records made since the
//! innermost checkpoint, newest first, so the owner can undo them in order.
//!
//! Records are only kept while a checkpoint is open; outside a trial the
//! ledger costs one branch per mutation.

/// A stack of undo records with nested checkpoint marks.
#[derive(Debug, Clone)]
pub struct Ledger<R> {
    records: Vec<R>,
    marks: Vec<usize>,
}

impl<R> Ledger<R> {
    /// Creates an empty ledger with no open checkpoint.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Opens a checkpoint.
    pub fn checkpoint(&mut self) {
        self.marks.push(self.records.len());
    }

    /// Returns `true` while at least one checkpoint is open.
    pub fn is_recording(&self) -> bool {
        !self.marks.is_empty()
    }

    /// Number of open checkpoints.
    pub fn depth(&self) -> usize {
        self.marks.len()
    }

    /// Number of records kept for the open checkpoints.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record is kept.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pushes a record if a checkpoint is open.
    pub fn record(&mut self, record: R) {
        if self.is_recording() {
            self.records.push(record);
        }
    }

    /// Pushes a record built on demand, skipping the construction entirely
    /// when nothing is being recorded.
    pub fn record_with(&mut self, build: impl FnOnce() -> R) {
        if self.is_recording() {
            self.records.push(build());
        }
    }

    /// Closes the innermost checkpoint and returns its records newest first.
    ///
    /// Returns an empty list when no checkpoint is open.
    pub fn rewind(&mut self) -> Vec<R> {
        match self.marks.pop() {
            Some(mark) => {
                let mut undone = self.records.split_off(mark);
                undone.reverse();
                undone
            }
            None => {
                log::warn!("rollback requested without an open checkpoint");
                Vec::new()
            }
        }
    }

    /// Closes the innermost checkpoint, keeping its effects.
    ///
    /// Records stay on the stack while an enclosing checkpoint is still
    /// open so that an outer rollback also reverses them.
    pub fn commit(&mut self) {
        if self.marks.pop().is_some() && self.marks.is_empty() {
            self.records.clear();
        }
    }
}

impl<R> Default for Ledger<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_recording_without_checkpoint() {
        let mut ledger = Ledger::new();
        ledger.record(1);
        assert!(ledger.is_empty());
        assert!(!ledger.is_recording());
    }

    #[test]
    fn test_rewind_returns_newest_first() {
        let mut ledger = Ledger::new();
        ledger.checkpoint();
        ledger.record(1);
        ledger.record(2);
        ledger.record(3);
        assert_eq!(ledger.rewind(), vec![3, 2, 1]);
        assert!(ledger.is_empty());
        assert_eq!(ledger.depth(), 0);
    }

    #[test]
    fn test_nested_rewind_only_inner() {
        let mut ledger = Ledger::new();
        ledger.checkpoint();
        ledger.record("outer");
        ledger.checkpoint();
        ledger.record("inner");
        assert_eq!(ledger.rewind(), vec!["inner"]);
        assert_eq!(ledger.rewind(), vec!["outer"]);
    }

    #[test]
    fn test_commit_inner_keeps_records_for_outer() {
        let mut ledger = Ledger::new();
        ledger.checkpoint();
        ledger.record(1);
        ledger.checkpoint();
        ledger.record(2);
        ledger.commit();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.rewind(), vec![2, 1]);
    }

    #[test]
    fn test_commit_outermost_clears() {
        let mut ledger = Ledger::new();
        ledger.checkpoint();
        ledger.record(1);
        ledger.commit();
        assert!(ledger.is_empty());
        ledger.record(2);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_with_is_lazy() {
        let mut ledger: Ledger<u32> = Ledger::new();
        let mut built = false;
        ledger.record_with(|| {
            built = true;
            7
        });
        assert!(!built);
    }

    #[test]
    fn test_rewind_without_checkpoint_is_empty() {
        let mut ledger: Ledger<u8> = Ledger::new();
        assert!(ledger.rewind().is_empty());
    }
}
