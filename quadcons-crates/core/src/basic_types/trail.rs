use std::iter::Rev;
use std::ops::Deref;
use std::vec::Drain;

use crate::quadcons_assert_simple;

/// A stack of entries which is partitioned into checkpoints; backtracking to a checkpoint returns
/// the entries recorded after it, most recent first.
#[derive(Clone, Debug)]
pub(crate) struct Trail<T> {
    /// For checkpoint `i + 1`, the length of the trail when it was created.
    checkpoint_starts: Vec<usize>,
    entries: Vec<T>,
}

impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            checkpoint_starts: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> Trail<T> {
    pub(crate) fn new_checkpoint(&mut self) {
        self.checkpoint_starts.push(self.entries.len());
    }

    /// The number of checkpoints above the root; zero at the root.
    pub(crate) fn get_checkpoint(&self) -> usize {
        self.checkpoint_starts.len()
    }

    /// Removes the checkpoints above `checkpoint` and returns their entries in reverse order of
    /// recording.
    pub(crate) fn synchronise(&mut self, checkpoint: usize) -> Rev<Drain<'_, T>> {
        quadcons_assert_simple!(checkpoint < self.get_checkpoint());

        let start = self.checkpoint_starts[checkpoint];
        self.checkpoint_starts.truncate(checkpoint);
        self.entries.drain(start..).rev()
    }

    pub(crate) fn push(&mut self, entry: T) {
        self.entries.push(entry)
    }
}

impl<T> Deref for Trail<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_entries_survive_backtracking() {
        let mut trail = Trail::default();
        trail.push('a');
        trail.new_checkpoint();
        trail.push('b');

        let undone = trail.synchronise(0).collect::<Vec<_>>();

        assert_eq!(undone, vec!['b']);
        assert_eq!(trail.deref(), &['a']);
        assert_eq!(trail.get_checkpoint(), 0);
    }

    #[test]
    fn several_checkpoints_are_undone_at_once_latest_first() {
        let mut trail = Trail::default();
        for entry in 1..=3 {
            trail.new_checkpoint();
            trail.push(entry);
            trail.push(10 * entry);
        }

        let undone = trail.synchronise(1).collect::<Vec<_>>();

        assert_eq!(undone, vec![30, 3, 20, 2]);
        assert_eq!(trail.deref(), &[1, 10]);
        assert_eq!(trail.get_checkpoint(), 1);
    }

    #[test]
    fn empty_checkpoints_are_allowed() {
        let mut trail = Trail::<u8>::default();
        trail.new_checkpoint();
        trail.new_checkpoint();

        assert_eq!(trail.synchronise(0).count(), 0);
        assert!(trail.is_empty());
    }
}
