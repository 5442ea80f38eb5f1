#![warn(missing_docs)]

//! Snapshot-based undo/redo engine for edited documents in myoviz.
//!
//! Snapshot-based rather than command-based: each commit stores a complete
//! copy of the document, trading memory for simplicity and for immunity to
//! "inverse operation" bugs. Appropriate because the edited document (a
//! whole model) is modest in size and edits are user-driven, not
//! high-frequency.
//!
//! Editing happens in a mutable "scratch" copy; nothing is visible in
//! history until [`UndoRedo::commit_scratch`] is called. History is never
//! empty: the construction commit is a permanent rollback floor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Process-unique identifier for a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One immutable, labeled, timestamped snapshot in the history.
///
/// Entries share their snapshot via `Arc`, so moving them between the undo
/// and redo stacks never copies the document.
#[derive(Debug)]
pub struct UndoRedoEntry<T> {
    id: EntryId,
    time: SystemTime,
    message: String,
    data: Arc<T>,
}

impl<T> UndoRedoEntry<T> {
    fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            id: EntryId::next(),
            time: SystemTime::now(),
            message: message.into(),
            data: Arc::new(data),
        }
    }

    /// Unique id of this entry.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Wall-clock time the entry was committed.
    pub fn time(&self) -> SystemTime {
        self.time
    }

    /// The human-readable commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The committed document snapshot.
    pub fn data(&self) -> &T {
        &self.data
    }
}

impl<T> Clone for UndoRedoEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            time: self.time,
            message: self.message.clone(),
            data: Arc::clone(&self.data),
        }
    }
}

/// Undo/redo storage for a document of type `T`.
///
/// State: a "head" entry (the current committed state), an undo stack of
/// older entries, a redo stack of undone entries, and the mutable scratch
/// copy seeded from the head.
#[derive(Debug, Clone)]
pub struct UndoRedo<T: Clone> {
    undo: Vec<UndoRedoEntry<T>>,
    redo: Vec<UndoRedoEntry<T>>,
    head: UndoRedoEntry<T>,
    scratch: T,
}

impl<T: Clone> UndoRedo<T> {
    /// Create storage around an initial document, which becomes the first
    /// (permanent) commit.
    pub fn new(document: T) -> Self {
        let head = UndoRedoEntry::new("created document", document.clone());
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            head,
            scratch: document,
        }
    }

    /// The scratch (work-in-progress) document.
    pub fn scratch(&self) -> &T {
        &self.scratch
    }

    /// Mutable access to the scratch document for in-place editing. Edits
    /// are invisible in history until committed.
    pub fn scratch_mut(&mut self) -> &mut T {
        &mut self.scratch
    }

    /// Commit the scratch document as a new head entry.
    ///
    /// The previous head moves onto the undo stack and the redo stack is
    /// cleared: committing after an undo discards the abandoned branch.
    pub fn commit_scratch(&mut self, message: impl Into<String>) {
        let new_head = UndoRedoEntry::new(message, self.scratch.clone());
        self.undo.push(std::mem::replace(&mut self.head, new_head));
        self.redo.clear();
    }

    /// The current committed entry.
    pub fn head(&self) -> &UndoRedoEntry<T> {
        &self.head
    }

    /// Id of the current committed entry.
    pub fn head_id(&self) -> EntryId {
        self.head.id
    }

    /// Number of entries that can be undone to.
    pub fn num_undo_entries(&self) -> usize {
        self.undo.len()
    }

    /// The `i`th undo entry, 0 being the most recently committed.
    ///
    /// # Panics
    /// Panics if `i >= num_undo_entries()`.
    pub fn undo_entry(&self, i: usize) -> &UndoRedoEntry<T> {
        &self.undo[self.undo.len() - 1 - i]
    }

    /// Whether [`UndoRedo::undo`] may be called.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Move the head back one entry, resetting scratch to it.
    ///
    /// # Panics
    /// Panics when there is nothing to undo; callers guard with
    /// [`UndoRedo::can_undo`].
    pub fn undo(&mut self) {
        let restored = self.undo.pop().expect("undo() called with an empty undo stack");
        self.redo.push(std::mem::replace(&mut self.head, restored));
        self.scratch = (*self.head.data).clone();
    }

    /// Undo to the `i`th undo entry, as if calling [`UndoRedo::undo`]
    /// `i + 1` times: intervening entries move onto the redo stack in order.
    ///
    /// # Panics
    /// Panics if `i >= num_undo_entries()`.
    pub fn undo_to(&mut self, i: usize) {
        assert!(i < self.undo.len(), "undo_to() index out of range");
        for _ in 0..=i {
            self.undo();
        }
    }

    /// Number of entries that can be redone to.
    pub fn num_redo_entries(&self) -> usize {
        self.redo.len()
    }

    /// The `i`th redo entry, 0 being the most recently undone.
    ///
    /// # Panics
    /// Panics if `i >= num_redo_entries()`.
    pub fn redo_entry(&self, i: usize) -> &UndoRedoEntry<T> {
        &self.redo[self.redo.len() - 1 - i]
    }

    /// Whether [`UndoRedo::redo`] may be called.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Move the head forward one entry, resetting scratch to it.
    ///
    /// # Panics
    /// Panics when there is nothing to redo; callers guard with
    /// [`UndoRedo::can_redo`].
    pub fn redo(&mut self) {
        let restored = self.redo.pop().expect("redo() called with an empty redo stack");
        self.undo.push(std::mem::replace(&mut self.head, restored));
        self.scratch = (*self.head.data).clone();
    }

    /// Redo to the `i`th redo entry, as if calling [`UndoRedo::redo`]
    /// `i + 1` times.
    ///
    /// # Panics
    /// Panics if `i >= num_redo_entries()`.
    pub fn redo_to(&mut self, i: usize) {
        assert!(i < self.redo.len(), "redo_to() index out of range");
        for _ in 0..=i {
            self.redo();
        }
    }
}
