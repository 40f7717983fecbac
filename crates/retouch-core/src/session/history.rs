//! Linear undo/redo history of full image snapshots.

use std::collections::VecDeque;
use std::mem;

use crate::raster::RasterImage;

/// Snapshot history with a current entry that always exists.
///
/// `past` holds older states oldest-first; `current` is the top of the
/// history. Entries beyond `cap` are evicted from the oldest end.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<RasterImage>,
    current: RasterImage,
    redo: Vec<RasterImage>,
    cap: usize,
}

impl History {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: RasterImage, cap: usize) -> Self {
        Self {
            past: VecDeque::new(),
            current: initial,
            redo: Vec::new(),
            cap: cap.max(1),
        }
    }

    /// Number of entries, including the current one.
    pub fn len(&self) -> usize {
        self.past.len() + 1
    }

    /// Always false: the current entry cannot be removed.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Top of the history.
    pub fn current(&self) -> &RasterImage {
        &self.current
    }

    /// Change the entry cap, evicting the oldest entries if needed.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.max(1);
        self.evict();
    }

    /// Record `image` as the new top.
    ///
    /// Nothing happens if it equals the current top. Otherwise the redo stack
    /// is cleared. Returns whether an entry was added.
    pub fn push(&mut self, image: RasterImage) -> bool {
        if image == self.current {
            return false;
        }
        let previous = mem::replace(&mut self.current, image);
        self.past.push_back(previous);
        self.redo.clear();
        self.evict();
        true
    }

    /// Step back one entry. Returns the new top, or `None` if only the
    /// initial entry remains.
    pub fn undo(&mut self) -> Option<&RasterImage> {
        let previous = self.past.pop_back()?;
        let undone = mem::replace(&mut self.current, previous);
        self.redo.push(undone);
        Some(&self.current)
    }

    /// Re-apply the most recently undone entry. Returns the new top, or
    /// `None` if there is nothing to redo.
    pub fn redo(&mut self) -> Option<&RasterImage> {
        let next = self.redo.pop()?;
        let previous = mem::replace(&mut self.current, next);
        self.past.push_back(previous);
        self.evict();
        Some(&self.current)
    }

    fn evict(&mut self) {
        while self.len() > self.cap {
            self.past.pop_front();
        }
    }
}
