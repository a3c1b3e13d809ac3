//! The wire-handle table
//!
//! The stream refers back to previously written objects by handle. Handles
//! are assigned in reading order starting at [`BASE_HANDLE`]; a reset in the
//! stream throws the table away and restarts allocation, so handles are
//! unique within a reset epoch only. The table archives each superseded
//! epoch, keeping everything reachable after the parse.

use crate::codes::{Handle, BASE_HANDLE};
use crate::content::ContentId;
use crate::errors::{Error, Result};
use std::collections::HashMap;

/// One epoch's bindings
pub type HandleMap = HashMap<Handle, ContentId>;

#[derive(Debug)]
pub struct HandleTable {
    current: HandleMap,
    next: Handle,
    epochs: Vec<HandleMap>,
}

impl HandleTable {
    pub fn new() -> HandleTable {
        HandleTable {
            current: HandleMap::new(),
            next: BASE_HANDLE,
            epochs: Vec::new(),
        }
    }

    /// Assign the next handle of the current epoch.
    pub fn allocate(&mut self) -> Handle {
        let handle = self.next;
        self.next += 1;
        handle
    }

    /// Bind a handle to a content node. Handles are bound exactly once per
    /// epoch.
    pub fn bind(&mut self, handle: Handle, id: ContentId) -> Result<()> {
        if self.current.contains_key(&handle) {
            return Err(Error::HandleCollision(handle));
        }
        self.current.insert(handle, id);
        Ok(())
    }

    pub fn lookup(&self, handle: Handle) -> Result<ContentId> {
        self.current
            .get(&handle)
            .copied()
            .ok_or(Error::DanglingHandle(handle))
    }

    /// Archive the current epoch (if it bound anything), clear the table
    /// and restart allocation at [`BASE_HANDLE`].
    pub fn reset(&mut self) {
        if !self.current.is_empty() {
            self.epochs.push(std::mem::take(&mut self.current));
        }
        self.next = BASE_HANDLE;
    }

    pub fn current(&self) -> &HandleMap {
        &self.current
    }

    /// Consume the table, archiving the final epoch unconditionally.
    pub fn finish(mut self) -> Vec<HandleMap> {
        self.epochs.push(self.current);
        self.epochs
    }
}

impl Default for HandleTable {
    fn default() -> HandleTable {
        HandleTable::new()
    }
}
