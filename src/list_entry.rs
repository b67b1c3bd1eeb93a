#![allow(non_camel_case_types)]

use std::{mem::offset_of, ptr};

use static_assertions::const_assert_eq;

use crate::arch;

/// ABI of `LIST_ENTRY`, the doubly linked node the OS embeds in its records.
///
/// Lists built from these are circular: for any node `n` on a non-empty list
/// `(*n.flink).blink == n` and `(*n.blink).flink == n`, and an empty head points
/// at itself both ways. Whoever owns the list keeps that true; nothing here
/// walks or edits it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    /// Successor.
    pub flink: *mut ListEntry,
    /// Predecessor.
    pub blink: *mut ListEntry,
}

impl ListEntry {
    /// Both links null, the state of a node not on any list.
    pub const fn unlinked() -> Self {
        Self {
            flink: ptr::null_mut(),
            blink: ptr::null_mut(),
        }
    }
}

impl Default for ListEntry {
    fn default() -> Self {
        Self::unlinked()
    }
}

pub type LIST_ENTRY = ListEntry;
pub type PLIST_ENTRY = *mut ListEntry;
pub type RESTRICTED_POINTER = *mut ListEntry;
// No `*` in the header: despite the name this is the struct, not a pointer.
pub type PRLIST_ENTRY = ListEntry;

const_assert_eq!(size_of::<ListEntry>(), arch::CURRENT.list_entry.size);
const_assert_eq!(offset_of!(ListEntry, flink), arch::CURRENT.list_entry.flink);
const_assert_eq!(offset_of!(ListEntry, blink), arch::CURRENT.list_entry.blink);
