//! ABI of `RTL_CRITICAL_SECTION` and `RTL_CRITICAL_SECTION_DEBUG`.
//!
//! Both are declared under `#pragma pack(push, 8)`; `packed(8)` caps field
//! alignment the same way. On every supported target no field wants more than
//! 8, so the pack changes nothing about offsets but pins the contract.
//!
//! The OS does all the locking. These exist so memory holding a critical
//! section (ours, another process's, a dump) can be read without guessing.
#![allow(non_camel_case_types)]

use std::{mem::offset_of, ptr};

use static_assertions::const_assert_eq;

use crate::{
    arch,
    list_entry::ListEntry,
    types::{DWORD, HANDLE, LONG, ULONG_PTR, WORD},
};

/// Per-lock metadata the loader allocates for each initialized critical
/// section and chains onto the process-wide locks list.
#[repr(C, packed(8))]
#[derive(Debug, Clone, Copy)]
pub struct RtlCriticalSectionDebug {
    /// `RTL_CRITSECT_TYPE` or `RTL_RESOURCE_TYPE`.
    pub kind: WORD,
    pub creator_back_trace_index: WORD,
    /// Back-reference to the owning lock.
    pub critical_section: *mut RtlCriticalSection,
    /// Link in the process-wide list of live debug records.
    pub process_locks_list: ListEntry,
    pub entry_count: DWORD,
    pub contention_count: DWORD,
    pub flags: DWORD,
    pub creator_back_trace_index_high: WORD,
    pub identifier: WORD,
}

impl RtlCriticalSectionDebug {
    pub const fn zeroed() -> Self {
        Self {
            kind: 0,
            creator_back_trace_index: 0,
            critical_section: ptr::null_mut(),
            process_locks_list: ListEntry::unlinked(),
            entry_count: 0,
            contention_count: 0,
            flags: 0,
            creator_back_trace_index_high: 0,
            identifier: 0,
        }
    }
}

impl Default for RtlCriticalSectionDebug {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// The recursive user-mode mutex as the OS stores it.
#[repr(C, packed(8))]
#[derive(Debug, Clone, Copy)]
pub struct RtlCriticalSection {
    pub debug_info: *mut RtlCriticalSectionDebug,
    pub lock_count: LONG,
    pub recursion_count: LONG,
    /// Thread id of the owner (`ClientId.UniqueThread`), not a real handle.
    pub owning_thread: HANDLE,
    pub lock_semaphore: HANDLE,
    /// Pointer-width so the struct is the same size packed or not.
    pub spin_count: ULONG_PTR,
}

impl RtlCriticalSection {
    pub const fn zeroed() -> Self {
        Self {
            debug_info: ptr::null_mut(),
            lock_count: 0,
            recursion_count: 0,
            owning_thread: ptr::null_mut(),
            lock_semaphore: ptr::null_mut(),
            spin_count: 0,
        }
    }
}

impl Default for RtlCriticalSection {
    fn default() -> Self {
        Self::zeroed()
    }
}

pub type RTL_CRITICAL_SECTION_DEBUG = RtlCriticalSectionDebug;
pub type PRTL_CRITICAL_SECTION_DEBUG = *mut RtlCriticalSectionDebug;
pub type RTL_RESOURCE_DEBUG = RtlCriticalSectionDebug;
pub type PRTL_RESOURCE_DEBUG = *mut RtlCriticalSectionDebug;

pub type RTL_CRITICAL_SECTION = RtlCriticalSection;
pub type PRTL_CRITICAL_SECTION = *mut RtlCriticalSection;
pub type CRITICAL_SECTION = RtlCriticalSection;

const DEBUG: arch::CriticalSectionDebugLayout = arch::CURRENT.critical_section_debug;
const_assert_eq!(size_of::<RtlCriticalSectionDebug>(), DEBUG.size);
const_assert_eq!(offset_of!(RtlCriticalSectionDebug, kind), DEBUG.kind);
const_assert_eq!(
    offset_of!(RtlCriticalSectionDebug, creator_back_trace_index),
    DEBUG.creator_back_trace_index
);
const_assert_eq!(
    offset_of!(RtlCriticalSectionDebug, critical_section),
    DEBUG.critical_section
);
const_assert_eq!(
    offset_of!(RtlCriticalSectionDebug, process_locks_list),
    DEBUG.process_locks_list
);
const_assert_eq!(offset_of!(RtlCriticalSectionDebug, entry_count), DEBUG.entry_count);
const_assert_eq!(
    offset_of!(RtlCriticalSectionDebug, contention_count),
    DEBUG.contention_count
);
const_assert_eq!(offset_of!(RtlCriticalSectionDebug, flags), DEBUG.flags);
const_assert_eq!(
    offset_of!(RtlCriticalSectionDebug, creator_back_trace_index_high),
    DEBUG.creator_back_trace_index_high
);
const_assert_eq!(offset_of!(RtlCriticalSectionDebug, identifier), DEBUG.identifier);

const SECTION: arch::CriticalSectionLayout = arch::CURRENT.critical_section;
const_assert_eq!(size_of::<RtlCriticalSection>(), SECTION.size);
const_assert_eq!(offset_of!(RtlCriticalSection, debug_info), SECTION.debug_info);
const_assert_eq!(offset_of!(RtlCriticalSection, lock_count), SECTION.lock_count);
const_assert_eq!(
    offset_of!(RtlCriticalSection, recursion_count),
    SECTION.recursion_count
);
const_assert_eq!(offset_of!(RtlCriticalSection, owning_thread), SECTION.owning_thread);
const_assert_eq!(
    offset_of!(RtlCriticalSection, lock_semaphore),
    SECTION.lock_semaphore
);
const_assert_eq!(offset_of!(RtlCriticalSection, spin_count), SECTION.spin_count);
// No gaps anywhere, which is what lets it be `PaddingFree`.
const_assert_eq!(
    size_of::<RtlCriticalSection>(),
    2 * size_of::<LONG>() + 3 * size_of::<HANDLE>() + size_of::<ULONG_PTR>()
);
