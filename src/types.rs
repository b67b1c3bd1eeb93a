//! Windows primitive aliases with the widths `winnt.h` gives them.
#![allow(non_camel_case_types)]

use core::ffi::c_void;

pub type PVOID = *mut c_void;
/// Opaque OS identifier. Never dereferenced here.
pub type HANDLE = PVOID;

pub type BYTE = u8;
pub type BOOLEAN = BYTE;

pub type WCHAR = u16;
pub type PWCHAR = *mut WCHAR;
pub type PWSTR = *mut WCHAR;

pub type WORD = u16;
pub type DWORD = u32;
pub type LONG = i32;
pub type ULONG_PTR = usize;

// The SDK falls back to `double` on x86 purely to get an 8-byte field. These
// are real integers on every target so `QuadPart` arithmetic stays correct;
// the cells that hold them force 8-byte alignment themselves.
pub type LONGLONG = i64;
pub type ULONGLONG = u64;

/// Number of fiber-local storage slots a process can allocate.
pub const FLS_MAXIMUM_AVAILABLE: DWORD = 4080;

/// `RTL_CRITICAL_SECTION_DEBUG::Type` for a critical section.
pub const RTL_CRITSECT_TYPE: WORD = 0;
/// `RTL_CRITICAL_SECTION_DEBUG::Type` for an `RTL_RESOURCE`.
pub const RTL_RESOURCE_TYPE: WORD = 1;
