//! Hand-written Windows ABI types whose memory layout matches `winnt.h`
//! byte for byte, for building Windows-facing code without the SDK headers.

pub mod arch;
pub mod critical_section;
pub mod error;
pub mod large_integer;
pub mod list_entry;
pub mod overlay;
#[cfg(all(unix, feature = "shm"))]
mod shared_image;
#[cfg(all(unix, feature = "shm"))]
mod shared_mem;
pub mod types;
#[cfg(test)]
mod test;

pub use critical_section::{
    CRITICAL_SECTION, PRTL_CRITICAL_SECTION, PRTL_CRITICAL_SECTION_DEBUG, PRTL_RESOURCE_DEBUG,
    RTL_CRITICAL_SECTION, RTL_CRITICAL_SECTION_DEBUG, RTL_RESOURCE_DEBUG, RtlCriticalSection,
    RtlCriticalSectionDebug,
};
pub use error::OverlayError;
pub use large_integer::{
    LARGE_INTEGER, LargeInteger, LargeIntegerParts, ULARGE_INTEGER, ULargeInteger,
    ULargeIntegerParts,
};
pub use list_entry::{LIST_ENTRY, ListEntry, PLIST_ENTRY, PRLIST_ENTRY, RESTRICTED_POINTER};
pub use overlay::{AbiType, PaddingFree};
#[cfg(all(unix, feature = "shm"))]
pub use shared_image::SharedImage;
#[cfg(all(unix, feature = "shm", not(miri)))]
pub use shared_mem::unlink_if_exists;
pub use types::*;
