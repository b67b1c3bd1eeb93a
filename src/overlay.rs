//! Reading ABI structures out of raw bytes.
//!
//! The bytes usually come from somewhere this process doesn't control: a
//! `ReadProcessMemory` buffer, a minidump, a shared mapping. Pointer and handle
//! fields in the result are plain bit patterns from that other address space.

use std::ptr;

use crate::{
    critical_section::{RtlCriticalSection, RtlCriticalSectionDebug},
    error::OverlayError,
    large_integer::{LargeInteger, ULargeInteger},
    list_entry::ListEntry,
};

/// Types that can be conjured from any initialized bytes of the right size.
///
/// # Safety
///
/// Every bit pattern of `size_of::<Self>()` initialized bytes must be a valid
/// `Self`. No references, no `bool`, no enums with holes. Raw pointers are fine
/// since this crate never dereferences them.
pub unsafe trait AbiType: Copy + 'static {}

unsafe impl AbiType for u8 {}
unsafe impl AbiType for u16 {}
unsafe impl AbiType for u32 {}
unsafe impl AbiType for u64 {}
unsafe impl AbiType for usize {}
unsafe impl AbiType for i8 {}
unsafe impl AbiType for i16 {}
unsafe impl AbiType for i32 {}
unsafe impl AbiType for i64 {}
unsafe impl AbiType for isize {}
unsafe impl AbiType for ListEntry {}
unsafe impl AbiType for LargeInteger {}
unsafe impl AbiType for ULargeInteger {}
unsafe impl AbiType for RtlCriticalSectionDebug {}
unsafe impl AbiType for RtlCriticalSection {}

/// [`AbiType`]s with no padding bytes, so storing a whole value writes every
/// byte it covers.
///
/// `RtlCriticalSectionDebug` is not one: on 64-bit targets bytes 4..8 sit
/// between `creator_back_trace_index` and the `critical_section` pointer.
///
/// # Safety
///
/// `size_of::<Self>()` must equal the sum of the sizes of its fields, applied
/// recursively.
pub unsafe trait PaddingFree: AbiType {}

unsafe impl PaddingFree for u8 {}
unsafe impl PaddingFree for u16 {}
unsafe impl PaddingFree for u32 {}
unsafe impl PaddingFree for u64 {}
unsafe impl PaddingFree for usize {}
unsafe impl PaddingFree for i8 {}
unsafe impl PaddingFree for i16 {}
unsafe impl PaddingFree for i32 {}
unsafe impl PaddingFree for i64 {}
unsafe impl PaddingFree for isize {}
unsafe impl PaddingFree for ListEntry {}
unsafe impl PaddingFree for LargeInteger {}
unsafe impl PaddingFree for ULargeInteger {}
unsafe impl PaddingFree for RtlCriticalSection {}

fn check_len<T: AbiType>(bytes: &[u8]) -> Result<(), OverlayError> {
    let needed = size_of::<T>();
    if bytes.len() < needed {
        log::trace!(
            "rejecting {}-byte buffer for {}",
            bytes.len(),
            std::any::type_name::<T>()
        );
        return Err(OverlayError::TooShort {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

fn check_align<T: AbiType>(address: usize) -> Result<(), OverlayError> {
    let align = align_of::<T>();
    if address % align != 0 {
        log::trace!(
            "rejecting buffer at {address:#x} for {} (align {align})",
            std::any::type_name::<T>()
        );
        return Err(OverlayError::Misaligned { align, address });
    }
    Ok(())
}

/// Borrow the start of `bytes` as a `T` in place.
pub fn view<T: AbiType>(bytes: &[u8]) -> Result<&T, OverlayError> {
    check_len::<T>(bytes)?;
    check_align::<T>(bytes.as_ptr() as usize)?;
    // SAFETY: length and alignment checked above, and `AbiType` promises any
    // initialized bytes are a valid `T`.
    Ok(unsafe { &*bytes.as_ptr().cast::<T>() })
}

/// Mutable counterpart of [`view`]. Stores go straight to `bytes`.
///
/// Only padding-free types are accepted: assigning a whole padded value would
/// leave its padding bytes uninitialized inside `bytes`.
///
/// ```compile_fail
/// use winnt_abi::{RtlCriticalSectionDebug, overlay};
///
/// let mut raw = [0u64; 8];
/// let bytes: &mut [u8] = unsafe {
///     std::slice::from_raw_parts_mut(raw.as_mut_ptr().cast(), size_of_val(&raw))
/// };
/// let _ = overlay::view_mut::<RtlCriticalSectionDebug>(bytes);
/// ```
pub fn view_mut<T: PaddingFree>(bytes: &mut [u8]) -> Result<&mut T, OverlayError> {
    check_len::<T>(bytes)?;
    check_align::<T>(bytes.as_ptr() as usize)?;
    // SAFETY: as in `view`; the exclusive borrow of `bytes` covers the result.
    Ok(unsafe { &mut *bytes.as_mut_ptr().cast::<T>() })
}

/// Copy a `T` out of the start of `bytes`, whatever its alignment.
pub fn read<T: AbiType>(bytes: &[u8]) -> Result<T, OverlayError> {
    check_len::<T>(bytes)?;
    // SAFETY: length checked, `read_unaligned` has no alignment requirement.
    Ok(unsafe { ptr::read_unaligned(bytes.as_ptr().cast::<T>()) })
}

/// [`read`] starting `offset` bytes into `bytes`.
pub fn read_at<T: AbiType>(bytes: &[u8], offset: usize) -> Result<T, OverlayError> {
    let tail = bytes.get(offset..).ok_or(OverlayError::OutOfBounds {
        offset,
        len: bytes.len(),
    })?;
    read(tail)
}
