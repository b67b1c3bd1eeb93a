use std::{mem::offset_of, ptr};

use proptest::prelude::*;
use static_assertions::{assert_impl_all, assert_not_impl_any};

use crate::{
    arch::{self, TargetLayout},
    critical_section::{RtlCriticalSection, RtlCriticalSectionDebug},
    error::OverlayError,
    large_integer::{LargeInteger, LargeIntegerParts, ULargeInteger, ULargeIntegerParts},
    list_entry::ListEntry,
    overlay::{self, PaddingFree},
    types::*,
};

const POINTER: usize = size_of::<usize>();

#[repr(C, align(8))]
struct Aligned([u8; 64]);

/// Offsets and total size of a C struct built from `(size, align)` fields
/// under `#pragma pack(pack)`.
fn c_layout(fields: &[(usize, usize)], pack: usize) -> (Vec<usize>, usize) {
    let mut offset = 0usize;
    let mut struct_align = 1usize;
    let mut offsets = Vec::with_capacity(fields.len());
    for &(size, align) in fields {
        let align = align.min(pack);
        offset = offset.next_multiple_of(align);
        offsets.push(offset);
        offset += size;
        struct_align = struct_align.max(align);
    }
    (offsets, offset.next_multiple_of(struct_align))
}

fn debug_fields(pointer: usize) -> [(usize, usize); 9] {
    [
        (2, 2),
        (2, 2),
        (pointer, pointer),
        (2 * pointer, pointer),
        (4, 4),
        (4, 4),
        (4, 4),
        (2, 2),
        (2, 2),
    ]
}

fn section_fields(pointer: usize) -> [(usize, usize); 6] {
    [
        (pointer, pointer),
        (4, 4),
        (4, 4),
        (pointer, pointer),
        (pointer, pointer),
        (pointer, pointer),
    ]
}

fn check_reference_table(target: &TargetLayout) {
    let p = target.pointer_width;

    let (offsets, size) = c_layout(&[(p, p), (p, p)], arch::PACK);
    let list = target.list_entry;
    assert_eq!(offsets, [list.flink, list.blink], "{}", target.name);
    assert_eq!(size, list.size, "{}", target.name);

    let (offsets, size) = c_layout(&debug_fields(p), arch::PACK);
    let debug = target.critical_section_debug;
    assert_eq!(
        offsets,
        [
            debug.kind,
            debug.creator_back_trace_index,
            debug.critical_section,
            debug.process_locks_list,
            debug.entry_count,
            debug.contention_count,
            debug.flags,
            debug.creator_back_trace_index_high,
            debug.identifier,
        ],
        "{}",
        target.name
    );
    assert_eq!(size, debug.size, "{}", target.name);

    let (offsets, size) = c_layout(&section_fields(p), arch::PACK);
    let section = target.critical_section;
    assert_eq!(
        offsets,
        [
            section.debug_info,
            section.lock_count,
            section.recursion_count,
            section.owning_thread,
            section.lock_semaphore,
            section.spin_count,
        ],
        "{}",
        target.name
    );
    assert_eq!(size, section.size, "{}", target.name);
}

#[test]
fn test_reference_table_x86() {
    check_reference_table(&arch::X86);
}

#[test]
fn test_reference_table_x64() {
    check_reference_table(&arch::X64);
}

#[test]
fn test_current_table_matches_pointer_width() {
    assert_eq!(arch::CURRENT.pointer_width, POINTER);
}

#[test]
fn test_primitive_widths() {
    assert_eq!(size_of::<HANDLE>(), POINTER);
    assert_eq!(size_of::<PVOID>(), POINTER);
    assert_eq!(size_of::<ULONG_PTR>(), POINTER);
    assert_eq!(size_of::<BOOLEAN>(), 1);
    assert_eq!(size_of::<WCHAR>(), 2);
    assert_eq!(size_of::<WORD>(), 2);
    assert_eq!(size_of::<DWORD>(), 4);
    assert_eq!(size_of::<LONG>(), 4);
    assert_eq!(size_of::<LONGLONG>(), 8);
    assert_eq!(size_of::<ULONGLONG>(), 8);
}

#[test]
fn test_fls_slot_count() {
    assert_eq!(FLS_MAXIMUM_AVAILABLE, 4080);
}

#[test]
fn test_list_entry_layout() {
    assert_eq!(size_of::<ListEntry>(), 2 * POINTER);
    assert_eq!(offset_of!(ListEntry, flink), 0);
    assert_eq!(offset_of!(ListEntry, blink), POINTER);
    assert_eq!(ListEntry::default(), ListEntry::unlinked());

    // `PRLIST_ENTRY` is the node itself; `RESTRICTED_POINTER` points at one.
    let node: crate::PRLIST_ENTRY = ListEntry::unlinked();
    let link: crate::RESTRICTED_POINTER = ptr::null_mut();
    assert_eq!(size_of_val(&node), size_of::<crate::LIST_ENTRY>());
    assert_eq!(size_of_val(&link), POINTER);
    assert_eq!(node.flink, link);
}

#[test]
fn test_list_entry_circular_shape() {
    let mut head = ListEntry::unlinked();
    let head_ptr = &raw mut head;

    let mut nodes = [ListEntry::unlinked(); 3];
    let base = nodes.as_mut_ptr();
    unsafe {
        let chain = [head_ptr, base, base.add(1), base.add(2)];
        for (i, &node) in chain.iter().enumerate() {
            (*node).flink = chain[(i + 1) % chain.len()];
            (*node).blink = chain[(i + chain.len() - 1) % chain.len()];
        }

        let mut cur = (*head_ptr).flink;
        let mut seen = 0;
        while cur != head_ptr {
            assert_eq!((*(*cur).flink).blink, cur);
            assert_eq!((*(*cur).blink).flink, cur);
            cur = (*cur).flink;
            seen += 1;
        }
        assert_eq!(seen, 3);
    }
}

#[test]
fn test_large_integer_views() {
    assert_eq!(size_of::<LargeInteger>(), 8);
    assert_eq!(size_of::<ULargeInteger>(), 8);

    let unsigned = ULargeInteger::from_parts(0xFFFF_FFFF, 1);
    assert_eq!(unsigned.quad_part(), 0x1_FFFF_FFFF);

    let signed = LargeInteger::from_parts(0xFFFF_FFFF, 1);
    assert_eq!(signed.quad_part(), 0x1_FFFF_FFFF_i64);

    let negative = LargeInteger::new(-1);
    assert_eq!(negative.low_part(), u32::MAX);
    assert_eq!(negative.high_part(), -1);

    let mut cell = LargeInteger::default();
    cell.set_high_part(-2);
    assert_eq!(cell.quad_part(), -2_i64 << 32);
    cell.set_low_part(7);
    assert_eq!(cell.quad_part(), (-2_i64 << 32) | 7);
}

#[test]
fn test_large_integer_low_part_first_in_memory() {
    let cell = ULargeInteger::from_parts(0x0403_0201, 0x0807_0605);
    assert_eq!(cell.to_le_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);

    let bytes = LargeInteger::new(0x1_0000_0002).to_le_bytes();
    assert_eq!(overlay::read_at::<u32>(&bytes, 0), Ok(2u32.to_le()));
    assert_eq!(overlay::read_at::<u32>(&bytes, 4), Ok(1u32.to_le()));
}

proptest! {
    #[test]
    fn test_large_integer_alias_consistency(low in any::<u32>(), high in any::<i32>()) {
        let cell = LargeInteger::from_parts(low, high);
        prop_assert_eq!(cell.quad_part(), ((high as i64) << 32) | low as i64);

        let mut back = LargeInteger::default();
        back.set_quad_part(cell.quad_part());
        prop_assert_eq!(back.parts(), LargeIntegerParts { low_part: low, high_part: high });
    }

    #[test]
    fn test_ularge_integer_alias_consistency(low in any::<u32>(), high in any::<u32>()) {
        let cell = ULargeInteger::from_parts(low, high);
        prop_assert_eq!(cell.quad_part(), ((high as u64) << 32) | low as u64);

        let back = ULargeInteger::from(cell.quad_part());
        prop_assert_eq!(back.parts(), ULargeIntegerParts { low_part: low, high_part: high });
    }

    #[test]
    fn test_large_integer_quad_round_trip(quad in any::<i64>()) {
        let cell = LargeInteger::new(quad);
        prop_assert_eq!(LargeInteger::from(cell.parts()).quad_part(), quad);
        prop_assert_eq!(i64::from_le_bytes(cell.to_le_bytes()), quad);
    }
}

#[test]
fn test_critical_section_layout() {
    let section = arch::CURRENT.critical_section;
    assert_eq!(size_of::<RtlCriticalSection>(), section.size);
    assert_eq!(offset_of!(RtlCriticalSection, debug_info), section.debug_info);
    assert_eq!(offset_of!(RtlCriticalSection, lock_count), section.lock_count);
    assert_eq!(
        offset_of!(RtlCriticalSection, recursion_count),
        section.recursion_count
    );
    assert_eq!(
        offset_of!(RtlCriticalSection, owning_thread),
        section.owning_thread
    );
    assert_eq!(
        offset_of!(RtlCriticalSection, lock_semaphore),
        section.lock_semaphore
    );
    assert_eq!(offset_of!(RtlCriticalSection, spin_count), section.spin_count);
    assert_eq!(align_of::<RtlCriticalSection>(), POINTER);
}

#[test]
fn test_critical_section_debug_layout() {
    let debug = arch::CURRENT.critical_section_debug;
    assert_eq!(size_of::<RtlCriticalSectionDebug>(), debug.size);
    assert_eq!(offset_of!(RtlCriticalSectionDebug, kind), debug.kind);
    assert_eq!(
        offset_of!(RtlCriticalSectionDebug, process_locks_list),
        debug.process_locks_list
    );
    assert_eq!(
        offset_of!(RtlCriticalSectionDebug, entry_count),
        debug.entry_count
    );
    assert_eq!(
        offset_of!(RtlCriticalSectionDebug, contention_count),
        debug.contention_count
    );
    assert_eq!(offset_of!(RtlCriticalSectionDebug, identifier), debug.identifier);
}

#[test]
fn test_pointer_after_words_is_pointer_aligned() {
    // Two WORDs end at offset 4; the pointer must still land on its natural
    // boundary, which pack 8 never lowers.
    let offset = offset_of!(RtlCriticalSectionDebug, critical_section);
    assert_eq!(offset, POINTER);
    assert_eq!(offset % POINTER, 0);

    let (packed8, _) = c_layout(&debug_fields(8), 8);
    assert_eq!(packed8[2], 8);
    let (packed2, _) = c_layout(&debug_fields(8), 2);
    assert_eq!(packed2[2], 4);
    let (packed8_x86, _) = c_layout(&debug_fields(4), 8);
    assert_eq!(packed8_x86[2], 4);
}

#[test]
fn test_debug_record_from_raw_bytes() {
    let debug = arch::CURRENT.critical_section_debug;
    let mut raw = Aligned([0; 64]);
    raw.0[debug.entry_count..debug.entry_count + 4].copy_from_slice(&5u32.to_le_bytes());
    raw.0[debug.contention_count..debug.contention_count + 4]
        .copy_from_slice(&2u32.to_le_bytes());
    raw.0[debug.kind..debug.kind + 2].copy_from_slice(&RTL_RESOURCE_TYPE.to_le_bytes());

    let record = overlay::view::<RtlCriticalSectionDebug>(&raw.0).unwrap();
    let (entries, contentions, kind) = (record.entry_count, record.contention_count, record.kind);
    assert_eq!((entries, contentions), (5, 2));
    assert_eq!(kind, RTL_RESOURCE_TYPE);

    let copied = overlay::read::<RtlCriticalSectionDebug>(&raw.0).unwrap();
    let (entries, contentions) = (copied.entry_count, copied.contention_count);
    assert_eq!((entries, contentions), (5, 2));
    let flags = copied.flags;
    assert_eq!(flags, 0);
    let owner = copied.critical_section;
    assert!(owner.is_null());
}

#[test]
fn test_view_mut_writes_through() {
    let section = arch::CURRENT.critical_section;
    let mut raw = Aligned([0; 64]);
    {
        let cs = overlay::view_mut::<RtlCriticalSection>(&mut raw.0).unwrap();
        cs.lock_count = -1;
        cs.recursion_count = 3;
        cs.spin_count = 4000;
    }
    assert_eq!(overlay::read_at::<i32>(&raw.0, section.lock_count), Ok(-1));
    assert_eq!(overlay::read_at::<i32>(&raw.0, section.recursion_count), Ok(3));
    assert_eq!(
        overlay::read_at::<usize>(&raw.0, section.spin_count),
        Ok(4000)
    );
}

// Types with interior gaps can be viewed but never handed out mutably: a
// whole-value store through `&mut T` may leave their padding uninit.
assert_impl_all!(ListEntry: PaddingFree);
assert_impl_all!(LargeInteger: PaddingFree);
assert_impl_all!(ULargeInteger: PaddingFree);
assert_impl_all!(RtlCriticalSection: PaddingFree);
assert_not_impl_any!(RtlCriticalSectionDebug: PaddingFree);

#[test]
fn test_whole_value_store_leaves_every_byte_initialized() {
    let size = size_of::<RtlCriticalSection>();
    let mut raw = Aligned([0xAA; 64]);
    *overlay::view_mut::<RtlCriticalSection>(&mut raw.0).unwrap() = RtlCriticalSection {
        lock_count: -1,
        recursion_count: 1,
        spin_count: 0x0102,
        ..RtlCriticalSection::zeroed()
    };

    // Plain safe reads of every byte the store covered; Miri flags any that
    // were left uninitialized.
    let nonzero = raw.0[..size].iter().filter(|&&b| b != 0).count();
    assert_eq!(nonzero, 4 + 1 + 2);
    assert!(raw.0[size..].iter().all(|&b| b == 0xAA));
}

#[test]
fn test_overlay_rejects_short_buffer() {
    let raw = Aligned([0; 64]);
    let needed = size_of::<RtlCriticalSection>();
    assert_eq!(
        overlay::view::<RtlCriticalSection>(&raw.0[..needed - 1]).unwrap_err(),
        OverlayError::TooShort {
            needed,
            available: needed - 1
        }
    );
    assert!(matches!(
        overlay::read::<RtlCriticalSection>(&raw.0[..3]),
        Err(OverlayError::TooShort { .. })
    ));
}

#[test]
fn test_overlay_rejects_misaligned_buffer() {
    let raw = Aligned([0; 64]);
    let shifted = &raw.0[1..];
    match overlay::view::<ListEntry>(shifted) {
        Err(OverlayError::Misaligned { align, address }) => {
            assert_eq!(align, POINTER);
            assert_eq!(address, shifted.as_ptr() as usize);
        }
        other => panic!("expected misalignment, got {other:?}"),
    }
    // Copying out has no alignment requirement.
    let entry = overlay::read::<ListEntry>(shifted).unwrap();
    assert!(entry.flink.is_null());
}

#[test]
fn test_read_at_out_of_bounds() {
    let raw = [0u8; 8];
    assert_eq!(
        overlay::read_at::<u8>(&raw, 9),
        Err(OverlayError::OutOfBounds { offset: 9, len: 8 })
    );
    assert!(matches!(
        overlay::read_at::<u32>(&raw, 6),
        Err(OverlayError::TooShort {
            needed: 4,
            available: 2
        })
    ));
}

#[test]
fn test_zeroed_structs() {
    let cs = RtlCriticalSection::default();
    let (lock_count, spin_count, debug_info) = (cs.lock_count, cs.spin_count, cs.debug_info);
    assert_eq!(lock_count, 0);
    assert_eq!(spin_count, 0);
    assert_eq!(debug_info, ptr::null_mut());

    let debug = RtlCriticalSectionDebug::default();
    let list = debug.process_locks_list;
    assert_eq!(list, ListEntry::unlinked());
    let kind = debug.kind;
    assert_eq!(kind, RTL_CRITSECT_TYPE);
}

#[cfg(all(unix, feature = "shm"))]
mod shared {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use crate::{critical_section::RtlCriticalSectionDebug, shared_image::SharedImage};
    #[cfg(not(miri))]
    use crate::unlink_if_exists;

    macro_rules! function {
        () => {{
            fn f() {}
            fn type_name_of<T>(_: T) -> &'static str {
                std::any::type_name::<T>()
            }
            let name = type_name_of(f);
            name.strip_suffix("::f").unwrap()
        }};
    }

    macro_rules! maybe_cleanup {
        () => {
            let _guard = CleanupGuard::new(function!());
        };
    }

    // Unsynchronized handles: each thread has to open its own.
    assert_impl_all!(SharedImage<u64>: Send);
    assert_not_impl_any!(SharedImage<u64>: Sync);
    assert_not_impl_any!(SharedImage<RtlCriticalSectionDebug>: Sync);

    #[test]
    fn test_fresh_image_is_zeroed() {
        maybe_cleanup!();
        let image = unsafe { SharedImage::<RtlCriticalSectionDebug>::open(function!()) }.unwrap();
        let record = unsafe { image.read() };
        let (entries, contentions) = (record.entry_count, record.contention_count);
        assert_eq!((entries, contentions), (0, 0));
        let owner = record.critical_section;
        assert!(owner.is_null());
    }

    #[test]
    fn test_second_open_sees_writes() {
        maybe_cleanup!();
        let mut writer =
            unsafe { SharedImage::<RtlCriticalSectionDebug>::open(function!()) }.unwrap();
        unsafe {
            writer.write(RtlCriticalSectionDebug {
                entry_count: 5,
                contention_count: 2,
                ..RtlCriticalSectionDebug::zeroed()
            })
        };

        let mut reader =
            unsafe { SharedImage::<RtlCriticalSectionDebug>::open(function!()) }.unwrap();
        let record = unsafe { reader.read() };
        let (entries, contentions) = (record.entry_count, record.contention_count);
        assert_eq!((entries, contentions), (5, 2));

        let updated = unsafe { reader.update(|r| r.contention_count += 1) };
        let contentions = updated.contention_count;
        assert_eq!(contentions, 3);
        let contentions = unsafe { writer.read() }.contention_count;
        assert_eq!(contentions, 3);
    }

    #[test]
    fn test_image_across_threads() {
        maybe_cleanup!();
        let name = function!();
        let mut image = unsafe { SharedImage::<u64>::open(name) }.unwrap();
        unsafe { image.write(41) };

        // Only one thread touches the region at a time: the main thread waits
        // on `join` before reading again.
        std::thread::spawn(move || {
            let mut image = unsafe { SharedImage::<u64>::open(name) }.unwrap();
            unsafe { image.update(|v| *v += 1) };
        })
        .join()
        .unwrap();

        assert_eq!(unsafe { image.read() }, 42);
    }

    #[test]
    fn test_handle_moves_to_another_thread() {
        maybe_cleanup!();
        let mut image = unsafe { SharedImage::<u64>::open(function!()) }.unwrap();
        unsafe { image.write(7) };

        let image = std::thread::spawn(move || {
            unsafe { image.update(|v| *v *= 6) };
            image
        })
        .join()
        .unwrap();

        assert_eq!(unsafe { image.read() }, 42);
    }

    struct CleanupGuard {
        #[allow(dead_code)]
        name: &'static str,
    }

    impl CleanupGuard {
        fn new(name: &'static str) -> Self {
            #[cfg(not(miri))]
            {
                let _ = unlink_if_exists(name);
            }
            Self { name }
        }
    }

    impl Drop for CleanupGuard {
        fn drop(&mut self) {
            #[cfg(not(miri))]
            {
                let _ = unlink_if_exists(self.name);
            }
        }
    }
}
