//! Per-architecture reference layouts.
//!
//! The numbers below are the sizes and offsets of the Windows SDK definitions
//! of `LIST_ENTRY`, `RTL_CRITICAL_SECTION_DEBUG` and `RTL_CRITICAL_SECTION`.
//! They are written out by hand, not computed, so the structs in this crate
//! are checked against them rather than against themselves.

/// Maximum field alignment for the critical-section structures (`#pragma pack(8)`).
pub const PACK: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntryLayout {
    pub size: usize,
    pub flink: usize,
    pub blink: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalSectionDebugLayout {
    pub size: usize,
    pub kind: usize,
    pub creator_back_trace_index: usize,
    pub critical_section: usize,
    pub process_locks_list: usize,
    pub entry_count: usize,
    pub contention_count: usize,
    pub flags: usize,
    pub creator_back_trace_index_high: usize,
    pub identifier: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalSectionLayout {
    pub size: usize,
    pub debug_info: usize,
    pub lock_count: usize,
    pub recursion_count: usize,
    pub owning_thread: usize,
    pub lock_semaphore: usize,
    pub spin_count: usize,
}

/// Everything the layout assertions need to know about one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLayout {
    pub name: &'static str,
    pub pointer_width: usize,
    pub list_entry: ListEntryLayout,
    pub critical_section_debug: CriticalSectionDebugLayout,
    pub critical_section: CriticalSectionLayout,
}

/// 32-bit x86 (`_M_IX86`).
pub const X86: TargetLayout = TargetLayout {
    name: "x86",
    pointer_width: 4,
    list_entry: ListEntryLayout {
        size: 8,
        flink: 0,
        blink: 4,
    },
    critical_section_debug: CriticalSectionDebugLayout {
        size: 32,
        kind: 0,
        creator_back_trace_index: 2,
        critical_section: 4,
        process_locks_list: 8,
        entry_count: 16,
        contention_count: 20,
        flags: 24,
        creator_back_trace_index_high: 28,
        identifier: 30,
    },
    critical_section: CriticalSectionLayout {
        size: 24,
        debug_info: 0,
        lock_count: 4,
        recursion_count: 8,
        owning_thread: 12,
        lock_semaphore: 16,
        spin_count: 20,
    },
};

/// Every 64-bit target (x86_64, aarch64).
pub const X64: TargetLayout = TargetLayout {
    name: "64-bit",
    pointer_width: 8,
    list_entry: ListEntryLayout {
        size: 16,
        flink: 0,
        blink: 8,
    },
    critical_section_debug: CriticalSectionDebugLayout {
        size: 48,
        kind: 0,
        creator_back_trace_index: 2,
        critical_section: 8,
        process_locks_list: 16,
        entry_count: 32,
        contention_count: 36,
        flags: 40,
        creator_back_trace_index_high: 44,
        identifier: 46,
    },
    critical_section: CriticalSectionLayout {
        size: 40,
        debug_info: 0,
        lock_count: 8,
        recursion_count: 12,
        owning_thread: 16,
        lock_semaphore: 24,
        spin_count: 32,
    },
};

#[cfg(all(target_pointer_width = "32", not(target_arch = "x86")))]
compile_error!("only 32-bit x86 and 64-bit targets have reference layouts");

/// Reference layout for the target being compiled.
#[cfg(target_arch = "x86")]
pub const CURRENT: TargetLayout = X86;
/// Reference layout for the target being compiled.
#[cfg(not(target_arch = "x86"))]
pub const CURRENT: TargetLayout = X64;
