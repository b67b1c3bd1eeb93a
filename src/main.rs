use std::{env, mem::offset_of};

use winnt_abi::{RtlCriticalSection, RtlCriticalSectionDebug, arch};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("layout") => {
            print_layout();
            Ok(())
        }
        #[cfg(all(unix, feature = "shm"))]
        Some("child") => demo::child_process(),
        #[cfg(all(unix, feature = "shm"))]
        _ => demo::parent_process(),
        #[cfg(not(all(unix, feature = "shm")))]
        _ => {
            print_layout();
            Ok(())
        }
    }
}

fn print_layout() {
    let reference = arch::CURRENT;
    println!("=== {} (pack {}) ===", reference.name, arch::PACK);

    let debug = reference.critical_section_debug;
    println!("RTL_CRITICAL_SECTION_DEBUG");
    for (field, expected, actual) in [
        ("size", debug.size, size_of::<RtlCriticalSectionDebug>()),
        ("Type", debug.kind, offset_of!(RtlCriticalSectionDebug, kind)),
        (
            "CriticalSection",
            debug.critical_section,
            offset_of!(RtlCriticalSectionDebug, critical_section),
        ),
        (
            "ProcessLocksList",
            debug.process_locks_list,
            offset_of!(RtlCriticalSectionDebug, process_locks_list),
        ),
        (
            "EntryCount",
            debug.entry_count,
            offset_of!(RtlCriticalSectionDebug, entry_count),
        ),
        (
            "ContentionCount",
            debug.contention_count,
            offset_of!(RtlCriticalSectionDebug, contention_count),
        ),
        ("Flags", debug.flags, offset_of!(RtlCriticalSectionDebug, flags)),
        (
            "Identifier",
            debug.identifier,
            offset_of!(RtlCriticalSectionDebug, identifier),
        ),
    ] {
        println!("  {field:<18} {expected:>3} {actual:>3}");
    }

    let section = reference.critical_section;
    println!("RTL_CRITICAL_SECTION");
    for (field, expected, actual) in [
        ("size", section.size, size_of::<RtlCriticalSection>()),
        (
            "DebugInfo",
            section.debug_info,
            offset_of!(RtlCriticalSection, debug_info),
        ),
        (
            "LockCount",
            section.lock_count,
            offset_of!(RtlCriticalSection, lock_count),
        ),
        (
            "RecursionCount",
            section.recursion_count,
            offset_of!(RtlCriticalSection, recursion_count),
        ),
        (
            "OwningThread",
            section.owning_thread,
            offset_of!(RtlCriticalSection, owning_thread),
        ),
        (
            "LockSemaphore",
            section.lock_semaphore,
            offset_of!(RtlCriticalSection, lock_semaphore),
        ),
        (
            "SpinCount",
            section.spin_count,
            offset_of!(RtlCriticalSection, spin_count),
        ),
    ] {
        println!("  {field:<18} {expected:>3} {actual:>3}");
    }
}

#[cfg(all(unix, feature = "shm"))]
mod demo {
    use std::{env, process::Command};

    use anyhow::{Context, bail};
    use nix::unistd::getpid;
    use winnt_abi::{RTL_CRITSECT_TYPE, RtlCriticalSectionDebug, SharedImage, unlink_if_exists};

    const IMAGE_NAME: &str = "winnt_abi_demo";

    type SharedDebug = SharedImage<RtlCriticalSectionDebug>;

    pub fn parent_process() -> anyhow::Result<()> {
        println!("=== Parent Process ({}) ===", getpid());
        unlink_if_exists(IMAGE_NAME)?;

        let mut shared = unsafe { SharedDebug::open(IMAGE_NAME) }?;
        // SAFETY: the child isn't running yet and this is the only handle.
        let written = unsafe {
            shared.update(|record| {
                *record = RtlCriticalSectionDebug {
                    kind: RTL_CRITSECT_TYPE,
                    entry_count: 5,
                    contention_count: 2,
                    ..RtlCriticalSectionDebug::zeroed()
                }
            })
        };
        println!("Parent: wrote debug record {written:?}");

        let status = Command::new(env::current_exe()?)
            .arg("child")
            .status()
            .context("failed to run child")?;
        if !status.success() {
            bail!("child exited with {status}");
        }

        // SAFETY: the child has exited.
        let record = unsafe { shared.read() };
        let (entries, contentions) = (record.entry_count, record.contention_count);
        println!("Parent: final entry count {entries}, contention count {contentions}");

        unlink_if_exists(IMAGE_NAME)?;
        Ok(())
    }

    pub fn child_process() -> anyhow::Result<()> {
        println!("  Child ({}): starting", getpid());

        let mut shared = unsafe { SharedDebug::open(IMAGE_NAME) }?;
        // SAFETY: the parent is blocked waiting for this process to exit.
        let record = unsafe { shared.update(|record| record.contention_count += 1) };
        let (entries, contentions) = (record.entry_count, record.contention_count);
        println!("  Child: saw entry count {entries}, bumped contention count to {contentions}");
        Ok(())
    }
}
