use std::{
    ffi::{CStr, CString},
    fs::File,
    io,
    os::fd::FromRawFd,
};

use anyhow::{Context, Result};
use memmap2::MmapMut;
use nix::errno::Errno;

use crate::{
    overlay::AbiType,
    shared_mem::{PAGE_SIZE, PageAligned, ShmemWrapper},
};

pub fn shm_open(name: &CStr) -> io::Result<File> {
    let mode = 0o666;
    let options = libc::O_RDWR | libc::O_CREAT;

    match unsafe { libc::shm_open(name.as_ptr(), options, mode) } {
        -1 => Err(Errno::last().into()),
        fd => Ok(unsafe { File::from_raw_fd(fd) }),
    }
}

pub fn shm_unlink(name: &CStr) -> io::Result<()> {
    match unsafe { libc::shm_unlink(name.as_ptr()) } {
        0 => Ok(()),
        _ => Err(Errno::last().into()),
    }
}

/// Remove the shared image called `name`. Live mappings stay valid.
pub fn unlink_if_exists(name: &str) -> io::Result<()> {
    let shm_name = into_shm_name(name)?;
    match shm_unlink(&shm_name) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
        Ok(()) => {
            log::debug!("unlinked shared image {name}");
            Ok(())
        }
    }
}

fn into_shm_name(path: &str) -> io::Result<CString> {
    CString::new(format!("/{path}")).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

pub struct SharedMem {
    map: MmapMut,
}

impl SharedMem {
    pub unsafe fn new(path: &str, length: usize) -> io::Result<Self> {
        let name = into_shm_name(path)?;
        let file = shm_open(&name)?;
        // Only ever grow: a second opener must not truncate a live image.
        if file.metadata()?.len() < length as u64 {
            file.set_len(length as u64)?;
        }
        let map = unsafe { MmapMut::map_mut(&file) }?;
        Ok(Self { map })
    }

    pub fn as_ptr(&self) -> *mut PageAligned {
        self.map.as_ptr().cast_mut().cast()
    }
}

pub fn get_memory<T: AbiType>(name: &str) -> Result<ShmemWrapper> {
    let length = PAGE_SIZE;

    let shmem = unsafe { SharedMem::new(name, length) }
        .with_context(|| format!("failed to map shared image {name:?}"))?;
    log::debug!(
        "mapped shared image {name:?} for {} ({length} bytes)",
        std::any::type_name::<T>()
    );

    Ok(ShmemWrapper { shmem })
}
