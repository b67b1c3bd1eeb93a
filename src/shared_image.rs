use std::{marker::PhantomData, ptr};

use anyhow::Result;

use crate::{
    overlay::AbiType,
    shared_mem::{self, ShmemWrapper},
};

/// One ABI value living in a named shared-memory region, visible to every
/// process that opens the same name.
///
/// Reads and writes are plain volatile copies with no locking, so every access
/// is `unsafe`: two handles to the same name alias the same bytes, and a write
/// through one racing any access through another is a data race. The handle is
/// `Send` but not `Sync`. Pointer fields are only meaningful in whichever
/// process wrote them.
pub struct SharedImage<T: AbiType> {
    memory: ShmemWrapper,
    _marker: PhantomData<T>,
}

unsafe impl<T: AbiType> Send for SharedImage<T> {}

impl<T: AbiType> SharedImage<T> {
    /// Open the image called `name`, creating it zero-filled if it doesn't
    /// exist yet.
    ///
    /// # Safety
    ///
    /// Every opener of `name`, in any process, must use the same `T`.
    pub unsafe fn open(name: &str) -> Result<SharedImage<T>> {
        let memory = shared_mem::get_memory::<T>(name)?;
        Ok(SharedImage {
            memory,
            _marker: PhantomData,
        })
    }

    pub fn as_ptr(&self) -> *mut T {
        self.memory.pointer().cast()
    }

    /// # Safety
    ///
    /// No thread may be writing this image's region, through this or any other
    /// handle, for the duration of the call.
    pub unsafe fn read(&self) -> T {
        // SAFETY: the mapping is page-aligned, at least `size_of::<T>()` long
        // and initialized (zero-filled, then only ever written with `T`s); the
        // caller rules out concurrent writers.
        unsafe { ptr::read_volatile(self.as_ptr()) }
    }

    /// # Safety
    ///
    /// No thread may be reading or writing this image's region,
    /// through this or any other handle, for the duration of the call.
    pub unsafe fn write(&mut self, value: T) {
        // SAFETY: as in `read`, with the caller ruling out concurrent readers.
        unsafe { ptr::write_volatile(self.as_ptr(), value) }
    }

    /// Read, apply `f`, write back. Not atomic across processes.
    ///
    /// # Safety
    ///
    /// Same as [`Self::write`].
    pub unsafe fn update(&mut self, f: impl FnOnce(&mut T)) -> T {
        let mut value = unsafe { self.read() };
        f(&mut value);
        unsafe { self.write(value) };
        value
    }
}
