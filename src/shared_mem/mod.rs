use std::alloc::Layout;

use anyhow::Result;

#[cfg(not(miri))]
pub use shmlink::unlink_if_exists;

use crate::overlay::AbiType;

#[cfg(miri)]
mod mock;
#[cfg(not(miri))]
mod shmlink;

const PAGE_SIZE: usize = 4096;
const _: () = assert!(std::mem::align_of::<PageAligned>() == PAGE_SIZE);

#[repr(align(4096))]
#[expect(dead_code)]
pub struct PageAligned([u8; PAGE_SIZE]);

pub(crate) struct ShmemWrapper {
    #[cfg(not(miri))]
    shmem: shmlink::SharedMem,
    #[cfg(miri)]
    pointer: *mut PageAligned,
}

impl ShmemWrapper {
    pub(crate) fn pointer(&self) -> *mut PageAligned {
        #[cfg(not(miri))]
        {
            self.shmem.as_ptr()
        }
        #[cfg(miri)]
        {
            self.pointer
        }
    }
}

/// Map (creating if needed) the region called `name`, sized for one `T`.
/// A new region reads as all zeroes.
pub(crate) fn get_memory<T: AbiType>(name: &str) -> Result<ShmemWrapper> {
    const {
        let layout = Layout::new::<T>();
        let page_layout = Layout::new::<PageAligned>();
        assert!(layout.align() <= page_layout.align());
        assert!(layout.size() <= page_layout.size());
    }
    #[cfg(miri)]
    {
        mock::get_memory::<T>(name)
    }
    #[cfg(not(miri))]
    {
        shmlink::get_memory::<T>(name)
    }
}
