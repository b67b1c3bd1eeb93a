use std::{
    alloc::Layout,
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

use anyhow::{Result, anyhow};

use crate::{
    overlay::AbiType,
    shared_mem::{PageAligned, ShmemWrapper},
};

pub(super) fn get_memory<T: AbiType>(name: &str) -> Result<ShmemWrapper> {
    #[repr(transparent)]
    struct SendPtr(*mut PageAligned);

    unsafe impl Send for SendPtr {}
    unsafe impl Sync for SendPtr {}

    static TEST_MEMORY: OnceLock<Mutex<HashMap<String, SendPtr>>> = OnceLock::new();

    let memory_map = TEST_MEMORY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = memory_map
        .lock()
        .map_err(|_| anyhow!("mock shared memory table poisoned"))?;

    if let Some(ptr) = map.get(name) {
        return Ok(ShmemWrapper { pointer: ptr.0 });
    }

    let layout = Layout::new::<PageAligned>();
    let raw_ptr = unsafe { std::alloc::alloc_zeroed(layout) as *mut PageAligned };
    if raw_ptr.is_null() {
        return Err(anyhow!("failed to allocate mock shared image {name:?}"));
    }
    map.insert(name.to_string(), SendPtr(raw_ptr));

    Ok(ShmemWrapper { pointer: raw_ptr })
}
