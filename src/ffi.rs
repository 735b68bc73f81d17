//! C ABI for minimal-runtime hosts (e.g. a sandboxed module).
//!
//! One process-wide [`GlobalAllocator`] sits behind these functions. A null
//! pointer is `0`. Addresses are region addresses; [`region_base`] gives the
//! host the backing bytes of `region_start()`, and stays valid until the
//! next [`region_configure`] call.

use spin::Mutex;

use crate::global::GlobalAllocator;

static REGION: Mutex<GlobalAllocator> = Mutex::new(GlobalAllocator::new());

/// Configures, grows or resets the region. Returns `false` when
/// `end <= start`.
#[unsafe(no_mangle)]
pub extern "C" fn region_configure(
  start: usize,
  end: usize,
) -> bool {
  REGION.lock().configure(start, end).is_ok()
}

/// Returns a region address, or `0` when nothing fits.
///
/// Region addresses are not host addresses, even when the region was
/// configured from `__heap_base`/`__heap_end`. The usable bytes sit at
/// `region_base() + (addr - region_start())`.
#[unsafe(no_mangle)]
pub extern "C" fn region_allocate(size: usize) -> usize {
  REGION.lock().allocate(size).unwrap_or(0)
}

/// Unknown or out-of-range pointers are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn region_release(ptr: usize) {
  REGION.lock().release(ptr);
}

#[unsafe(no_mangle)]
pub extern "C" fn region_reallocate(
  ptr: usize,
  new_size: usize,
) -> usize {
  let ptr = (ptr != 0).then_some(ptr);
  REGION.lock().reallocate(ptr, new_size).unwrap_or(0)
}

#[unsafe(no_mangle)]
pub extern "C" fn region_start() -> usize {
  REGION.lock().start()
}

#[unsafe(no_mangle)]
pub extern "C" fn region_end() -> usize {
  REGION.lock().end()
}

#[unsafe(no_mangle)]
pub extern "C" fn region_base() -> *mut u8 {
  REGION.lock().base_ptr()
}
