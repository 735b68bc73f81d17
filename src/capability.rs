//! # Allocator Capability
//!
//! The `{allocate, release}` pair arenas and pools obtain their backing
//! buffer through. A [`Buffer`] is an owned handle: it is not `Clone`, and
//! releasing it consumes it, so a buffer can neither be released twice nor
//! read after release.
//!
//! ```text
//!   ┌─────────────┐  allocate(size)   ┌──────────────────────────┐
//!   │ Arena/Pool  │ ────────────────► │ impl Allocator           │
//!   │             │ ◄──── Buffer ──── │  GlobalAllocator         │
//!   │             │                   │  CallerBuffer  (no-op)   │
//!   │             │ ── release(buf) ► │  SystemAllocator (libc)  │
//!   └─────────────┘                   └──────────────────────────┘
//! ```

use alloc::collections::BTreeMap;
use core::{ptr::NonNull, slice};

use log::{debug, warn};

use crate::{
  error::{Error, Result},
  global::{GlobalAllocator, Release},
};

/// An owned span of bytes handed out by an [`Allocator`].
#[derive(Debug, PartialEq, Eq)]
pub struct Buffer {
  addr: usize,
  len: usize,
}

impl Buffer {
  /// Mints a handle. Meant for [`Allocator`] implementations, which must
  /// validate handles again in [`Allocator::bytes`].
  pub fn new(
    addr: usize,
    len: usize,
  ) -> Self {
    Self { addr, len }
  }

  /// Address of the first byte in the owning allocator's address space.
  #[inline]
  pub fn addr(&self) -> usize {
    self.addr
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }
}

/// Source of backing buffers for arenas and pools.
pub trait Allocator {
  /// Reserves `size` bytes. `None` means the request was refused.
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Buffer>;

  /// Gives a buffer back.
  ///
  /// Allocators without a release operation keep this default, which
  /// reports [`Error::ReleaseUnsupported`] instead of silently dropping the
  /// buffer.
  fn release(
    &mut self,
    buffer: Buffer,
  ) -> Result<()> {
    let _ = buffer;
    Err(Error::ReleaseUnsupported)
  }

  /// The bytes behind `buffer`, if it belongs to this allocator.
  fn bytes(
    &self,
    buffer: &Buffer,
  ) -> Option<&[u8]>;

  fn bytes_mut(
    &mut self,
    buffer: &Buffer,
  ) -> Option<&mut [u8]>;
}

impl<A: Allocator + ?Sized> Allocator for &mut A {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Buffer> {
    (**self).allocate(size)
  }

  fn release(
    &mut self,
    buffer: Buffer,
  ) -> Result<()> {
    (**self).release(buffer)
  }

  fn bytes(
    &self,
    buffer: &Buffer,
  ) -> Option<&[u8]> {
    (**self).bytes(buffer)
  }

  fn bytes_mut(
    &mut self,
    buffer: &Buffer,
  ) -> Option<&mut [u8]> {
    (**self).bytes_mut(buffer)
  }
}

impl Allocator for GlobalAllocator {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Buffer> {
    GlobalAllocator::allocate(self, size).map(|addr| Buffer::new(addr, size))
  }

  fn release(
    &mut self,
    buffer: Buffer,
  ) -> Result<()> {
    match GlobalAllocator::release(self, buffer.addr) {
      Release::Released => Ok(()),
      Release::OutOfRange | Release::Untracked => Err(Error::InvalidHandle(buffer.addr)),
    }
  }

  fn bytes(
    &self,
    buffer: &Buffer,
  ) -> Option<&[u8]> {
    GlobalAllocator::bytes(self, buffer.addr, buffer.len)
  }

  fn bytes_mut(
    &mut self,
    buffer: &Buffer,
  ) -> Option<&mut [u8]> {
    GlobalAllocator::bytes_mut(self, buffer.addr, buffer.len)
  }
}

/// Lends a caller-owned slice out once; releasing it is an explicit no-op.
///
/// Buffers minted here address the slice by offset, starting at `0`.
#[derive(Debug)]
pub struct CallerBuffer<'a> {
  memory: &'a mut [u8],
  lent: bool,
}

impl<'a> CallerBuffer<'a> {
  /// Adopts `memory`. An empty slice is rejected.
  pub fn new(memory: &'a mut [u8]) -> Result<Self> {
    if memory.is_empty() {
      return Err(Error::EmptyBuffer);
    }
    Ok(Self { memory, lent: false })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.memory.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.memory.is_empty()
  }
}

impl Allocator for CallerBuffer<'_> {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Buffer> {
    if self.lent || size == 0 || size > self.memory.len() {
      return None;
    }
    self.lent = true;
    Some(Buffer::new(0, size))
  }

  fn release(
    &mut self,
    buffer: Buffer,
  ) -> Result<()> {
    debug!("caller buffer of {} bytes returned, nothing to free", buffer.len);
    self.lent = false;
    Ok(())
  }

  fn bytes(
    &self,
    buffer: &Buffer,
  ) -> Option<&[u8]> {
    self.memory.get(buffer.addr..buffer.addr.checked_add(buffer.len)?)
  }

  fn bytes_mut(
    &mut self,
    buffer: &Buffer,
  ) -> Option<&mut [u8]> {
    self.memory.get_mut(buffer.addr..buffer.addr.checked_add(buffer.len)?)
  }
}

/// The host platform allocator (`calloc`/`free`).
///
/// Live buffers are tracked so views are only formed over memory this
/// allocator still owns. Anything not released is freed on drop.
#[derive(Debug, Default)]
pub struct SystemAllocator {
  live: BTreeMap<usize, usize>,
}

impl SystemAllocator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of buffers handed out and not yet released.
  pub fn live_buffers(&self) -> usize {
    self.live.len()
  }

  fn owns(
    &self,
    buffer: &Buffer,
  ) -> bool {
    self
      .live
      .get(&buffer.addr)
      .is_some_and(|len| buffer.len <= *len)
  }
}

impl Allocator for SystemAllocator {
  fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Buffer> {
    if size == 0 {
      return None;
    }

    // SAFETY: calloc has no preconditions; a null result is handled below.
    let ptr = unsafe { libc::calloc(1, size) } as *mut u8;
    let ptr = NonNull::new(ptr)?;

    let addr = ptr.as_ptr() as usize;
    self.live.insert(addr, size);
    Some(Buffer::new(addr, size))
  }

  fn release(
    &mut self,
    buffer: Buffer,
  ) -> Result<()> {
    if self.live.remove(&buffer.addr).is_none() {
      warn!("system release of unknown buffer {:#x}", buffer.addr);
      return Err(Error::InvalidHandle(buffer.addr));
    }

    // SAFETY: `addr` came from calloc and was still live.
    unsafe { libc::free(buffer.addr as *mut libc::c_void) };
    Ok(())
  }

  fn bytes(
    &self,
    buffer: &Buffer,
  ) -> Option<&[u8]> {
    if !self.owns(buffer) {
      return None;
    }
    // SAFETY: the span lies inside a live calloc allocation owned by self.
    Some(unsafe { slice::from_raw_parts(buffer.addr as *const u8, buffer.len) })
  }

  fn bytes_mut(
    &mut self,
    buffer: &Buffer,
  ) -> Option<&mut [u8]> {
    if !self.owns(buffer) {
      return None;
    }
    // SAFETY: as in `bytes`, and `&mut self` makes the view exclusive.
    Some(unsafe { slice::from_raw_parts_mut(buffer.addr as *mut u8, buffer.len) })
  }
}

impl Drop for SystemAllocator {
  fn drop(&mut self) {
    for (addr, _) in core::mem::take(&mut self.live) {
      // SAFETY: every tracked address is a live calloc allocation.
      unsafe { libc::free(addr as *mut libc::c_void) };
    }
  }
}
