//! # Arena Allocator
//!
//! A bump allocator over one buffer, with save points to roll back to.

use log::debug;

use crate::{
  align::{self, WORD},
  capability::{Allocator, Buffer, CallerBuffer},
  error::{Error, Result},
  global::GlobalAllocator,
};

/// An arena offset captured by [`Arena::save_point`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SavePoint(usize);

impl SavePoint {
  #[inline]
  pub fn offset(self) -> usize {
    self.0
  }
}

/// A bump-pointer arena over a buffer obtained from an [`Allocator`].
///
/// Allocations only move the offset forward. Individual allocations are
/// never released: [`restore_point`](Self::restore_point) rewinds the offset,
/// invalidating (but not zeroing) everything allocated since the save point.
///
/// ```text
///   0                      idx                         capacity
///   ├──────┬─────┬─────────┼───────────────────────────────┤
///   │  a1  │ a2  │   a3    │          remaining            │
///   └──────┴─────┴─────────┴───────────────────────────────┘
///          ▲ save point      restore_point rewinds idx here
/// ```
///
/// Allocations are identified by their offset from the start of the arena.
#[derive(Debug)]
pub struct Arena<A: Allocator> {
  allocator: A,
  buffer: Buffer,
  capacity: usize,
  idx: usize,
}

impl<'g> Arena<&'g mut GlobalAllocator> {
  /// Creates an arena of `capacity` bytes carved out of `heap`.
  pub fn init(
    heap: &'g mut GlobalAllocator,
    capacity: usize,
  ) -> Result<Self> {
    Self::init_with_allocator(capacity, heap)
  }
}

impl<'a> Arena<CallerBuffer<'a>> {
  /// Adopts a caller-owned buffer. Releasing it on
  /// [`deinit`](Arena::deinit) is a no-op.
  pub fn init_from_buffer(memory: &'a mut [u8]) -> Result<Self> {
    let capacity = memory.len();
    Self::init_with_allocator(capacity, CallerBuffer::new(memory)?)
  }
}

impl<A: Allocator> Arena<A> {
  /// Creates an arena of `capacity` bytes obtained from `allocator`.
  pub fn init_with_allocator(
    capacity: usize,
    mut allocator: A,
  ) -> Result<Self> {
    if capacity == 0 {
      return Err(Error::ZeroCapacity);
    }

    let buffer = allocator
      .allocate(capacity)
      .ok_or(Error::OutOfMemory { requested: capacity })?;

    debug!("arena of {capacity} bytes at {:#x}", buffer.addr());
    Ok(Self {
      allocator,
      buffer,
      capacity,
      idx: 0,
    })
  }

  /// Releases the buffer and hands the allocator back.
  ///
  /// Fails with [`Error::ReleaseUnsupported`] when the allocator cannot take
  /// the buffer back.
  pub fn deinit(self) -> Result<A> {
    let Self {
      mut allocator,
      buffer,
      capacity,
      ..
    } = self;

    allocator.release(buffer)?;
    debug!("arena of {capacity} bytes released");
    Ok(allocator)
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes consumed so far.
  #[inline]
  pub fn used(&self) -> usize {
    self.idx
  }

  #[inline]
  pub fn remaining(&self) -> usize {
    self.capacity - self.idx
  }

  /// Bumps the offset by `size` rounded up to the machine word and returns
  /// the offset of the allocation, or `None` when it does not fit.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<usize> {
    let size = align::checked_align_up(size, WORD)?;
    let end = self.idx.checked_add(size)?;
    if end > self.capacity {
      return None;
    }

    let offset = self.idx;
    self.idx = end;
    Some(offset)
  }

  #[inline]
  pub fn save_point(&self) -> SavePoint {
    SavePoint(self.idx)
  }

  /// Rewinds to `point`. Save points must be restored in stack order; a
  /// point past the current offset is rejected and nothing changes.
  pub fn restore_point(
    &mut self,
    point: SavePoint,
  ) -> Result<()> {
    if point.0 > self.idx {
      return Err(Error::InvalidSavePoint {
        requested: point.0,
        current: self.idx,
      });
    }
    self.idx = point.0;
    Ok(())
  }

  /// Rewinds to the start of the buffer.
  #[inline]
  pub fn reset(&mut self) {
    self.idx = 0;
  }

  /// View of `len` bytes at `offset`, within the allocated part of the arena.
  pub fn bytes(
    &self,
    offset: usize,
    len: usize,
  ) -> Option<&[u8]> {
    let end = offset.checked_add(len)?;
    if end > self.idx {
      return None;
    }
    self.allocator.bytes(&self.buffer)?.get(offset..end)
  }

  pub fn bytes_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> Option<&mut [u8]> {
    let end = offset.checked_add(len)?;
    if end > self.idx {
      return None;
    }
    self.allocator.bytes_mut(&self.buffer)?.get_mut(offset..end)
  }
}
