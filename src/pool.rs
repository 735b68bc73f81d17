//! # Pool Allocator
//!
//! Fixed-size slot allocator. The free list lives in the unused slots
//! themselves: every slot starts with one word that links to the next free
//! slot.
//!
//! ```text
//!   slot 0             slot 1             slot 2             slot 3
//!   ┌──────┬────────┐  ┌──────┬────────┐  ┌──────┬────────┐  ┌──────┬────────┐
//!   │ next │  item  │  │IN USE│  item  │  │ next │  item  │  │ END  │  item  │
//!   └──┬───┴────────┘  └──────┴────────┘  └──┬───┴────────┘  └──────┴────────┘
//!      └──────────────────────────────────────┘ ──────────────────►
//!   free_list_head = slot 0
//! ```

use bytemuck::Pod;
use log::{debug, trace};

use crate::{
  align::{self, WORD},
  capability::{Allocator, Buffer, CallerBuffer},
  error::{Error, Result},
  global::GlobalAllocator,
};

/// Bytes in front of every item.
pub const SLOT_HEADER_SIZE: usize = WORD;

/// Link value ending the free list.
const END: usize = usize::MAX;

/// Link value marking a slot that was handed out.
const IN_USE: usize = usize::MAX - 1;

/// A pool of equally sized slots over a buffer obtained from an
/// [`Allocator`].
///
/// Items are identified by the offset of their first byte from the start of
/// the pool buffer. Released slots are handed out again most recent first.
#[derive(Debug)]
pub struct Pool<A: Allocator> {
  allocator: A,
  buffer: Buffer,
  item_size: usize,
  stride: usize,
  capacity: usize,
  free_list_head: Option<usize>,
}

/// Distance between two slots for items of `item_size` bytes.
#[inline]
pub fn stride_for(item_size: usize) -> Option<usize> {
  align::checked_align_up(item_size.checked_add(SLOT_HEADER_SIZE)?, WORD)
}

impl<'g> Pool<&'g mut GlobalAllocator> {
  /// Creates a pool of `capacity` slots carved out of `heap`.
  pub fn init(
    heap: &'g mut GlobalAllocator,
    item_size: usize,
    capacity: usize,
  ) -> Result<Self> {
    Self::init_with_allocator(item_size, capacity, heap)
  }
}

impl<'a> Pool<CallerBuffer<'a>> {
  /// Adopts a caller-owned buffer, fitting as many slots as it holds.
  /// Releasing it on [`deinit`](Pool::deinit) is a no-op.
  pub fn init_from_buffer(
    memory: &'a mut [u8],
    item_size: usize,
  ) -> Result<Self> {
    if item_size == 0 {
      return Err(Error::ZeroSize);
    }
    let stride = stride_for(item_size).ok_or(Error::ZeroCapacity)?;
    let capacity = memory.len() / stride;
    Self::init_with_allocator(item_size, capacity, CallerBuffer::new(memory)?)
  }
}

impl<A: Allocator> Pool<A> {
  /// Creates a pool of `capacity` slots of `item_size` bytes, backed by a
  /// buffer from `allocator`.
  pub fn init_with_allocator(
    item_size: usize,
    capacity: usize,
    mut allocator: A,
  ) -> Result<Self> {
    if item_size == 0 {
      return Err(Error::ZeroSize);
    }
    if capacity == 0 {
      return Err(Error::ZeroCapacity);
    }

    let stride = stride_for(item_size).ok_or(Error::ZeroSize)?;
    let requested = stride
      .checked_mul(capacity)
      .ok_or(Error::OutOfMemory { requested: usize::MAX })?;

    let buffer = allocator
      .allocate(requested)
      .ok_or(Error::OutOfMemory { requested })?;

    let mut pool = Self {
      allocator,
      buffer,
      item_size,
      stride,
      capacity,
      free_list_head: None,
    };
    pool.clear();

    debug!("pool of {capacity} x {item_size} byte slots (stride {stride})");
    Ok(pool)
  }

  /// Releases the buffer and hands the allocator back.
  pub fn deinit(self) -> Result<A> {
    let Self {
      mut allocator,
      buffer,
      capacity,
      ..
    } = self;

    allocator.release(buffer)?;
    debug!("pool of {capacity} slots released");
    Ok(allocator)
  }

  #[inline]
  pub fn item_size(&self) -> usize {
    self.item_size
  }

  #[inline]
  pub fn stride(&self) -> usize {
    self.stride
  }

  /// Number of slots.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Threads every slot onto the free list in address order, forgetting
  /// every outstanding item.
  pub fn clear(&mut self) {
    for slot in 0..self.capacity {
      let next = if slot + 1 < self.capacity {
        (slot + 1) * self.stride
      } else {
        END
      };
      self.set_link(slot * self.stride, next);
    }
    self.free_list_head = Some(0);
  }

  /// Pops a free slot and returns the offset of its item bytes, or `None`
  /// when every slot is in use.
  pub fn request(&mut self) -> Option<usize> {
    let slot = self.free_list_head?;
    let next = self.link(slot)?;

    self.free_list_head = (next != END).then_some(next);
    self.set_link(slot, IN_USE);

    trace!("pool slot {} requested", slot / self.stride);
    Some(slot + SLOT_HEADER_SIZE)
  }

  /// Pushes the slot holding `item` back onto the free list.
  ///
  /// Offsets that do not name an item are rejected with
  /// [`Error::InvalidHandle`], and slots that are already free with
  /// [`Error::DoubleRelease`].
  pub fn release(
    &mut self,
    item: usize,
  ) -> Result<()> {
    let slot = self.slot_of(item).ok_or(Error::InvalidHandle(item))?;
    if self.link(slot) != Some(IN_USE) {
      return Err(Error::DoubleRelease(item));
    }

    self.set_link(slot, self.free_list_head.unwrap_or(END));
    self.free_list_head = Some(slot);

    trace!("pool slot {} released", slot / self.stride);
    Ok(())
  }

  /// Walks the free list. Bounded by the slot count.
  pub fn count_free_nodes(&self) -> usize {
    let mut count = 0;
    let mut cursor = self.free_list_head;
    while let Some(slot) = cursor {
      if count == self.capacity {
        break;
      }
      count += 1;
      cursor = self.link(slot).filter(|next| *next != END && *next != IN_USE);
    }
    count
  }

  pub fn count_used_nodes(&self) -> usize {
    self.capacity - self.count_free_nodes()
  }

  /// The `item_size` bytes of the item at `item`.
  pub fn item(
    &self,
    item: usize,
  ) -> Option<&[u8]> {
    self.slot_of(item)?;
    self.allocator.bytes(&self.buffer)?.get(item..item + self.item_size)
  }

  pub fn item_mut(
    &mut self,
    item: usize,
  ) -> Option<&mut [u8]> {
    self.slot_of(item)?;
    let len = self.item_size;
    self.allocator.bytes_mut(&self.buffer)?.get_mut(item..item + len)
  }

  /// Stores `value` at the front of the item. Fails when `T` is larger than
  /// the item.
  pub fn write<T: Pod>(
    &mut self,
    item: usize,
    value: &T,
  ) -> Option<()> {
    let bytes = bytemuck::bytes_of(value);
    self.item_mut(item)?.get_mut(..bytes.len())?.copy_from_slice(bytes);
    Some(())
  }

  /// Reads a `T` from the front of the item.
  pub fn read<T: Pod>(
    &self,
    item: usize,
  ) -> Option<T> {
    let bytes = self.item(item)?.get(..core::mem::size_of::<T>())?;
    Some(bytemuck::pod_read_unaligned(bytes))
  }

  /// Slot offset for an item offset, if `item` is where some slot's item
  /// starts.
  fn slot_of(
    &self,
    item: usize,
  ) -> Option<usize> {
    let slot = item.checked_sub(SLOT_HEADER_SIZE)?;
    (slot % self.stride == 0 && slot / self.stride < self.capacity).then_some(slot)
  }

  fn link(
    &self,
    slot: usize,
  ) -> Option<usize> {
    let bytes = self.allocator.bytes(&self.buffer)?;
    let word = bytes.get(slot..slot + SLOT_HEADER_SIZE)?;
    Some(bytemuck::pod_read_unaligned(word))
  }

  fn set_link(
    &mut self,
    slot: usize,
    next: usize,
  ) {
    let Some(bytes) = self.allocator.bytes_mut(&self.buffer) else {
      return;
    };
    if let Some(word) = bytes.get_mut(slot..slot + SLOT_HEADER_SIZE) {
      word.copy_from_slice(&next.to_ne_bytes());
    }
  }
}
