use alloc::vec::Vec;
use core::iter::FusedIterator;

use log::{debug, trace, warn};

use crate::{
  align::{self, WORD},
  block::{BlockHeader, HEADER_SIZE, NIL},
  error::{Error, Result},
};

/// Which branch a [`GlobalAllocator::configure`] call took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Configured {
  /// First configuration of this allocator.
  Fresh,
  /// Same start, larger end: `added` bytes were zero-filled and every live
  /// block was kept.
  Grown { added: usize },
  /// Any other reconfiguration: all live blocks were discarded.
  Reset,
}

/// Outcome of a [`GlobalAllocator::release`] call.
///
/// Only `Released` changes the allocator; the other two are tolerated
/// no-ops reported for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
  Released,
  /// The pointer lies outside the region.
  OutOfRange,
  /// The pointer is inside the region but does not start a live block.
  Untracked,
}

/// Snapshot of one live block, as yielded by [`GlobalAllocator::blocks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  /// Address of the block header.
  pub header: usize,
  /// Address handed to the caller.
  pub ptr: usize,
  /// Bytes reserved, header and padding included.
  pub size: usize,
  /// Reserved bytes the caller cannot use.
  pub padding: usize,
}

impl BlockInfo {
  /// One past the last reserved address.
  #[inline]
  pub fn end(&self) -> usize {
    self.header + self.size
  }

  #[inline]
  pub fn usable(&self) -> usize {
    self.size - self.padding - HEADER_SIZE
  }
}

/// First-fit free-list allocator over the address range `[start, end)`.
///
/// Live blocks form an address-ordered doubly linked list whose headers sit
/// in the region bytes themselves. Free space is never recorded: it is
/// whatever lies between two consecutive live blocks, before the first one,
/// or after the last one. Released blocks are unlinked and their span is
/// left for a later first-fit scan; adjacent gaps are never merged.
///
/// ```text
///   start                                                        end
///   │  ┌────┬──────┐        ┌────┬────────┐  ┌────┬───┐            │
///   └─►│hdr │ data │  gap   │hdr │  data  │  │hdr │dat│   tail     │
///      └────┴──────┘        └────┴────────┘  └────┴───┘            │
///        ▲ head ──next──────►  ◄──prev──next───►                    │
/// ```
#[derive(Debug)]
pub struct GlobalAllocator {
  start: usize,
  end: usize,
  head: Option<usize>,
  memory: Vec<u8>,
}

impl Default for GlobalAllocator {
  fn default() -> Self {
    Self::new()
  }
}

impl GlobalAllocator {
  /// Creates an unconfigured allocator. Every allocation fails until
  /// [`configure`](Self::configure) succeeds.
  pub const fn new() -> Self {
    Self {
      start: 0,
      end: 0,
      head: None,
      memory: Vec::new(),
    }
  }

  /// Creates an allocator already configured for `[start, end)`.
  pub fn with_region(
    start: usize,
    end: usize,
  ) -> Result<Self> {
    let mut heap = Self::new();
    heap.configure(start, end)?;
    Ok(heap)
  }

  /// Establishes, grows or resets the managed region.
  ///
  /// Calling again with the same `start` and a larger `end` zero-fills only
  /// the new tail and keeps every live block. Any other call discards all
  /// live blocks and zero-fills the whole range.
  pub fn configure(
    &mut self,
    start: usize,
    end: usize,
  ) -> Result<Configured> {
    if end <= start {
      return Err(Error::InvalidRegion { start, end });
    }

    let len = end - start;

    if self.is_configured() && start == self.start && end > self.end {
      let added = end - self.end;
      self.memory.resize(len, 0);
      self.end = end;
      debug!("region grown by {added} bytes to [{start:#x}, {end:#x})");
      return Ok(Configured::Grown { added });
    }

    let outcome = if self.is_configured() {
      Configured::Reset
    } else {
      Configured::Fresh
    };

    self.memory.clear();
    self.memory.resize(len, 0);
    self.start = start;
    self.end = end;
    self.head = None;

    debug!("region configured as [{start:#x}, {end:#x}) ({outcome:?})");
    Ok(outcome)
  }

  #[inline]
  pub fn is_configured(&self) -> bool {
    self.end > self.start
  }

  #[inline]
  pub fn start(&self) -> usize {
    self.start
  }

  #[inline]
  pub fn end(&self) -> usize {
    self.end
  }

  /// Bytes blocks can be placed in: from the first word-aligned address at
  /// or after `start` up to `end`.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.end.saturating_sub(self.base())
  }

  /// First word-aligned address blocks may be placed at.
  #[inline]
  fn base(&self) -> usize {
    align::align_up(self.start, WORD)
  }

  /// Reserves `size` usable bytes and returns the address of the first one.
  ///
  /// The reserved block is the smallest word multiple holding `size` plus a
  /// header, placed in the first gap (in address order) large enough for it.
  /// Returned memory reads as zero. `None` means no gap fits.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<usize> {
    if !self.is_configured() {
      trace!("allocate({size}) before the region was configured");
      return None;
    }

    let requested = size.checked_add(HEADER_SIZE)?;
    let total = align::checked_align_up(requested, WORD)?;
    let padding = total - requested;

    let Some((at, prev, next)) = self.find_space(total) else {
      trace!("allocate({size}): no gap of {total} bytes left");
      return None;
    };

    let header = BlockHeader::new(total, padding, prev, next);
    let slot = at - self.start;
    if !header.write(&mut self.memory, slot) {
      return None;
    }

    match prev {
      Some(prev) => self.set_next(prev, Some(at)),
      None => self.head = Some(at),
    }
    if let Some(next) = next {
      self.set_prev(next, Some(at));
    }

    self.memory[slot + HEADER_SIZE..slot + total].fill(0);

    trace!("allocate({size}): block of {total} bytes at {at:#x}");
    Some(at + HEADER_SIZE)
  }

  /// Finds where a block of `total` bytes goes, with its future neighbours.
  fn find_space(
    &self,
    total: usize,
  ) -> Option<(usize, Option<usize>, Option<usize>)> {
    let base = self.base();

    let Some(head) = self.head else {
      return self.fits(base, total).then_some((base, None, None));
    };

    if head > base && head - base >= total {
      return Some((base, None, Some(head)));
    }

    let mut node = head;
    loop {
      let header = self.header(node)?;
      let node_end = node.checked_add(header.size)?;

      match header.next() {
        Some(next) => {
          if next <= node {
            warn!("block list out of order at {node:#x}");
            return None;
          }
          if next > node_end && next - node_end >= total {
            return Some((node_end, Some(node), Some(next)));
          }
          node = next;
        }
        None => {
          return self
            .fits(node_end, total)
            .then_some((node_end, Some(node), None));
        }
      }
    }
  }

  #[inline]
  fn fits(
    &self,
    at: usize,
    total: usize,
  ) -> bool {
    at.checked_add(total).is_some_and(|block_end| block_end <= self.end)
  }

  /// Returns a block to the region.
  ///
  /// Pointers outside the region, or not starting a live block (including
  /// pointers already released), are ignored; the returned [`Release`] says
  /// which case applied.
  pub fn release(
    &mut self,
    ptr: usize,
  ) -> Release {
    let Some(at) = self.header_address(ptr) else {
      warn!("release({ptr:#x}): outside region [{:#x}, {:#x})", self.start, self.end);
      return Release::OutOfRange;
    };

    let Some(header) = self.tracked(at) else {
      warn!("release({ptr:#x}): not a live block");
      return Release::Untracked;
    };

    match header.prev() {
      Some(prev) => self.set_next(prev, header.next()),
      None => self.head = header.next(),
    }
    if let Some(next) = header.next() {
      self.set_prev(next, header.prev());
    }

    trace!("release({ptr:#x}): freed {} bytes", header.size);
    Release::Released
  }

  /// Moves a block into a fresh allocation of `new_size` bytes.
  ///
  /// The first `min(old, new_size)` bytes are copied over and the old block
  /// is released. `None` as `ptr` behaves like [`allocate`](Self::allocate).
  /// If the new block cannot be placed the old one is left untouched.
  pub fn reallocate(
    &mut self,
    ptr: Option<usize>,
    new_size: usize,
  ) -> Option<usize> {
    let Some(old) = ptr else {
      return self.allocate(new_size);
    };

    let old_len = match self.header_address(old).and_then(|at| self.tracked(at)) {
      Some(header) => header.usable(),
      None => {
        warn!("reallocate({old:#x}): not a live block, allocating afresh");
        return self.allocate(new_size);
      }
    };

    let new = self.allocate(new_size)?;
    let count = old_len.min(new_size);
    let src = old - self.start;
    let dst = new - self.start;
    self.memory.copy_within(src..src + count, dst);

    self.release(old);
    Some(new)
  }

  /// Usable bytes of the live block starting at `ptr`.
  pub fn usable_size(
    &self,
    ptr: usize,
  ) -> Option<usize> {
    let at = self.header_address(ptr)?;
    self.tracked(at).map(|header| header.usable())
  }

  /// The usable bytes of the live block starting at `ptr`.
  pub fn data(
    &self,
    ptr: usize,
  ) -> Option<&[u8]> {
    let len = self.usable_size(ptr)?;
    self.bytes(ptr, len)
  }

  pub fn data_mut(
    &mut self,
    ptr: usize,
  ) -> Option<&mut [u8]> {
    let len = self.usable_size(ptr)?;
    self.bytes_mut(ptr, len)
  }

  /// Raw view of `len` region bytes starting at `addr`.
  pub fn bytes(
    &self,
    addr: usize,
    len: usize,
  ) -> Option<&[u8]> {
    let range = self.range(addr, len)?;
    self.memory.get(range)
  }

  pub fn bytes_mut(
    &mut self,
    addr: usize,
    len: usize,
  ) -> Option<&mut [u8]> {
    let range = self.range(addr, len)?;
    self.memory.get_mut(range)
  }

  /// Live blocks in address order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      heap: self,
      cursor: self.head,
    }
  }

  pub fn live_blocks(&self) -> usize {
    self.blocks().count()
  }

  /// Bytes reserved by live blocks, headers and padding included.
  pub fn used_bytes(&self) -> usize {
    self.blocks().map(|block| block.size).sum()
  }

  /// Start of the backing bytes, for hosts that address the region directly.
  #[cfg(feature = "ffi")]
  pub(crate) fn base_ptr(&mut self) -> *mut u8 {
    self.memory.as_mut_ptr()
  }

  fn range(
    &self,
    addr: usize,
    len: usize,
  ) -> Option<core::ops::Range<usize>> {
    let offset = addr.checked_sub(self.start)?;
    let end = offset.checked_add(len)?;
    (end <= self.memory.len()).then_some(offset..end)
  }

  /// Header address for a caller pointer, if the header lies inside the
  /// region. A header-only block at the tail hands out `ptr == end`.
  fn header_address(
    &self,
    ptr: usize,
  ) -> Option<usize> {
    let at = ptr.checked_sub(HEADER_SIZE)?;
    (at >= self.start && ptr <= self.end).then_some(at)
  }

  fn header(
    &self,
    at: usize,
  ) -> Option<BlockHeader> {
    BlockHeader::read(&self.memory, at.checked_sub(self.start)?)
  }

  /// The header at `at`, if a live block starts there.
  fn tracked(
    &self,
    at: usize,
  ) -> Option<BlockHeader> {
    let mut cursor = self.head;
    while let Some(node) = cursor {
      if node > at {
        return None;
      }
      let header = self.header(node)?;
      if node == at {
        return Some(header);
      }
      cursor = header.next().filter(|next| *next > node);
    }
    None
  }

  fn update(
    &mut self,
    at: usize,
    edit: impl FnOnce(&mut BlockHeader),
  ) {
    let Some(mut header) = self.header(at) else {
      return;
    };
    edit(&mut header);
    header.write(&mut self.memory, at - self.start);
  }

  fn set_next(
    &mut self,
    at: usize,
    next: Option<usize>,
  ) {
    self.update(at, |header| header.next = next.unwrap_or(NIL));
  }

  fn set_prev(
    &mut self,
    at: usize,
    prev: Option<usize>,
  ) {
    self.update(at, |header| header.prev = prev.unwrap_or(NIL));
  }
}

/// Iterator over live blocks, see [`GlobalAllocator::blocks`].
#[derive(Debug)]
pub struct Blocks<'a> {
  heap: &'a GlobalAllocator,
  cursor: Option<usize>,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let at = self.cursor?;
    let header = self.heap.header(at)?;
    self.cursor = header.next().filter(|next| *next > at);
    Some(BlockInfo {
      header: at,
      ptr: at + HEADER_SIZE,
      size: header.size,
      padding: header.padding,
    })
  }
}

impl FusedIterator for Blocks<'_> {}

#[cfg(test)]
mod tests {
  use alloc::vec::Vec;

  use pretty_assertions::assert_eq;
  use proptest::prelude::*;
  use rstest::rstest;

  use super::*;

  const START: usize = 0x1000;
  const REGION: usize = 16 * 1024;

  fn heap() -> GlobalAllocator {
    GlobalAllocator::with_region(START, START + REGION).unwrap()
  }

  fn assert_disjoint(heap: &GlobalAllocator) {
    let blocks: Vec<BlockInfo> = heap.blocks().collect();
    for pair in blocks.windows(2) {
      assert!(pair[0].end() <= pair[1].header, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    if let Some(last) = blocks.last() {
      assert!(last.end() <= heap.end());
    }
  }

  #[test]
  fn test_unconfigured_allocate_fails() {
    let mut heap = GlobalAllocator::new();
    assert_eq!(heap.allocate(8), None);
    assert_eq!(heap.release(8), Release::OutOfRange);
  }

  #[rstest]
  #[case(0x10, 0x10)]
  #[case(0x20, 0x10)]
  fn test_configure_rejects_empty_region(
    #[case] start: usize,
    #[case] end: usize,
  ) {
    let mut heap = GlobalAllocator::new();
    assert_eq!(heap.configure(start, end), Err(Error::InvalidRegion { start, end }));
    assert!(!heap.is_configured());
  }

  #[test]
  fn test_first_block_at_start() {
    let mut heap = heap();
    let ptr = heap.allocate(10).unwrap();

    assert_eq!(ptr, START + HEADER_SIZE);
    let block = heap.blocks().next().unwrap();
    assert_eq!(block.size, align!(10 + HEADER_SIZE));
    assert_eq!(block.usable(), 10);
    assert_eq!(heap.usable_size(ptr), Some(10));
  }

  #[test]
  fn test_unaligned_start_yields_aligned_pointers() {
    let mut heap = GlobalAllocator::with_region(START + 3, START + 3 + 512).unwrap();
    let a = heap.allocate(5).unwrap();
    let b = heap.allocate(17).unwrap();

    assert_eq!(a % WORD, 0);
    assert_eq!(b % WORD, 0);
  }

  #[test]
  fn test_grow_keeps_blocks_and_zero_fills_tail() {
    let mut heap = GlobalAllocator::with_region(START, START + 256).unwrap();
    let ptr = heap.allocate(16).unwrap();
    heap.data_mut(ptr).unwrap().fill(0xAA);

    assert_eq!(heap.configure(START, START + 512), Ok(Configured::Grown { added: 256 }));
    assert_eq!(heap.data(ptr).unwrap(), &[0xAA; 16]);
    assert!(heap.bytes(START + 256, 256).unwrap().iter().all(|b| *b == 0));
    assert_eq!(heap.live_blocks(), 1);
  }

  #[rstest]
  #[case(START, START + 256)]
  #[case(START, START + 128)]
  #[case(START + 64, START + 1024)]
  fn test_other_reconfigure_resets(
    #[case] start: usize,
    #[case] end: usize,
  ) {
    let mut heap = GlobalAllocator::with_region(START, START + 256).unwrap();
    let ptr = heap.allocate(16).unwrap();
    heap.data_mut(ptr).unwrap().fill(0xAA);

    assert_eq!(heap.configure(start, end), Ok(Configured::Reset));
    assert_eq!(heap.live_blocks(), 0);
    assert!(heap.bytes(start, end - start).unwrap().iter().all(|b| *b == 0));
  }

  #[test]
  fn test_exhaustion_is_not_fatal() {
    let mut heap = GlobalAllocator::with_region(START, START + 128).unwrap();
    assert_eq!(heap.allocate(128), None);

    let ptr = heap.allocate(128 - HEADER_SIZE).unwrap();
    assert_eq!(heap.allocate(1), None);

    heap.release(ptr);
    assert!(heap.allocate(1).is_some());
  }

  #[test]
  fn test_first_fit_reuses_earliest_gap() {
    let mut heap = heap();
    let ptrs: Vec<usize> = (0..4).map(|_| heap.allocate(32).unwrap()).collect();

    heap.release(ptrs[1]);
    heap.release(ptrs[2]);

    let small = heap.allocate(8).unwrap();
    assert_eq!(small, ptrs[1]);
    assert_disjoint(&heap);
  }

  #[test]
  fn test_gap_before_head_is_used() {
    let mut heap = heap();
    let first = heap.allocate(64).unwrap();
    let _second = heap.allocate(64).unwrap();

    assert_eq!(heap.release(first), Release::Released);
    let again = heap.allocate(16).unwrap();

    assert_eq!(again, first);
    assert_eq!(heap.blocks().next().unwrap().ptr, again);
    assert_disjoint(&heap);
  }

  #[test]
  fn test_released_neighbours_are_not_merged_in_headers() {
    let mut heap = heap();
    let a = heap.allocate(32).unwrap();
    let b = heap.allocate(32).unwrap();
    let c = heap.allocate(32).unwrap();
    let d = heap.allocate(32).unwrap();

    heap.release(b);
    heap.release(c);

    // The span of b and c is one gap to the scan even though nothing was
    // merged, so a block larger than either fits there.
    let wide = heap.allocate(64 + HEADER_SIZE).unwrap();
    assert_eq!(wide, b);
    assert!(heap.blocks().any(|block| block.ptr == a));
    assert!(heap.blocks().any(|block| block.ptr == d));
    assert_disjoint(&heap);
  }

  #[test]
  fn test_release_of_head_updates_list() {
    let mut heap = heap();
    let a = heap.allocate(8).unwrap();
    let b = heap.allocate(8).unwrap();

    heap.release(a);
    let blocks: Vec<usize> = heap.blocks().map(|block| block.ptr).collect();
    assert_eq!(blocks, [b]);

    heap.release(b);
    assert_eq!(heap.live_blocks(), 0);
    assert_eq!(heap.allocate(8), Some(a));
  }

  #[rstest]
  #[case(START)]
  #[case(START - 1)]
  #[case(START + REGION + WORD)]
  #[case(0)]
  fn test_release_out_of_range_is_noop(#[case] ptr: usize) {
    let mut heap = heap();
    let live = heap.allocate(8).unwrap();

    assert_eq!(heap.release(ptr), Release::OutOfRange);
    assert_eq!(heap.usable_size(live), Some(8));
  }

  #[test]
  fn test_double_release_keeps_others_intact() {
    let mut heap = heap();
    let ptrs: Vec<usize> = (0..6).map(|_| heap.allocate(24).unwrap()).collect();
    for (i, ptr) in ptrs.iter().enumerate() {
      heap.data_mut(*ptr).unwrap().fill(i as u8 + 1);
    }

    assert_eq!(heap.release(ptrs[2]), Release::Released);
    assert_eq!(heap.release(ptrs[2]), Release::Untracked);
    assert_eq!(heap.release(ptrs[4] + WORD), Release::Untracked);

    for (i, ptr) in ptrs.iter().enumerate().filter(|(i, _)| *i != 2) {
      assert_eq!(heap.data(*ptr).unwrap(), &[i as u8 + 1; 24]);
    }
    assert_eq!(heap.live_blocks(), 5);
  }

  #[test]
  fn test_reallocate_null_allocates() {
    let mut heap = heap();
    let ptr = heap.reallocate(None, 12).unwrap();
    assert_eq!(heap.usable_size(ptr), Some(12));
  }

  #[test]
  fn test_reallocate_moves_and_releases() {
    let mut heap = heap();
    let old = heap.allocate(16).unwrap();
    heap.data_mut(old).unwrap().copy_from_slice(b"0123456789abcdef");

    let new = heap.reallocate(Some(old), 40).unwrap();

    assert_ne!(new, old);
    assert_eq!(&heap.data(new).unwrap()[..16], b"0123456789abcdef");
    assert!(heap.data(new).unwrap()[16..].iter().all(|b| *b == 0));
    assert_eq!(heap.usable_size(old), None);
    assert_eq!(heap.live_blocks(), 1);
  }

  #[test]
  fn test_reallocate_failure_keeps_old_block() {
    let mut heap = GlobalAllocator::with_region(START, START + 256).unwrap();
    let old = heap.allocate(64).unwrap();
    heap.data_mut(old).unwrap().fill(7);

    assert_eq!(heap.reallocate(Some(old), 512), None);
    assert_eq!(heap.data(old).unwrap(), &[7; 64]);
  }

  #[test]
  fn test_zero_size_allocation_still_reserves_a_header() {
    let mut heap = heap();
    let a = heap.allocate(0).unwrap();
    let b = heap.allocate(0).unwrap();

    assert_eq!(b - a, HEADER_SIZE);
    assert_eq!(heap.data(a).unwrap(), &[] as &[u8]);
  }

  #[test]
  fn test_header_only_block_at_tail_is_tracked() {
    let mut heap = GlobalAllocator::with_region(START, START + 2 * HEADER_SIZE).unwrap();
    let a = heap.allocate(0).unwrap();
    let b = heap.allocate(0).unwrap();

    assert_eq!(b, heap.end());
    assert_eq!(heap.usable_size(b), Some(0));
    assert_eq!(heap.data(b).unwrap(), &[] as &[u8]);

    assert_eq!(heap.release(b), Release::Released);
    assert_eq!(heap.live_blocks(), 1);
    assert_eq!(heap.release(b), Release::Untracked);
    assert_eq!(heap.allocate(0), Some(b));

    assert_eq!(heap.release(a), Release::Released);
    assert_eq!(heap.reallocate(Some(b), 0), Some(a));
    assert_eq!(heap.usable_size(b), None);
    assert_eq!(heap.live_blocks(), 1);
  }

  #[rstest]
  #[case(START, 64)]
  #[case(START + 3, 64 - WORD)]
  #[case(START + WORD - 1, 64 - WORD)]
  fn test_capacity_starts_at_first_aligned_address(
    #[case] start: usize,
    #[case] capacity: usize,
  ) {
    let mut heap = GlobalAllocator::with_region(start, START + 64).unwrap();
    assert_eq!(heap.capacity(), capacity);

    let whole = heap.allocate(capacity - HEADER_SIZE).unwrap();
    assert_eq!(whole, align!(start) + HEADER_SIZE);
    assert_eq!(heap.used_bytes(), heap.capacity());
  }

  #[test]
  fn test_freed_memory_is_zeroed_on_reuse() {
    let mut heap = heap();
    let ptr = heap.allocate(48).unwrap();
    heap.data_mut(ptr).unwrap().fill(0xFF);
    heap.release(ptr);

    let again = heap.allocate(48).unwrap();
    assert_eq!(again, ptr);
    assert!(heap.data(again).unwrap().iter().all(|b| *b == 0));
  }

  proptest! {
    #[test]
    fn prop_allocations_are_aligned_and_sized(sizes in prop::collection::vec(0usize..300, 1..20)) {
      let mut heap = heap();
      for size in sizes {
        let Some(ptr) = heap.allocate(size) else { break };
        prop_assert_eq!(ptr % WORD, 0);
        let block = heap.blocks().find(|block| block.ptr == ptr).unwrap();
        prop_assert_eq!(block.size, align!(size + HEADER_SIZE));
        prop_assert!(block.size - WORD < size + HEADER_SIZE);
        prop_assert!(heap.data(ptr).unwrap().iter().all(|b| *b == 0));
      }
      assert_disjoint(&heap);
    }

    #[test]
    fn prop_no_false_exhaustion(
      skew in 0usize..WORD,
      sizes in prop::collection::vec(0usize..2048, 1..40),
    ) {
      let mut heap = GlobalAllocator::with_region(START + skew, START + REGION).unwrap();
      for size in sizes {
        let candidate = align!(size + HEADER_SIZE);
        let fits = heap.used_bytes() + candidate <= heap.capacity();
        let placed = heap.allocate(size).is_some();
        prop_assert_eq!(placed, fits);
      }
    }

    #[test]
    fn prop_reallocate_preserves_prefix(old_size in 0usize..512, new_size in 0usize..512) {
      let mut heap = heap();
      let old = heap.allocate(old_size).unwrap();
      for (i, byte) in heap.data_mut(old).unwrap().iter_mut().enumerate() {
        *byte = (i % 251) as u8;
      }

      let new = heap.reallocate(Some(old), new_size).unwrap();
      let kept = old_size.min(new_size);
      let data = heap.data(new).unwrap();
      for (i, byte) in data[..kept].iter().enumerate() {
        prop_assert_eq!(*byte, (i % 251) as u8);
      }
    }

    #[test]
    fn prop_random_release_keeps_blocks_disjoint(
      ops in prop::collection::vec((0usize..200, any::<bool>()), 1..60),
    ) {
      let mut heap = heap();
      let mut live: Vec<usize> = Vec::new();
      for (size, release) in ops {
        if release && !live.is_empty() {
          let ptr = live.remove(size % live.len());
          prop_assert_eq!(heap.release(ptr), Release::Released);
        } else if let Some(ptr) = heap.allocate(size) {
          live.push(ptr);
        }
        assert_disjoint(&heap);
        prop_assert_eq!(heap.live_blocks(), live.len());
      }
    }
  }
}
