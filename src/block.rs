use core::mem;

use bytemuck::{Pod, Zeroable};

/// Link value meaning "no neighbour".
pub const NIL: usize = usize::MAX;

/// Bytes occupied by a [`BlockHeader`] at the front of every block.
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

/// Metadata stored in the region bytes in front of every live block.
///
/// `next` and `prev` hold region addresses of the neighbouring live blocks in
/// address order, `size` counts the whole block (header and alignment slack
/// included) and `padding` counts the slack the caller did not ask for.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BlockHeader {
  pub next: usize,
  pub prev: usize,
  pub size: usize,
  pub padding: usize,
}

impl BlockHeader {
  pub fn new(
    size: usize,
    padding: usize,
    prev: Option<usize>,
    next: Option<usize>,
  ) -> Self {
    Self {
      next: next.unwrap_or(NIL),
      prev: prev.unwrap_or(NIL),
      size,
      padding,
    }
  }

  #[inline]
  pub fn next(&self) -> Option<usize> {
    (self.next != NIL).then_some(self.next)
  }

  #[inline]
  pub fn prev(&self) -> Option<usize> {
    (self.prev != NIL).then_some(self.prev)
  }

  /// Bytes the caller asked for when the block was placed.
  #[inline]
  pub fn usable(&self) -> usize {
    self
      .size
      .saturating_sub(self.padding)
      .saturating_sub(HEADER_SIZE)
  }

  /// Reads a header stored at `offset` in `bytes`.
  pub fn read(
    bytes: &[u8],
    offset: usize,
  ) -> Option<Self> {
    let end = offset.checked_add(HEADER_SIZE)?;
    bytes.get(offset..end).map(bytemuck::pod_read_unaligned)
  }

  /// Stores the header at `offset` in `bytes`. Returns `false` when the
  /// header would not fit.
  pub fn write(
    &self,
    bytes: &mut [u8],
    offset: usize,
  ) -> bool {
    let Some(end) = offset.checked_add(HEADER_SIZE) else {
      return false;
    };
    match bytes.get_mut(offset..end) {
      Some(slot) => {
        slot.copy_from_slice(bytemuck::bytes_of(self));
        true
      }
      None => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use alloc::vec;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::align::WORD;

  #[test]
  fn test_header_is_four_words() {
    assert_eq!(HEADER_SIZE, 4 * WORD);
  }

  #[test]
  fn test_header_round_trips_through_bytes() {
    let mut bytes = vec![0u8; HEADER_SIZE * 2];
    let header = BlockHeader::new(96, 8, None, Some(0x2000));

    assert!(header.write(&mut bytes, 3));
    let read = BlockHeader::read(&bytes, 3).unwrap();

    assert_eq!(read, header);
    assert_eq!(read.prev(), None);
    assert_eq!(read.next(), Some(0x2000));
    assert_eq!(read.usable(), 96 - 8 - HEADER_SIZE);
  }

  #[test]
  fn test_header_out_of_bounds() {
    let mut bytes = vec![0u8; HEADER_SIZE];
    let header = BlockHeader::new(HEADER_SIZE, 0, None, None);

    assert!(!header.write(&mut bytes, 1));
    assert_eq!(BlockHeader::read(&bytes, 1), None);
    assert_eq!(BlockHeader::read(&bytes, usize::MAX), None);
  }
}
