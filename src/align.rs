use core::mem;

/// Size of a pointer word on the target, the unit every allocator in this
/// crate aligns to.
pub const WORD: usize = mem::size_of::<usize>();

/// Rounds the given size up to the machine word.
///
/// # Examples
///
/// ```rust
/// use regionalloc::align;
///
/// match core::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align::align_up($value, $crate::align::WORD)
  };
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. Returns `None` when the rounded value
/// does not fit in a `usize`.
#[inline]
pub const fn checked_align_up(
  value: usize,
  alignment: usize,
) -> Option<usize> {
  debug_assert!(alignment.is_power_of_two());
  match value.checked_add(alignment - 1) {
    Some(bumped) => Some(bumped & !(alignment - 1)),
    None => None,
  }
}

/// Rounds `value` up to the next multiple of `alignment`, saturating at the
/// largest aligned `usize`.
#[inline]
pub const fn align_up(
  value: usize,
  alignment: usize,
) -> usize {
  match checked_align_up(value, alignment) {
    Some(aligned) => aligned,
    None => usize::MAX & !(alignment - 1),
  }
}

#[inline]
pub const fn is_aligned(
  value: usize,
  alignment: usize,
) -> bool {
  value & (alignment - 1) == 0
}
