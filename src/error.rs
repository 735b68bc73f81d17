//! # Allocator Error Types
//!
//! Construction and teardown failures. Running out of space on an allocation
//! path is not an error: those calls return `None`.

use alloc::string::String;

use thiserror::Error;

/// Errors reported by region configuration, arena/pool setup and teardown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// The region bounds are empty or inverted.
  #[error("invalid region bounds: start {start:#x}, end {end:#x}")]
  InvalidRegion {
    /// Requested first address.
    start: usize,
    /// Requested one-past-last address.
    end: usize,
  },

  /// A pool item size of zero was requested.
  #[error("item size must be greater than zero")]
  ZeroSize,

  /// A capacity of zero was requested, or derived from a buffer.
  #[error("capacity must be greater than zero")]
  ZeroCapacity,

  /// A caller-owned buffer of length zero was supplied.
  #[error("caller buffer is empty")]
  EmptyBuffer,

  /// The backing allocator could not provide `requested` bytes.
  #[error("backing allocator refused {requested} bytes")]
  OutOfMemory {
    /// Bytes asked for.
    requested: usize,
  },

  /// The handle does not name memory owned by this allocator.
  #[error("handle {0:#x} is not owned by this allocator")]
  InvalidHandle(usize),

  /// The pool slot behind this handle is already free.
  #[error("slot at offset {0:#x} was already released")]
  DoubleRelease(usize),

  /// The capability that produced a buffer has no release operation.
  #[error("allocator has no release operation")]
  ReleaseUnsupported,

  /// A save point ahead of the current arena offset.
  #[error("save point {requested} is past the current offset {current}")]
  InvalidSavePoint {
    /// Offset passed to `restore_point`.
    requested: usize,
    /// Arena offset at the time of the call.
    current: usize,
  },

  /// Configuration could not be parsed.
  #[error("invalid configuration: {0}")]
  Config(String),
}

/// Result type for allocator setup and teardown.
pub type Result<T> = core::result::Result<T, Error>;
