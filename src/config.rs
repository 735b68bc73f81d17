//! # Allocator Configuration
//!
//! Region, arena and pool sizes, loaded once from TOML.
//!
//! ```toml
//! [region]
//! start = 4096
//! size = 16384
//!
//! [arena]
//! capacity = 2048
//!
//! [pool]
//! item_size = 24
//! capacity = 100
//! ```

use alloc::string::ToString;

use serde::Deserialize;

use crate::{
  arena::Arena,
  error::{Error, Result},
  global::GlobalAllocator,
  pool::Pool,
};

/// Top-level configuration. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub region: RegionConfig,
  pub arena: Option<ArenaConfig>,
  pub pool: Option<PoolConfig>,
}

impl Config {
  pub fn from_toml_str(source: &str) -> Result<Self> {
    toml::from_str(source).map_err(|err| Error::Config(err.to_string()))
  }
}

/// Bounds of the region managed by the [`GlobalAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionConfig {
  /// First managed address.
  pub start: usize,
  /// Managed bytes.
  pub size: usize,
}

impl Default for RegionConfig {
  fn default() -> Self {
    Self {
      start: 0x1000,
      size: 16 * 1024,
    }
  }
}

impl RegionConfig {
  /// One past the last managed address.
  pub fn end(&self) -> Result<usize> {
    self.start.checked_add(self.size).ok_or(Error::InvalidRegion {
      start: self.start,
      end: usize::MAX,
    })
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArenaConfig {
  pub capacity: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
  pub item_size: usize,
  pub capacity: usize,
}

impl GlobalAllocator {
  pub fn from_config(config: &RegionConfig) -> Result<Self> {
    Self::with_region(config.start, config.end()?)
  }
}

impl<'g> Arena<&'g mut GlobalAllocator> {
  pub fn from_config(
    heap: &'g mut GlobalAllocator,
    config: &ArenaConfig,
  ) -> Result<Self> {
    Self::init(heap, config.capacity)
  }
}

impl<'g> Pool<&'g mut GlobalAllocator> {
  pub fn from_config(
    heap: &'g mut GlobalAllocator,
    config: &PoolConfig,
  ) -> Result<Self> {
    Self::init(heap, config.item_size, config.capacity)
  }
}
