//! # regionalloc - Layered Allocators over One Byte Region
//!
//! This crate provides three allocators that share a single contiguous byte
//! region: a first-fit **free-list allocator**, a **bump arena** with save
//! points, and a **fixed-size pool** whose free list lives inside its unused
//! slots.
//!
//! ## Overview
//!
//! ```text
//!   Layering:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                        REGION [start, end)                           │
//!   │                                                                      │
//!   │   ┌─────┬──────┬───────────────────────┬─────┬──────────────────┐    │
//!   │   │ B1  │ gap  │  B2: Arena buffer     │ B3  │      tail        │    │
//!   │   └─────┴──────┴───────────────────────┴─────┴──────────────────┘    │
//!   │                 ▲                       ▲                            │
//!   │                 │ bump offset           └── B3: Pool buffer          │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   The GlobalAllocator places blocks first-fit. Arenas and pools ask an
//!   Allocator for one buffer up front and sub-allocate inside it.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   regionalloc
//!   ├── align      - Word alignment helpers (align!)
//!   ├── block      - In-region block header (internal)
//!   ├── global     - GlobalAllocator: first-fit, non-coalescing free list
//!   ├── capability - Allocator trait, CallerBuffer, SystemAllocator
//!   ├── arena      - Arena: bump allocation with save points
//!   ├── pool       - Pool: fixed-size slots, LIFO reuse
//!   ├── config     - TOML configuration (feature `config`)
//!   └── ffi        - C ABI exports (feature `ffi`)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use regionalloc::{Arena, GlobalAllocator, Pool};
//!
//! let mut heap = GlobalAllocator::with_region(0x1000, 0x1000 + 16 * 1024).unwrap();
//!
//! let ptr = heap.allocate(64).unwrap();
//! heap.data_mut(ptr).unwrap()[0] = 42;
//! heap.release(ptr);
//!
//! let mut arena = Arena::init(&mut heap, 1024).unwrap();
//! let saved = arena.save_point();
//! arena.allocate(100).unwrap();
//! arena.restore_point(saved).unwrap();
//! let heap = arena.deinit().unwrap();
//!
//! let mut pool = Pool::init(heap, 24, 16).unwrap();
//! let item = pool.request().unwrap();
//! pool.release(item).unwrap();
//! pool.deinit().unwrap();
//! ```
//!
//! ## How It Works
//!
//! Every free-list allocation is a block with a header in front:
//!
//! ```text
//!   Single Allocation:
//!   ┌───────────────────────┬────────────────────────────────┬─────────┐
//!   │    Block Header       │         User Data              │ padding │
//!   │  ┌─────────────────┐  │                                │         │
//!   │  │ next: addr/NIL  │  │  ┌──────────────────────────┐  │         │
//!   │  │ prev: addr/NIL  │  │  │                          │  │         │
//!   │  │ size: total     │  │  │     N bytes usable       │  │         │
//!   │  │ padding: slack  │  │  │                          │  │         │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │         │
//!   │      4 words          │                                │         │
//!   └───────────────────────┴────────────────────────────────┴─────────┘
//!                           ▲
//!                           └── Address returned to the caller
//! ```
//!
//! Only live blocks are linked. Free space is implicit: the gaps between
//! consecutive blocks and the tail before `end`.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **No coalescing**: released blocks leave gaps that only first-fit
//!   placement reclaims
//! - **Linear scans**: allocation and release walk the live block list
//!
//! ## Safety
//!
//! The region is an owned byte buffer addressed by offset, so misuse of an
//! address is reported or ignored rather than corrupting memory. The only
//! unsafe code is [`SystemAllocator`], which wraps `calloc`/`free`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
pub mod align;
mod arena;
mod block;
mod capability;
#[cfg(feature = "config")]
mod config;
mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
mod global;
mod pool;

pub use arena::{Arena, SavePoint};
pub use block::HEADER_SIZE;
pub use capability::{Allocator, Buffer, CallerBuffer, SystemAllocator};
#[cfg(feature = "config")]
pub use config::{ArenaConfig, Config, PoolConfig, RegionConfig};
pub use error::{Error, Result};
pub use global::{BlockInfo, Blocks, Configured, GlobalAllocator, Release};
pub use pool::{Pool, SLOT_HEADER_SIZE, stride_for};
