//! # mapbuf
//!
//! Page-aligned buffers shared between a host process and a hardware
//! accelerator over a memory-mapped interconnect.
//!
//! The backing memory of a [`MappedBuffer`](buffer::MappedBuffer) is
//! addressable by both sides at once, so the hard part is not the layout
//! (a flat typed array) but knowing *which side holds the authoritative
//! copy*. Every buffer carries an explicit residency flag and two blocking
//! sync operations that move authority across the interconnect.
//!
//! ## Features
//!
//! - **Huge-page discipline**: allocations are whole 2 MiB pages, always
//!   2 MiB-aligned, sized `ceil(bytes / 2 MiB)`
//! - **Explicit residency**: `Host` or `Device`, flipped only by a
//!   completed sync; no in-flight state is ever observable
//! - **Narrow collaborator contracts**: the page allocator and the
//!   transfer primitive are traits, combined into one
//!   [`DeviceContext`](device::DeviceContext) handle
//! - **Explicit release**: pages go back through the provider on demand;
//!   dropping a live buffer logs a leak warning instead of freeing
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use mapbuf::prelude::*;
//!
//! let dev = my_accelerator_context()?;
//! let mut buf = MappedBuffer::<f32>::new(1 << 20, ElementType::Float32, &dev)?;
//! buf.host_slice_mut().fill(1.0);
//! buf.sync_to_device()?;
//! // ... device-side work ...
//! buf.sync_from_device()?;
//! buf.release();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod buffer;
pub mod device;
pub mod error;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::buffer::{DeviceBuffer, ElementType, Location, MappedBuffer};
    pub use crate::device::{
        DeviceContext, MemoryProvider, TransferDirection, TransferEngine, PAGE_SIZE,
    };
    pub use crate::error::{Error, Result};
}

pub use error::{Error, Result};
