//! Accelerator collaborator contracts.
//!
//! A mapped buffer never talks to hardware directly. It consumes two
//! narrow interfaces: a [`MemoryProvider`] that reserves huge pages
//! already mapped into the accelerator's translation table, and a
//! [`TransferEngine`] that moves bytes across the interconnect. Both are
//! bundled into a single [`DeviceContext`] handle that a buffer borrows
//! for its lifetime.
//!
//! The crate ships one concrete provider, [`HugePageProvider`], backed by
//! `mmap(MAP_HUGETLB)`. Transfer engines are hardware-specific and always
//! supplied by the integrating runtime.

mod huge_pages;
mod traits;

pub use huge_pages::HugePageProvider;
pub use traits::{DeviceContext, MemoryProvider, TransferEngine};

/// Allocation granule of the mapped interconnect: 2 MiB huge pages.
///
/// Every buffer is sized in whole pages and its base pointer is aligned
/// to this value.
pub const PAGE_SIZE: usize = 2 * 1024 * 1024;

/// Direction of a blocking host/device transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    /// Push the host copy to the accelerator.
    HostToDevice,
    /// Pull the accelerator copy back to the host.
    DeviceToHost,
}
