//! Traits for the page allocator and the transfer primitive.

use crate::error::Result;
use std::ptr::NonNull;

use super::TransferDirection;

/// Allocator for accelerator-mapped huge pages.
///
/// Implementations reserve physically-backed 2 MiB pages, map them into
/// the accelerator's translation table, and hand back the host-virtual
/// address. Requests are expressed in whole pages.
///
/// # Safety
///
/// Implementations must ensure that:
/// - Returned pointers are non-null and 2 MiB-aligned
/// - The region stays valid and both-side addressable until `free_pages`
/// - Thread-safety requirements are met (Send + Sync)
pub trait MemoryProvider: Send + Sync {
    /// Reserve `pages` huge pages mapped for both host and accelerator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`](crate::Error::AllocationFailed)
    /// or a system error when the pool or the translation table is
    /// exhausted. No retry is performed here.
    fn allocate_pages(&self, pages: usize) -> Result<NonNull<u8>>;

    /// Return a region previously obtained from [`allocate_pages`].
    ///
    /// Double-free behavior is this provider's contract, not the
    /// buffer's.
    ///
    /// # Safety
    ///
    /// `ptr` must come from a call to `allocate_pages(pages)` on this
    /// provider and must not be used afterwards.
    ///
    /// [`allocate_pages`]: MemoryProvider::allocate_pages
    unsafe fn free_pages(&self, ptr: NonNull<u8>, pages: usize);
}

/// Blocking copy primitive across the host/accelerator interconnect.
pub trait TransferEngine: Send + Sync {
    /// Move `byte_len` bytes at `ptr` in the given direction.
    ///
    /// Blocks until the hardware reports completion. There is no partial
    /// or streamed completion; a timeout enforced by the engine must
    /// surface as [`Error::TransferFailed`](crate::Error::TransferFailed)
    /// rather than hanging the caller silently.
    fn transfer(&self, ptr: NonNull<u8>, byte_len: usize, direction: TransferDirection)
        -> Result<()>;
}

/// The accelerator context handle a buffer binds to at construction.
///
/// This is the capability-checked handle from the buffer's point of view:
/// the constructor resolves it once, and no downcasting happens anywhere
/// else in the crate. Any type providing both collaborator contracts is a
/// device context.
pub trait DeviceContext: MemoryProvider + TransferEngine {}

impl<D: MemoryProvider + TransferEngine> DeviceContext for D {}
