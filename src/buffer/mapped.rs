//! Physically-backed buffer mapped for both host and accelerator access.

use crate::buffer::{DeviceBuffer, ElementType, Location};
use crate::device::{DeviceContext, TransferDirection, PAGE_SIZE};
use crate::error::{Error, Result};
use bytemuck::Pod;
use std::ptr::NonNull;

/// A buffer whose pages are addressable by the host and by an
/// accelerator at the same time.
///
/// The allocation is made in whole 2 MiB pages through the bound
/// [`DeviceContext`] and is 2 MiB-aligned for its whole lifetime. The
/// buffer starts host-resident; [`sync_to_device`] and
/// [`sync_from_device`] move authority across the interconnect.
///
/// # Release discipline
///
/// Pages are returned with an explicit [`release`] call, never on drop:
/// the mapping must be torn down through the same provider that created
/// it, and that teardown is not free. Dropping a live buffer logs a leak
/// warning. Any operation after `release` (including a second `release`)
/// panics; that is a programmer error, not a recoverable condition.
///
/// # Thread safety
///
/// A `MappedBuffer` is `Send` but not `Sync`: residency and the base
/// pointer are mutated without internal locking, so one buffer must be
/// confined to one thread at a time (or behind an external mutex).
/// Distinct buffers own disjoint pages and are fully independent.
///
/// [`sync_to_device`]: MappedBuffer::sync_to_device
/// [`sync_from_device`]: MappedBuffer::sync_from_device
/// [`release`]: MappedBuffer::release
pub struct MappedBuffer<'d, T> {
    ptr: NonNull<T>,
    len: usize,
    element_type: ElementType,
    byte_size: usize,
    pages: usize,
    location: Location,
    released: bool,
    device: &'d dyn DeviceContext,
}

impl<'d, T: Pod> MappedBuffer<'d, T> {
    /// Allocate a buffer of `len` elements on the given device context.
    ///
    /// Pages are requested from the context's memory provider; the
    /// returned buffer is host-resident and its content is whatever the
    /// provider hands out (zeroed for fresh kernel mappings).
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] when `len` is zero, the byte
    /// size overflows, or the provider cannot satisfy the page request.
    /// On failure nothing is allocated and no buffer exists.
    pub fn new(len: usize, element_type: ElementType, device: &'d dyn DeviceContext) -> Result<Self> {
        let elem_size = std::mem::size_of::<T>();
        if len == 0 || elem_size == 0 {
            return Err(Error::AllocationFailed(
                "buffer must hold at least one byte".into(),
            ));
        }
        let byte_size = len
            .checked_mul(elem_size)
            .ok_or_else(|| Error::AllocationFailed("byte size overflows usize".into()))?;

        // Round up to whole 2 MiB pages
        let pages = (byte_size + PAGE_SIZE - 1) / PAGE_SIZE;

        let raw = device.allocate_pages(pages)?;
        debug_assert_eq!(
            raw.as_ptr() as usize % PAGE_SIZE,
            0,
            "memory provider returned a misaligned region"
        );

        tracing::trace!(len, byte_size, pages, ptr = ?raw, "mapped buffer allocated");

        Ok(Self {
            ptr: raw.cast(),
            len,
            element_type,
            byte_size,
            pages,
            location: Location::Host,
            released: false,
            device,
        })
    }

    /// Number of 2 MiB pages backing this buffer.
    pub fn page(&self) -> usize {
        self.pages
    }

    /// Current residency of the authoritative copy.
    pub fn location(&self) -> Location {
        self.assert_live("location");
        self.location
    }

    /// Whether [`release`](MappedBuffer::release) has been called.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Raw host-virtual base pointer, 2 MiB-aligned.
    ///
    /// Freshness through this pointer is only guaranteed while the
    /// buffer is host-resident; the residency flag is advisory and does
    /// not fault stale reads.
    pub fn as_ptr(&self) -> *const T {
        self.assert_live("as_ptr");
        self.ptr.as_ptr()
    }

    /// Mutable raw host-virtual base pointer.
    ///
    /// Host-side writes while the buffer is device-resident are not
    /// observed by the accelerator until the next
    /// [`sync_to_device`](MappedBuffer::sync_to_device).
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.assert_live("as_mut_ptr");
        self.ptr.as_ptr()
    }

    /// The host-visible elements as a slice.
    ///
    /// Same freshness caveat as [`as_ptr`](MappedBuffer::as_ptr).
    pub fn host_slice(&self) -> &[T] {
        self.assert_live("host_slice");
        // SAFETY: ptr is valid for len elements until release, T is Pod
        // so any backing bytes are a valid value, and &self prevents
        // host-side aliasing mutation for the borrow's duration.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The host-visible elements as a mutable slice.
    pub fn host_slice_mut(&mut self) -> &mut [T] {
        self.assert_live("host_slice_mut");
        // SAFETY: as host_slice, with exclusivity from &mut self.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Push the host copy to the accelerator. Blocks until the transfer
    /// completes.
    ///
    /// On success the buffer is device-resident; host-side mutations
    /// made after this call are not visible to the accelerator until the
    /// next push. On failure the residency is unchanged; the transfer
    /// is assumed to have had no effect.
    pub fn sync_to_device(&mut self) -> Result<()> {
        self.assert_live("sync_to_device");
        self.device
            .transfer(self.ptr.cast(), self.byte_size, TransferDirection::HostToDevice)?;
        self.location = Location::Device;
        Ok(())
    }

    /// Pull the accelerator copy back to the host. Blocks until the
    /// transfer completes.
    ///
    /// On success the buffer is host-resident. On failure the residency
    /// is unchanged.
    pub fn sync_from_device(&mut self) -> Result<()> {
        self.assert_live("sync_from_device");
        self.device
            .transfer(self.ptr.cast(), self.byte_size, TransferDirection::DeviceToHost)?;
        self.location = Location::Host;
        Ok(())
    }

    /// Extract `start..end` into an independent buffer on the same
    /// device context.
    ///
    /// The result never aliases this buffer: it owns its own pages and
    /// receives a copy of the host-visible bytes of the range, so
    /// mutations of either buffer after the call are invisible to the
    /// other. Callers needing zero-copy sub-views need a different buffer
    /// variant; this one cannot cheaply sub-map an existing huge-page
    /// region into the accelerator's table.
    ///
    /// By convention the returned buffer is device-resident, so it is
    /// immediately usable by device-side operations without another
    /// sync. (This holds regardless of the source's residency, a quirk
    /// kept for consistency with the rest of the buffer family.)
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] when `start > end` or
    /// `end > len`, before anything is allocated. A zero-length range
    /// funnels into zero-length construction and fails the same way;
    /// [`Error::AllocationFailed`] / [`Error::TransferFailed`] from the
    /// allocation and forced sync steps. No partial buffer is returned
    /// on failure.
    pub fn slice(&self, start: usize, end: usize) -> Result<MappedBuffer<'d, T>> {
        self.assert_live("slice");
        if start > end || end > self.len {
            return Err(Error::InvalidRange {
                start,
                end,
                len: self.len,
            });
        }

        let mut slice_buf = MappedBuffer::<T>::new(end - start, self.element_type, self.device)?;

        // SAFETY: both regions are live, disjoint (freshly allocated
        // destination), and large enough for end - start elements.
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.ptr.as_ptr().add(start),
                slice_buf.ptr.as_ptr(),
                end - start,
            );
        }

        // Sliced buffers default to device residency
        if let Err(err) = slice_buf.sync_to_device() {
            slice_buf.release();
            return Err(err);
        }

        Ok(slice_buf)
    }

    /// Return this buffer's pages to the memory provider.
    ///
    /// After this call the base pointer is invalid and every other
    /// operation on the buffer panics. Calling `release` twice is a
    /// programmer error and also panics.
    pub fn release(&mut self) {
        self.assert_live("release");
        tracing::trace!(pages = self.pages, ptr = ?self.ptr, "releasing mapped buffer");
        // SAFETY: ptr came from allocate_pages(self.pages) on this
        // provider and is not used after the released flag is set.
        unsafe { self.device.free_pages(self.ptr.cast(), self.pages) };
        self.released = true;
    }

    #[track_caller]
    fn assert_live(&self, op: &str) {
        assert!(!self.released, "{op} called on a released mapped buffer");
    }
}

impl<T: Pod> DeviceBuffer for MappedBuffer<'_, T> {
    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn len(&self) -> usize {
        self.len
    }

    fn size(&self) -> usize {
        self.byte_size
    }

    fn is_simulated(&self) -> bool {
        false
    }

    fn is_host_only(&self) -> bool {
        false
    }

    fn is_host_resident(&self) -> bool {
        self.assert_live("is_host_resident");
        self.location == Location::Host
    }

    fn sync_to_device(&mut self) -> Result<()> {
        MappedBuffer::sync_to_device(self)
    }

    fn sync_from_device(&mut self) -> Result<()> {
        MappedBuffer::sync_from_device(self)
    }

    fn slice(&self, start: usize, end: usize) -> Result<Self> {
        MappedBuffer::slice(self, start, end)
    }
}

impl<T> Drop for MappedBuffer<'_, T> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                pages = self.pages,
                byte_size = self.byte_size,
                "mapped buffer dropped without release; its pages leak"
            );
        }
    }
}

impl<T> std::fmt::Debug for MappedBuffer<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("element_type", &self.element_type)
            .field("byte_size", &self.byte_size)
            .field("pages", &self.pages)
            .field("location", &self.location)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

// SAFETY: MappedBuffer owns its pages exclusively and the device handle
// is Send + Sync, so moving the buffer to another thread is sound. It is
// intentionally not Sync: residency is mutated without locking.
unsafe impl<T: Send> Send for MappedBuffer<'_, T> {}
