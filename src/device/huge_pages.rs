//! Huge-page memory provider backed by `mmap(MAP_HUGETLB)`.
//!
//! This is the crate's reference [`MemoryProvider`]. It reserves 2 MiB
//! huge pages from the kernel pool, which keeps the accelerator's
//! translation table small: one entry covers a whole page instead of 512
//! regular ones.
//!
//! # Requirements
//!
//! - Linux kernel with huge page support
//! - Sufficient huge pages reserved (see `/proc/sys/vm/nr_hugepages`)
//!
//! When huge pages are not reserved on the machine, the fallback mode
//! serves 2 MiB-aligned regions out of regular anonymous mappings. The
//! alignment and whole-page sizing guarantees hold either way; only the
//! TLB benefit is lost. The fallback is meant for development and tests,
//! not production transfer paths.

use crate::device::PAGE_SIZE;
use crate::error::{Error, Result};
use rustix::mm::{MapFlags, ProtFlags};
use std::ptr::NonNull;

use super::MemoryProvider;

/// log2(2 MiB), encoded into mmap flags via MAP_HUGE_SHIFT (bit 26).
const HUGE_2MB_SHIFT: u32 = 21;

/// A [`MemoryProvider`] serving 2 MiB huge pages via mmap.
#[derive(Debug, Clone, Copy, Default)]
pub struct HugePageProvider {
    fallback: bool,
}

impl HugePageProvider {
    /// Provider that only serves real huge pages; allocation fails when
    /// the kernel pool is exhausted.
    pub fn new() -> Self {
        Self { fallback: false }
    }

    /// Provider that falls back to aligned regular mappings when the
    /// huge page pool cannot satisfy a request.
    pub fn with_fallback() -> Self {
        Self { fallback: true }
    }

    fn map_huge(&self, len: usize) -> Result<NonNull<u8>> {
        // MAP_HUGETLB | (shift << MAP_HUGE_SHIFT)
        let huge_flags =
            MapFlags::from_bits_retain(MapFlags::HUGETLB.bits() | (HUGE_2MB_SHIFT << 26));

        let ptr = unsafe {
            rustix::mm::mmap_anonymous(
                std::ptr::null_mut(),
                len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::PRIVATE | huge_flags,
            )?
        };

        NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| Error::AllocationFailed("mmap returned null".into()))
    }

    /// Over-map a regular anonymous region by one page and trim the head
    /// and tail so the window handed out is 2 MiB-aligned. A plain mmap
    /// only guarantees base-page alignment.
    fn map_aligned_fallback(&self, len: usize) -> Result<NonNull<u8>> {
        let padded = len + PAGE_SIZE;

        let raw = unsafe {
            rustix::mm::mmap_anonymous(
                std::ptr::null_mut(),
                padded,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::PRIVATE,
            )?
        };

        let addr = raw as usize;
        let aligned = (addr + PAGE_SIZE - 1) & !(PAGE_SIZE - 1);
        let head = aligned - addr;
        let tail = padded - head - len;

        unsafe {
            if head > 0 {
                rustix::mm::munmap(raw, head)?;
            }
            if tail > 0 {
                rustix::mm::munmap((aligned + len) as *mut _, tail)?;
            }
        }

        NonNull::new(aligned as *mut u8)
            .ok_or_else(|| Error::AllocationFailed("mmap returned null".into()))
    }
}

impl MemoryProvider for HugePageProvider {
    fn allocate_pages(&self, pages: usize) -> Result<NonNull<u8>> {
        if pages == 0 {
            return Err(Error::AllocationFailed(
                "page count must be greater than 0".into(),
            ));
        }
        let len = pages * PAGE_SIZE;

        match self.map_huge(len) {
            Ok(ptr) => Ok(ptr),
            Err(err) if self.fallback => {
                tracing::debug!(
                    pages,
                    %err,
                    "huge page pool unavailable, serving aligned regular pages"
                );
                self.map_aligned_fallback(len)
            }
            Err(err) => Err(err),
        }
    }

    unsafe fn free_pages(&self, ptr: NonNull<u8>, pages: usize) {
        let _ = unsafe { rustix::mm::munmap(ptr.as_ptr().cast(), pages * PAGE_SIZE) };
    }
}
