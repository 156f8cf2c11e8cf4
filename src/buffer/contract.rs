//! The buffer family trait and its tag types.

use crate::error::Result;

/// Logical datatype tag carried by a buffer.
///
/// Peer components (e.g. a collective-communication runtime using buffers
/// as message payloads) cross-check this tag against their own element
/// descriptors. It never drives memory layout; sizing always comes from
/// the Rust element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// No datatype attached.
    None,
    /// IEEE 754 half precision.
    Float16,
    /// IEEE 754 single precision.
    Float32,
    /// IEEE 754 double precision.
    Float64,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
}

impl ElementType {
    /// Width of one element in bits, or 0 for [`ElementType::None`].
    pub fn bits(&self) -> usize {
        match self {
            ElementType::None => 0,
            ElementType::Float16 => 16,
            ElementType::Float32 | ElementType::Int32 => 32,
            ElementType::Float64 | ElementType::Int64 => 64,
        }
    }
}

/// Which side currently holds the authoritative copy of a buffer's data.
///
/// There is no in-flight variant: syncs are blocking, and from the
/// caller's perspective the location flips atomically when a sync
/// returns successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// The host copy is authoritative.
    Host,
    /// The accelerator copy is authoritative.
    Device,
}

/// Common contract of the device buffer family.
///
/// Kept deliberately flat: capability queries, residency queries, the two
/// blocking syncs, and sub-range extraction. Variant-specific surface
/// (raw pointers, page counts) lives on the concrete types.
pub trait DeviceBuffer {
    /// The datatype tag attached at construction.
    fn element_type(&self) -> ElementType;

    /// Number of logical elements.
    fn len(&self) -> usize;

    /// Size of the buffer in bytes.
    fn size(&self) -> usize;

    /// Returns true if the buffer has no elements.
    ///
    /// Always false for buffers in this crate; construction rejects
    /// zero-length buffers.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this buffer is backed by a simulation rather than
    /// physical memory.
    fn is_simulated(&self) -> bool;

    /// Whether this buffer exists only in host memory, with no
    /// accelerator mapping at all.
    fn is_host_only(&self) -> bool;

    /// Whether the host currently holds the authoritative copy.
    fn is_host_resident(&self) -> bool;

    /// Whether the accelerator currently holds the authoritative copy.
    fn is_device_resident(&self) -> bool {
        !self.is_host_resident()
    }

    /// Push the host copy to the accelerator. Blocks until complete.
    ///
    /// On success the buffer becomes device-resident. On failure the
    /// residency is unchanged.
    fn sync_to_device(&mut self) -> Result<()>;

    /// Pull the accelerator copy back to the host. Blocks until
    /// complete.
    ///
    /// On success the buffer becomes host-resident. On failure the
    /// residency is unchanged.
    fn sync_from_device(&mut self) -> Result<()>;

    /// Extract the element range `start..end` into a new buffer.
    fn slice(&self, start: usize, end: usize) -> Result<Self>
    where
        Self: Sized;
}
