//! Buffer family contract and the mapped buffer variant.
//!
//! The crate models a small family of device buffers behind one flat
//! trait, [`DeviceBuffer`]. Members differ in where their bytes live
//! (physically-backed and accelerator-mapped, simulated, host-only); this
//! crate implements the physically-backed member, [`MappedBuffer`].
//!
//! # Residency
//!
//! Every buffer tracks a [`Location`]: which side currently holds the
//! authoritative copy of the data. The flag is advisory. Nothing stops
//! host code from reading through the base pointer while the buffer is
//! device-resident; it will simply observe whatever the host copy last
//! held. Callers that want fresh data sync first.

mod contract;
mod mapped;

pub use contract::{DeviceBuffer, ElementType, Location};
pub use mapped::MappedBuffer;
