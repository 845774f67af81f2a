//! Shared types between the CLASSIFY kernel target and userspace
//!
//! This crate defines the payload that must be:
//! - `#[repr(C)]` for the layout `xt_classify_target_info` has in the kernel
//! - `no_std` compatible
//! - Shared between the option parser and anything that reads rule blobs

#![cfg_attr(not(feature = "userspace"), no_std)]

/// CLASSIFY target payload (`struct xt_classify_target_info`)
///
/// Layout (4 bytes, 4-byte aligned):
/// - priority: traffic-control handle written to `skb->priority`
///
/// The host stores the payload padded to [`XT_ALIGN_TO`], see [`PAYLOAD_SIZE`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "userspace", derive(PartialEq, Eq, Hash))]
pub struct ClassifyTargetInfo {
    pub priority: u32,
}

/// Alignment of every netfilter match/target payload (`XT_ALIGN`)
pub const XT_ALIGN_TO: usize = 8;

/// Round `len` up to the netfilter payload alignment
pub const fn xt_align(len: usize) -> usize {
    (len + XT_ALIGN_TO - 1) & !(XT_ALIGN_TO - 1)
}

/// Size of the CLASSIFY payload as the host allocates it
pub const PAYLOAD_SIZE: usize = xt_align(core::mem::size_of::<ClassifyTargetInfo>());

impl ClassifyTargetInfo {
    pub const fn new(priority: u32) -> Self {
        Self { priority }
    }

    /// Serialize into the aligned payload (native byte order, zero padding)
    pub fn to_bytes(&self) -> [u8; PAYLOAD_SIZE] {
        let mut out = [0u8; PAYLOAD_SIZE];
        out[..4].copy_from_slice(&self.priority.to_ne_bytes());
        out
    }

    /// Read a payload back. Padding is ignored; `None` if the buffer cannot
    /// hold the struct.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let raw: [u8; 4] = data.get(..4)?.try_into().ok()?;
        Some(Self {
            priority: u32::from_ne_bytes(raw),
        })
    }
}

/// Traffic-control handle helpers (`TC_H_*` from `linux/pkt_sched.h`)
pub mod tc_handle {
    pub const MAJ_MASK: u32 = 0xFFFF_0000;
    pub const MIN_MASK: u32 = 0x0000_FFFF;

    pub const UNSPEC: u32 = 0;
    pub const ROOT: u32 = 0xFFFF_FFFF;
    pub const INGRESS: u32 = 0xFFFF_FFF1;

    /// `TC_H_MAJ`: the major half, left in place
    pub const fn maj(handle: u32) -> u32 {
        handle & MAJ_MASK
    }

    /// `TC_H_MIN`
    pub const fn min(handle: u32) -> u32 {
        handle & MIN_MASK
    }

    /// `TC_H_MAKE`: `maj` is expected to be shifted already
    pub const fn make(maj: u32, min: u32) -> u32 {
        (maj & MAJ_MASK) | (min & MIN_MASK)
    }
}

#[cfg(feature = "userspace")]
const _: () = {
    assert!(
        core::mem::size_of::<ClassifyTargetInfo>() == 4,
        "ClassifyTargetInfo must be exactly 4 bytes"
    );
    assert!(
        core::mem::align_of::<ClassifyTargetInfo>() == 4,
        "ClassifyTargetInfo must be 4-byte aligned"
    );
    assert!(PAYLOAD_SIZE == 8, "CLASSIFY payload must be padded to 8 bytes");
};
