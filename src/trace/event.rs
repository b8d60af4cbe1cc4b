//! Allocation event record
//!
//! [`AllocationEvent`] is the atomic unit of the trace: one immutable record
//! per observed operation. `Alloc` carries the address the provider returned
//! and the size that was requested; `Free` carries only the address, because
//! that is all a free call is guaranteed to know.
//!
//! Addresses are opaque [`Address`] integers for bookkeeping and display.
//! Nothing in this crate ever turns one back into a pointer.

use std::fmt;

/// Memory address type (64-bit)
pub type Address = u64;

/// One recorded heap operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationEvent {
    /// A successful allocation of `size` bytes at `address`. Only recorded
    /// after the backing provider returned this address; `size` is always
    /// greater than zero.
    Alloc { address: Address, size: usize },

    /// A request to release the block at `address`. Recorded for every free
    /// call, including ones the log never saw an allocation for.
    Free { address: Address },
}

impl AllocationEvent {
    /// The address this event refers to.
    pub fn address(&self) -> Address {
        match self {
            AllocationEvent::Alloc { address, .. } => *address,
            AllocationEvent::Free { address } => *address,
        }
    }

    /// The allocation size, or `None` for a free (frees carry no size).
    pub fn size(&self) -> Option<usize> {
        match self {
            AllocationEvent::Alloc { size, .. } => Some(*size),
            AllocationEvent::Free { .. } => None,
        }
    }

    /// Short operation name for display ("alloc" / "free").
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationEvent::Alloc { .. } => "alloc",
            AllocationEvent::Free { .. } => "free",
        }
    }
}

impl fmt::Display for AllocationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationEvent::Alloc { address, size } => {
                write!(f, "alloc 0x{:08x} {} bytes", address, size)
            }
            AllocationEvent::Free { address } => write!(f, "free  0x{:08x}", address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let a = AllocationEvent::Alloc {
            address: 0x100,
            size: 32,
        };
        let f = AllocationEvent::Free { address: 0x100 };

        assert_eq!(a.address(), 0x100);
        assert_eq!(a.size(), Some(32));
        assert_eq!(a.kind(), "alloc");

        assert_eq!(f.address(), 0x100);
        assert_eq!(f.size(), None);
        assert_eq!(f.kind(), "free");
    }

    #[test]
    fn display_formats() {
        let a = AllocationEvent::Alloc {
            address: 0x1000_0000,
            size: 64,
        };
        assert_eq!(a.to_string(), "alloc 0x10000000 64 bytes");
    }
}
