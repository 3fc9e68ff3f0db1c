//! # Listener References
//!
//! A listener is a plain function invoked with the channel's call context.
//! Channels never own listeners: the extension that registered a function
//! owns its code, and must unregister it before unloading.
//!
//! Two calling conventions are supported:
//!
//! - [`ListenerFn`]: an ordinary Rust `fn(&mut CallContext)`.
//! - [`NativeListenerFn`]: an `extern "C"` function handed over by a
//!   dynamically loaded extension, possibly null, possibly built from a
//!   raw address with [`ListenerRef::from_raw`].
//!
//! Native references are raw addresses, so every channel runs them through
//! an [`AddressPolicy`] before storing and again before calling them. The
//! policy is a heuristic that catches gross corruption (null-adjacent
//! sentinels, poisoned high bits). It is not a security boundary.

use crate::{context::CallContext, error::ListenerError};
use std::fmt;

/// A Rust listener.
pub type ListenerFn = fn(&mut CallContext);

/// A native listener exported by a dynamically loaded extension.
pub type NativeListenerFn = unsafe extern "C" fn(*mut CallContext);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Abi {
    Rust,
    Native,
}

/// A non-owning, copyable reference to a listener function.
///
/// Equality is address identity: two references are equal when they name
/// the same function with the same calling convention.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerRef {
    addr: usize,
    abi: Abi,
}

impl ListenerRef {
    /// Reference a Rust listener.
    pub fn new(listener: ListenerFn) -> Self {
        Self {
            addr: listener as usize,
            abi: Abi::Rust,
        }
    }

    /// Reference a native listener; `None` produces a null reference.
    pub fn native(listener: Option<NativeListenerFn>) -> Self {
        Self {
            addr: listener.map_or(0, |f| f as usize),
            abi: Abi::Native,
        }
    }

    /// The null reference.
    pub const fn null() -> Self {
        Self {
            addr: 0,
            abi: Abi::Native,
        }
    }

    /// Reference a native listener by raw address.
    ///
    /// # Safety
    ///
    /// If `addr` passes the channel's [`AddressPolicy`] it will be called
    /// as a [`NativeListenerFn`]. The caller guarantees it is either such a
    /// function, valid until removed from every channel, or an address the
    /// policy rejects.
    pub const unsafe fn from_raw(addr: usize) -> Self {
        Self {
            addr,
            abi: Abi::Native,
        }
    }

    /// The raw address.
    pub const fn addr(&self) -> usize {
        self.addr
    }

    /// Whether this reference is null.
    pub const fn is_null(&self) -> bool {
        self.addr == 0
    }

    /// Whether this reference uses the native calling convention.
    pub const fn is_native(&self) -> bool {
        matches!(self.abi, Abi::Native)
    }

    /// Call the listener.
    ///
    /// Panics raised by a Rust listener unwind to the caller. A native
    /// listener cannot unwind across the `extern "C"` boundary.
    ///
    /// # Safety
    ///
    /// The reference must be non-null and, for native references, point at
    /// a live [`NativeListenerFn`].
    pub unsafe fn invoke(&self, ctx: &mut CallContext) {
        debug_assert!(!self.is_null());
        let ptr = self.addr as *const ();
        match self.abi {
            Abi::Rust => {
                // SAFETY: built by `new` from a `ListenerFn`.
                let listener = unsafe { std::mem::transmute::<*const (), ListenerFn>(ptr) };
                listener(ctx);
            }
            Abi::Native => {
                // SAFETY: upheld by the caller.
                unsafe {
                    let listener = std::mem::transmute::<*const (), NativeListenerFn>(ptr);
                    listener(ctx as *mut CallContext);
                }
            }
        }
    }
}

impl From<ListenerFn> for ListenerRef {
    fn from(listener: ListenerFn) -> Self {
        Self::new(listener)
    }
}

impl fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRef")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("abi", &self.abi)
            .finish()
    }
}

impl fmt::Display for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.addr)
    }
}

/// Plausibility check applied to listener addresses.
///
/// An address is rejected when it is null, below `address_floor`, or has
/// any bit set at or above bit `high_bits_shift`.
///
/// # Example
///
/// ```rust
/// use hookwire_core::{AddressPolicy, ListenerError, ListenerRef};
///
/// let policy = AddressPolicy::default();
/// let low = unsafe { ListenerRef::from_raw(0x10) };
/// assert_eq!(policy.check(low), Err(ListenerError::Implausible { addr: 0x10 }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPolicy {
    address_floor: usize,
    high_bits_shift: u32,
}

impl AddressPolicy {
    /// Lowest address accepted by default.
    pub const DEFAULT_ADDRESS_FLOOR: usize = 0x1000;
    /// First poisoned bit by default.
    pub const DEFAULT_HIGH_BITS_SHIFT: u32 = 56;

    /// Create the default policy.
    pub const fn new() -> Self {
        Self {
            address_floor: Self::DEFAULT_ADDRESS_FLOOR,
            high_bits_shift: Self::DEFAULT_HIGH_BITS_SHIFT,
        }
    }

    /// Set the lowest accepted address.
    pub const fn with_address_floor(mut self, floor: usize) -> Self {
        self.address_floor = floor;
        self
    }

    /// Set the first bit treated as poisoned.
    pub const fn with_high_bits_shift(mut self, shift: u32) -> Self {
        self.high_bits_shift = shift;
        self
    }

    /// Lowest accepted address.
    pub const fn address_floor(&self) -> usize {
        self.address_floor
    }

    /// First bit treated as poisoned.
    pub const fn high_bits_shift(&self) -> u32 {
        self.high_bits_shift
    }

    fn has_poisoned_bits(&self, addr: usize) -> bool {
        // A shift past the pointer width means no bit is poisoned.
        self.high_bits_shift < usize::BITS && (addr >> self.high_bits_shift) != 0
    }

    /// Validate a listener reference.
    pub fn check(&self, listener: ListenerRef) -> Result<(), ListenerError> {
        let addr = listener.addr();
        if addr == 0 {
            return Err(ListenerError::Null);
        }
        if addr < self.address_floor || self.has_poisoned_bits(addr) {
            return Err(ListenerError::Implausible { addr });
        }
        Ok(())
    }
}

impl Default for AddressPolicy {
    fn default() -> Self {
        Self::new()
    }
}
