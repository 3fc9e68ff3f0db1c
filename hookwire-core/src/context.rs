//! # Call Context
//!
//! The single mutable value object that carries arguments into, and
//! results or errors out of, a dispatch pass.
//!
//! Every [`Channel`] owns exactly one `CallContext` for its whole lifetime.
//! The host's marshalling layer fills the argument slots, executes the
//! channel, and reads the result slot back. Listeners read arguments and
//! may write a result or signal an error through
//! [`throw_native_error`](CallContext::throw_native_error).
//!
//! Values travel through fixed 64-bit slots; any type implementing
//! [`ContextValue`] can be stored.
//!
//! # Example
//!
//! ```rust
//! use hookwire_core::CallContext;
//!
//! let mut ctx = CallContext::new();
//! ctx.push_arg(40_i32).unwrap();
//! ctx.push_arg(2_i32).unwrap();
//!
//! let sum: i32 = ctx.arg::<i32>(0).unwrap() + ctx.arg::<i32>(1).unwrap();
//! ctx.set_result(sum).unwrap();
//!
//! assert_eq!(ctx.result::<i32>(), Ok(42));
//! ```
//!
//! [`Channel`]: https://docs.rs/hookwire-std/latest/hookwire_std/struct.Channel.html

use crate::error::ContextError;
use bitflags::bitflags;

/// Number of argument slots in a context.
pub const MAX_ARGS: usize = 32;

bitflags! {
    /// State bits carried alongside the slots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContextFlags: u8 {
        /// A result has been written since the last reset.
        const HAS_RESULT = 1 << 0;
        /// An error has been signalled since the last reset.
        const HAS_ERROR = 1 << 1;
        /// The native side tore the context down.
        const INVALIDATED = 1 << 2;
    }
}

/// A scalar that round-trips through a 64-bit context slot.
pub trait ContextValue: Sized {
    /// Encode into a slot.
    fn into_slot(self) -> u64;

    /// Decode from a slot.
    fn from_slot(slot: u64) -> Self;
}

macro_rules! impl_context_value_int {
    ($($t:ty),+) => {
        $(
            impl ContextValue for $t {
                #[inline]
                fn into_slot(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_slot(slot: u64) -> Self {
                    slot as $t
                }
            }
        )+
    };
}

impl_context_value_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl ContextValue for bool {
    fn into_slot(self) -> u64 {
        u64::from(self)
    }

    fn from_slot(slot: u64) -> Self {
        slot != 0
    }
}

impl ContextValue for f32 {
    fn into_slot(self) -> u64 {
        u64::from(self.to_bits())
    }

    fn from_slot(slot: u64) -> Self {
        f32::from_bits(slot as u32)
    }
}

impl ContextValue for f64 {
    fn into_slot(self) -> u64 {
        self.to_bits()
    }

    fn from_slot(slot: u64) -> Self {
        f64::from_bits(slot)
    }
}

/// Shared, resettable argument/result carrier for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    args: [u64; MAX_ARGS],
    num_args: usize,
    result: u64,
    flags: ContextFlags,
    error: Option<String>,
}

impl CallContext {
    /// Create a zeroed context.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_live(&self) -> Result<(), ContextError> {
        if self.flags.contains(ContextFlags::INVALIDATED) {
            Err(ContextError::Invalidated)
        } else {
            Ok(())
        }
    }

    /// Append an argument.
    pub fn push_arg<T: ContextValue>(&mut self, value: T) -> Result<(), ContextError> {
        self.ensure_live()?;
        if self.num_args == MAX_ARGS {
            return Err(ContextError::TooManyArguments { max: MAX_ARGS });
        }
        self.args[self.num_args] = value.into_slot();
        self.num_args += 1;
        Ok(())
    }

    /// Overwrite an already pushed argument.
    pub fn set_arg<T: ContextValue>(&mut self, index: usize, value: T) -> Result<(), ContextError> {
        self.ensure_live()?;
        if index >= self.num_args {
            return Err(ContextError::ArgumentOutOfRange {
                index,
                len: self.num_args,
            });
        }
        self.args[index] = value.into_slot();
        Ok(())
    }

    /// Read the argument at `index`.
    pub fn arg<T: ContextValue>(&self, index: usize) -> Result<T, ContextError> {
        self.ensure_live()?;
        if index >= self.num_args {
            return Err(ContextError::ArgumentOutOfRange {
                index,
                len: self.num_args,
            });
        }
        Ok(T::from_slot(self.args[index]))
    }

    /// Raw view of the pushed argument slots.
    pub fn arg_slots(&self) -> &[u64] {
        &self.args[..self.num_args]
    }

    /// Number of pushed arguments.
    pub fn num_args(&self) -> usize {
        self.num_args
    }

    /// Write the result slot.
    pub fn set_result<T: ContextValue>(&mut self, value: T) -> Result<(), ContextError> {
        self.ensure_live()?;
        self.result = value.into_slot();
        self.flags.insert(ContextFlags::HAS_RESULT);
        Ok(())
    }

    /// Read the result slot.
    ///
    /// A context with no result yields the zero value of `T`. Fails only
    /// when the context has been invalidated, which makes this the
    /// liveness probe used before every dispatch pass.
    pub fn result<T: ContextValue>(&self) -> Result<T, ContextError> {
        self.ensure_live()?;
        Ok(T::from_slot(self.result))
    }

    /// Whether a result was written since the last reset.
    pub fn has_result(&self) -> bool {
        self.flags.contains(ContextFlags::HAS_RESULT)
    }

    /// Signal an error to the native side.
    ///
    /// Works on an invalidated context too; the last message wins.
    pub fn throw_native_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.flags.insert(ContextFlags::HAS_ERROR);
    }

    /// Whether an error was signalled since the last reset.
    pub fn has_error(&self) -> bool {
        self.flags.contains(ContextFlags::HAS_ERROR)
    }

    /// The most recently signalled error message.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark the context as torn down by the native side.
    ///
    /// Subsequent reads and writes fail until [`reset`](Self::reset).
    pub fn invalidate(&mut self) {
        self.flags.insert(ContextFlags::INVALIDATED);
    }

    /// Whether [`invalidate`](Self::invalidate) was called since the last reset.
    pub fn is_invalidated(&self) -> bool {
        self.flags.contains(ContextFlags::INVALIDATED)
    }

    /// Current state bits.
    pub fn flags(&self) -> ContextFlags {
        self.flags
    }

    /// Restore the zero state. Idempotent.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the context is in its zero state.
    pub fn is_zeroed(&self) -> bool {
        *self == Self::default()
    }
}
