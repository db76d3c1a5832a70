//! Engine boundary - the capabilities conversions need from a script engine
//!
//! The engine is an external collaborator. This crate only asks it to:
//! 1. Expose a byte buffer (pointer + byte length) or say it isn't one
//! 2. Expose a typed view (pointer + byte length + element width + temp handle)
//! 3. Release temporary handles from (2)
//! 4. Allocate new engine-owned buffers/views by copying native bytes
//! 5. Raise a script-visible type error
//!
//! `heap` is a complete in-process engine implementing these capabilities.

pub mod heap;

pub use heap::{EngineBuffer, HeapEngine, HeapValue, TypedArrayObject};

use crate::interop::TypeDescriptor;
use crate::logging::log_release;

/// Borrowed byte range of an engine byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBytes {
    pub ptr: *mut u8,
    pub byte_len: usize,
}

/// Borrowed byte range of an engine typed view
///
/// `handle` is whatever temporary reference the engine had to take to answer
/// the query; it must go back through [`Engine::release`].
#[derive(Debug)]
pub struct TypedView<H> {
    pub ptr: *mut u8,
    pub byte_len: usize,
    pub bytes_per_element: usize,
    pub handle: H,
}

/// Script engine capabilities consumed by the conversion routines
///
/// # Safety
/// Pointers reported by [`Engine::array_buffer`] and [`Engine::typed_array`]
/// must stay valid for reads and writes of `byte_len` bytes for as long as
/// the queried value stays borrowed, and a non-empty range must be non-null.
/// Typed-view pointers must be aligned for the reported element width
/// whenever the engine can guarantee it; misaligned ranges are rejected, not
/// dereferenced.
pub unsafe trait Engine {
    /// Engine value referenced from native code
    type Value;
    /// Temporary reference taken while answering a typed-view query
    type Temp;

    /// Byte-buffer accessor, `None` if the value is not a byte buffer
    fn array_buffer(&self, value: &Self::Value) -> Option<RawBytes>;

    /// Typed-view accessor, `None` if the value is not a typed view
    fn typed_array(&self, value: &Self::Value) -> Option<TypedView<Self::Temp>>;

    /// Release a temporary reference obtained from `typed_array`
    fn release(&self, temp: Self::Temp);

    /// New engine-owned byte buffer holding a copy of `bytes`
    fn new_array_buffer(&self, bytes: &[u8]) -> Self::Value;

    /// New engine-owned typed view of `descriptor`'s kind over a copy of `bytes`
    fn new_typed_array(&self, descriptor: &TypeDescriptor, bytes: &[u8]) -> Self::Value;

    /// Raise a type error at the engine call site, returning the engine's exception value
    fn throw_type_error(&self, message: &str) -> Self::Value;
}

/// Releases a temporary engine handle when dropped
///
/// Holding the handle in a guard means every early return, including
/// failures, gives it back.
pub(crate) struct TempGuard<'e, E: Engine> {
    engine: &'e E,
    temp: Option<E::Temp>,
}

impl<'e, E: Engine> TempGuard<'e, E> {
    #[inline]
    pub(crate) fn new(engine: &'e E, temp: E::Temp) -> Self {
        Self {
            engine,
            temp: Some(temp),
        }
    }
}

impl<E: Engine> Drop for TempGuard<'_, E> {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            self.engine.release(temp);
            log_release();
        }
    }
}
