//! Conversion routines - engine values <-> typed sequences
//!
//! Design:
//! - Decode never copies: the result aliases engine memory for the borrow of the value
//! - Encode always copies into a fresh engine-owned buffer
//! - Aliasing sequences only go engine -> native, owning ones only native -> engine
//! - Temporary typed-view handles are released on every exit path

use super::types::{AnyOwnedSequence, AnySequence, In, Kind, Out};
use crate::allocator::RawRegion;
use crate::engine::{Engine, TempGuard, TypedView};
use crate::errors::{ConversionError, ConversionResult, Direction};
use crate::logging::{log_conversion_error, log_decode, log_encode};

/// Native types that can be produced from an engine value
///
/// The returned value may borrow `value` for `'a`.
pub trait FromEngine<'a, E: Engine>: Sized {
    fn from_engine(engine: &E, value: &'a E::Value) -> ConversionResult<Self>;
}

/// Native types that can be turned into a new engine value
pub trait ToEngine<E: Engine> {
    fn to_engine(&self, engine: &E) -> ConversionResult<E::Value>;
}

/// Decode `value` as an aliasing sequence of kind `K`
pub fn decode<'a, K: Kind, E: Engine>(engine: &E, value: &'a E::Value) -> ConversionResult<In<'a, K>> {
    let result = if K::KIND.is_typed_view() {
        decode_view::<K, E>(engine, value)
    } else {
        decode_untyped::<K, E>(engine, value)
    };

    if let Err(err) = &result {
        log_conversion_error(K::descriptor().type_name, err);
    }
    result
}

fn decode_untyped<'a, K: Kind, E: Engine>(engine: &E, value: &'a E::Value) -> ConversionResult<In<'a, K>> {
    let descriptor = K::descriptor();
    let raw = engine
        .array_buffer(value)
        .ok_or(ConversionError::TypeMismatch {
            expected: descriptor.type_name,
        })?;

    // A non-empty buffer is never null, so null means no backing storage at all
    if raw.ptr.is_null() {
        return Err(ConversionError::NoBufferPresent);
    }

    // SAFETY: the engine keeps the buffer valid while `value` is borrowed for `'a`
    unsafe { bridge_region::<K>(raw.ptr, raw.byte_len) }
}

fn decode_view<'a, K: Kind, E: Engine>(engine: &E, value: &'a E::Value) -> ConversionResult<In<'a, K>> {
    let descriptor = K::descriptor();
    let TypedView {
        ptr,
        byte_len,
        bytes_per_element,
        handle,
    } = engine
        .typed_array(value)
        .ok_or(ConversionError::TypeMismatch {
            expected: descriptor.type_name,
        })?;
    let _temp = TempGuard::new(engine, handle);

    if bytes_per_element != descriptor.bytes_per_element {
        return Err(ConversionError::WidthMismatch {
            expected: descriptor.type_name,
            expected_width: descriptor.bytes_per_element,
            found_width: bytes_per_element,
        });
    }

    // Empty views (including detached ones) may report no storage
    if ptr.is_null() && byte_len > 0 {
        return Err(ConversionError::NoBufferPresent);
    }

    // SAFETY: the engine keeps the view's window valid while `value` is borrowed for `'a`
    unsafe { bridge_region::<K>(ptr, byte_len) }
}

/// # Safety
/// `ptr` must be valid for reads and writes of `byte_len` bytes for `'a`.
unsafe fn bridge_region<'a, K: Kind>(ptr: *mut u8, byte_len: usize) -> ConversionResult<In<'a, K>> {
    let descriptor = K::descriptor();
    let width = descriptor.bytes_per_element;
    debug_assert!(
        byte_len % width == 0,
        "{} byte length {} is not a multiple of {}",
        descriptor.type_name,
        byte_len,
        width
    );

    if (ptr as usize) % descriptor.align != 0 {
        return Err(ConversionError::Misaligned {
            type_name: descriptor.type_name,
            align: descriptor.align,
        });
    }

    let region = RawRegion::new(ptr.cast::<K::Elem>(), byte_len / width);
    let sequence = In::<K>::bridge(region);
    log_decode(descriptor.type_name, sequence.len(), ptr);
    Ok(sequence)
}

/// New engine value holding a copy of `sequence`
///
/// Byte buffers become byte buffers; typed kinds become a typed view of the
/// same kind over a fresh buffer.
pub fn encode<K: Kind, E: Engine>(engine: &E, sequence: &Out<K>) -> E::Value {
    let descriptor = K::descriptor();
    let bytes = sequence.as_bytes();
    log_encode(descriptor.type_name, bytes.len());

    if descriptor.kind.is_typed_view() {
        engine.new_typed_array(descriptor, bytes)
    } else {
        engine.new_array_buffer(bytes)
    }
}

impl<'a, K: Kind, E: Engine> FromEngine<'a, E> for In<'a, K> {
    #[inline]
    fn from_engine(engine: &E, value: &'a E::Value) -> ConversionResult<Self> {
        decode(engine, value)
    }
}

impl<'a, K: Kind, E: Engine> ToEngine<E> for In<'a, K> {
    fn to_engine(&self, _engine: &E) -> ConversionResult<E::Value> {
        let err = ConversionError::UnsupportedDirection {
            type_name: K::descriptor().type_name,
            direction: Direction::Encode,
        };
        log_conversion_error(K::descriptor().type_name, &err);
        Err(err)
    }
}

impl<'a, K: Kind, E: Engine> FromEngine<'a, E> for Out<K> {
    fn from_engine(_engine: &E, _value: &'a E::Value) -> ConversionResult<Self> {
        let err = ConversionError::UnsupportedDirection {
            type_name: K::descriptor().type_name,
            direction: Direction::Decode,
        };
        log_conversion_error(K::descriptor().type_name, &err);
        Err(err)
    }
}

impl<K: Kind, E: Engine> ToEngine<E> for Out<K> {
    #[inline]
    fn to_engine(&self, engine: &E) -> ConversionResult<E::Value> {
        Ok(encode(engine, self))
    }
}

impl<E: Engine> ToEngine<E> for AnyOwnedSequence {
    #[inline]
    fn to_engine(&self, engine: &E) -> ConversionResult<E::Value> {
        Ok(self.encode(engine))
    }
}

impl<'a, E: Engine> ToEngine<E> for AnySequence<'a> {
    fn to_engine(&self, _engine: &E) -> ConversionResult<E::Value> {
        let type_name = self.kind().type_name();
        let err = ConversionError::UnsupportedDirection {
            type_name,
            direction: Direction::Encode,
        };
        log_conversion_error(type_name, &err);
        Err(err)
    }
}

/// Convert a failed conversion into the engine's exception value
pub fn surface<T, E: Engine>(engine: &E, result: ConversionResult<T>) -> Result<T, E::Value> {
    result.map_err(|err| engine.throw_type_error(&err.to_string()))
}

/// Decode through [`FromEngine`], raising a type error in the engine on failure
pub fn from_engine_value<'a, T, E>(engine: &E, value: &'a E::Value) -> Result<T, E::Value>
where
    T: FromEngine<'a, E>,
    E: Engine,
{
    surface(engine, T::from_engine(engine, value))
}

/// Encode through [`ToEngine`]; failures come back as the engine's exception value
pub fn to_engine_value<T, E>(engine: &E, value: &T) -> E::Value
where
    T: ToEngine<E> + ?Sized,
    E: Engine,
{
    match value.to_engine(engine) {
        Ok(encoded) => encoded,
        Err(err) => engine.throw_type_error(&err.to_string()),
    }
}
