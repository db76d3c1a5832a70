//! Reference engine - in-process buffer object model
//!
//! Single-threaded like a real engine context: values share buffers through
//! `Rc`, and interior mutability is `Cell`-based. Byte buffers are word
//! aligned so every element kind can view them.

use super::{Engine, RawBytes, TypedView};
use crate::interop::{ElementKind, Kind, TypeDescriptor};
use core::ptr;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

const WORD: usize = core::mem::size_of::<u64>();

/// Engine-owned backing store of a byte buffer
pub struct EngineBuffer {
    words: RefCell<Option<Box<[Cell<u64>]>>>,
    byte_len: Cell<usize>,
}

impl EngineBuffer {
    /// New buffer holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Rc<Self> {
        let words: Box<[Cell<u64>]> = (0..bytes.len().div_ceil(WORD))
            .map(|_| Cell::new(0))
            .collect();
        if !bytes.is_empty() {
            // SAFETY: `words` spans at least `bytes.len()` bytes; Cell contents may be written through a shared pointer
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), words.as_ptr() as *mut u8, bytes.len());
            }
        }
        Rc::new(Self {
            words: RefCell::new(Some(words)),
            byte_len: Cell::new(bytes.len()),
        })
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.byte_len.get()
    }

    #[inline]
    pub fn is_detached(&self) -> bool {
        self.words.borrow().is_none()
    }

    /// Start of the backing store, null once detached
    pub fn data_ptr(&self) -> *mut u8 {
        self.words
            .borrow()
            .as_ref()
            .map_or(ptr::null_mut(), |words| words.as_ptr() as *mut u8)
    }

    /// Snapshot of the current contents
    pub fn to_vec(&self) -> Vec<u8> {
        let len = self.byte_len();
        let data = self.data_ptr();
        if len == 0 || data.is_null() {
            return Vec::new();
        }
        // SAFETY: live storage spans `len` initialised bytes
        unsafe { core::slice::from_raw_parts(data, len) }.to_vec()
    }

    /// Drop the backing store; the buffer then reports a null pointer and zero length
    ///
    /// # Safety
    /// No sequence decoded from a value sharing this buffer may still be alive.
    pub unsafe fn detach(&self) {
        *self.words.borrow_mut() = None;
        self.byte_len.set(0);
    }
}

impl fmt::Debug for EngineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuffer")
            .field("byte_len", &self.byte_len())
            .field("detached", &self.is_detached())
            .finish()
    }
}

/// Element-typed view over a shared `EngineBuffer`
#[derive(Debug, Clone)]
pub struct TypedArrayObject {
    buffer: Rc<EngineBuffer>,
    kind: ElementKind,
    byte_offset: usize,
    length: usize,
}

impl TypedArrayObject {
    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    #[inline]
    pub fn buffer(&self) -> &Rc<EngineBuffer> {
        &self.buffer
    }

    #[inline]
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Element count
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.length * self.kind.bytes_per_element()
    }
}

/// Value in the reference engine's object model
#[derive(Debug, Clone)]
pub enum HeapValue {
    Undefined,
    Number(f64),
    ArrayBuffer(Rc<EngineBuffer>),
    TypedArray(TypedArrayObject),
    /// Pending exception raised by `throw_type_error`
    Exception(String),
}

impl HeapValue {
    #[inline]
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception(_))
    }

    pub fn exception_message(&self) -> Option<&str> {
        match self {
            Self::Exception(message) => Some(message),
            _ => None,
        }
    }

    /// Script-side class name, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Number(_) => "number",
            Self::ArrayBuffer(_) => ElementKind::Bytes.type_name(),
            Self::TypedArray(view) => view.kind.type_name(),
            Self::Exception(_) => "exception",
        }
    }

    /// Copy of the bytes this value exposes (whole buffer, or the view's window)
    pub fn bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::ArrayBuffer(buffer) => Some(buffer.to_vec()),
            Self::TypedArray(view) => {
                let all = view.buffer.to_vec();
                let end = view.byte_offset + view.byte_len();
                Some(all.get(view.byte_offset..end).map(<[u8]>::to_vec).unwrap_or_default())
            }
            _ => None,
        }
    }
}

/// Temporary reference handed out by typed-view queries
///
/// Pins the view's backing buffer until released.
#[derive(Debug)]
pub struct TempRef {
    _buffer: Rc<EngineBuffer>,
}

/// In-process engine context
///
/// Counts temporary handles so callers can check that every query was
/// paired with a release.
#[derive(Debug, Default)]
pub struct HeapEngine {
    outstanding: Cell<usize>,
    acquired: Cell<usize>,
    last_error: RefCell<Option<String>>,
}

impl HeapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script-side `new ArrayBuffer` initialised with `bytes`
    pub fn array_buffer_from(&self, bytes: &[u8]) -> HeapValue {
        self.new_array_buffer(bytes)
    }

    /// Script-side typed array of kind `K` holding `elements`
    pub fn typed_array_from<K: Kind>(&self, elements: &[K::Elem]) -> HeapValue {
        self.new_typed_array(K::descriptor(), bytemuck::cast_slice(elements))
    }

    /// Typed view of `kind` over part of an existing byte buffer
    ///
    /// Mirrors the script-side constructor checks: the offset must be a
    /// multiple of the element width and the window must fit the buffer.
    pub fn typed_array_view(
        &self,
        buffer: &HeapValue,
        kind: ElementKind,
        byte_offset: usize,
        length: usize,
    ) -> Option<HeapValue> {
        let HeapValue::ArrayBuffer(storage) = buffer else {
            return None;
        };
        if !kind.is_typed_view() || byte_offset % kind.bytes_per_element() != 0 {
            return None;
        }
        let end = length
            .checked_mul(kind.bytes_per_element())?
            .checked_add(byte_offset)?;
        if end > storage.byte_len() {
            return None;
        }
        Some(HeapValue::TypedArray(TypedArrayObject {
            buffer: Rc::clone(storage),
            kind,
            byte_offset,
            length,
        }))
    }

    /// Byte buffer whose storage has already been detached
    pub fn detached_array_buffer(&self) -> HeapValue {
        let buffer = EngineBuffer::from_bytes(&[]);
        // SAFETY: nothing has seen this buffer yet
        unsafe { buffer.detach() };
        HeapValue::ArrayBuffer(buffer)
    }

    /// Temporary handles handed out and not yet released
    #[inline]
    pub fn outstanding_handles(&self) -> usize {
        self.outstanding.get()
    }

    /// Temporary handles handed out since creation
    #[inline]
    pub fn handles_acquired(&self) -> usize {
        self.acquired.get()
    }

    /// Message of the most recent type error raised, clearing it
    pub fn take_last_error(&self) -> Option<String> {
        self.last_error.borrow_mut().take()
    }
}

// SAFETY: every reported pointer is the storage of an `Rc<EngineBuffer>` held
// by the queried value, so it lives at least as long as the value's borrow.
// Storage is word aligned and views only start at multiples of their element
// width. The only way to free storage early is the unsafe `detach`.
unsafe impl Engine for HeapEngine {
    type Value = HeapValue;
    type Temp = TempRef;

    fn array_buffer(&self, value: &HeapValue) -> Option<RawBytes> {
        match value {
            HeapValue::ArrayBuffer(buffer) => Some(RawBytes {
                ptr: buffer.data_ptr(),
                byte_len: buffer.byte_len(),
            }),
            _ => None,
        }
    }

    fn typed_array(&self, value: &HeapValue) -> Option<TypedView<TempRef>> {
        let HeapValue::TypedArray(view) = value else {
            return None;
        };

        self.outstanding.set(self.outstanding.get() + 1);
        self.acquired.set(self.acquired.get() + 1);

        let base = view.buffer.data_ptr();
        let (ptr, byte_len) = if base.is_null() {
            (ptr::null_mut(), 0)
        } else {
            // SAFETY: the view window was bounds-checked against the buffer at construction
            (unsafe { base.add(view.byte_offset) }, view.byte_len())
        };

        Some(TypedView {
            ptr,
            byte_len,
            bytes_per_element: view.kind.bytes_per_element(),
            handle: TempRef {
                _buffer: Rc::clone(&view.buffer),
            },
        })
    }

    fn release(&self, temp: TempRef) {
        drop(temp);
        self.outstanding.set(self.outstanding.get().saturating_sub(1));
    }

    fn new_array_buffer(&self, bytes: &[u8]) -> HeapValue {
        HeapValue::ArrayBuffer(EngineBuffer::from_bytes(bytes))
    }

    fn new_typed_array(&self, descriptor: &TypeDescriptor, bytes: &[u8]) -> HeapValue {
        if !descriptor.kind.is_typed_view() {
            return self.new_array_buffer(bytes);
        }
        HeapValue::TypedArray(TypedArrayObject {
            buffer: EngineBuffer::from_bytes(bytes),
            kind: descriptor.kind,
            byte_offset: 0,
            length: bytes.len() / descriptor.bytes_per_element,
        })
    }

    fn throw_type_error(&self, message: &str) -> HeapValue {
        *self.last_error.borrow_mut() = Some(message.to_string());
        HeapValue::Exception(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::{Float64, Int16};

    #[test]
    fn buffers_are_word_aligned() {
        let engine = HeapEngine::new();
        let value = engine.array_buffer_from(&[1, 2, 3]);
        let raw = engine.array_buffer(&value).expect("byte buffer");
        assert_eq!(raw.byte_len, 3);
        assert_eq!(raw.ptr as usize % WORD, 0);
    }

    #[test]
    fn typed_views_are_not_byte_buffers() {
        let engine = HeapEngine::new();
        let value = engine.typed_array_from::<Int16>(&[1, 2]);
        assert!(engine.array_buffer(&value).is_none());
        assert_eq!(value.type_name(), "Int16Array");
    }

    #[test]
    fn typed_view_query_takes_a_handle() {
        let engine = HeapEngine::new();
        let value = engine.typed_array_from::<Float64>(&[1.0, 2.0]);

        let view = engine.typed_array(&value).expect("typed view");
        assert_eq!(view.bytes_per_element, 8);
        assert_eq!(view.byte_len, 16);
        assert_eq!(engine.outstanding_handles(), 1);

        engine.release(view.handle);
        assert_eq!(engine.outstanding_handles(), 0);
        assert_eq!(engine.handles_acquired(), 1);
    }

    #[test]
    fn typed_view_handle_pins_buffer() {
        let engine = HeapEngine::new();
        let value = engine.typed_array_from::<Int16>(&[1]);
        let HeapValue::TypedArray(view) = &value else {
            panic!("expected typed array");
        };
        let before = Rc::strong_count(view.buffer());

        let handle = engine.typed_array(&value).expect("typed view").handle;
        assert_eq!(Rc::strong_count(view.buffer()), before + 1);

        engine.release(handle);
        assert_eq!(Rc::strong_count(view.buffer()), before);
    }

    #[test]
    fn view_constructor_rejects_bad_windows() {
        let engine = HeapEngine::new();
        let buffer = engine.array_buffer_from(&[0u8; 8]);

        assert!(engine.typed_array_view(&buffer, ElementKind::I32, 2, 1).is_none());
        assert!(engine.typed_array_view(&buffer, ElementKind::I32, 4, 2).is_none());
        assert!(engine.typed_array_view(&buffer, ElementKind::Bytes, 0, 1).is_none());
        assert!(engine.typed_array_view(&buffer, ElementKind::I32, 4, 1).is_some());
    }

    #[test]
    fn detached_buffer_reports_null_and_zero() {
        let engine = HeapEngine::new();
        let value = engine.detached_array_buffer();
        let raw = engine.array_buffer(&value).expect("still a byte buffer");
        assert!(raw.ptr.is_null());
        assert_eq!(raw.byte_len, 0);
    }

    #[test]
    fn type_errors_are_recorded() {
        let engine = HeapEngine::new();
        let thrown = engine.throw_type_error("nope");
        assert_eq!(thrown.exception_message(), Some("nope"));
        assert_eq!(engine.take_last_error().as_deref(), Some("nope"));
        assert!(engine.take_last_error().is_none());
    }
}
