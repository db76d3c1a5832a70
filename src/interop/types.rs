//! Typed sequence family - element kinds and the sequences built on them
//!
//! One generic `TypedSequence<K, A>` covers every kind and both ownership
//! modes; per-kind data (width, engine type name) is a table lookup by
//! `ElementKind` tag rather than a separate type per kind.

use crate::allocator::{BridgeAllocator, HeapAllocator, OwnershipMode, RawRegion, RawSequence, SequenceAllocator};
use crate::engine::Engine;
use crate::errors::ConversionResult;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::Deref;

/// Static per-kind metadata
#[derive(Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub kind: ElementKind,
    /// `size_of` one element
    pub bytes_per_element: usize,
    /// `align_of` one element
    pub align: usize,
    /// Engine-side class name, used in diagnostics
    pub type_name: &'static str,
}

/// Native element type of a sequence
pub trait Element: bytemuck::Pod + fmt::Debug + PartialEq + 'static {}

impl Element for u8 {}
impl Element for i8 {}
impl Element for u16 {}
impl Element for i16 {}
impl Element for u32 {}
impl Element for i32 {}
impl Element for u64 {}
impl Element for i64 {}
impl Element for f32 {}
impl Element for f64 {}

/// Compile-time handle on one element kind
pub trait Kind: 'static {
    type Elem: Element;
    const KIND: ElementKind;

    #[inline]
    fn descriptor() -> &'static TypeDescriptor {
        Self::KIND.descriptor()
    }
}

/// Aliasing sequence of kind `K`, valid while the engine value is borrowed for `'a`
pub type In<'a, K> = TypedSequence<K, BridgeAllocator<'a, <K as Kind>::Elem>>;

/// Owning sequence of kind `K`
pub type Out<K> = TypedSequence<K, HeapAllocator<<K as Kind>::Elem>>;

macro_rules! define_element_kinds {
    ($(
        $(#[$doc:meta])*
        $tag:ident => $marker:ident($elem:ty, $name:literal) as $alias:ident / $owned:ident;
    )+) => {
        /// Tag identifying one supported element kind
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum ElementKind {
            $( $(#[$doc])* $tag, )+
        }

        impl ElementKind {
            /// Every kind, in table order
            pub const ALL: &'static [ElementKind] = &[$( ElementKind::$tag, )+];
        }

        static DESCRIPTORS: &[TypeDescriptor] = &[$(
            TypeDescriptor {
                kind: ElementKind::$tag,
                bytes_per_element: mem::size_of::<$elem>(),
                align: mem::align_of::<$elem>(),
                type_name: $name,
            },
        )+];

        $(
            #[doc = concat!("Marker for `", $name, "` sequences")]
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $marker;

            impl Kind for $marker {
                type Elem = $elem;
                const KIND: ElementKind = ElementKind::$tag;
            }

            #[doc = concat!("Aliasing `", $name, "` sequence")]
            pub type $alias<'a> = In<'a, $marker>;

            #[doc = concat!("Owning `", $name, "` sequence")]
            pub type $owned = Out<$marker>;
        )+

        /// Aliasing sequence of any kind, tagged by kind
        #[derive(Debug)]
        pub enum AnySequence<'a> {
            $( $tag($alias<'a>), )+
        }

        impl<'a> AnySequence<'a> {
            pub fn kind(&self) -> ElementKind {
                match self {
                    $( Self::$tag(_) => ElementKind::$tag, )+
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $( Self::$tag(seq) => seq.len(), )+
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn as_bytes(&self) -> &[u8] {
                match self {
                    $( Self::$tag(seq) => seq.as_bytes(), )+
                }
            }

            /// Independent copy that may outlive the engine value
            pub fn to_owned_sequence(&self) -> AnyOwnedSequence {
                match self {
                    $( Self::$tag(seq) => AnyOwnedSequence::$tag(seq.to_owned_sequence()), )+
                }
            }

            /// Decode `value` as the kind named by `kind`
            pub fn decode_as<E: Engine>(
                engine: &E,
                value: &'a E::Value,
                kind: ElementKind,
            ) -> ConversionResult<Self> {
                match kind {
                    $( ElementKind::$tag => super::convert::decode::<$marker, E>(engine, value).map(Self::$tag), )+
                }
            }
        }

        /// Owning sequence of any kind, tagged by kind
        #[derive(Debug, Clone, PartialEq)]
        pub enum AnyOwnedSequence {
            $( $tag($owned), )+
        }

        impl AnyOwnedSequence {
            /// Owning sequence of `kind` holding `bytes` reinterpreted as elements
            ///
            /// A trailing partial element is zero-padded.
            pub fn from_bytes(kind: ElementKind, bytes: &[u8]) -> Self {
                match kind {
                    $( ElementKind::$tag => Self::$tag(<$owned>::from_bytes(bytes)), )+
                }
            }

            pub fn kind(&self) -> ElementKind {
                match self {
                    $( Self::$tag(_) => ElementKind::$tag, )+
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $( Self::$tag(seq) => seq.len(), )+
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn as_bytes(&self) -> &[u8] {
                match self {
                    $( Self::$tag(seq) => seq.as_bytes(), )+
                }
            }

            /// New engine value holding a copy of this sequence
            pub fn encode<E: Engine>(&self, engine: &E) -> E::Value {
                match self {
                    $( Self::$tag(seq) => super::convert::encode(engine, seq), )+
                }
            }
        }
    };
}

define_element_kinds! {
    /// Untyped byte buffer
    Bytes => Untyped(u8, "ArrayBuffer") as ArrayBuffer / OwnedArrayBuffer;
    I8 => Int8(i8, "Int8Array") as Int8Array / OwnedInt8Array;
    U8 => Uint8(u8, "Uint8Array") as Uint8Array / OwnedUint8Array;
    /// Same layout as `U8`; the engine clamps on store
    U8Clamped => Uint8Clamped(u8, "Uint8ClampedArray") as Uint8ClampedArray / OwnedUint8ClampedArray;
    I16 => Int16(i16, "Int16Array") as Int16Array / OwnedInt16Array;
    U16 => Uint16(u16, "Uint16Array") as Uint16Array / OwnedUint16Array;
    I32 => Int32(i32, "Int32Array") as Int32Array / OwnedInt32Array;
    U32 => Uint32(u32, "Uint32Array") as Uint32Array / OwnedUint32Array;
    I64 => BigInt64(i64, "BigInt64Array") as BigInt64Array / OwnedBigInt64Array;
    U64 => BigUint64(u64, "BigUint64Array") as BigUint64Array / OwnedBigUint64Array;
    F32 => Float32(f32, "Float32Array") as Float32Array / OwnedFloat32Array;
    F64 => Float64(f64, "Float64Array") as Float64Array / OwnedFloat64Array;
}

impl ElementKind {
    #[inline]
    pub fn descriptor(self) -> &'static TypeDescriptor {
        &DESCRIPTORS[self as usize]
    }

    #[inline]
    pub fn bytes_per_element(self) -> usize {
        self.descriptor().bytes_per_element
    }

    #[inline]
    pub fn type_name(self) -> &'static str {
        self.descriptor().type_name
    }

    /// Whether values of this kind are typed views (everything but `Bytes`)
    #[inline]
    pub fn is_typed_view(self) -> bool {
        self != Self::Bytes
    }

    /// Look a kind up by its engine class name
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.type_name() == name)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Element sequence of kind `K` stored through allocator `A`
///
/// With `BridgeAllocator` the elements are engine memory (aliasing); with
/// `HeapAllocator` they are owned.
pub struct TypedSequence<K: Kind, A: SequenceAllocator<K::Elem>> {
    raw: RawSequence<K::Elem, A>,
    descriptor: &'static TypeDescriptor,
    _kind: PhantomData<K>,
}

impl<K: Kind, A: SequenceAllocator<K::Elem>> TypedSequence<K, A> {
    #[inline]
    fn from_raw(raw: RawSequence<K::Elem, A>) -> Self {
        Self {
            raw,
            descriptor: K::descriptor(),
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.descriptor.kind
    }

    #[inline]
    pub fn mode(&self) -> OwnershipMode {
        A::MODE
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.raw.len() * self.descriptor.bytes_per_element
    }

    #[inline]
    pub fn as_ptr(&self) -> *const K::Elem {
        self.raw.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[K::Elem] {
        self.raw.as_slice()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.raw.as_slice())
    }

    /// Independent copy that may outlive the engine value
    pub fn to_owned_sequence(&self) -> Out<K> {
        Out::<K>::from_slice(self.as_slice())
    }
}

impl<'a, K: Kind> In<'a, K> {
    /// Aliasing sequence over `region`
    ///
    /// The region is assigned onto itself through the same copy path owning
    /// sequences use.
    ///
    /// # Safety
    /// `region` must satisfy the [`BridgeAllocator::new`] contract for `'a`.
    pub unsafe fn bridge(region: RawRegion<K::Elem>) -> Self {
        let mut raw = RawSequence::new_in(BridgeAllocator::from_region(region));
        raw.assign_raw(region.ptr(), region.len());
        Self::from_raw(raw)
    }
}

impl<K: Kind> Out<K> {
    #[inline]
    pub fn new() -> Self {
        Self::from_raw(RawSequence::new())
    }

    pub fn from_slice(elements: &[K::Elem]) -> Self {
        Self::from_raw(RawSequence::from_slice(elements))
    }

    pub fn from_vec(elements: Vec<K::Elem>) -> Self {
        Self::from_slice(&elements)
    }

    /// Elements reinterpreted from raw bytes; a trailing partial element is zero-padded
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let width = mem::size_of::<K::Elem>();
        let mut elements = vec![<K::Elem as bytemuck::Zeroable>::zeroed(); bytes.len().div_ceil(width)];
        bytemuck::cast_slice_mut::<K::Elem, u8>(&mut elements)[..bytes.len()].copy_from_slice(bytes);
        Self::from_vec(elements)
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [K::Elem] {
        self.raw.as_mut_slice()
    }

    pub fn into_vec(self) -> Vec<K::Elem> {
        self.raw.into_vec()
    }
}

impl<K: Kind> Default for Out<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kind> Clone for Out<K> {
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl<K: Kind> From<Vec<K::Elem>> for Out<K> {
    fn from(elements: Vec<K::Elem>) -> Self {
        Self::from_vec(elements)
    }
}

impl<K: Kind> From<&[K::Elem]> for Out<K> {
    fn from(elements: &[K::Elem]) -> Self {
        Self::from_slice(elements)
    }
}

impl<K: Kind> FromIterator<K::Elem> for Out<K> {
    fn from_iter<I: IntoIterator<Item = K::Elem>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<K: Kind, A: SequenceAllocator<K::Elem>> Deref for TypedSequence<K, A> {
    type Target = [K::Elem];

    #[inline]
    fn deref(&self) -> &[K::Elem] {
        self.as_slice()
    }
}

impl<K, A, B> PartialEq<TypedSequence<K, B>> for TypedSequence<K, A>
where
    K: Kind,
    A: SequenceAllocator<K::Elem>,
    B: SequenceAllocator<K::Elem>,
{
    fn eq(&self, other: &TypedSequence<K, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<K: Kind, A: SequenceAllocator<K::Elem>> fmt::Debug for TypedSequence<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.descriptor.type_name)
            .field("mode", &A::MODE)
            .field("elements", &self.as_slice())
            .finish()
    }
}
