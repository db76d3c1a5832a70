//! Sum-type resolver - pick the first candidate shape an engine value matches
//!
//! Design:
//! - Candidates are probed strictly in declaration order; first match wins
//! - Probes are structural: byte buffer present, or typed-view width equality
//! - Inner stages report exhaustion as `Ok(None)`; only the outermost caller
//!   turns it into `NoStructuralMatch`
//!
//! Two surfaces: [`Resolver`] for candidate lists built at runtime, and
//! [`buffer_union!`](crate::buffer_union) for closed enums declared in code.

use super::convert::decode;
use super::types::{AnySequence, ElementKind, In, Kind};
use crate::engine::{Engine, TempGuard};
use crate::errors::{ConversionError, ConversionResult};
use crate::logging::{log_conversion_error, log_probe, log_resolution, perf};
use smallvec::SmallVec;

/// Whether `value` structurally matches `kind`
///
/// Any temporary handle taken for the check is released before returning.
pub fn probe<E: Engine>(engine: &E, value: &E::Value, kind: ElementKind) -> bool {
    let matched = if kind.is_typed_view() {
        match engine.typed_array(value) {
            Some(view) => {
                let _temp = TempGuard::new(engine, view.handle);
                view.bytes_per_element == kind.bytes_per_element()
            }
            None => false,
        }
    } else {
        engine.array_buffer(value).is_some_and(|raw| !raw.ptr.is_null())
    };

    log_probe(kind.type_name(), matched);
    matched
}

fn no_match(candidates: String) -> ConversionError {
    let err = ConversionError::NoStructuralMatch { candidates };
    log_conversion_error("union", &err);
    err
}

/// Ordered list of candidate kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolver {
    candidates: SmallVec<[ElementKind; 4]>,
}

/// Outcome of a successful resolution
#[derive(Debug)]
pub struct Resolved<'a> {
    /// Position of the matching candidate in declaration order
    pub index: usize,
    pub sequence: AnySequence<'a>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_kinds(kinds: &[ElementKind]) -> Self {
        Self {
            candidates: kinds.iter().copied().collect(),
        }
    }

    /// Append a candidate after the existing ones
    pub fn candidate(mut self, kind: ElementKind) -> Self {
        self.candidates.push(kind);
        self
    }

    /// Append every candidate of `other`, which is only tried once these are exhausted
    pub fn then(mut self, other: Resolver) -> Self {
        self.candidates.extend(other.candidates);
        self
    }

    #[inline]
    pub fn candidates(&self) -> &[ElementKind] {
        &self.candidates
    }

    /// Candidate names joined as `"A | B | C"`
    pub fn describe(&self) -> String {
        self.candidates
            .iter()
            .map(|kind| kind.type_name())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// First matching candidate, or `None` once every candidate has been tried
    pub fn try_resolve<'a, E: Engine>(
        &self,
        engine: &E,
        value: &'a E::Value,
    ) -> ConversionResult<Option<Resolved<'a>>> {
        let _perf = perf::track("resolve");

        for (index, &kind) in self.candidates.iter().enumerate() {
            if !probe(engine, value, kind) {
                continue;
            }
            let sequence = AnySequence::decode_as(engine, value, kind)?;
            log_resolution(kind.type_name(), index);
            return Ok(Some(Resolved { index, sequence }));
        }

        Ok(None)
    }

    /// First matching candidate; exhaustion is a `NoStructuralMatch` error
    pub fn resolve<'a, E: Engine>(&self, engine: &E, value: &'a E::Value) -> ConversionResult<Resolved<'a>> {
        match self.try_resolve(engine, value)? {
            Some(resolved) => Ok(resolved),
            None => Err(no_match(self.describe())),
        }
    }
}

/// One shape (or closed set of shapes) an engine value may take
///
/// Implemented by every aliasing sequence and by enums declared with
/// [`buffer_union!`](crate::buffer_union), so unions nest.
pub trait Alternative<'a, E: Engine>: Sized {
    /// Decode `value` if it matches, `Ok(None)` if it matches no alternative
    fn try_match(engine: &E, value: &'a E::Value) -> ConversionResult<Option<Self>>;

    /// Append engine type names of every alternative, in order
    fn candidate_names(names: &mut Vec<&'static str>);

    /// Outermost resolution: exhaustion becomes `NoStructuralMatch`
    fn resolve(engine: &E, value: &'a E::Value) -> ConversionResult<Self> {
        match Self::try_match(engine, value)? {
            Some(matched) => Ok(matched),
            None => {
                let mut names = Vec::new();
                Self::candidate_names(&mut names);
                Err(no_match(names.join(" | ")))
            }
        }
    }
}

impl<'a, K: Kind, E: Engine> Alternative<'a, E> for In<'a, K> {
    fn try_match(engine: &E, value: &'a E::Value) -> ConversionResult<Option<Self>> {
        if probe(engine, value, K::KIND) {
            decode::<K, E>(engine, value).map(Some)
        } else {
            Ok(None)
        }
    }

    fn candidate_names(names: &mut Vec<&'static str>) {
        names.push(K::descriptor().type_name);
    }
}

/// Declare a closed enum of buffer alternatives resolved in declaration order
///
/// ```
/// use bufbridge::buffer_union;
/// use bufbridge::interop::{ArrayBuffer, Float64Array, Int32Array};
///
/// buffer_union! {
///     pub enum Samples<'a> {
///         Wide(Float64Array<'a>),
///         Narrow(Int32Array<'a>),
///         Raw(ArrayBuffer<'a>),
///     }
/// }
/// ```
#[macro_export]
macro_rules! buffer_union {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident<$lt:lifetime> {
            $( $(#[$variant_meta:meta])* $variant:ident($ty:ty) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name<$lt> {
            $( $(#[$variant_meta])* $variant($ty), )+
        }

        impl<$lt, BridgeEngine: $crate::engine::Engine> $crate::interop::Alternative<$lt, BridgeEngine> for $name<$lt> {
            fn try_match(
                engine: &BridgeEngine,
                value: &$lt BridgeEngine::Value,
            ) -> $crate::errors::ConversionResult<::core::option::Option<Self>> {
                $(
                    if let ::core::option::Option::Some(matched) =
                        <$ty as $crate::interop::Alternative<$lt, BridgeEngine>>::try_match(engine, value)?
                    {
                        return ::core::result::Result::Ok(::core::option::Option::Some($name::$variant(matched)));
                    }
                )+
                ::core::result::Result::Ok(::core::option::Option::None)
            }

            fn candidate_names(names: &mut ::std::vec::Vec<&'static str>) {
                $( <$ty as $crate::interop::Alternative<$lt, BridgeEngine>>::candidate_names(names); )+
            }
        }

        impl<$lt, BridgeEngine: $crate::engine::Engine> $crate::interop::FromEngine<$lt, BridgeEngine> for $name<$lt> {
            fn from_engine(
                engine: &BridgeEngine,
                value: &$lt BridgeEngine::Value,
            ) -> $crate::errors::ConversionResult<Self> {
                <Self as $crate::interop::Alternative<$lt, BridgeEngine>>::resolve(engine, value)
            }
        }
    };
}
