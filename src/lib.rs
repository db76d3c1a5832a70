//! bufbridge - binary buffer interop between native code and a script engine
//!
//! Engine byte buffers and typed views decode into native typed sequences
//! that alias engine memory for the duration of a borrow; owning native
//! sequences encode into fresh engine-owned buffers. When a value may take
//! one of several shapes, a resolver picks the first candidate it matches.

pub mod allocator;
pub mod config;
pub mod engine;
pub mod errors;
pub mod interop;
pub mod logging;

// Re-export commonly used items
pub use allocator::{BridgeAllocator, HeapAllocator, OwnershipMode, RawSequence, SequenceAllocator};
pub use config::{ConfigError, InteropConfig};
pub use engine::{Engine, HeapEngine, HeapValue};
pub use errors::{ConversionError, ConversionResult, Direction};
pub use interop::{
    decode, encode, Alternative, AnyOwnedSequence, AnySequence, ElementKind, FromEngine, In, Kind, Out,
    Resolver, ToEngine, TypedSequence,
};

/// Initialize logging from the environment
pub fn init() {
    init_with_config(&InteropConfig::from_env());
}

/// Initialize logging as described by `config`
pub fn init_with_config(config: &InteropConfig) {
    logging::init_with_config(config.log_config());
}
