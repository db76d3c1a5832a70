//! Interop - engine buffers <-> native typed sequences
//!
//! Design: zero-copy engine -> native, one copy native -> engine
//!
//! Architecture:
//! - `types.rs` - element kinds, descriptor table, `TypedSequence` family
//! - `convert.rs` - decode/encode per kind, `FromEngine` / `ToEngine`
//! - `resolve.rs` - ordered sum-type resolution (`Resolver`, `buffer_union!`)

mod convert;
mod resolve;
mod types;


pub use convert::{decode, encode, from_engine_value, surface, to_engine_value, FromEngine, ToEngine};
pub use resolve::{probe, Alternative, Resolved, Resolver};
pub use types::*;
