//!
//! naml-std-core - Core Runtime Types
//!
//! This crate provides the fundamental types shared across naml standard library crates:
//!
//! - `Value` and `Object` for script-level values handed to native code
//! - `TypedArray` views over shared byte buffers
//! - `Arena` and `SlotKey` for generation-checked handle tables
//! - `ExceptionKind` for mapping native failures onto host exception classes
//! - Display and JSON rendering of values
//!

pub mod value;
pub mod bytes;
pub mod arena;
pub mod exception;
pub mod print;

pub use value::*;
pub use bytes::*;
pub use arena::*;
pub use exception::*;
