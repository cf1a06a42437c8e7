//! Closed vocabularies of the x86 instruction specification format.
//!
//! Every token of a specification line metadata is validated against one of
//! the vocabularies defined here. Unknown tokens are rejected with
//! [`SpecError`].

#[macro_use]
extern crate log;

pub mod macros;

pub mod access;
pub mod attributes;
pub mod cpu_modes;
pub mod cpuid;
pub mod decorators;
pub mod error;
pub mod evex;
pub mod exception;
pub mod flags;
pub mod fpu;
pub mod meta;
pub mod prefixes;
pub mod set;
pub mod simd;
pub mod templates;

pub use crate::{error::SpecError, templates::Templates};

pub type Result<T, E = SpecError> = core::result::Result<T, E>;
