//! x86 instruction specification compiler.
//!
//! Specification lines are parsed into fully processed [`Instruction`]s, the
//! instructions of every encoding family are then grouped into a decision
//! tree a decoder generator walks to emit its lookup tables.

#[macro_use]
extern crate log;

pub mod encoding;
pub mod filter;
pub mod group;
pub mod insn;
pub mod operand;

mod error;
mod loader;
mod parser;

pub use crate::{
    error::{Error, ErrorKind},
    group::{group, InstructionGroup, LEGACY_COMPONENTS, VEX_COMPONENTS},
    insn::Instruction,
    loader::{DecodeTrees, Spec, Specification},
    parser::parse_line,
};

pub use isagen_core::{SpecError, Templates};
