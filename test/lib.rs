//! Golden tests of decision trees.

#[macro_use]
extern crate log;

pub mod utils;
