use crate::{error::SpecError, macros::vocabulary};

vocabulary! {
    /// Key of a `key:value` metadata entry.
    pub enum MetaKey(MetaKey) {
        Class = "c",
        Category = "t",
        /// Instruction set, also the default feature identifier.
        Set = "s",
        Id = "i",
        Attributes = "a",
        Prefixes = "p",
        Access = "w",
        Tuple = "l",
        EvexMode = "v",
        Exception = "e",
        Flags = "f",
        FpuFlags = "u",
        Modes = "m",
        SimdExceptions = "x",
    }
}

/// Splits a metadata entry into its key and value.
pub fn parse_entry(entry: &str) -> Result<(MetaKey, &str), SpecError> {
    let entry = entry.trim();
    match entry.split_once(':') {
        Some((key, value)) if !value.contains(':') => Ok((key.trim().parse()?, value.trim())),
        _ => Err(SpecError::malformed("metadata entry", entry)),
    }
}
