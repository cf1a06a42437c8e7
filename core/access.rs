use crate::{error::SpecError, macros::vocabulary};

vocabulary! {
    /// How an instruction accesses one of its operands.
    pub enum OperandAccess(OperandAccess) {
        None = "N",
        /// Memory operand whose address is computed but not accessed.
        Prefetch = "P",
        Read = "R",
        Write = "W",
        CondRead = "CR",
        CondWrite = "CW",
        ReadWrite = "RW",
        CondReadWrite = "CRW",
        ReadCondWrite = "RCW",
        CondReadCondWrite = "CRCW",
    }
}

impl OperandAccess {
    pub fn is_read(&self) -> bool {
        self.as_str().contains('R')
    }

    pub fn is_write(&self) -> bool {
        self.as_str().contains('W')
    }

    pub fn is_conditional(&self) -> bool {
        self.as_str().contains('C')
    }
}

/// Access of every operand, explicit operands first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessMap {
    list: Vec<OperandAccess>,
}

impl AccessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `|`-separated access entries.
    pub fn add(&mut self, value: &str) -> Result<(), SpecError> {
        let list: Vec<OperandAccess> = crate::macros::parse_list(value)?;
        self.list.extend(list);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<OperandAccess> {
        self.list.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn as_slice(&self) -> &[OperandAccess] {
        &self.list
    }

    /// Checks that every one of `operands` has an access entry.
    pub fn check(&self, operands: usize) -> Result<(), SpecError> {
        if self.list.len() < operands {
            return Err(SpecError::AccessMapTooShort {
                provided: self.list.len(),
                expected: operands,
            });
        }
        Ok(())
    }
}
