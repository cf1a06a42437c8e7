use core::fmt;

/// Closed vocabularies of the specification format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Vocabulary {
    Attribute,
    Prefix,
    CpuMode,
    ModeGroup,
    Decorator,
    Flag,
    FlagAccess,
    FpuFlag,
    FpuAccess,
    OperandAccess,
    OperandType,
    OperandSize,
    Tuple,
    EvexMode,
    ExceptionType,
    SimdException,
    MetaKey,
    CpuidRegister,
    EncodingField,
    Filter,
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Attribute => "attribute",
            Self::Prefix => "prefix",
            Self::CpuMode => "CPU mode",
            Self::ModeGroup => "CPU mode group",
            Self::Decorator => "decorator",
            Self::Flag => "flag",
            Self::FlagAccess => "flag access",
            Self::FpuFlag => "FPU flag",
            Self::FpuAccess => "FPU flag access",
            Self::OperandAccess => "operand access",
            Self::OperandType => "operand type",
            Self::OperandSize => "operand size",
            Self::Tuple => "tuple",
            Self::EvexMode => "EVEX mode",
            Self::ExceptionType => "exception type",
            Self::SimdException => "SIMD exception",
            Self::MetaKey => "metadata key",
            Self::CpuidRegister => "CPUID register",
            Self::EncodingField => "encoding field",
            Self::Filter => "filter",
        };
        fmt.write_str(s)
    }
}

/// Invalid specification.
///
/// Every validation failure of the specification compiler is reported with
/// this type, from a bad token on a single line up to an ambiguous grouping of
/// the whole instruction set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecError {
    /// Token is not part of its closed vocabulary.
    Unknown {
        vocabulary: Vocabulary,
        token: String,
        expected: &'static [&'static str],
    },
    /// CPU mode is valid but belongs to another mode group.
    ModeNotInGroup {
        group: &'static str,
        mode: String,
        expected: &'static [&'static str],
    },
    /// An entry does not follow its `name<sep>value` shape.
    Malformed { what: &'static str, entry: String },
    /// Fewer operand access entries than operands.
    AccessMapTooShort { provided: usize, expected: usize },
    /// Operand token cannot be resolved to a type and a size.
    InvalidOperand(String),
    /// Stack operand with a size that does not describe a number of words.
    InvalidStackSize(String),
    /// Unknown encoding token.
    InvalidEncoding(String),
    /// Malformed ModR/M encoding token.
    InvalidModrm(String),
    /// Specification line starts with a space.
    LeadingSpace,
    /// Specification line does not have exactly five components.
    ComponentCount(usize),
    EmptyMnemonic,
    /// Condition placeholder in a mnemonic without the encoding field it is taken from.
    MissingCondition {
        mnemonic: String,
        field: &'static str,
    },
    /// Encoding value that does not index into its grouping component.
    InvalidGroupValue {
        component: String,
        value: String,
        size: usize,
    },
    /// Instructions that cannot be told apart by any grouping component.
    Conflict(Vec<String>),
}

impl SpecError {
    pub(crate) fn malformed(what: &'static str, entry: &str) -> Self {
        Self::Malformed {
            what,
            entry: entry.to_owned(),
        }
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unknown {
                vocabulary,
                token,
                expected,
            } => write!(
                fmt,
                "unknown {vocabulary} specifier '{token}', expecting one of [{}]",
                expected.join(",")
            ),
            Self::ModeNotInGroup {
                group,
                mode,
                expected,
            } => write!(
                fmt,
                "mode {mode} is not valid for mode group {group}; it can be one of [{}]",
                expected.join(",")
            ),
            Self::Malformed { what, entry } => write!(fmt, "malformed {what} '{entry}'"),
            Self::AccessMapTooShort { provided, expected } => write!(
                fmt,
                "invalid number of operand access specifiers: provided {provided}, expecting {expected}"
            ),
            Self::InvalidOperand(raw) => write!(fmt, "invalid operand size specified: {raw}"),
            Self::InvalidStackSize(size) => write!(fmt, "unknown stack size specified: {size}"),
            Self::InvalidEncoding(token) => write!(fmt, "invalid encoding: unknown token: {token}"),
            Self::InvalidModrm(token) => write!(
                fmt,
                "invalid encoding: modrm specification is invalid: '{token}'"
            ),
            Self::LeadingSpace => fmt.write_str("space cannot be the first character"),
            Self::ComponentCount(count) => write!(
                fmt,
                "expected 5 components per line, but found {count} (missing semicolon?)"
            ),
            Self::EmptyMnemonic => fmt.write_str("mnemonic cannot be empty"),
            Self::MissingCondition { mnemonic, field } => write!(
                fmt,
                "mnemonic {mnemonic} needs a condition, but the {field} field is empty"
            ),
            Self::InvalidGroupValue {
                component,
                value,
                size,
            } => write!(
                fmt,
                "value '{value}' cannot index component {component} of size {size}"
            ),
            Self::Conflict(instructions) => {
                fmt.write_str("cannot properly group the following instructions:")?;
                for i in instructions {
                    write!(fmt, "\n    -> {i}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SpecError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;

    #[test]
    fn unknown_lists_vocabulary() {
        let err = "BOGUS".parse::<Attribute>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("unknown attribute specifier 'BOGUS'"), "{msg}");
        assert!(msg.contains("MODRM,3DNOW"), "{msg}");
    }

    #[test]
    fn conflict_lists_every_instruction() {
        let err = SpecError::Conflict(vec!["NOP".into(), "PAUSE".into()]);
        assert_eq!(
            err.to_string(),
            "cannot properly group the following instructions:\n    -> NOP\n    -> PAUSE"
        );
    }
}
