use crate::{macros::vocabulary, set::Set};

vocabulary! {
    /// Structural or validity property of an instruction.
    pub enum Attribute(Attribute) {
        /// ModR/M byte is present.
        Modrm = "MODRM",
        /// 3DNow! instruction, the opcode follows the operands.
        ThreeDNow = "3DNOW",
        /// Condition code in the low opcode nibble.
        Cond = "COND",
        /// LOCK prefix is accepted without a memory destination.
        LockSpecial = "LOCKSP",
        Vector = "VECTOR",
        /// 0x66 is part of the opcode, not an operand size override.
        S66 = "S66",
        /// Accesses the shadow stack.
        Shs = "SHS",
        /// Mod field is forced to register.
        Mfr = "MFR",
        /// CET tracked indirect branch.
        Cett = "CETT",
        Serial = "SERIAL",
        Scalable = "SCALABLE",
        /// Invalid in 64-bit mode.
        I64 = "I64",
        /// Valid only in 64-bit mode.
        O64 = "O64",
        /// Operand size forced to 64 bit in 64-bit mode.
        F64 = "F64",
        /// Operand size defaults to 64 bit in 64-bit mode.
        D64 = "D64",
        Op1Def = "OP1DEF",
        Op2Def = "OP2DEF",
        Op2SignExO1 = "OP2SIGNEXO1",
        Op3SignExO1 = "OP3SIGNEXO1",
        Op1SignExDw = "OP1SIGNEXDW",
        /// Address generation, no memory access.
        Ag = "AG",
        BitBase = "BITBASE",
        Vsib = "VSIB",
        Mib = "MIB",
        SibMem = "SIBMEM",
        /// Vector length ignored.
        Lig = "LIG",
        /// Vector width ignored.
        Wig = "WIG",
        /// Address size override ignored in 64-bit mode.
        I67 = "I67",
        /// Embedded rounding ignored.
        Ier = "IER",
        /// Vector width ignored outside 64-bit mode.
        Iwo64 = "IWO64",
        /// Mask register is mandatory.
        MMask = "MMASK",
        /// Zeroing is not allowed for memory destinations.
        NoMz = "NOMZ",
        NoL0 = "NOL0",
        NoA16 = "NOA16",
        NoRipRel = "NORIPREL",
        No66 = "NO66",
        No67 = "NO67",
        NoRep = "NOREP",
        NoRex2 = "NOREX2",
        NoV = "NOV",
        NoVp = "NOVP",
    }
}

vocabulary! {
    /// Operand-scoped flag, attached from an `OP<n><flag>` attribute.
    pub enum OperandFlag(Attribute) {
        /// Default operand, not encoded.
        Default = "OPDEF",
        /// Sign extended to the size of the first operand.
        SignExtendOp1 = "OPSIGNEXO1",
        /// Sign extended to a double word.
        SignExtendDword = "OPSIGNEXDW",
    }
}

impl Attribute {
    /// Returns the operand number and flag of an operand-scoped attribute.
    pub const fn operand_flag(&self) -> Option<(usize, OperandFlag)> {
        Some(match self {
            Self::Op1Def => (1, OperandFlag::Default),
            Self::Op2Def => (2, OperandFlag::Default),
            Self::Op2SignExO1 => (2, OperandFlag::SignExtendOp1),
            Self::Op3SignExO1 => (3, OperandFlag::SignExtendOp1),
            Self::Op1SignExDw => (1, OperandFlag::SignExtendDword),
            _ => return None,
        })
    }
}

pub type Attributes = Set<Attribute>;

impl Set<Attribute> {
    /// Removes operand-scoped attributes of operand `number` and returns their flags.
    pub fn take_operand_flags(&mut self, number: usize) -> Vec<OperandFlag> {
        let mut flags = Vec::new();
        self.retain(|attr| match attr.operand_flag() {
            Some((n, flag)) if n == number => {
                flags.push(flag);
                false
            }
            _ => true,
        });
        flags
    }

    /// Returns attributes which are not operand-scoped.
    pub fn instruction_attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.iter().filter(|i| i.operand_flag().is_none())
    }
}
