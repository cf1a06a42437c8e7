use isagen_core::{attributes::Attribute, vocabulary};

use crate::operand::OperandType;

vocabulary! {
    /// Residual validity check of an instruction, the #UD conditions tested
    /// after the decision tree reached its leaf.
    pub enum Filter(Filter) {
        /// Invalid in 64-bit mode.
        No64 = "no64",
        /// Invalid outside 64-bit mode.
        No1632 = "no1632",
        NoRipRel = "noriprel",
        /// 16-bit addressing is invalid.
        NoA16 = "noa16",
        No66 = "no66",
        No67 = "no67",
        NoRep = "norep",
        NoRex2 = "norex2",
        /// Vector length 0 is invalid.
        NoL0 = "nol0",
        /// VEX/EVEX.vvvv must be 0b1111.
        NoV = "nov",
        /// EVEX.V' must be 1.
        NoVp = "novp",
        /// Both `nov` and `novp`.
        NoVvp = "novvp",
        /// General purpose register in ModR/M.reg below 16.
        RrLt16 = "rrlt16",
        /// General purpose register in vvvv below 16.
        RvLt16 = "rvlt16",
        /// Segment register in {0,2,3,4,5}.
        SrIn02345 = "srin02345",
        /// Segment register in {0,1,2,3,4,5}.
        SrIn012345 = "srin012345",
        /// Control register in {0,2,3,4,8}.
        CrIn02348 = "crin02348",
        DrLt8 = "drlt8",
        /// Test register below 8.
        QrLt8 = "qrlt8",
        /// Bound register in ModR/M.reg below 4.
        BrLt4 = "brlt4",
        /// Bound register in ModR/M.rm below 4.
        BmLt4 = "bmlt4",
        /// Mask register in ModR/M.reg below 8.
        KrLt8 = "krlt8",
        /// Mask register in vvvv below 8.
        KvLt8 = "kvlt8",
        /// Tile register in ModR/M.reg below 8.
        TrLt8 = "trlt8",
        /// Tile register in ModR/M.rm below 8.
        TmLt8 = "tmlt8",
        /// Tile register in vvvv below 8.
        TvLt8 = "tvlt8",
        /// VSIB index, vvvv and ModR/M.reg registers are distinct.
        VxNeVrVxNeVvVrNeVv = "vxnevr_vxnevv_vrnevv",
        /// VSIB index and ModR/M.reg registers are distinct.
        VxNeVr = "vxnevr",
        /// Tile registers are distinct.
        TrNeTmTrNeTvTvNeTm = "trnetm_trnetv_tvnetm",
        VrNeVvVrNeVm = "vrnevv_vrnevm",
        /// vvvv and ModR/M.rm do not encode RSP.
        RvNe4RmNe4 = "rvne4_rmne4",
        /// vvvv and ModR/M.rm encode distinct registers.
        RvNeRm = "rvnerm",
    }
}

impl Filter {
    /// Returns the filter implied by an instruction attribute.
    pub fn from_attribute(attr: Attribute) -> Option<Self> {
        Some(match attr {
            Attribute::I64 => Self::No64,
            Attribute::O64 => Self::No1632,
            Attribute::NoRipRel => Self::NoRipRel,
            Attribute::NoA16 => Self::NoA16,
            Attribute::No66 => Self::No66,
            Attribute::No67 => Self::No67,
            Attribute::NoRep => Self::NoRep,
            Attribute::NoRex2 => Self::NoRex2,
            Attribute::NoL0 => Self::NoL0,
            Attribute::NoV => Self::NoV,
            Attribute::NoVp => Self::NoVp,
            _ => return None,
        })
    }

    /// Returns the register range check of an explicit operand type.
    ///
    /// Checks on general purpose registers encoded in EVEX apply to native
    /// EVEX instructions only and are not covered here.
    pub fn from_operand(ty: OperandType, write: bool) -> Option<Self> {
        use OperandType as T;

        Some(match ty {
            T::S if write => Self::SrIn02345,
            T::S => Self::SrIn012345,
            T::C => Self::CrIn02348,
            T::D => Self::DrLt8,
            T::T => Self::QrLt8,
            T::RB => Self::BrLt4,
            T::MB => Self::BmLt4,
            T::RK => Self::KrLt8,
            T::VK => Self::KvLt8,
            T::RT => Self::TrLt8,
            T::MT => Self::TmLt8,
            T::VT => Self::TvLt8,
            _ => return None,
        })
    }
}
