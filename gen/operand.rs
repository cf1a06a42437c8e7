use std::fmt;

use isagen_core::{
    access::OperandAccess,
    attributes::OperandFlag,
    decorators::{Decorators, OperandDecorator},
    set::Set,
    vocabulary, SpecError,
};

vocabulary! {
    /// Explicit operand type, the addressing form of an operand.
    ///
    /// Order matters, an operand token is matched against the first type it
    /// starts with.
    pub enum OperandType(OperandType) {
        /// Direct far address.
        A = "A",
        /// VEX/EVEX.vvvv encodes a general purpose register.
        B = "B",
        /// ModR/M.reg encodes a control register.
        C = "C",
        /// ModR/M.reg encodes a debug register.
        D = "D",
        /// ModR/M.rm encodes a general purpose register or memory.
        E = "E",
        /// Flags register.
        F = "F",
        /// ModR/M.reg encodes a general purpose register.
        G = "G",
        /// VEX/EVEX.vvvv encodes a vector register.
        H = "H",
        /// First of two immediates.
        I1 = "I1",
        /// Second of two immediates.
        I2 = "I2",
        I = "I",
        /// Relative offset.
        J = "J",
        /// Stack.
        K = "K",
        /// Upper 4 bits of an immediate encode a vector register.
        L = "L",
        /// ModR/M.rm encodes memory.
        M = "M",
        /// ModR/M.rm encodes a MMX register.
        N = "N",
        /// Memory offset.
        O = "O",
        /// ModR/M.reg encodes a MMX register.
        P = "P",
        /// ModR/M.rm encodes a MMX register or memory.
        Q = "Q",
        /// ModR/M.rm encodes a general purpose register.
        R = "R",
        /// ModR/M.reg encodes a segment register.
        S = "S",
        /// ModR/M.reg encodes a test register.
        T = "T",
        /// ModR/M.rm encodes a vector register.
        U = "U",
        /// ModR/M.reg encodes a vector register.
        V = "V",
        /// ModR/M.rm encodes a vector register or memory.
        W = "W",
        /// DS:rSI addressing.
        X = "X",
        /// ES:rDI addressing.
        Y = "Y",
        /// Opcode low 3 bits encode a general purpose register.
        Z = "Z",
        /// ModR/M.reg encodes a bound register.
        RB = "rB",
        /// ModR/M.rm encodes a bound register or memory.
        MB = "mB",
        /// ModR/M.reg encodes a mask register.
        RK = "rK",
        /// VEX/EVEX.vvvv encodes a mask register.
        VK = "vK",
        /// ModR/M.rm encodes a mask register.
        MK = "mK",
        /// EVEX.aaa encodes a mask register.
        AK = "aK",
        /// ModR/M.reg encodes the base address of a memory operand.
        RM = "rM",
        /// ModR/M.rm encodes the base address of a memory operand.
        MM = "mM",
        /// ModR/M.reg encodes a tile register.
        RT = "rT",
        /// ModR/M.rm encodes a tile register.
        MT = "mT",
        /// VEX.vvvv encodes a tile register.
        VT = "vT",
        /// Low 2 bits of an immediate.
        M2zI = "m2zI",
        /// EVEX.vvvv encodes a default flags value.
        Dfv = "dfv",
    }
}

vocabulary! {
    /// Operand size, meaning depends on operand and vector sizes.
    pub enum OperandSize(OperandSize) {
        A = "a",
        B = "b",
        W = "w",
        D = "d",
        Q = "q",
        Z = "z",
        V = "v",
        Y = "y",
        Yf = "yf",
        S = "s",
        P = "p",
        L = "l",
        Fa = "fa",
        Fw = "fw",
        Fd = "fd",
        Fq = "fq",
        Ft = "ft",
        Fe = "fe",
        Fs = "fs",
        Dq = "dq",
        Qq = "qq",
        Oq = "oq",
        Ev = "ev",
        Qv = "qv",
        Hv = "hv",
        X = "x",
        Uv = "uv",
        Fv = "fv",
        Pd = "pd",
        Ps = "ps",
        Ph = "ph",
        Sd = "sd",
        Ss = "ss",
        Sh = "sh",
        Vm32x = "vm32x",
        Vm32y = "vm32y",
        Vm32z = "vm32z",
        Vm32h = "vm32h",
        Vm32n = "vm32n",
        Vm64x = "vm64x",
        Vm64y = "vm64y",
        Vm64z = "vm64z",
        Vm64h = "vm64h",
        Vm64n = "vm64n",
        Mib = "mib",
        V2 = "v2",
        V3 = "v3",
        V4 = "v4",
        V5 = "v5",
        V8 = "v8",
        Unknown = "?",
        Zero = "0",
        Asz = "asz",
        Ssz = "ssz",
        Rx = "rx",
        Cl = "cl",
        B12 = "12",
        Tile = "t",
        B384 = "384",
        B512 = "512",
        B4096 = "4096",
    }
}

impl OperandSize {
    /// Returns the number of stack words of a stack operand.
    pub fn stack_words(&self) -> Option<u8> {
        Some(match self {
            Self::V => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
            Self::V5 => 5,
            Self::V8 => 8,
            _ => return None,
        })
    }
}

vocabulary! {
    /// Register or memory class of a fixed operand.
    pub enum FixedOperand(OperandType) {
        Ah = "AH",
        RAx = "rAX",
        RCx = "rCX",
        RDx = "rDX",
        RBx = "rBX",
        RBp = "rBP",
        RSp = "rSP",
        RSi = "rSI",
        RDi = "rDI",
        R8 = "rR8",
        R9 = "rR9",
        R11 = "rR11",
        RIp = "rIP",
        One = "1",
        Xmm0 = "XMM0",
        Xmm1 = "XMM1",
        Xmm2 = "XMM2",
        Xmm3 = "XMM3",
        Xmm4 = "XMM4",
        Xmm5 = "XMM5",
        Xmm6 = "XMM6",
        Xmm7 = "XMM7",
        St0 = "ST0",
        StI = "STi",
        Cs = "CS",
        Ss = "SS",
        Ds = "DS",
        Es = "ES",
        Fs = "FS",
        Gs = "GS",
        Cr0 = "CR0",
        Xcr = "XCR",
        Xcr0 = "XCR0",
        Msr = "MSR",
        Tsc = "TSC",
        TscAux = "TSCAUX",
        Scs = "SCS",
        Seip = "SEIP",
        Sesp = "SESP",
        FsBase = "FSBASE",
        GsBase = "GSBASE",
        KgsBase = "KGSBASE",
        Star = "STAR",
        Lstar = "LSTAR",
        Fmask = "FMASK",
        Gdtr = "GDTR",
        Idtr = "IDTR",
        Ldtr = "LDTR",
        Tr = "TR",
        Bank = "BANK",
        X87Control = "X87CONTROL",
        X87Tag = "X87TAG",
        X87Status = "X87STATUS",
        Mxcsr = "MXCSR",
        Pkru = "PKRU",
        Ssp = "SSP",
        Smt = "SMT",
        Dmt = "DMT",
        /// Implicit [rAX].
        PAx = "pAX",
        /// Implicit [rCX].
        PCx = "pCX",
        /// Implicit [rBX + AL].
        PBxAl = "pBXAL",
        /// Implicit [rDI].
        PDi = "pDI",
        /// Implicit [rBP].
        PBp = "pBP",
        /// Shadow stack.
        Shs = "SHS",
        /// Shadow stack of IA32_PL0_SSP.
        Shs0 = "SHS0",
        /// Shadow stack push or pop.
        ShsP = "SHSP",
        /// User interrupt flag.
        Uif = "UIF",
    }
}

/// Fixed operand tokens, not encoded in the instruction.
const FIXED: &[(&str, FixedOperand, OperandSize)] = {
    use FixedOperand as F;
    use OperandSize as S;

    &[
        ("AH", F::Ah, S::B),
        ("AL", F::RAx, S::B),
        ("AX", F::RAx, S::W),
        ("EAX", F::RAx, S::D),
        ("RAX", F::RAx, S::Q),
        ("eAX", F::RAx, S::Z),
        ("rAX", F::RAx, S::V),
        ("yAX", F::RAx, S::Y),
        ("CL", F::RCx, S::B),
        ("ECX", F::RCx, S::D),
        ("RCX", F::RCx, S::Q),
        ("eCX", F::RCx, S::Z),
        ("rCX", F::RCx, S::V),
        ("yCX", F::RCx, S::Y),
        ("aCX", F::RCx, S::Asz),
        ("DX", F::RDx, S::W),
        ("EDX", F::RDx, S::D),
        ("RDX", F::RDx, S::Q),
        ("eDX", F::RDx, S::Z),
        ("rDX", F::RDx, S::V),
        ("yDX", F::RDx, S::Y),
        ("EBX", F::RBx, S::D),
        ("RBX", F::RBx, S::Q),
        ("rBX", F::RBx, S::V),
        ("yBX", F::RBx, S::Y),
        ("rBP", F::RBp, S::V),
        ("sBP", F::RBp, S::Ssz),
        ("rSP", F::RSp, S::V),
        ("sSP", F::RSp, S::Ssz),
        ("aSI", F::RSi, S::Asz),
        ("aDI", F::RDi, S::Asz),
        ("R8", F::R8, S::Q),
        ("R9", F::R9, S::Q),
        ("R11", F::R11, S::Q),
        ("rIP", F::RIp, S::V),
        ("yIP", F::RIp, S::Yf),
        ("1", F::One, S::B),
        ("XMM0", F::Xmm0, S::Dq),
        ("XMM1", F::Xmm1, S::Dq),
        ("XMM2", F::Xmm2, S::Dq),
        ("XMM3", F::Xmm3, S::Dq),
        ("XMM4", F::Xmm4, S::Dq),
        ("XMM5", F::Xmm5, S::Dq),
        ("XMM6", F::Xmm6, S::Dq),
        ("XMM7", F::Xmm7, S::Dq),
        ("ST(0)", F::St0, S::Ft),
        ("ST(i)", F::StI, S::Ft),
        ("CS", F::Cs, S::V),
        ("SS", F::Ss, S::V),
        ("DS", F::Ds, S::V),
        ("ES", F::Es, S::V),
        ("FS", F::Fs, S::V),
        ("GS", F::Gs, S::V),
        ("CR0", F::Cr0, S::Yf),
        ("XCR", F::Xcr, S::Q),
        ("XCR0", F::Xcr0, S::Q),
        ("MSR", F::Msr, S::Q),
        ("TSC", F::Tsc, S::Q),
        ("TSCAUX", F::TscAux, S::Q),
        ("SCS", F::Scs, S::Q),
        ("SEIP", F::Seip, S::Q),
        ("SESP", F::Sesp, S::Q),
        ("FSBASE", F::FsBase, S::Q),
        ("GSBASE", F::GsBase, S::Q),
        ("KGSBASE", F::KgsBase, S::Q),
        ("STAR", F::Star, S::Q),
        ("LSTAR", F::Lstar, S::Q),
        ("FMASK", F::Fmask, S::Q),
        ("GDTR", F::Gdtr, S::S),
        ("IDTR", F::Idtr, S::S),
        ("LDTR", F::Ldtr, S::W),
        ("TR", F::Tr, S::W),
        ("BANK", F::Bank, S::Unknown),
        ("X87CONTROL", F::X87Control, S::W),
        ("X87TAG", F::X87Tag, S::W),
        ("X87STATUS", F::X87Status, S::W),
        ("MXCSR", F::Mxcsr, S::D),
        ("PKRU", F::Pkru, S::D),
        ("SSP", F::Ssp, S::Yf),
        ("SMT", F::Smt, S::B4096),
        ("DMT", F::Dmt, S::B4096),
        ("pAXb", F::PAx, S::B),
        ("pCXdq", F::PCx, S::Dq),
        ("pBXALb", F::PBxAl, S::B),
        ("pDIq", F::PDi, S::Q),
        ("pDIdq", F::PDi, S::Dq),
        ("pBP", F::PBp, S::V),
        ("SHS", F::Shs, S::Q),
        ("SHS0", F::Shs0, S::Q),
        ("SHSI", F::Shs, S::V2),
        ("SHSS", F::Shs, S::B12),
        ("SHS1", F::ShsP, S::V),
        ("SHS2", F::ShsP, S::V2),
        ("SHS3", F::ShsP, S::V3),
        ("SHS4", F::ShsP, S::V4),
        ("UIF", F::Uif, S::B),
    ]
};

/// Operand type, explicit or fixed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Explicit(OperandType),
    Fixed(FixedOperand),
}

impl fmt::Display for OperandKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Explicit(i) => fmt::Display::fmt(i, fmt),
            Self::Fixed(i) => fmt::Display::fmt(i, fmt),
        }
    }
}

/// How the register or memory of an operand is selected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperandEncoding {
    /// Not encoded.
    Implicit,
    /// ModR/M.reg.
    Reg,
    /// ModR/M.rm.
    Rm,
    /// VEX/EVEX.vvvv.
    Vvvv,
    /// EVEX.aaa.
    Aaa,
    Immediate,
    /// Directly in the instruction bytes.
    Direct,
    /// Opcode low 3 bits.
    Opcode,
    /// Upper bits of an immediate.
    Is4,
    /// Constant 1.
    One,
    /// CL register.
    Cl,
}

impl OperandEncoding {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Implicit => "S",
            Self::Reg => "R",
            Self::Rm => "M",
            Self::Vvvv => "V",
            Self::Aaa => "A",
            Self::Immediate => "I",
            Self::Direct => "D",
            Self::Opcode => "O",
            Self::Is4 => "L",
            Self::One => "1",
            Self::Cl => "C",
        }
    }

    fn from_type(ty: OperandType) -> Option<Self> {
        use OperandType as T;

        Some(match ty {
            T::A | T::J | T::O => Self::Direct,
            T::B | T::H | T::VK | T::Dfv => Self::Vvvv,
            T::C | T::D | T::G | T::P | T::S | T::T | T::V | T::RB | T::RK => Self::Reg,
            T::E | T::M | T::N | T::Q | T::R | T::U | T::W | T::MB | T::MK | T::MM => Self::Rm,
            T::I => Self::Immediate,
            T::L | T::M2zI => Self::Is4,
            T::Z => Self::Opcode,
            T::AK => Self::Aaa,
            _ => return None,
        })
    }

    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "CL" => Some(Self::Cl),
            "ST(i)" => Some(Self::Rm),
            _ => None,
        }
    }
}

impl fmt::Display for OperandEncoding {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Strips a block register suffix, returns the token and the number of registers.
fn strip_block(token: &str) -> (&str, usize) {
    if let Some(token) = token.strip_suffix("+3") {
        return (token, 4);
    }
    if let Some(token) = token.strip_suffix("+1") {
        return (token, 2);
    }
    // XMM<first>-<last>
    if let Some(range) = token.strip_prefix("XMM") {
        if let [first @ b'0'..=b'9', b'-', last @ b'0'..=b'9', ..] = range.as_bytes() {
            if last >= first {
                return (&token[..4], (last - first) as usize + 1);
            }
        }
    }
    (token, 0)
}

/// One operand of an instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operand {
    raw: String,
    kind: OperandKind,
    size: OperandSize,
    flags: Vec<OperandFlag>,
    decorators: Decorators,
    access: OperandAccess,
    block: usize,
    encoding: OperandEncoding,
    implicit: bool,
}

impl Operand {
    /// Parses an operand token.
    ///
    /// Implicit operands are always flagged as default operands.
    pub fn parse(
        raw: &str,
        access: OperandAccess,
        mut flags: Vec<OperandFlag>,
        implicit: bool,
    ) -> Result<Self, SpecError> {
        let (token, block) = strip_block(raw);
        let (token, decorators) = Decorators::strip(token);
        let (kind, size) = Self::parse_kind(raw, &token)?;

        let encoding = match kind {
            OperandKind::Explicit(ty) => OperandEncoding::from_type(ty),
            OperandKind::Fixed(FixedOperand::One) => Some(OperandEncoding::One),
            OperandKind::Fixed(_) => None,
        };
        let encoding = encoding
            .or_else(|| OperandEncoding::from_raw(raw))
            .unwrap_or(OperandEncoding::Implicit);

        if implicit && !flags.contains(&OperandFlag::Default) {
            flags.push(OperandFlag::Default);
        }

        Ok(Self {
            raw: raw.to_owned(),
            kind,
            size,
            flags,
            decorators,
            access,
            block,
            encoding,
            implicit,
        })
    }

    fn parse_kind(raw: &str, token: &str) -> Result<(OperandKind, OperandSize), SpecError> {
        if let Some((_, fixed, size)) = FIXED.iter().find(|i| i.0 == token) {
            return Ok((OperandKind::Fixed(*fixed), *size));
        }

        let invalid = || SpecError::InvalidOperand(raw.to_owned());
        let (ty, rest) = OperandType::ALL
            .iter()
            .find_map(|ty| token.strip_prefix(ty.as_str()).map(|rest| (*ty, rest)))
            .ok_or_else(invalid)?;
        let size = match (ty, OperandSize::from_token(rest)) {
            (OperandType::RK | OperandType::MK | OperandType::VK | OperandType::AK, None) => {
                OperandSize::Q
            }
            (OperandType::Dfv, _) => OperandSize::Zero,
            (_, Some(size)) => size,
            (_, None) => return Err(invalid()),
        };
        Ok((OperandKind::Explicit(ty), size))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> OperandKind {
        self.kind
    }

    /// Returns the explicit operand type.
    pub fn ty(&self) -> Option<OperandType> {
        match self.kind {
            OperandKind::Explicit(ty) => Some(ty),
            OperandKind::Fixed(_) => None,
        }
    }

    pub fn is(&self, ty: OperandType) -> bool {
        self.kind == OperandKind::Explicit(ty)
    }

    pub fn is_fixed(&self, fixed: FixedOperand) -> bool {
        self.kind == OperandKind::Fixed(fixed)
    }

    pub fn size(&self) -> OperandSize {
        self.size
    }

    pub fn flags(&self) -> &[OperandFlag] {
        &self.flags
    }

    pub fn decorators(&self) -> &Decorators {
        &self.decorators
    }

    pub fn decorator_flags(&self) -> Set<OperandDecorator> {
        self.decorators.operand_flags()
    }

    pub fn access(&self) -> OperandAccess {
        self.access
    }

    /// Returns the number of registers of a block register operand, zero otherwise.
    pub fn block(&self) -> usize {
        self.block
    }

    pub fn encoding(&self) -> OperandEncoding {
        self.encoding
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    /// Memory access through ModR/M, only if ModR/M.mod is not register.
    pub fn is_memory_modrm(&self) -> bool {
        use OperandType as T;

        matches!(self.ty(), Some(T::M | T::E | T::Q | T::W | T::MB | T::MK))
    }

    /// Memory access regardless of ModR/M.
    pub fn is_memory_default(&self) -> bool {
        use OperandType as T;

        matches!(self.ty(), Some(T::O | T::X | T::Y | T::K | T::RM | T::MM))
    }

    pub fn is_memory_implicit(&self) -> bool {
        use FixedOperand as F;

        matches!(
            self.kind,
            OperandKind::Fixed(
                F::PDi | F::PBxAl | F::PAx | F::PCx | F::PBp | F::Shs | F::Shs0 | F::ShsP | F::Smt | F::Dmt
            )
        )
    }

    pub fn is_cs(&self) -> bool {
        self.is_fixed(FixedOperand::Cs)
    }

    pub fn is_rip(&self) -> bool {
        self.is_fixed(FixedOperand::RIp)
    }

    pub fn is_flags(&self) -> bool {
        self.is(OperandType::F)
    }

    pub fn is_stack(&self) -> bool {
        self.is(OperandType::K)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Operand, SpecError> {
        Operand::parse(raw, OperandAccess::Read, vec![], false)
    }

    #[test]
    fn explicit() {
        let op = parse("Gv").unwrap();
        assert_eq!(op.kind(), OperandKind::Explicit(OperandType::G));
        assert_eq!(op.size(), OperandSize::V);
        assert_eq!(op.encoding(), OperandEncoding::Reg);

        let op = parse("I1b").unwrap();
        assert!(op.is(OperandType::I1));
        assert_eq!(op.size(), OperandSize::B);
        assert_eq!(op.encoding(), OperandEncoding::Implicit);

        let op = parse("Wsd").unwrap();
        assert!(op.is(OperandType::W));
        assert_eq!(op.size(), OperandSize::Sd);
        assert!(op.is_memory_modrm());
    }

    #[test]
    fn fixed() {
        let op = parse("EAX").unwrap();
        assert_eq!(op.kind(), OperandKind::Fixed(FixedOperand::RAx));
        assert_eq!(op.size(), OperandSize::D);
        assert_eq!(op.encoding(), OperandEncoding::Implicit);

        assert_eq!(parse("CL").unwrap().encoding(), OperandEncoding::Cl);
        assert_eq!(parse("ST(i)").unwrap().encoding(), OperandEncoding::Rm);
        assert_eq!(parse("1").unwrap().encoding(), OperandEncoding::One);
        assert!(parse("pDIq").unwrap().is_memory_implicit());
    }

    #[test]
    fn invalid() {
        assert_eq!(parse("Qz9"), Err(SpecError::InvalidOperand("Qz9".into())));
        assert!(parse("zz").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn mask_and_flags_value() {
        let op = parse("rK").unwrap();
        assert_eq!(op.size(), OperandSize::Q);
        let op = parse("vKb").unwrap();
        assert_eq!(op.size(), OperandSize::B);
        let op = parse("aKq").unwrap();
        assert_eq!(op.encoding(), OperandEncoding::Aaa);
        let op = parse("dfv").unwrap();
        assert_eq!(op.size(), OperandSize::Zero);
        assert_eq!(op.encoding(), OperandEncoding::Vvvv);
    }

    #[test]
    fn block() {
        let op = parse("Vdq+3").unwrap();
        assert_eq!(op.block(), 4);
        assert_eq!(op.size(), OperandSize::Dq);
        assert_eq!(op.raw(), "Vdq+3");

        assert_eq!(parse("Hdq+1").unwrap().block(), 2);

        let op = parse("XMM4-7").unwrap();
        assert_eq!(op.block(), 4);
        assert!(op.is_fixed(FixedOperand::Xmm4));
    }

    #[test]
    fn decorators() {
        let op = parse("Vfv{K}{z}").unwrap();
        assert!(op.is(OperandType::V));
        assert_eq!(op.size(), OperandSize::Fv);
        assert_eq!(op.decorator_flags().to_string(), "MASK|ZERO");

        let op = parse("Wps|B32").unwrap();
        assert_eq!(op.size(), OperandSize::Ps);
        assert_eq!(op.decorator_flags().to_string(), "B32");
    }

    #[test]
    fn implicit_is_default() {
        let op = Operand::parse("rAX", OperandAccess::Write, vec![], true).unwrap();
        assert_eq!(op.flags(), [OperandFlag::Default]);
        assert!(op.is_implicit());
    }
}
