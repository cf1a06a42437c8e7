use std::fmt;

use isagen_core::{
    access::{AccessMap, OperandAccess},
    attributes::{Attribute, Attributes},
    cpu_modes::{CpuMode, CpuModes},
    cpuid::CpuidFeature,
    decorators::{DecoratorFlag, Decorators},
    evex::{EvexMode, Tuple},
    exception::ExceptionType,
    flags::FlagsAccess,
    fpu::FpuFlagsAccess,
    meta::{self, MetaKey},
    prefixes::Prefixes,
    set::Set,
    simd::SimdExceptions,
    SpecError, Templates,
};

use crate::{
    encoding::{Encoding, Field},
    filter::Filter,
    operand::{Operand, OperandSize, OperandType},
};

/// Tokens marking an absent operand list.
pub(crate) const ABSENT: &[&str] = &["n/a", ""];

/// Condition codes of the low opcode nibble.
static CONDITIONS: [&str; 16] = [
    "O", "NO", "C", "NC", "Z", "NZ", "BE", "NBE", "S", "NS", "P", "NP", "L", "NL", "LE", "NLE",
];

/// Condition codes of EVEX.SC.
static STANDARD_CONDITIONS: [&str; 16] = [
    "O", "NO", "C", "NC", "Z", "NZ", "BE", "NBE", "S", "NS", "T", "F", "L", "NL", "LE", "NLE",
];

/// Kind of the bytes following the opcode and ModR/M.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Immediate,
    /// Relative offset.
    Relative,
    /// Direct far address.
    Absolute,
    /// Memory offset.
    Offset,
    /// Register encoded in the upper bits of an immediate.
    Register,
}

impl PayloadKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "I",
            Self::Relative => "J",
            Self::Absolute => "A",
            Self::Offset => "O",
            Self::Register => "L",
        }
    }
}

/// Shape of the instruction payload, lets a decoder fetch it without looking
/// at the operands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    kind: PayloadKind,
    sizes: Vec<OperandSize>,
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn sizes(&self) -> &[OperandSize] {
        &self.sizes
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}_", self.kind.as_str())?;
        for size in &self.sizes {
            fmt::Display::fmt(size, fmt)?;
        }
        Ok(())
    }
}

/// Access of special operands, precomputed for the decoder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessSummary {
    /// CS register access, far branches.
    pub cs: Option<OperandAccess>,
    /// Instruction pointer access, branches.
    pub rip: Option<OperandAccess>,
    /// RFLAGS register access.
    pub flags: Option<OperandAccess>,
    pub stack: Option<OperandAccess>,
    /// Number of stack words pushed or popped.
    pub stack_words: u8,
    /// Memory access through ModR/M, only if ModR/M.mod is not register.
    pub memory_modrm: Option<OperandAccess>,
    /// Unconditional memory accesses.
    pub memory: Vec<OperandAccess>,
}

impl AccessSummary {
    fn push_memory(&mut self, access: OperandAccess) {
        if !self.memory.contains(&access) {
            self.memory.push(access);
        }
    }
}

/// Fully processed specification of one instruction encoding.
#[derive(Clone, Debug)]
pub struct Instruction {
    mnemonic: String,
    class: String,
    set: String,
    category: String,
    id: String,
    raw_encoding: String,
    operands: Vec<Operand>,
    implicit: Vec<Operand>,
    attributes: Attributes,
    prefixes: Prefixes,
    access: AccessMap,
    tuple: Option<Tuple>,
    evex_mode: Option<EvexMode>,
    exception: Option<ExceptionType>,
    flags: FlagsAccess,
    fpu_flags: FpuFlagsAccess,
    simd: SimdExceptions,
    modes: CpuModes,
    decorators: Set<DecoratorFlag>,
    encoding: Encoding,
    filters: Vec<Filter>,
    payload: Option<Payload>,
    summary: AccessSummary,
    cpuid: Option<CpuidFeature>,
}

impl Instruction {
    /// Builds an instruction from the components of a specification line.
    pub fn new(
        mnemonic: &str,
        explicit: &[&str],
        implicit: &[&str],
        encoding: &str,
        meta: &[&str],
        templates: &Templates,
    ) -> Result<Self, SpecError> {
        let (mnemonic, decorators) = Decorators::strip(mnemonic);

        // The mask register is a decorator of the first operand but it has
        // its own operand slot.
        let mut explicit = explicit.to_vec();
        if explicit.first().and_then(|i| i.find("{K")).map_or(false, |i| i > 0) {
            explicit.insert(1, "aKq");
        }

        let mut insn = Self {
            class: mnemonic.clone(),
            mnemonic,
            set: String::from("UNKNOWN"),
            category: String::from("UNKNOWN"),
            id: String::from("UNKNOWN"),
            raw_encoding: encoding.to_owned(),
            operands: Vec::new(),
            implicit: Vec::new(),
            attributes: Attributes::new(),
            prefixes: Prefixes::new(),
            access: AccessMap::new(),
            tuple: None,
            evex_mode: None,
            exception: None,
            flags: FlagsAccess::new(),
            fpu_flags: FpuFlagsAccess::new(),
            simd: SimdExceptions::new(),
            modes: CpuModes::all(),
            decorators: decorators.instruction_flags(),
            encoding: Encoding::default(),
            filters: Vec::new(),
            payload: None,
            summary: AccessSummary::default(),
            cpuid: None,
        };

        insn.process_meta(meta, templates)?;
        insn.access.check(explicit.len() + implicit.len())?;
        insn.encoding = Encoding::parse(encoding, &mut insn.attributes)?;
        insn.operands = insn.parse_operands(&explicit, false)?;
        insn.implicit = insn.parse_operands(implicit, true)?;
        insn.post_process_operands();
        insn.post_process_modes();
        insn.post_process_mnemonic()?;
        insn.process_filters();
        insn.fill_access_summary()?;
        insn.cpuid = templates.cpuid(&insn.id).cloned();

        Ok(insn)
    }

    fn process_meta(&mut self, meta: &[&str], templates: &Templates) -> Result<(), SpecError> {
        for entry in meta {
            let (key, value) = meta::parse_entry(entry)?;
            match key {
                MetaKey::Class => self.class = value.to_owned(),
                MetaKey::Category => self.category = value.to_owned(),
                MetaKey::Set => {
                    self.set = value.to_owned();
                    self.id = value.to_owned();
                }
                MetaKey::Id => self.id = value.to_owned(),
                MetaKey::Attributes => self.attributes.add(value)?,
                MetaKey::Prefixes => self.prefixes.add(value)?,
                MetaKey::Access => self.access.add(value)?,
                MetaKey::Tuple => self.tuple = Some(value.parse()?),
                MetaKey::EvexMode => self.evex_mode = Some(value.parse()?),
                MetaKey::Exception => self.exception = Some(value.parse()?),
                MetaKey::Flags => self.flags.add(value, templates)?,
                MetaKey::FpuFlags => self.fpu_flags.add(value)?,
                MetaKey::Modes => self.modes = CpuModes::parse(value, templates)?,
                MetaKey::SimdExceptions => self.simd.add(value)?,
            }
        }
        Ok(())
    }

    fn parse_operands(&mut self, list: &[&str], implicit: bool) -> Result<Vec<Operand>, SpecError> {
        // implicit operands follow explicit ones in the access map
        let offset = if implicit { self.operands.len() } else { 0 };
        let mut operands = Vec::with_capacity(list.len());
        for (i, raw) in list.iter().take_while(|i| !ABSENT.contains(*i)).enumerate() {
            let flags = if implicit {
                Vec::new()
            } else {
                self.attributes.take_operand_flags(i + 1)
            };
            let access = self
                .access
                .get(offset + i)
                .ok_or(SpecError::AccessMapTooShort {
                    provided: self.access.len(),
                    expected: offset + i + 1,
                })?;
            operands.push(Operand::parse(raw, access, flags, implicit)?);
        }
        Ok(operands)
    }

    fn post_process_operands(&mut self) {
        use OperandType as T;

        let evex = self.encoding.is_evex();
        let mut uses_v = false;
        let mut uses_vp = false;
        let mut kind = None;
        let mut sizes = Vec::new();

        for op in &self.operands {
            for flag in op.decorators().instruction_flags().iter() {
                self.decorators.insert(flag);
            }

            let Some(ty) = op.ty() else {
                continue;
            };
            if matches!(ty, T::U | T::V | T::W | T::H | T::L) {
                self.attributes.insert(Attribute::Vector);
            }
            if matches!(ty, T::B | T::H | T::VK | T::VT | T::Dfv) {
                uses_v = true;
            }
            if evex
                && (matches!(ty, T::B | T::H)
                    || self.attributes.contains(Attribute::Vsib)
                    || self.encoding.has(Field::Sc))
            {
                uses_vp = true;
            }

            let (payload, size) = match ty {
                T::I | T::I1 | T::I2 => (PayloadKind::Immediate, op.size()),
                T::J => (PayloadKind::Relative, op.size()),
                T::A => (PayloadKind::Absolute, op.size()),
                T::O => (PayloadKind::Offset, OperandSize::A),
                T::L => (PayloadKind::Register, OperandSize::B),
                _ => continue,
            };
            kind = Some(payload);
            sizes.push(size);
        }

        self.payload = kind.map(|kind| Payload { kind, sizes });

        if self.encoding.is_vector() {
            if !uses_v {
                self.attributes.insert(Attribute::NoV);
            }
            if evex && !uses_vp {
                self.attributes.insert(Attribute::NoVp);
            }
        }
    }

    fn post_process_modes(&mut self) {
        if self.encoding.is_vector() {
            self.modes.remove(CpuMode::Real);
            self.modes.remove(CpuMode::V8086);
        }
        let long = self.modes.contains(CpuMode::Long);
        if !long && !self.attributes.contains(Attribute::I64) {
            self.attributes.insert(Attribute::I64);
        }
        if long
            && !self.modes.contains(CpuMode::Prot)
            && !self.attributes.contains(Attribute::O64)
        {
            self.attributes.insert(Attribute::O64);
        }
    }

    fn post_process_mnemonic(&mut self) -> Result<(), SpecError> {
        let mut suffix = String::new();
        if self.decorators.contains(DecoratorFlag::Nf) {
            suffix.push_str("NF");
        }
        if self.decorators.contains(DecoratorFlag::Zu) {
            suffix.push_str("ZU");
        }

        let placeholder = |s: &str, p: &str| s.find(p).map_or(false, |i| i > 0);
        if placeholder(&self.mnemonic, "cc") {
            let cond = self
                .encoding
                .field(Field::Opcode)
                .last()
                .and_then(|i| i.chars().last())
                .and_then(|i| i.to_digit(16))
                .and_then(|i| CONDITIONS.get(i as usize))
                .ok_or_else(|| self.missing_condition(Field::Opcode))?;
            self.mnemonic = self.mnemonic.replace("cc", &format!("{suffix}{cond}"));
        } else if placeholder(&self.mnemonic, "sc") {
            let cond = self
                .encoding
                .field(Field::Sc)
                .first()
                .and_then(|i| usize::from_str_radix(i, 16).ok())
                .and_then(|i| STANDARD_CONDITIONS.get(i))
                .ok_or_else(|| self.missing_condition(Field::Sc))?;
            self.mnemonic = self.mnemonic.replace("sc", &format!("{suffix}{cond}"));
        } else {
            self.mnemonic.push_str(&suffix);
        }
        Ok(())
    }

    fn missing_condition(&self, field: Field) -> SpecError {
        SpecError::MissingCondition {
            mnemonic: self.mnemonic.clone(),
            field: field.as_str(),
        }
    }

    fn process_filters(&mut self) {
        use ExceptionType as E;
        use OperandType as T;

        let mut filters = Vec::new();
        for attr in self.attributes.iter() {
            match Filter::from_attribute(attr) {
                // XSAVE and XRSTOR families are the only ones rejecting REX2
                // inside opcode groups that accept it.
                Some(Filter::NoRex2)
                    if !self.mnemonic.starts_with("XSAVE") && !self.mnemonic.starts_with("XRSTOR") => {}
                Some(filter) => filters.push(filter),
                None => {}
            }
        }
        if filters.contains(&Filter::NoV) && filters.contains(&Filter::NoVp) {
            filters.retain(|i| !matches!(i, Filter::NoV | Filter::NoVp));
            filters.push(Filter::NoVvp);
        }

        let native_evex = self.encoding.is_evex() && self.evex_mode.is_none();
        for op in &self.operands {
            let Some(ty) = op.ty() else {
                continue;
            };
            let filter = match ty {
                T::G if native_evex => Some(Filter::RrLt16),
                T::B if native_evex => Some(Filter::RvLt16),
                _ => Filter::from_operand(ty, op.access().is_write()),
            };
            filters.extend(filter);
        }

        if self.attributes.contains(Attribute::Vsib) && self.category == "AVX2GATHER" {
            match self.exception {
                Some(E::T12) => filters.push(Filter::VxNeVrVxNeVvVrNeVv),
                Some(E::E12) => filters.push(Filter::VxNeVr),
                _ => {}
            }
        } else {
            match self.exception {
                Some(E::AmxE4 | E::AmxE10) => filters.push(Filter::TrNeTmTrNeTvTvNeTm),
                Some(E::E4S | E::E10S) => filters.push(Filter::VrNeVvVrNeVm),
                Some(E::ApxPp2) => {
                    filters.push(Filter::RvNe4RmNe4);
                    if self.class == "POP2" {
                        filters.push(Filter::RvNeRm);
                    }
                }
                _ => {}
            }
        }

        self.filters = filters;
    }

    fn fill_access_summary(&mut self) -> Result<(), SpecError> {
        let mut summary = AccessSummary::default();
        for op in self.operands.iter().chain(&self.implicit) {
            let access = op.access();
            if op.is_cs() {
                summary.cs = Some(access);
            } else if op.is_rip() {
                summary.rip = Some(access);
            } else if op.is_flags() {
                summary.flags = Some(access);
            } else if op.is_stack() {
                let size = op.size();
                summary.stack = Some(access);
                summary.stack_words = size
                    .stack_words()
                    .ok_or_else(|| SpecError::InvalidStackSize(size.to_string()))?;
                summary.push_memory(access);
            } else if op.is_memory_modrm() {
                summary.memory_modrm = Some(access);
            } else if op.is_memory_default() || op.is_memory_implicit() {
                summary.push_memory(access);
            }
        }
        self.summary = summary;
        Ok(())
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Instruction set.
    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Feature identifier, the instruction set if not overridden.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn raw_encoding(&self) -> &str {
        &self.raw_encoding
    }

    /// Explicit operands.
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn implicit_operands(&self) -> &[Operand] {
        &self.implicit
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Accepted prefixes.
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    pub fn access_map(&self) -> &AccessMap {
        &self.access
    }

    pub fn tuple(&self) -> Option<Tuple> {
        self.tuple
    }

    pub fn evex_mode(&self) -> Option<EvexMode> {
        self.evex_mode
    }

    pub fn exception(&self) -> Option<ExceptionType> {
        self.exception
    }

    /// RFLAGS access.
    pub fn flags(&self) -> &FlagsAccess {
        &self.flags
    }

    pub fn fpu_flags(&self) -> &FpuFlagsAccess {
        &self.fpu_flags
    }

    pub fn simd_exceptions(&self) -> &SimdExceptions {
        &self.simd
    }

    /// CPU modes the instruction is valid in.
    pub fn modes(&self) -> &CpuModes {
        &self.modes
    }

    pub fn decorators(&self) -> &Set<DecoratorFlag> {
        &self.decorators
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn access_summary(&self) -> &AccessSummary {
        &self.summary
    }

    /// CPUID feature flag of the instruction, if the feature identifier is known.
    pub fn cpuid(&self) -> Option<&CpuidFeature> {
        self.cpuid.as_ref()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            fmt.write_str(if i == 0 { " " } else { "," })?;
            fmt::Display::fmt(op, fmt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isagen_core::{
        attributes::OperandFlag,
        flags::{Flag, FlagAccess},
    };

    fn insn(
        mnemonic: &str,
        explicit: &[&str],
        implicit: &[&str],
        encoding: &str,
        meta: &[&str],
    ) -> Result<Instruction, SpecError> {
        let templates = Templates::default();
        Instruction::new(mnemonic, explicit, implicit, encoding, meta, &templates)
    }

    #[test]
    fn legacy() {
        let add = insn("ADD", &["Gv", "Ev"], &[], "0x01 /r", &["w:RW|R", "a:MODRM", "f:ARITH"]).unwrap();
        assert_eq!(add.to_string(), "ADD Gv,Ev");
        assert_eq!(add.class(), "ADD");
        assert_eq!(add.set(), "UNKNOWN");
        assert_eq!(add.operands().len(), 2);
        assert_eq!(add.operands()[0].access(), OperandAccess::ReadWrite);
        assert!(add.attributes().contains(Attribute::Modrm));
        assert_eq!(
            add.flags().flags(FlagAccess::Modified),
            [Flag::Cf, Flag::Pf, Flag::Af, Flag::Zf, Flag::Sf, Flag::Of]
        );
        assert_eq!(add.access_summary().memory_modrm, Some(OperandAccess::Read));
        assert!(add.modes().contains_all_modes());
        assert!(add.filters().is_empty());
        assert!(add.payload().is_none());
    }

    #[test]
    fn mask_operand() {
        let add = insn(
            "VADDPS",
            &["Vfv{K}{z}", "Hfv", "Wfv|B32{er}"],
            &[],
            "evex m:1 p:0 l:x w:0 0x58 /r",
            &["s:AVX512F", "t:AVX512", "w:W|R|R|R", "e:E2", "l:fv"],
        )
        .unwrap();
        assert_eq!(add.to_string(), "VADDPS Vfv{K}{z},aKq,Hfv,Wfv|B32{er}");
        assert!(add.operands()[1].is(OperandType::AK));
        assert_eq!(add.operands()[1].access(), OperandAccess::Read);
        assert_eq!(add.decorators().to_string(), "MASK|ZERO|ER|BROADCAST");
        assert!(add.attributes().contains(Attribute::Vector));
        assert!(!add.attributes().contains(Attribute::NoV));
        assert!(!add.modes().contains(CpuMode::Real));
        assert!(!add.modes().contains(CpuMode::V8086));
        assert_eq!(add.tuple(), Some(Tuple::FullVector));
        assert_eq!(add.exception(), Some(ExceptionType::E2));
    }

    #[test]
    fn vvvv_unused() {
        let mov = insn(
            "VMOVUPS",
            &["Vx", "Wx"],
            &[],
            "evex m:1 p:0 l:x w:0 0x10 /r",
            &["s:AVX512F", "w:W|R"],
        )
        .unwrap();
        assert!(mov.attributes().contains(Attribute::NoV));
        assert!(mov.attributes().contains(Attribute::NoVp));
        assert_eq!(mov.filters(), [Filter::NoVvp]);

        let mov = insn("VMOVUPS", &["Vx", "Wx"], &[], "vex m:1 p:0 l:x w:i 0x10 /r", &["w:W|R"]).unwrap();
        assert_eq!(mov.filters(), [Filter::NoV]);
    }

    #[test]
    fn conditions() {
        let jz = insn("Jcc", &["Jb"], &["rIP"], "0x74 cb", &["s:I86", "w:R|RW", "f:CZ"]).unwrap();
        assert_eq!(jz.mnemonic(), "JZ");
        assert_eq!(jz.class(), "Jcc");
        assert_eq!(jz.payload().map(|i| i.to_string()).as_deref(), Some("J_b"));
        assert_eq!(jz.access_summary().rip, Some(OperandAccess::ReadWrite));

        let jnle = insn("Jcc", &["Jz"], &["rIP"], "0x0F 0x8F cz", &["w:R|RW"]).unwrap();
        assert_eq!(jnle.mnemonic(), "JNLE");

        let err = insn("SETcc", &["Eb"], &[], "/r", &["w:W"]).unwrap_err();
        assert_eq!(
            err,
            SpecError::MissingCondition {
                mnemonic: "SETcc".into(),
                field: "opcode",
            }
        );
    }

    #[test]
    fn standard_conditions() {
        let ccmp = insn(
            "CCMPsc",
            &["dfv", "Eb", "Gb"],
            &["Fv"],
            "evex m:4 p:0 l:0 nd:0 sc:A 0x38 /r",
            &["s:CCMP", "w:R|R|R|W", "v:cond"],
        )
        .unwrap();
        assert_eq!(ccmp.mnemonic(), "CCMPT");
        assert_eq!(ccmp.evex_mode(), Some(EvexMode::Cond));
        assert_eq!(ccmp.access_summary().flags, Some(OperandAccess::Write));
        assert!(!ccmp.attributes().contains(Attribute::NoV));
        assert!(!ccmp.attributes().contains(Attribute::NoVp));
        assert!(ccmp.filters().is_empty());
    }

    #[test]
    fn suffix() {
        let add = insn(
            "ADD{NF}",
            &["Bv", "Ev", "Gv"],
            &[],
            "evex m:4 l:0 p:1 nd:1 nf:1 0x01 /r",
            &["w:W|R|R", "v:legacy"],
        )
        .unwrap();
        assert_eq!(add.mnemonic(), "ADDNF");
        assert_eq!(add.class(), "ADD");
        assert!(add.decorators().contains(DecoratorFlag::Nf));
        assert_eq!(add.encoding().field(Field::Lpdf), ["7"]);
    }

    #[test]
    fn modes() {
        let syscall = insn("SYSCALL", &[], &[], "0x0F 0x05", &["m:O64"]).unwrap();
        assert!(syscall.attributes().contains(Attribute::O64));
        assert_eq!(syscall.filters(), [Filter::No1632]);

        let aaa = insn("AAA", &[], &[], "0x37", &["m:NO64"]).unwrap();
        assert!(aaa.attributes().contains(Attribute::I64));
        assert_eq!(aaa.filters(), [Filter::No64]);

        let nop = insn("NOP", &[], &[], "0x90", &["s:I86"]).unwrap();
        assert_eq!(nop.to_string(), "NOP");
        assert!(nop.filters().is_empty());
    }

    #[test]
    fn register_filters() {
        let mov = insn("MOV", &["Sw", "Ew"], &[], "0x8E /r", &["w:W|R"]).unwrap();
        assert_eq!(mov.filters(), [Filter::SrIn02345]);
        let mov = insn("MOV", &["Ev", "Sw"], &[], "0x8C /r", &["w:W|R"]).unwrap();
        assert_eq!(mov.filters(), [Filter::SrIn012345]);
        let mov = insn("MOV", &["Cy", "Ry"], &[], "0x0F 0x22 /r", &["w:W|R"]).unwrap();
        assert_eq!(mov.filters(), [Filter::CrIn02348]);

        let kadd = insn(
            "KADDW",
            &["rKw", "vKw", "mKw"],
            &[],
            "vex m:1 p:0 l:1 w:0 0x4A /r:reg",
            &["w:W|R|R"],
        )
        .unwrap();
        assert_eq!(kadd.filters(), [Filter::KrLt8, Filter::KvLt8]);
    }

    #[test]
    fn rex2_filter() {
        let xsave = insn(
            "XSAVE",
            &["M?"],
            &["EDX", "EAX", "XCR0"],
            "NP 0x0F 0xAE /4:mem",
            &["s:XSAVE", "a:NOREX2", "w:W|R|R|R"],
        )
        .unwrap();
        assert_eq!(xsave.encoding().field(Field::Prefix), ["PNP"]);
        assert_eq!(xsave.filters(), [Filter::NoRex2]);

        let fxsave = insn(
            "FXSAVE",
            &["M?"],
            &[],
            "NP 0x0F 0xAE /0:mem",
            &["a:NOREX2", "w:W"],
        )
        .unwrap();
        assert!(fxsave.filters().is_empty());
    }

    #[test]
    fn exception_filters() {
        let gather = insn(
            "VPGATHERDD",
            &["Vx", "Mvm32x", "Hx"],
            &[],
            "vex m:2 p:1 l:x w:0 0x90 /r:mem vsib",
            &["s:AVX2GATHER", "t:AVX2GATHER", "w:CRCW|CR|RCW", "e:12"],
        )
        .unwrap();
        assert_eq!(gather.filters(), [Filter::VxNeVrVxNeVvVrNeVv]);

        let pop2 = insn(
            "POP2",
            &["Bv", "Rv"],
            &["Kv2"],
            "evex m:4 l:0 p:0 nd:1 nf:0 0x8F /0:reg",
            &["w:W|W|R", "v:legacy", "e:APX_EVEX_PP2"],
        )
        .unwrap();
        assert_eq!(pop2.filters(), [Filter::RvNe4RmNe4, Filter::RvNeRm]);
        assert_eq!(pop2.access_summary().stack_words, 2);
    }

    #[test]
    fn stack() {
        let push = insn("PUSH", &["Zv"], &["Kv"], "0x50", &["w:R|W", "a:D64"]).unwrap();
        let summary = push.access_summary();
        assert_eq!(summary.stack, Some(OperandAccess::Write));
        assert_eq!(summary.stack_words, 1);
        assert_eq!(summary.memory, [OperandAccess::Write]);
        assert_eq!(push.implicit_operands()[0].flags(), [OperandFlag::Default]);

        let err = insn("PUSH", &["Zv"], &["Kb"], "0x50", &["w:R|W"]).unwrap_err();
        assert_eq!(err, SpecError::InvalidStackSize("b".into()));
    }

    #[test]
    fn payload() {
        let enter = insn(
            "ENTER",
            &["Iw", "Ib"],
            &["Kv", "rBP"],
            "0xC8 iw ib",
            &["w:R|R|W|RW"],
        )
        .unwrap();
        assert_eq!(enter.payload().map(|i| i.to_string()).as_deref(), Some("I_wb"));

        let mov = insn("MOV", &["AL", "Ob"], &[], "0xA0 cp", &["w:W|R"]).unwrap();
        assert_eq!(mov.payload().map(|i| i.to_string()).as_deref(), Some("O_a"));
        assert_eq!(mov.access_summary().memory, [OperandAccess::Read]);
    }

    #[test]
    fn operand_flags() {
        let imul = insn(
            "IMUL",
            &["Gv", "Ev", "Ib"],
            &[],
            "0x6B /r ib",
            &["w:W|R|R", "a:MODRM|OP3SIGNEXO1"],
        )
        .unwrap();
        assert_eq!(imul.operands()[2].flags(), [OperandFlag::SignExtendOp1]);
        assert!(!imul.attributes().contains(Attribute::Op3SignExO1));
    }

    #[test]
    fn access_map_too_short() {
        let err = insn("ADD", &["Gv", "Ev"], &[], "0x01 /r", &["w:RW"]).unwrap_err();
        assert_eq!(
            err,
            SpecError::AccessMapTooShort {
                provided: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn metadata_errors() {
        assert!(insn("NOP", &[], &[], "0x90", &["z:1"]).is_err());
        assert!(insn("NOP", &[], &[], "0x90", &["a:BOGUS"]).is_err());
        assert!(insn("NOP", &[], &[], "0x90", &["m:ring=r4"]).is_err());
        assert!(insn("NOP", &[], &[], "0x90", &[""]).is_err());
    }

    #[test]
    fn cpuid() {
        let mut templates = Templates::default();
        templates.load_cpuid("AVX : 0x00000001, 0xFFFFFFFF, ECX, 28\n");

        let vzeroall = Instruction::new(
            "VZEROALL",
            &[],
            &[],
            "vex m:1 p:0 l:1 w:i 0x77",
            &["s:AVX", "c:VZEROALL"],
            &templates,
        )
        .unwrap();
        assert_eq!(vzeroall.id(), "AVX");
        assert_eq!(vzeroall.cpuid().map(|i| i.bit), Some(28));

        let nop = Instruction::new("NOP", &[], &[], "0x90", &["s:I86"], &templates).unwrap();
        assert!(nop.cpuid().is_none());
    }
}
