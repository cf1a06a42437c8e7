use std::fmt;

use isagen_core::{
    attributes::{Attribute, Attributes},
    vocabulary, SpecError,
};

vocabulary! {
    /// Encoding field an instruction can be grouped by.
    pub enum Field(EncodingField) {
        Opcode = "opcode",
        /// Opcode after ModR/M, 3DNow! instructions.
        OpcodeLast = "opcode_last",
        Vendor = "vendor",
        /// Instructions which act like NOP if the feature is disabled.
        Feature = "feature",
        /// Mandatory prefix.
        Prefix = "prefix",
        ModrmReg = "modrmreg",
        ModrmMod = "modrmmod",
        ModrmRm = "modrmrm",
        /// Operating mode redirection.
        Mode = "mode",
        /// Data size redirection.
        DSize = "dsize",
        /// Address size redirection.
        ASize = "asize",
        /// Other redirections (REX, REP, RIP-relative, ...).
        Auxiliary = "auxiliary",
        /// XOP/VEX/EVEX.mmmmm, the opcode map.
        Mmmmm = "mmmmm",
        /// XOP/VEX/EVEX.pp, the compressed prefix.
        Pp = "pp",
        /// XOP/VEX/EVEX.L, the vector length.
        L = "l",
        /// XOP/VEX/EVEX/REX2.W.
        W = "w",
        /// W, ignored outside 64-bit mode.
        Wi = "wi",
        /// EVEX.ND, new data destination.
        Nd = "nd",
        /// EVEX.NF, no flags.
        Nf = "nf",
        /// EVEX.SC, standard condition code.
        Sc = "sc",
        /// Combined pp, L, ND and NF.
        Lpdf = "lpdf",
    }
}

/// Encoding family of an instruction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Family {
    #[default]
    Legacy,
    Xop,
    Vex,
    Evex,
}

impl Family {
    pub const ALL: &'static [Self] = &[Self::Legacy, Self::Xop, Self::Vex, Self::Evex];

    pub fn is_vector(&self) -> bool {
        *self != Self::Legacy
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Xop => "xop",
            Self::Vex => "vex",
            Self::Evex => "evex",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Encoding tokens of an instruction, split by field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoding {
    family: Family,
    fields: [Vec<String>; Field::COUNT],
}

fn hex_digit(s: &str, max: u8) -> Option<u8> {
    match s.as_bytes() {
        [c] => (*c as char)
            .to_digit(16)
            .map(|i| i as u8)
            .filter(|i| *i <= max && !c.is_ascii_lowercase()),
        _ => None,
    }
}

fn hex_byte(s: &str) -> Option<u8> {
    let s = s.strip_prefix("0x")?;
    if s.len() != 2 {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}

impl Encoding {
    /// Parses a whitespace separated encoding string.
    ///
    /// Some tokens imply attributes, those are added to `attrs`.
    pub fn parse(raw: &str, attrs: &mut Attributes) -> Result<Self, SpecError> {
        let mut enc = Self::default();
        let mut had_modrm = false;

        for token in raw.split_whitespace() {
            match token {
                "xop" => enc.family = Family::Xop,
                "vex" => enc.family = Family::Vex,
                "evex" => enc.family = Family::Evex,
                "NP" | "0x66" | "0xF3" | "0xF2"
                    if !enc.has(Field::Opcode) && !enc.family.is_vector() =>
                {
                    enc.push(Field::Prefix, format!("P{token}"));
                }
                "repz" | "mo64" | "rexw" | "rexb" | "rep" | "riprel" | "rex2" | "rex2w" => {
                    enc.push(Field::Auxiliary, token);
                }
                "ds16" | "ds32" | "ds64" | "dd64" | "df64" => enc.push(Field::DSize, token),
                "as16" | "as32" | "as64" => enc.push(Field::ASize, token),
                "m16" | "m32" | "m64" => enc.push(Field::Mode, token),
                "intel" | "amd" => enc.push(Field::Vendor, token),
                "mpx" | "cet" | "cldm" | "piti" | "movrs" | "bhi" => enc.push(Field::Feature, token),
                "vsib" | "sibmem" => {
                    let attr = if token == "vsib" {
                        Attribute::Vsib
                    } else {
                        Attribute::SibMem
                    };
                    attrs.insert(attr);
                    enc.push(Field::ModrmRm, "4");
                }
                "mib" => {
                    attrs.insert(Attribute::Mib);
                }
                "bitbase" => {
                    attrs.insert(Attribute::BitBase);
                }
                "ib" | "iw" | "iz" | "iv" | "id" | "cb" | "cz" | "cv" | "cp" | "cq" | "is4" => {}
                _ if token.starts_with('/') => {
                    had_modrm = true;
                    attrs.insert(Attribute::Modrm);
                    enc.parse_modrm(token)?;
                }
                _ => {
                    if let Some((key, value)) = token.split_once(':') {
                        if enc.parse_field(key, value, attrs) {
                            continue;
                        }
                    } else if hex_byte(token).is_some() {
                        let field = if had_modrm {
                            Field::OpcodeLast
                        } else {
                            Field::Opcode
                        };
                        enc.push(field, token);
                        continue;
                    }
                    return Err(SpecError::InvalidEncoding(token.to_owned()));
                }
            }
        }

        enc.merge_lpdf();
        Ok(enc)
    }

    /// Parses `/r`, `/r:mod`, `/reg`, `/reg:mod` and `/0xHH` forms.
    fn parse_modrm(&mut self, token: &str) -> Result<(), SpecError> {
        let invalid = || SpecError::InvalidModrm(token.to_owned());
        let body = &token[1..];

        if let Some(modrm) = hex_byte(body) {
            let mode = if modrm & 0xc0 == 0xc0 { "reg" } else { "mem" };
            self.push(Field::ModrmMod, mode);
            self.push(Field::ModrmRm, (modrm & 7).to_string());
            self.push(Field::ModrmReg, ((modrm >> 3) & 7).to_string());
            return Ok(());
        }

        let (reg, mode) = match body.split_once(':') {
            Some((reg, mode @ ("reg" | "mem"))) => (reg, Some(mode)),
            Some(_) => return Err(invalid()),
            None => (body, None),
        };
        match reg {
            "r" => {}
            _ => {
                let reg = hex_digit(reg, 7).ok_or_else(invalid)?;
                self.push(Field::ModrmReg, reg.to_string());
            }
        }
        if let Some(mode) = mode {
            self.push(Field::ModrmMod, mode);
        }
        Ok(())
    }

    /// Parses a `key:value` token, returns false if the token is not known.
    fn parse_field(&mut self, key: &str, value: &str, attrs: &mut Attributes) -> bool {
        match (key, value) {
            ("rm", _) if hex_digit(value, 7).is_some() => self.push(Field::ModrmRm, value),
            ("m", _) if hex_digit(value, 0xc).is_some() => self.push(Field::Mmmmm, value),
            ("p", _) if hex_digit(value, 3).is_some() => self.push(Field::Pp, value),
            ("l", "x") | ("w", "x") => {}
            ("l", "i") => {
                attrs.insert(Attribute::Lig);
            }
            ("l", "n") => {
                attrs.insert(Attribute::NoL0);
            }
            ("l", "0" | "1" | "2" | "3") => self.push(Field::L, value),
            ("w", "i") => {
                attrs.insert(Attribute::Wig);
            }
            ("w", "0" | "1") if attrs.contains(Attribute::Iwo64) => self.push(Field::Wi, value),
            ("w", "0" | "1") => self.push(Field::W, value),
            ("nd", "0" | "1") => self.push(Field::Nd, value),
            ("nf", "0" | "1") => self.push(Field::Nf, value),
            ("sc", _) if hex_digit(value, 0xf).is_some() => self.push(Field::Sc, value),
            _ => return false,
        }
        true
    }

    /// Combines pp, L, ND and NF into one field if all of them are present.
    fn merge_lpdf(&mut self) {
        let first = |field: Field| {
            self.field(field)
                .first()
                .and_then(|i| u8::from_str_radix(i, 16).ok())
        };
        let (Some(l), Some(p), Some(d), Some(f)) = (
            first(Field::L),
            first(Field::Pp),
            first(Field::Nd),
            first(Field::Nf),
        ) else {
            return;
        };
        let lpdf = f | (d << 1) | (p << 2) | (l << 4);
        for field in [Field::L, Field::Pp, Field::Nd, Field::Nf] {
            self.fields[field.index()].clear();
        }
        self.push(Field::Lpdf, format!("{lpdf:x}"));
    }

    fn push(&mut self, field: Field, value: impl Into<String>) {
        self.fields[field.index()].push(value.into());
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn is_vector(&self) -> bool {
        self.family.is_vector()
    }

    pub fn is_evex(&self) -> bool {
        self.family == Family::Evex
    }

    /// Returns tokens of `field` in encoding order.
    pub fn field(&self, field: Field) -> &[String] {
        &self.fields[field.index()]
    }

    pub fn has(&self, field: Field) -> bool {
        !self.fields[field.index()].is_empty()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.family.as_str())?;
        for field in Field::ALL {
            let values = self.field(*field);
            if !values.is_empty() {
                write!(fmt, " {field}:{}", values.join("+"))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<(Encoding, Attributes), SpecError> {
        let mut attrs = Attributes::new();
        Encoding::parse(raw, &mut attrs).map(|enc| (enc, attrs))
    }

    #[test]
    fn legacy() {
        let (enc, attrs) = parse("0x66 0x0F 0x38 0xF6 /r").unwrap();
        assert_eq!(enc.family(), Family::Legacy);
        assert_eq!(enc.field(Field::Prefix), ["P0x66"]);
        assert_eq!(enc.field(Field::Opcode), ["0x0F", "0x38", "0xF6"]);
        assert!(attrs.contains(Attribute::Modrm));
        assert!(!enc.has(Field::ModrmReg));
    }

    #[test]
    fn prefix_after_opcode_is_opcode() {
        let (enc, _) = parse("0x0F 0x66").unwrap();
        assert_eq!(enc.field(Field::Opcode), ["0x0F", "0x66"]);
        assert!(!enc.has(Field::Prefix));
        assert!(parse("0x0F NP").is_err());
    }

    #[test]
    fn modrm_forms() {
        let (enc, _) = parse("0x0F 0x00 /0:mem").unwrap();
        assert_eq!(enc.field(Field::ModrmReg), ["0"]);
        assert_eq!(enc.field(Field::ModrmMod), ["mem"]);

        let (enc, _) = parse("0x0F 0x01 /0xC8").unwrap();
        assert_eq!(enc.field(Field::ModrmMod), ["reg"]);
        assert_eq!(enc.field(Field::ModrmReg), ["1"]);
        assert_eq!(enc.field(Field::ModrmRm), ["0"]);

        let (enc, _) = parse("0x8B /r:reg rm:5").unwrap();
        assert_eq!(enc.field(Field::ModrmMod), ["reg"]);
        assert_eq!(enc.field(Field::ModrmRm), ["5"]);

        assert_eq!(
            parse("0xFF /8").unwrap_err(),
            SpecError::InvalidModrm("/8".into())
        );
        assert!(parse("0xFF /1:xxx").is_err());
    }

    #[test]
    fn opcode_after_modrm() {
        let (enc, attrs) = parse("0x0F 0x0F /r 0x0D").unwrap();
        assert_eq!(enc.field(Field::Opcode), ["0x0F", "0x0F"]);
        assert_eq!(enc.field(Field::OpcodeLast), ["0x0D"]);
        assert!(attrs.contains(Attribute::Modrm));
    }

    #[test]
    fn vector() {
        let (enc, attrs) = parse("vex m:1 p:1 l:i w:i 0x58 /r").unwrap();
        assert_eq!(enc.family(), Family::Vex);
        assert_eq!(enc.field(Field::Mmmmm), ["1"]);
        assert_eq!(enc.field(Field::Pp), ["1"]);
        assert!(!enc.has(Field::L));
        assert!(attrs.contains(Attribute::Lig));
        assert!(attrs.contains(Attribute::Wig));

        let (enc, attrs) = parse("evex m:2 p:1 l:x w:0 0xA0 /r:mem vsib").unwrap();
        assert_eq!(enc.field(Field::W), ["0"]);
        assert_eq!(enc.field(Field::ModrmRm), ["4"]);
        assert!(attrs.contains(Attribute::Vsib));
    }

    #[test]
    fn width_ignored_outside_64bit() {
        let mut attrs = Attributes::new();
        attrs.insert(Attribute::Iwo64);
        let enc = Encoding::parse("vex m:1 p:0 w:1 0x90", &mut attrs).unwrap();
        assert_eq!(enc.field(Field::Wi), ["1"]);
        assert!(!enc.has(Field::W));
    }

    #[test]
    fn vex_prefix_is_not_mandatory_prefix() {
        let (enc, _) = parse("vex m:1 0x66").unwrap();
        assert_eq!(enc.field(Field::Opcode), ["0x66"]);
        assert!(parse("vex NP 0x10").is_err());
    }

    #[test]
    fn lpdf() {
        let (enc, _) = parse("evex m:4 l:0 p:1 nd:1 nf:1 0x00 /r").unwrap();
        for field in [Field::L, Field::Pp, Field::Nd, Field::Nf] {
            assert!(!enc.has(field));
        }
        // nf | nd << 1 | pp << 2 | l << 4
        assert_eq!(enc.field(Field::Lpdf), ["7"]);

        let (enc, _) = parse("evex m:4 l:2 p:3 nd:0 nf:1 0x00 /r").unwrap();
        assert_eq!(enc.field(Field::Lpdf), ["2d"]);

        let (enc, _) = parse("evex m:4 l:0 p:1 nd:1 0x00 /r").unwrap();
        assert!(!enc.has(Field::Lpdf));
        assert_eq!(enc.field(Field::Nd), ["1"]);
    }

    #[test]
    fn redirections() {
        let (enc, attrs) = parse("rexw repz 0x90 ds64 as32 m64 intel cet ib bitbase").unwrap();
        assert_eq!(enc.field(Field::Auxiliary), ["rexw", "repz"]);
        assert_eq!(enc.field(Field::DSize), ["ds64"]);
        assert_eq!(enc.field(Field::ASize), ["as32"]);
        assert_eq!(enc.field(Field::Mode), ["m64"]);
        assert_eq!(enc.field(Field::Vendor), ["intel"]);
        assert_eq!(enc.field(Field::Feature), ["cet"]);
        assert!(attrs.contains(Attribute::BitBase));
    }

    #[test]
    fn unknown_tokens() {
        assert_eq!(
            parse("0x90 foo").unwrap_err(),
            SpecError::InvalidEncoding("foo".into())
        );
        assert!(parse("0x9").is_err());
        assert!(parse("m:D 0x10").is_err());
        assert!(parse("sc:g 0x10").is_err());
        assert!(parse("w:2 0x10").is_err());
    }
}
