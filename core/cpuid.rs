use core::{fmt, str::FromStr};

use crate::{error::SpecError, macros::vocabulary};

/// Sub-leaf value of features without a sub-leaf.
pub const NO_SUBLEAF: u32 = 0xffff_ffff;

vocabulary! {
    /// CPUID output register.
    pub enum CpuidRegister(CpuidRegister) {
        Eax = "EAX",
        Ebx = "EBX",
        Ecx = "ECX",
        Edx = "EDX",
    }
}

/// CPUID feature flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CpuidFeature {
    pub name: String,
    /// Input value of EAX.
    pub leaf: u32,
    /// Input value of ECX.
    pub subleaf: Option<u32>,
    pub register: CpuidRegister,
    pub bit: u8,
}

fn parse_hex(s: &str) -> Option<u32> {
    let s = s.trim().strip_prefix("0x")?;
    u32::from_str_radix(s, 16).ok()
}

impl FromStr for CpuidFeature {
    type Err = SpecError;

    /// Parses `NAME : 0xleaf, 0xsubleaf, REG, bit`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let err = || SpecError::malformed("CPUID feature", line.trim());
        let (name, value) = line.split_once(':').ok_or_else(err)?;
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(err());
        }
        let mut fields = value.split(',');
        let mut next = || fields.next().map(str::trim).ok_or_else(err);
        let leaf = parse_hex(next()?).ok_or_else(err)?;
        let subleaf = parse_hex(next()?).ok_or_else(err)?;
        let register = next()?.parse()?;
        let bit = next()?.parse::<u8>().ok().filter(|i| *i < 32).ok_or_else(err)?;
        if fields.next().is_some() {
            return Err(err());
        }
        Ok(Self {
            name: name.to_owned(),
            leaf,
            subleaf: Some(subleaf).filter(|i| *i != NO_SUBLEAF),
            register,
            bit,
        })
    }
}

impl fmt::Display for CpuidFeature {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let subleaf = self.subleaf.unwrap_or(NO_SUBLEAF);
        write!(
            fmt,
            "{}: {:#x}, {:#x}, {}, {}",
            self.name, self.leaf, subleaf, self.register, self.bit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let feature: CpuidFeature = "AVX2 : 0x00000007, 0x00000000, EBX, 5".parse().unwrap();
        assert_eq!(feature.name, "AVX2");
        assert_eq!(feature.leaf, 7);
        assert_eq!(feature.subleaf, Some(0));
        assert_eq!(feature.register, CpuidRegister::Ebx);
        assert_eq!(feature.bit, 5);
        assert_eq!(feature.to_string(), "AVX2: 0x7, 0x0, EBX, 5");

        let feature: CpuidFeature = "SSE2 : 0x00000001, 0xFFFFFFFF, EDX, 26".parse().unwrap();
        assert_eq!(feature.subleaf, None);
    }

    #[test]
    fn malformed() {
        assert!("AVX2 : 7, 0, EBX, 5".parse::<CpuidFeature>().is_err());
        assert!("AVX2 : 0x7, 0x0, EBX, 32".parse::<CpuidFeature>().is_err());
        assert!("AVX2 : 0x7, 0x0, ESI, 5".parse::<CpuidFeature>().is_err());
        assert!("AVX2 0x7, 0x0, EBX, 5".parse::<CpuidFeature>().is_err());
    }
}
