use core::fmt;

use crate::{error::SpecError, macros::vocabulary, templates::Templates};

vocabulary! {
    /// RFLAGS bit.
    pub enum Flag(Flag) {
        Cf = "CF",
        Pf = "PF",
        Af = "AF",
        Zf = "ZF",
        Sf = "SF",
        Tf = "TF",
        If = "IF",
        Df = "DF",
        Of = "OF",
        Iopl = "IOPL",
        Nt = "NT",
        Rf = "RF",
        Vm = "VM",
        Ac = "AC",
        Vif = "VIF",
        Vip = "VIP",
        Id = "ID",
    }
}

vocabulary! {
    /// How an instruction accesses a flag.
    pub enum FlagAccess(FlagAccess) {
        Modified = "m",
        Tested = "t",
        Cleared = "0",
        Set = "1",
        Undefined = "u",
        NotAccessed = "n",
    }
}

/// RFLAGS access of an instruction, flags grouped by access kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlagsAccess {
    map: [Vec<Flag>; FlagAccess::COUNT],
}

impl FlagsAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the access map with `FLAG=access` entries separated by `|`.
    ///
    /// An entry may be replaced by the name of a template.
    pub fn add(&mut self, value: &str, templates: &Templates) -> Result<(), SpecError> {
        let mut entries = Vec::new();
        for i in value.split('|') {
            let i = i.trim();
            match templates.flags(i) {
                Some(template) => entries.extend(template.split('|').map(str::trim)),
                None => entries.push(i),
            }
        }

        let mut map: [Vec<Flag>; FlagAccess::COUNT] = Default::default();
        for entry in entries {
            let (flag, access) = entry
                .split_once('=')
                .ok_or_else(|| SpecError::malformed("flag access", entry))?;
            let access = access.trim().parse::<FlagAccess>()?;
            let flag = flag.trim().parse::<Flag>()?;
            map[access.index()].push(flag);
        }
        self.map = map;
        Ok(())
    }

    /// Returns flags accessed in the `access` way.
    pub fn flags(&self, access: FlagAccess) -> &[Flag] {
        &self.map[access.index()]
    }

    /// Returns every access kind of `flag`.
    pub fn access(&self, flag: Flag) -> impl Iterator<Item = FlagAccess> + '_ {
        FlagAccess::ALL
            .iter()
            .copied()
            .filter(move |i| self.map[i.index()].contains(&flag))
    }

    pub fn is_tested(&self) -> bool {
        !self.flags(FlagAccess::Tested).is_empty()
    }

    pub fn is_modified(&self) -> bool {
        FlagAccess::ALL
            .iter()
            .filter(|i| !matches!(i, FlagAccess::Tested | FlagAccess::NotAccessed))
            .any(|i| !self.flags(*i).is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.map.iter().all(|i| i.is_empty())
    }
}

impl fmt::Display for FlagsAccess {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for access in FlagAccess::ALL {
            for flag in self.flags(*access) {
                if !first {
                    fmt.write_str("|")?;
                }
                first = false;
                write!(fmt, "{flag}={access}")?;
            }
        }
        Ok(())
    }
}
