use core::fmt;

use crate::{error::SpecError, macros::vocabulary};

vocabulary! {
    /// x87 FPU condition code flag.
    pub enum FpuFlag(FpuFlag) {
        C0 = "C0",
        C1 = "C1",
        C2 = "C2",
        C3 = "C3",
    }
}

vocabulary! {
    pub enum FpuAccess(FpuAccess) {
        Cleared = "0",
        Set = "1",
        Modified = "m",
        Undefined = "u",
    }
}

/// Access of the x87 FPU condition code flags, absent for non-FPU instructions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FpuFlagsAccess {
    flags: Option<[FpuAccess; FpuFlag::COUNT]>,
}

impl FpuFlagsAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets access of flags from `Cn=access` entries separated by `|`.
    ///
    /// Flags not mentioned are undefined.
    pub fn add(&mut self, value: &str) -> Result<(), SpecError> {
        let mut flags = [FpuAccess::Undefined; FpuFlag::COUNT];
        for entry in value.split('|') {
            let (flag, access) = entry
                .split_once('=')
                .ok_or_else(|| SpecError::malformed("FPU flag access", entry))?;
            let flag = flag.trim().parse::<FpuFlag>()?;
            flags[flag.index()] = access.trim().parse()?;
        }
        self.flags = Some(flags);
        Ok(())
    }

    pub fn get(&self, flag: FpuFlag) -> Option<FpuAccess> {
        self.flags.map(|i| i[flag.index()])
    }

    pub fn is_present(&self) -> bool {
        self.flags.is_some()
    }
}

impl fmt::Display for FpuFlagsAccess {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if let Some(flags) = &self.flags {
            for (i, (flag, access)) in FpuFlag::ALL.iter().zip(flags).enumerate() {
                if i != 0 {
                    fmt.write_str("|")?;
                }
                write!(fmt, "{flag}={access}")?;
            }
        }
        Ok(())
    }
}
