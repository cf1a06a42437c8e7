use crate::{error::SpecError, macros::vocabulary, set::Set, templates::Templates};

vocabulary! {
    /// CPU operating mode.
    pub enum CpuMode(CpuMode) {
        R0 = "r0",
        R1 = "r1",
        R2 = "r2",
        R3 = "r3",
        Real = "real",
        V8086 = "v8086",
        Prot = "prot",
        Compat = "compat",
        Long = "long",
        Smm = "smm",
        SmmOff = "smm_off",
        Sgx = "sgx",
        SgxOff = "sgx_off",
        Tsx = "tsx",
        TsxOff = "tsx_off",
        VmxRoot = "vmxr",
        VmxNonRoot = "vmxn",
        VmxRootSeam = "vmxr_seam",
        VmxNonRootSeam = "vmxn_seam",
        VmxOff = "vmx_off",
    }
}

vocabulary! {
    /// Independent axis of CPU operating modes.
    pub enum ModeGroup(ModeGroup) {
        Ring = "ring",
        Mode = "mode",
        Vmx = "vmx",
        Other = "other",
    }
}

impl ModeGroup {
    pub const fn modes(&self) -> &'static [CpuMode] {
        use CpuMode as M;

        match self {
            Self::Ring => &[M::R0, M::R1, M::R2, M::R3],
            Self::Mode => &[M::Real, M::V8086, M::Prot, M::Compat, M::Long],
            Self::Vmx => &[
                M::VmxRoot,
                M::VmxNonRoot,
                M::VmxRootSeam,
                M::VmxNonRootSeam,
                M::VmxOff,
            ],
            Self::Other => &[M::Smm, M::SmmOff, M::Sgx, M::SgxOff, M::Tsx, M::TsxOff],
        }
    }

    pub const fn tokens(&self) -> &'static [&'static str] {
        match self {
            Self::Ring => &["r0", "r1", "r2", "r3"],
            Self::Mode => &["real", "v8086", "prot", "compat", "long"],
            Self::Vmx => &["vmxr", "vmxn", "vmxr_seam", "vmxn_seam", "vmx_off"],
            Self::Other => &["smm", "smm_off", "sgx", "sgx_off", "tsx", "tsx_off"],
        }
    }

    fn parse_mode(&self, token: &str) -> Result<CpuMode, SpecError> {
        self.modes()
            .iter()
            .find(|i| i.as_str() == token)
            .copied()
            .ok_or_else(|| SpecError::ModeNotInGroup {
                group: self.as_str(),
                mode: token.to_owned(),
                expected: self.tokens(),
            })
    }
}

#[derive(Default)]
struct GroupClause {
    specified: bool,
    negated: bool,
    modes: Vec<CpuMode>,
}

/// Set of CPU modes an instruction is valid in.
pub type CpuModes = Set<CpuMode>;

impl Set<CpuMode> {
    /// Returns every CPU mode.
    pub fn all() -> Self {
        CpuMode::ALL.iter().copied().collect()
    }

    /// Parses a CPU modes specifier, `group=mode[+mode]` clauses separated by `|`.
    ///
    /// A clause may be replaced by the name of a template. Groups combine by
    /// union: a group not mentioned keeps all its modes, a mentioned group keeps
    /// the listed modes, and a negated group keeps all its modes except the
    /// listed ones. One negated mode negates the whole group.
    pub fn parse(value: &str, templates: &Templates) -> Result<Self, SpecError> {
        let mut clauses = Vec::new();
        for i in value.split('|') {
            let i = i.trim();
            match templates.mode(i) {
                Some(template) => clauses.extend(template.split('|').map(str::trim)),
                None => clauses.push(i),
            }
        }

        let mut groups: [GroupClause; ModeGroup::COUNT] = Default::default();
        for clause in clauses {
            let (group, modes) = clause
                .split_once('=')
                .ok_or_else(|| SpecError::malformed("CPU modes clause", clause))?;
            let group = group.trim().parse::<ModeGroup>()?;
            let state = &mut groups[group.index()];
            for mode in modes.split('+') {
                let mode = mode.trim();
                let mode = match mode.strip_prefix('!') {
                    Some(mode) => {
                        state.negated = true;
                        mode
                    }
                    None => mode,
                };
                state.specified = true;
                state.modes.push(group.parse_mode(mode)?);
            }
        }

        let mut set = Self::new();
        for (group, state) in ModeGroup::ALL.iter().zip(&groups) {
            let modes = group.modes().iter().copied();
            if !state.specified {
                modes.for_each(|i| {
                    set.insert(i);
                });
            } else if !state.negated {
                state.modes.iter().for_each(|i| {
                    set.insert(*i);
                });
            } else {
                modes.filter(|i| !state.modes.contains(i)).for_each(|i| {
                    set.insert(i);
                });
            }
        }
        Ok(set)
    }

    pub fn contains_all_modes(&self) -> bool {
        CpuMode::ALL.iter().all(|i| self.contains(*i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<CpuModes, SpecError> {
        CpuModes::parse(s, &Templates::default())
    }

    #[test]
    fn default_is_all() {
        let modes = CpuModes::all();
        assert!(modes.contains_all_modes());
        assert_eq!(modes.len(), CpuMode::COUNT);
    }

    #[test]
    fn groups_are_independent() {
        let modes = parse("ring=r0|mode=prot+long").unwrap();
        assert_eq!(
            modes.to_string(),
            "r0|prot|long|vmxr|vmxn|vmxr_seam|vmxn_seam|vmx_off|smm|smm_off|sgx|sgx_off|tsx|tsx_off"
        );
        assert!(!modes.contains(CpuMode::R3));
        assert!(!modes.contains(CpuMode::Real));
    }

    #[test]
    fn negation() {
        let modes = parse("mode=!real+!v8086").unwrap();
        assert!(!modes.contains(CpuMode::Real));
        assert!(!modes.contains(CpuMode::V8086));
        assert!(modes.contains(CpuMode::Prot));
        assert!(modes.contains(CpuMode::R3));
    }

    // A single negated mode negates every mode listed for the group.
    #[test]
    fn negation_is_group_scoped() {
        let modes = parse("mode=!real+long").unwrap();
        assert!(!modes.contains(CpuMode::Real));
        assert!(!modes.contains(CpuMode::Long));
        assert!(modes.contains(CpuMode::V8086));
        assert!(modes.contains(CpuMode::Prot));
        assert!(modes.contains(CpuMode::Compat));
    }

    #[test]
    fn templates() {
        let modes = parse("KERNEL").unwrap();
        assert!(modes.contains(CpuMode::R0));
        assert!(!modes.contains(CpuMode::R3));
        assert!(!modes.contains(CpuMode::Sgx));
        assert!(modes.contains(CpuMode::SgxOff));

        let modes = parse("O64").unwrap();
        assert!(modes.contains(CpuMode::Long));
        assert!(!modes.contains(CpuMode::Prot));

        let modes = parse("NOSMM|ring=r0").unwrap();
        assert!(!modes.contains(CpuMode::Smm));
        assert!(!modes.contains(CpuMode::Real));
        assert!(!modes.contains(CpuMode::R1));
    }

    #[test]
    fn errors() {
        assert!(matches!(
            parse("ring=long"),
            Err(SpecError::ModeNotInGroup { group: "ring", .. })
        ));
        assert!(matches!(parse("cpl=r0"), Err(SpecError::Unknown { .. })));
        assert!(matches!(parse("BOGUS"), Err(SpecError::Malformed { .. })));
    }
}
