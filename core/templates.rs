//! Named expansions used in specification metadata.
//!
//! Flags access (`f:`) and CPU modes (`m:`) entries may reference templates by
//! name, the CPUID feature table resolves feature identifiers (`i:`/`s:`).

use std::collections::HashMap;

use crate::cpuid::CpuidFeature;

const FLAGS: &[(&str, &str)] = &[
    ("ARITH", "CF=m|PF=m|AF=m|ZF=m|SF=m|OF=m"),
    ("ARITHC", "CF=t|CF=m|PF=m|AF=m|ZF=m|SF=m|OF=m"),
    ("INCDEC", "PF=m|AF=m|ZF=m|SF=m|OF=m"),
    ("LOGIC", "CF=0|PF=m|AF=u|ZF=m|SF=m|OF=0"),
    ("ROT", "CF=m|OF=m"),
    ("ROTC", "CF=t|CF=m|OF=m"),
    ("SHIFT", "CF=m|PF=m|AF=u|ZF=m|SF=m|OF=m"),
    ("SHIFTD", "CF=u|PF=m|AF=u|ZF=m|SF=m|OF=u"),
    ("MUL", "CF=m|PF=u|AF=u|ZF=u|SF=u|OF=m"),
    ("DIV", "CF=u|PF=u|AF=u|ZF=u|SF=u|OF=u"),
    ("AADM", "CF=u|PF=m|AF=u|ZF=m|SF=m|OF=u"),
    ("AAAS", "CF=m|PF=u|AF=t|AF=m|ZF=u|SF=u|OF=u"),
    ("DAAS", "CF=t|CF=m|PF=m|AF=t|AF=m|ZF=m|OF=u"),
    ("IO", "IOPL=t|VM=t"),
    ("IOS", "DF=t|IOPL=t|VM=t"),
    ("INT", "VM=t|VM=m|IF=m|NT=m|AC=m|RF=m|TF=m"),
    ("CMPS", "CF=m|PF=m|AF=m|ZF=m|SF=m|OF=m|DF=t"),
    ("REPCMPS", "CF=m|PF=m|AF=m|ZF=t|ZF=m|SF=m|OF=m|DF=t"),
    ("PCMPSTR", "CF=m|PF=0|AF=0|ZF=m|SF=m|OF=m"),
    ("MOVCRDR", "CF=u|PF=u|AF=u|ZF=u|SF=u|OF=u"),
    ("VMX", "CF=m|PF=0|AF=0|ZF=m|SF=0|OF=0"),
    ("BT", "CF=m|PF=u|AF=u|SF=u|OF=u"),
    ("COMIS", "CF=m|PF=m|ZF=m"),
    ("VPTEST", "CF=m|PF=0|AF=0|ZF=m|SF=0|OF=0"),
    ("WAITPKG", "CF=m|PF=0|AF=0|ZF=0|SF=0|OF=0"),
    ("ENQCMD", "CF=0|PF=0|AF=0|ZF=m|SF=0|OF=0"),
    ("KORTEST", "CF=m|PF=0|AF=0|ZF=m|SF=0|OF=0"),
    ("CO", "OF=t"),
    ("CNO", "OF=t"),
    ("CC", "CF=t"),
    ("CNC", "CF=t"),
    ("CZ", "ZF=t"),
    ("CNZ", "ZF=t"),
    ("CBE", "CF=t|ZF=t"),
    ("CNBE", "CF=t|ZF=t"),
    ("CS", "SF=t"),
    ("CNS", "SF=t"),
    ("CP", "PF=t"),
    ("CNP", "PF=t"),
    ("CL", "SF=t|OF=t"),
    ("CNL", "SF=t|OF=t"),
    ("CLE", "SF=t|ZF=t|OF=t"),
    ("CNLE", "SF=t|ZF=t|OF=t"),
    ("AESKL", "CF=0|PF=0|AF=0|ZF=m|SF=0|OF=0"),
    ("ZERO", "CF=0|PF=0|AF=0|ZF=0|SF=0|OF=0"),
    ("UINTR", "CF=m|PF=0|AF=0|ZF=0|SF=0|OF=0"),
    ("CMPSFP", "CF=m|PF=m|AF=0|ZF=m|SF=m|OF=m"),
];

const MODES: &[(&str, &str)] = &[
    (
        "VMXROOT",
        "ring=r0|vmx=vmxr+vmxr_seam|mode=prot+long|other=sgx_off+tsx_off+smm_off",
    ),
    ("VMX", "vmx=!vmx_off"),
    ("VMXNROOT", "vmx=vmxn+vmxn_seam"),
    ("KERNEL", "ring=r0|other=!sgx"),
    ("USER", "ring=r3"),
    ("NOREAL", "mode=!real+!v8086"),
    ("NOV86", "mode=!v8086"),
    ("O64", "mode=long"),
    ("NO64", "mode=!long"),
    ("NOTSX", "other=!tsx"),
    ("NOSGX", "other=!sgx"),
    ("SMM", "other=!smm_off"),
    ("NOSMM", "mode=!real+!v8086|other=!smm"),
    ("SEAMR", "ring=r0|mode=long|vmx=vmxr_seam"),
    ("SEAMN", "mode=long|vmx=vmxr+vmxn+vmxn_seam|other=!smm"),
];

fn builtin(list: &[(&str, &str)]) -> HashMap<String, String> {
    list.iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Splits a `NAME : value` template line.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() || value.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, value))
}

fn is_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Read-only context of one specification run.
#[derive(Clone, Debug)]
pub struct Templates {
    flags: HashMap<String, String>,
    modes: HashMap<String, String>,
    cpuid: Vec<CpuidFeature>,
}

impl Default for Templates {
    /// Built-in flags access and CPU modes templates, no CPUID features.
    fn default() -> Self {
        Self {
            flags: builtin(FLAGS),
            modes: builtin(MODES),
            cpuid: Vec::new(),
        }
    }
}

impl Templates {
    /// Templates without any entries.
    pub fn empty() -> Self {
        Self {
            flags: HashMap::new(),
            modes: HashMap::new(),
            cpuid: Vec::new(),
        }
    }

    pub fn flags(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(|i| i.as_str())
    }

    pub fn mode(&self, name: &str) -> Option<&str> {
        self.modes.get(name).map(|i| i.as_str())
    }

    pub fn cpuid(&self, name: &str) -> Option<&CpuidFeature> {
        self.cpuid.iter().find(|i| i.name == name)
    }

    pub fn cpuid_features(&self) -> &[CpuidFeature] {
        &self.cpuid
    }

    pub fn insert_flags(&mut self, name: &str, value: &str) {
        self.flags.insert(name.to_owned(), value.to_owned());
    }

    pub fn insert_mode(&mut self, name: &str, value: &str) {
        self.modes.insert(name.to_owned(), value.to_owned());
    }

    /// Adds or replaces a CPUID feature.
    pub fn insert_cpuid(&mut self, feature: CpuidFeature) {
        match self.cpuid.iter_mut().find(|i| i.name == feature.name) {
            Some(i) => *i = feature,
            None => self.cpuid.push(feature),
        }
    }

    /// Loads flags access templates, returns the number of templates loaded.
    pub fn load_flags(&mut self, src: &str) -> usize {
        Self::load(src, "flags access", |name, value| {
            self.insert_flags(name, value)
        })
    }

    /// Loads CPU modes templates, returns the number of templates loaded.
    pub fn load_modes(&mut self, src: &str) -> usize {
        Self::load(src, "CPU modes", |name, value| self.insert_mode(name, value))
    }

    /// Loads CPUID features, returns the number of features loaded.
    pub fn load_cpuid(&mut self, src: &str) -> usize {
        let mut count = 0;
        for (i, line) in src.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            match line.parse() {
                Ok(feature) => {
                    self.insert_cpuid(feature);
                    count += 1;
                }
                Err(err) => warn!("skip CPUID feature at line {}: {err}", i + 1),
            }
        }
        count
    }

    fn load(src: &str, what: &str, mut insert: impl FnMut(&str, &str)) -> usize {
        let mut count = 0;
        for (i, line) in src.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            match parse_line(line) {
                Some((name, value)) => {
                    insert(name, value);
                    count += 1;
                }
                None => warn!("skip malformed {what} template at line {}: {line}", i + 1),
            }
        }
        count
    }
}
