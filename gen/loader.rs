use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

use isagen_core::Templates;

use crate::{
    encoding::Family,
    error::{Error, ErrorKind},
    group::{group, InstructionGroup, LEGACY_COMPONENTS, VEX_COMPONENTS},
    insn::Instruction,
    parser::parse_line,
};

enum Source {
    File(PathBuf),
    Text { name: PathBuf, text: String },
}

impl Source {
    fn name(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Text { name, .. } => name,
        }
    }

    fn read(&self) -> Result<Cow<str>, Error> {
        match self {
            Self::File(path) => fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|error| Error::new(path, ErrorKind::SourceFile(error))),
            Self::Text { text, .. } => Ok(Cow::Borrowed(text)),
        }
    }

    fn text(name: &str, text: &str) -> Self {
        Self::Text {
            name: name.into(),
            text: text.to_owned(),
        }
    }
}

/// Specification sources.
///
/// Template files are loaded before any instruction table, instruction
/// tables are loaded in the order they were added.
///
/// ```no_run
/// let spec = isagen_gen::Spec::new()
///     .flags("isa/flags.dat")
///     .modes("isa/modes.dat")
///     .cpuid("isa/cpuid.dat")
///     .table("isa/table_base.dat")
///     .table("isa/table_vex.dat")
///     .load()?;
/// let trees = spec.build()?;
/// # Ok::<(), isagen_gen::Error>(())
/// ```
pub struct Spec {
    templates: Templates,
    flags: Vec<Source>,
    modes: Vec<Source>,
    cpuid: Vec<Source>,
    tables: Vec<Source>,
}

impl Default for Spec {
    fn default() -> Self {
        Self::new()
    }
}

impl Spec {
    /// Creates sources with the built-in templates.
    pub fn new() -> Self {
        Self {
            templates: Templates::default(),
            flags: Vec::new(),
            modes: Vec::new(),
            cpuid: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Replaces the templates loaded files add to.
    pub fn templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    /// Adds a flags access templates file.
    pub fn flags(mut self, path: impl AsRef<Path>) -> Self {
        self.flags.push(Source::File(path.as_ref().into()));
        self
    }

    pub fn flags_str(mut self, name: &str, text: &str) -> Self {
        self.flags.push(Source::text(name, text));
        self
    }

    /// Adds a CPU modes templates file.
    pub fn modes(mut self, path: impl AsRef<Path>) -> Self {
        self.modes.push(Source::File(path.as_ref().into()));
        self
    }

    pub fn modes_str(mut self, name: &str, text: &str) -> Self {
        self.modes.push(Source::text(name, text));
        self
    }

    /// Adds a CPUID feature flags file.
    pub fn cpuid(mut self, path: impl AsRef<Path>) -> Self {
        self.cpuid.push(Source::File(path.as_ref().into()));
        self
    }

    pub fn cpuid_str(mut self, name: &str, text: &str) -> Self {
        self.cpuid.push(Source::text(name, text));
        self
    }

    /// Adds an instruction table file.
    pub fn table(mut self, path: impl AsRef<Path>) -> Self {
        self.tables.push(Source::File(path.as_ref().into()));
        self
    }

    pub fn table_str(mut self, name: &str, text: &str) -> Self {
        self.tables.push(Source::text(name, text));
        self
    }

    /// Reads every source, stops at the first error.
    pub fn load(&self) -> Result<Specification, Error> {
        let mut templates = self.templates.clone();

        for source in &self.flags {
            let count = templates.load_flags(&source.read()?);
            debug!("{}: {count} flags access templates", source.name().display());
        }
        for source in &self.modes {
            let count = templates.load_modes(&source.read()?);
            debug!("{}: {count} CPU modes templates", source.name().display());
        }
        for source in &self.cpuid {
            let count = templates.load_cpuid(&source.read()?);
            debug!("{}: {count} CPUID features", source.name().display());
        }

        let mut instructions = Vec::new();
        for source in &self.tables {
            let text = source.read()?;
            let start = instructions.len();
            for (i, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let insn = parse_line(line, &templates).map_err(|error| {
                    let kind = ErrorKind::Parse { line: i + 1, error };
                    Error::new(source.name(), kind)
                })?;
                instructions.extend(insn);
            }
            debug!(
                "{}: {} instructions",
                source.name().display(),
                instructions.len() - start
            );
        }

        Ok(Specification::new(templates, instructions))
    }
}

/// Loaded instruction set.
#[derive(Clone, Debug)]
pub struct Specification {
    templates: Templates,
    instructions: Vec<Instruction>,
}

impl Specification {
    pub fn new(templates: Templates, instructions: Vec<Instruction>) -> Self {
        Self {
            templates,
            instructions,
        }
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Returns instructions in source order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns instructions of an encoding family in source order.
    pub fn family(&self, family: Family) -> impl Iterator<Item = &Instruction> {
        self.instructions
            .iter()
            .filter(move |i| i.encoding().family() == family)
    }

    /// Builds a decision tree for every encoding family.
    ///
    /// Legacy instructions are grouped with [`LEGACY_COMPONENTS`], other
    /// families with [`VEX_COMPONENTS`].
    pub fn build(&self) -> Result<DecodeTrees, Error> {
        let mut trees = DecodeTrees::default();
        for family in Family::ALL {
            let list: Vec<_> = self.family(*family).collect();
            if list.is_empty() {
                continue;
            }
            let components = if family.is_vector() {
                VEX_COMPONENTS
            } else {
                LEGACY_COMPONENTS
            };
            debug!("{family}: grouping {} instructions", list.len());
            let tree = group(list, components)
                .map_err(|error| Error::new(family.as_str(), ErrorKind::Group(error)))?;
            trees.set(*family, tree);
        }
        Ok(trees)
    }
}

/// Decision trees of every encoding family.
#[derive(Clone, Debug, Default)]
pub struct DecodeTrees<'a> {
    legacy: Option<InstructionGroup<'a>>,
    xop: Option<InstructionGroup<'a>>,
    vex: Option<InstructionGroup<'a>>,
    evex: Option<InstructionGroup<'a>>,
}

impl<'a> DecodeTrees<'a> {
    fn slot(&mut self, family: Family) -> &mut Option<InstructionGroup<'a>> {
        match family {
            Family::Legacy => &mut self.legacy,
            Family::Xop => &mut self.xop,
            Family::Vex => &mut self.vex,
            Family::Evex => &mut self.evex,
        }
    }

    fn set(&mut self, family: Family, tree: InstructionGroup<'a>) {
        *self.slot(family) = Some(tree);
    }

    /// Returns the tree of a family, `None` if the family has no instructions.
    pub fn get(&self, family: Family) -> Option<&InstructionGroup<'a>> {
        match family {
            Family::Legacy => self.legacy.as_ref(),
            Family::Xop => self.xop.as_ref(),
            Family::Vex => self.vex.as_ref(),
            Family::Evex => self.evex.as_ref(),
        }
    }

    pub fn legacy(&self) -> Option<&InstructionGroup<'a>> {
        self.legacy.as_ref()
    }

    pub fn xop(&self) -> Option<&InstructionGroup<'a>> {
        self.xop.as_ref()
    }

    pub fn vex(&self) -> Option<&InstructionGroup<'a>> {
        self.vex.as_ref()
    }

    pub fn evex(&self) -> Option<&InstructionGroup<'a>> {
        self.evex.as_ref()
    }

    /// Returns the built trees with their family.
    pub fn iter(&self) -> impl Iterator<Item = (Family, &InstructionGroup<'a>)> {
        Family::ALL
            .iter()
            .filter_map(|family| self.get(*family).map(|tree| (*family, tree)))
    }
}
