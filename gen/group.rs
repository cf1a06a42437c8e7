//! Decision tree builder.
//!
//! Instructions are recursively partitioned by one encoding field at a time,
//! the first field of the priority list that can split the remaining
//! instructions wins. Fields are consumed through per-instruction cursors,
//! the instructions themselves are never modified, so any number of trees
//! can be built from the same instruction list.

use std::{fmt, ptr};

use isagen_core::SpecError;

use crate::{encoding::Field, filter::Filter, insn::Instruction};

/// What a decision tree node dispatches on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Field(Field),
    /// Residual validity check, a node with a single child.
    Filter(Filter),
}

impl Component {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Field(i) => i.as_str(),
            Self::Filter(i) => i.as_str(),
        }
    }
}

/// Grouping component, one level of the decision tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupComponent {
    component: Component,
    size: usize,
    all: bool,
}

impl GroupComponent {
    /// Creates a component for `field` with `size` possible values.
    ///
    /// If `all` is set every instruction of a group must have the field,
    /// otherwise instructions without the field go to the first child.
    pub const fn new(field: Field, size: usize, all: bool) -> Self {
        Self {
            component: Component::Field(field),
            size,
            all,
        }
    }

    const fn filter(filter: Filter) -> Self {
        Self {
            component: Component::Filter(filter),
            size: 1,
            all: true,
        }
    }

    pub fn component(&self) -> Component {
        self.component
    }

    /// Returns the number of children of a node.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn is_filter(&self) -> bool {
        matches!(self.component, Component::Filter(_))
    }
}

impl fmt::Display for GroupComponent {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.component.as_str())
    }
}

/// Grouping priority of legacy encoded instructions.
pub const LEGACY_COMPONENTS: &[GroupComponent] = &[
    GroupComponent::new(Field::Opcode, 256, true),
    GroupComponent::new(Field::OpcodeLast, 256, true),
    GroupComponent::new(Field::Vendor, 16, false),
    GroupComponent::new(Field::Prefix, 4, true),
    GroupComponent::new(Field::ModrmReg, 8, true),
    GroupComponent::new(Field::ModrmMod, 2, true),
    GroupComponent::new(Field::ModrmRm, 8, true),
    GroupComponent::new(Field::Mode, 4, false),
    GroupComponent::new(Field::ASize, 4, false),
    GroupComponent::new(Field::DSize, 6, false),
    GroupComponent::new(Field::Feature, 8, false),
    GroupComponent::new(Field::Auxiliary, 10, false),
    GroupComponent::new(Field::W, 2, true),
];

/// Grouping priority of XOP, VEX and EVEX encoded instructions.
pub const VEX_COMPONENTS: &[GroupComponent] = &[
    GroupComponent::new(Field::Mmmmm, 32, true),
    GroupComponent::new(Field::Opcode, 256, true),
    GroupComponent::new(Field::Pp, 4, true),
    GroupComponent::new(Field::L, 4, true),
    GroupComponent::new(Field::W, 2, true),
    GroupComponent::new(Field::Wi, 2, true),
    GroupComponent::new(Field::Nd, 2, true),
    GroupComponent::new(Field::Nf, 2, true),
    GroupComponent::new(Field::Sc, 16, true),
    GroupComponent::new(Field::Lpdf, 64, true),
    GroupComponent::new(Field::ModrmReg, 8, true),
    GroupComponent::new(Field::ModrmMod, 2, true),
    GroupComponent::new(Field::ModrmRm, 8, true),
];

/// Symbolic encoding values.
const VALUE_INDEX: &[(&str, usize)] = &[
    ("None", 0),
    // ModR/M.mod
    ("mem", 0),
    ("reg", 1),
    // mandatory prefixes
    ("PNP", 0),
    ("P0x66", 1),
    ("P0xF3", 2),
    ("P0xF2", 3),
    // auxiliary
    ("repz", 1),
    ("rep", 2),
    ("rexb", 3),
    ("rexw", 4),
    ("mo64", 5),
    ("riprel", 6),
    ("rex2", 7),
    ("rex2w", 8),
    // mode
    ("m16", 1),
    ("m32", 2),
    ("m64", 3),
    // address size
    ("as16", 1),
    ("as32", 2),
    ("as64", 3),
    // data size
    ("ds16", 1),
    ("ds32", 2),
    ("ds64", 3),
    ("dd64", 4),
    ("df64", 5),
    // vendor
    ("any", 0),
    ("intel", 1),
    ("amd", 2),
    // feature
    ("mpx", 1),
    ("cet", 2),
    ("cldm", 3),
    ("piti", 4),
    ("movrs", 5),
    ("bhi", 6),
];

/// Converts an encoding value to a child index.
///
/// Values without a symbolic name are hexadecimal numbers.
pub fn compute_index(value: &str) -> Option<usize> {
    if let Some((_, index)) = VALUE_INDEX.iter().find(|(name, _)| *name == value) {
        return Some(*index);
    }
    let digits = value.strip_prefix("0x").unwrap_or(value);
    usize::from_str_radix(digits, 16).ok()
}

/// Instruction with the encoding fields and filters not yet consumed.
#[derive(Clone)]
struct Residual<'a> {
    insn: &'a Instruction,
    cursor: [usize; Field::COUNT],
    filter: usize,
}

impl<'a> Residual<'a> {
    fn new(insn: &'a Instruction) -> Self {
        Self {
            insn,
            cursor: [0; Field::COUNT],
            filter: 0,
        }
    }

    fn peek(&self, field: Field) -> Option<&'a str> {
        let values = self.insn.encoding().field(field);
        values.get(self.cursor[field.index()]).map(String::as_str)
    }

    fn has(&self, field: Field) -> bool {
        self.peek(field).is_some()
    }

    fn next_filter(&self) -> Option<Filter> {
        self.insn.filters().get(self.filter).copied()
    }

    /// Consumes the next value of the component, returns the child index.
    fn take(&mut self, component: &GroupComponent) -> Result<usize, SpecError> {
        let field = match component.component {
            Component::Filter(_) => {
                self.filter += 1;
                return Ok(0);
            }
            Component::Field(field) => field,
        };
        let Some(value) = self.peek(field) else {
            return Ok(0);
        };
        self.cursor[field.index()] += 1;
        compute_index(value)
            .filter(|i| *i < component.size)
            .ok_or_else(|| SpecError::InvalidGroupValue {
                component: component.to_string(),
                value: value.to_owned(),
                size: component.size,
            })
    }

    fn describe(&self) -> String {
        format!("{} with encoding: {}", self.insn, self.insn.raw_encoding())
    }
}

fn find_component(list: &[Residual], components: &[GroupComponent]) -> Option<GroupComponent> {
    let found = components.iter().find(|c| {
        let Component::Field(field) = c.component else {
            return false;
        };
        if c.all {
            list.iter().all(|i| i.has(field))
        } else {
            list.iter().any(|i| i.has(field))
        }
    });
    if found.is_some() {
        return found.copied();
    }
    list.first()
        .and_then(|i| i.next_filter())
        .map(GroupComponent::filter)
}

/// Decision tree node.
#[derive(Clone, Debug)]
pub enum InstructionGroup<'a> {
    Internal {
        component: GroupComponent,
        /// Indexed by the component value, `None` for values without instructions.
        children: Vec<Option<InstructionGroup<'a>>>,
    },
    Leaf(&'a Instruction),
}

impl<'a> InstructionGroup<'a> {
    fn build(
        list: Vec<Residual<'a>>,
        components: &[GroupComponent],
        level: usize,
    ) -> Result<Self, SpecError> {
        let component = match (find_component(&list, components), list.as_slice()) {
            (None, [single]) => return Ok(Self::Leaf(single.insn)),
            (Some(c), _) if !c.is_filter() || list.len() == 1 => c,
            _ => {
                let conflicts: Vec<_> = list.iter().map(Residual::describe).collect();
                error!("cannot properly group the following instructions:");
                for i in &conflicts {
                    error!("    -> {i}");
                }
                return Err(SpecError::Conflict(conflicts));
            }
        };

        trace!(
            "{:level$}{component} for {} instructions",
            "",
            list.len(),
            level = level * 4
        );

        let mut buckets: Vec<Vec<Residual>> = vec![Vec::new(); component.size];
        for mut i in list {
            let index = i.take(&component)?;
            buckets[index].push(i);
        }

        let mut children = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let child = if bucket.is_empty() {
                None
            } else {
                Some(Self::build(bucket, components, level + 1)?)
            };
            children.push(child);
        }

        Ok(Self::Internal {
            component,
            children,
        })
    }

    pub fn component(&self) -> Option<&GroupComponent> {
        match self {
            Self::Internal { component, .. } => Some(component),
            Self::Leaf(_) => None,
        }
    }

    /// Returns children of an internal node, empty for a leaf.
    pub fn children(&self) -> &[Option<Self>] {
        match self {
            Self::Internal { children, .. } => children,
            Self::Leaf(_) => &[],
        }
    }

    pub fn instruction(&self) -> Option<&'a Instruction> {
        match self {
            Self::Internal { .. } => None,
            Self::Leaf(insn) => Some(insn),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Returns every instruction of the tree in depth-first order.
    pub fn leaves(&self) -> Vec<&'a Instruction> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(&self, out: &mut Vec<&'a Instruction>) {
        match self {
            Self::Internal { children, .. } => {
                for child in children.iter().flatten() {
                    child.collect_leaves(out);
                }
            }
            Self::Leaf(insn) => out.push(insn),
        }
    }

    /// Returns the number of internal nodes on the longest path to a leaf.
    pub fn depth(&self) -> usize {
        match self {
            Self::Internal { children, .. } => {
                1 + children.iter().flatten().map(|i| i.depth()).max().unwrap_or(0)
            }
            Self::Leaf(_) => 0,
        }
    }

    fn dump(&self, fmt: &mut fmt::Formatter, level: usize) -> fmt::Result {
        let indent = level * 4;
        match self {
            Self::Internal {
                component,
                children,
            } => {
                for (i, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        writeln!(fmt, "{:indent$}{component} {i:02x}", "")?;
                        child.dump(fmt, level + 1)?;
                    }
                }
                Ok(())
            }
            Self::Leaf(insn) => writeln!(fmt, "{:indent$}{insn}", ""),
        }
    }
}

impl PartialEq for InstructionGroup<'_> {
    /// Trees are equal if they have the same shape and the same instruction
    /// objects in their leaves.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Internal {
                    component: a,
                    children: x,
                },
                Self::Internal {
                    component: b,
                    children: y,
                },
            ) => a == b && x == y,
            (Self::Leaf(a), Self::Leaf(b)) => ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for InstructionGroup<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.dump(fmt, 0)
    }
}

/// Builds the decision tree of `instructions` with the `components` priority list.
///
/// Fails if some instructions cannot be told apart, every one of them is
/// logged and returned in the error.
pub fn group<'a, I>(
    instructions: I,
    components: &[GroupComponent],
) -> Result<InstructionGroup<'a>, SpecError>
where
    I: IntoIterator<Item = &'a Instruction>,
{
    let list: Vec<_> = instructions.into_iter().map(Residual::new).collect();
    let count = list.len();
    let tree = InstructionGroup::build(list, components, 0)?;
    debug!("grouped {count} instructions, depth {}", tree.depth());
    Ok(tree)
}
