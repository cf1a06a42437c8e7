use isagen_core::{SpecError, Templates};

use crate::insn::{Instruction, ABSENT};

fn operand_list(component: &str) -> Vec<&str> {
    let list: Vec<&str> = component.trim().split(',').map(str::trim).collect();
    match list.as_slice() {
        [op] if ABSENT.contains(op) => Vec::new(),
        _ => list,
    }
}

/// Parses one specification line.
///
/// The line is `mnemonic ; explicit operands ; implicit operands ; encoding ; metadata`,
/// everything after `#` is a comment. Returns `None` for comment lines and
/// lines too short to hold an instruction.
pub fn parse_line(line: &str, templates: &Templates) -> Result<Option<Instruction>, SpecError> {
    if line.starts_with('#') || line.len() < 4 {
        return Ok(None);
    }

    let line = line.replace(['\r', '\n'], "");
    let line = match line.find('#') {
        Some(i) => &line[..i],
        None => &line[..],
    };
    if line.starts_with(' ') {
        return Err(SpecError::LeadingSpace);
    }

    let components: Vec<&str> = line.split(';').collect();
    let &[mnemonic, explicit, implicit, encoding, meta] = components.as_slice() else {
        return Err(SpecError::ComponentCount(components.len()));
    };

    let mnemonic = mnemonic.trim();
    if mnemonic.is_empty() {
        return Err(SpecError::EmptyMnemonic);
    }

    let meta: Vec<&str> = meta.trim().split(',').collect();
    Instruction::new(
        mnemonic,
        &operand_list(explicit),
        &operand_list(implicit),
        encoding.trim(),
        &meta,
        templates,
    )
    .map(Some)
}
