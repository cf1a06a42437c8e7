use std::fmt::{self, Write as _};

#[derive(PartialEq, Eq, Debug)]
struct Escape<'a>(pub &'a str);

impl std::ops::Deref for Escape<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl fmt::Display for Escape<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        // trailing whitespace is visible
        let content = self.0.trim_end();
        fmt.write_str(content)?;
        for c in self.0[content.len()..].chars() {
            match c {
                '\t' => fmt.write_char('→')?,
                ' ' => fmt.write_char('•')?,
                _ => fmt.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// Line diff of an expected and an actual output.
pub struct Diff<'a> {
    file: &'a str,
    line: usize,
    expect: &'a str,
    result: &'a str,
}

impl<'a> Diff<'a> {
    pub fn new(file: &'a str, line: usize, expect: &'a str, result: &'a str) -> Self {
        Self {
            file,
            line,
            expect,
            result,
        }
    }
}

impl fmt::Display for Diff<'_> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use diff::Result as E;
        let w = 5;
        if !self.file.is_empty() {
            writeln!(out, "{:w$}--> {}:{}", ' ', self.file, self.line)?;
        }
        let mut ln = std::cmp::max(self.line, 1);
        let mut ln2 = ln;
        for diff in diff::lines(self.expect, self.result) {
            match diff {
                E::Left(l) => {
                    writeln!(out, "{ln:w$} - {}↴", Escape(l))?;
                    ln += 1;
                }
                E::Both(l, _) => {
                    writeln!(out, "{ln:w$} | {}↴", Escape(l))?;
                    ln += 1;
                    ln2 = ln;
                }
                E::Right(r) => {
                    writeln!(out, "{ln2:w$} + {}↴", Escape(r))?;
                    ln2 += 1;
                }
            }
        }
        Ok(())
    }
}

pub fn check(file: &str, line: usize, left: &str, right: &str) -> Result<(), String> {
    if left != right {
        let err = "invalid result";
        eprintln!("error: {err}");
        eprintln!("{}", Diff::new(file, line, left, right));
        return Err(err.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape() {
        assert_eq!(Escape("NOP").to_string(), "NOP");
        assert_eq!(Escape("NOP \t").to_string(), "NOP•→");
        assert_eq!(Escape("  NOP").to_string(), "  NOP");
    }

    #[test]
    fn diff() {
        let diff = Diff::new("a.test", 10, "opcode 90\n    NOP\n", "opcode 90\n    PAUSE\n");
        let diff = diff.to_string();
        assert!(diff.starts_with("     --> a.test:10\n   10 | opcode 90↴\n"));
        assert!(diff.contains("   11 -     NOP↴\n"));
        assert!(diff.contains("   11 +     PAUSE↴\n"));
        assert!(check("", 1, "NOP", "NOP").is_ok());
        assert!(check("", 1, "NOP", "PAUSE").is_err());
    }
}
