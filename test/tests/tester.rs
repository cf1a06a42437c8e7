use isagen_test::test::{self, Parser, Test};

#[test]
fn parse() -> Result<(), String> {
    let src = "\
# comment
NOP ; ; ; 0x90 ; s:I86

PAUSE ; ; ; repz 0x90 ; s:PAUSE
== legacy
opcode 90
    NOP

== vex
---

---
# second
INT3 ; ; ; 0xCC ; s:I86
== error
";

    let mut parser = Parser::new("input", src);
    let mut test = Test::default();

    assert!(parser.parse(&mut test)?);
    assert_eq!(test.line, 2);
    assert_eq!(
        test.spec,
        "\nNOP ; ; ; 0x90 ; s:I86\n\nPAUSE ; ; ; repz 0x90 ; s:PAUSE\n"
    );
    assert_eq!(test.sections.len(), 2);
    assert_eq!(test.sections[0].name, "legacy");
    assert_eq!(test.sections[0].line, 6);
    assert_eq!(test.sections[0].text, "opcode 90\n    NOP\n");
    assert_eq!(test.sections[1].name, "vex");
    assert_eq!(test.sections[1].text, "");

    assert!(parser.parse(&mut test)?);
    assert_eq!(test.line, 14);
    assert_eq!(test.sections[0].name, test::ERROR_SECTION);

    assert!(!parser.parse(&mut test)?);
    Ok(())
}

#[test]
fn parse_errors() {
    let mut test = Test::default();

    let mut parser = Parser::new("input", "== legacy\nNOP\n");
    assert_eq!(
        parser.parse(&mut test),
        Err("error: expected output without specification, input:1".to_owned())
    );

    let mut parser = Parser::new("input", "NOP ; ; ; 0x90 ; s:I86\n");
    assert_eq!(
        parser.parse(&mut test),
        Err("error: no expected output, input:1".to_owned())
    );
}

#[test]
fn mismatch() {
    let src = "\
NOP ; ; ; 0x90 ; s:I86
== legacy
opcode 91
    NOP
";
    assert_eq!(test::run("input", src), Err("failed 1 tests".to_owned()));
}

#[test]
fn unexpected_tree() {
    let src = "\
NOP ; ; ; 0x90 ; s:I86
VZEROALL ; ; ; vex m:1 p:0 l:1 w:i 0x77 ; s:AVX
== legacy
opcode 90
    NOP
";
    assert!(test::run("input", src).is_err());
}
