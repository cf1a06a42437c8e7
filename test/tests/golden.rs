use isagen_test::test;

macro_rules! test {
    ($name:ident, $file:expr) => {
        #[test]
        fn $name() -> Result<(), String> {
            let _ = env_logger::Builder::new().is_test(true).try_init();
            test::run($file, include_str!($file))
        }
    };
}

test!(legacy, "legacy.test");
test!(vex, "vex.test");
test!(errors, "errors.test");
