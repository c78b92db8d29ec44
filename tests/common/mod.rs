/// Runs a fixture end to end and asserts on what it printed or on the
/// diagnostics it raised.
///
/// `OK` runs the fixture in-process through the library's `Sink`-based
/// `Lox::with_output`, avoiding a subprocess for the common case of
/// asserting on stdout. `ERR` shells out to the built binary via
/// `assert_cmd`, since the diagnostic path writes straight to the real
/// process stderr rather than through the configurable sink, and a failing
/// run's exit code is itself part of the contract.
#[macro_export]
macro_rules! lox_test {
    ($name:ident, $path:expr, OK $($expected:expr),* $(,)?) => {
        #[test]
        fn $name() {
            let source = std::fs::read_to_string(concat!("tests/fixtures/", $path))
                .expect("fixture file to exist");

            let output = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
            let mut engine = lox::Lox::with_output(output.clone());
            engine.run(&source);

            let expected: Vec<&str> = vec![$($expected),*];
            let expected = if expected.is_empty() {
                String::new()
            } else {
                format!("{}\n", expected.join("\n"))
            };

            let actual = String::from_utf8(output.borrow().clone()).unwrap();
            assert_eq!(actual, expected, "unexpected output for {}", $path);
        }
    };
    ($name:ident, $path:expr, ERR $($expected:expr),+ $(,)?) => {
        #[test]
        fn $name() {
            use assert_cmd::Command;
            let expected = format!("{}\n", vec![$($expected),+].join("\n"));
            Command::cargo_bin("lox")
                .unwrap()
                .arg(concat!("tests/fixtures/", $path))
                .assert()
                .stderr(expected)
                .failure();
        }
    };
}
