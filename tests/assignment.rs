#[macro_use]
mod common;

lox_test!(basic, "assignment_basic.lox", OK "2", "3", "3");
lox_test!(undefined, "assignment_undefined.lox", ERR "Undefined variable 'a'.", "[line 1]");
lox_test!(
    invalid_target,
    "assignment_invalid_target.lox",
    ERR "[line 1] Error at '=': Invalid assignment target."
);
