#[macro_use]
mod common;

lox_test!(
    super_reaches_the_overridden_method,
    "super_calls_overridden_method.lox",
    OK "Fry until golden brown.", "Pipe full of custard and coat with chocolate."
);
lox_test!(
    this_outside_a_class_is_a_compile_error,
    "this_outside_class.lox",
    ERR "[line 1] Error at 'this': Cannot use 'this' outside of a class."
);
