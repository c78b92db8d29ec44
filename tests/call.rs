#[macro_use]
mod common;

lox_test!(
    arity_mismatch,
    "call_arity_mismatch.lox",
    ERR "Expected 2 arguments but got 1.", "[line 4]"
);
lox_test!(
    non_callable,
    "call_non_callable.lox",
    ERR "Can only call functions and classes.", "[line 2]"
);
