#[macro_use]
mod common;

lox_test!(
    independent_closures_each_get_their_own_upvalue,
    "closure_counter.lox",
    OK "1", "2", "1"
);
