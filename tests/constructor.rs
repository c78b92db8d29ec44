#[macro_use]
mod common;

lox_test!(
    init_always_returns_this,
    "constructor_init.lox",
    OK "7", "<instance of Point>", "30"
);
