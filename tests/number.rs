#[macro_use]
mod common;

lox_test!(
    integral_values_print_without_a_trailing_dot,
    "number_formatting.lox",
    OK "1", "1.5", "5", "0.3333333333333333"
);
