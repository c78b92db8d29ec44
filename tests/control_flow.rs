#[macro_use]
mod common;

lox_test!(if_else_branches, "if_else.lox", OK "yes");
lox_test!(
    logical_operators_short_circuit,
    "logical_short_circuit.lox",
    OK "left-or", "true", "left-and", "false"
);
