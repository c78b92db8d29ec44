#[macro_use]
mod common;

lox_test!(scoping, "block_scoping.lox", OK "inner", "outer");
lox_test!(
    runtime_error_restores_scope,
    "block_runtime_error_restores_scope.lox",
    ERR "Division by zero.", "[line 4]"
);
