#[macro_use]
mod common;

lox_test!(break_exits_the_loop, "break_while.lox", OK "0", "1", "2");
lox_test!(continue_skips_to_the_condition, "continue_for.lox", OK "0", "2", "4");
lox_test!(
    break_outside_loop_is_a_compile_error,
    "break_outside_loop.lox",
    ERR "[line 1] Error at 'break': Cannot use 'break' outside of a loop."
);
lox_test!(
    break_inside_a_function_nested_in_a_loop_is_still_a_compile_error,
    "break_does_not_cross_function_boundary.lox",
    ERR "[line 3] Error at 'break': Cannot use 'break' outside of a loop."
);
