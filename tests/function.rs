#[macro_use]
mod common;

lox_test!(recursion, "function_recursion.lox", OK "21");
lox_test!(display, "function_display.lox", OK "<fn greet>", "<native fn>");
