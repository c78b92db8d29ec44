#[macro_use]
mod common;

lox_test!(
    method_sees_the_instance_via_this,
    "method_this_binding.lox",
    OK "The German chocolate cake is delicious!"
);
