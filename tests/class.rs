#[macro_use]
mod common;

lox_test!(
    display_and_fields,
    "class_display_and_fields.lox",
    OK "<class Bagel>", "<instance of Bagel>", "plain"
);
lox_test!(
    undefined_property_is_a_runtime_error,
    "class_undefined_property.lox",
    ERR "Undefined property 'flavor'.", "[line 3]"
);
