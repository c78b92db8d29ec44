#[macro_use]
mod common;

lox_test!(
    subclass_inherits_superclass_methods,
    "inheritance_method_dispatch.lox",
    OK "Fry until golden brown."
);
lox_test!(
    self_inheritance_is_a_compile_error,
    "inheritance_self.lox",
    ERR "[line 1] Error at 'Oops': A class cannot inherit from itself."
);
