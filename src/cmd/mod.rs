pub mod assign;
pub mod validate;
