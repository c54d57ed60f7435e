pub mod assign;
pub mod canonicalize;
