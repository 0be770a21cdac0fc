pub mod maximize;
pub mod parse;
