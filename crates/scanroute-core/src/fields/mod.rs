//! Field extraction module.

mod parser;
pub mod rules;

pub use parser::FieldParser;
pub use rules::{
    extract_account, extract_name, is_valid_account, normalize, AccountExtractor, FieldExtractor,
    NameExtractor,
};
