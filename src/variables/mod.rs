//! Variable lookup and `{{variable}}` interpolation.
//!
//! Interpolation fails open: an expression that cannot be resolved is left in
//! place so a running conversation never breaks on a typo.

pub mod parse;
pub mod store;

pub use parse::{
    DeepParseOptions, FieldToParse, ParseOptions, deep_parse_variables, is_single_variable,
    parse_guessed_value_type, parse_variables, parse_variables_in_url,
};
pub use store::{
    extract_variables_from_text, find_unique_variable_value,
    find_variable_by_id, find_variable_by_name, parse_variable_number, resolve_variable,
};
