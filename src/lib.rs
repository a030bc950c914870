//! tagdb: persistent symbol tags store
//!
//! A queryable index of source-code entities (functions, classes, variables,
//! macros) used for editor navigation, completion and type resolution.

pub mod cli;
pub mod core;
