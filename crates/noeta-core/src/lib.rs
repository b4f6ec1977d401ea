//! Noeta Core Types
//!
//! This crate provides the foundational types shared by the Noeta compiler
//! front end and its callers:
//!
//! - **Schema**: column and dataset descriptions ([`schema`] module)
//! - **Symbol table**: the alias registry carried across compilations
//!   ([`symbol_table`] module)

pub mod schema;
pub mod symbol_table;

pub use schema::{ColumnInfo, DataType, DatasetInfo};
pub use symbol_table::{RuntimeValue, SymbolTable};
