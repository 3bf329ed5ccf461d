//! Data model types for grid tokens.
//!
//! - Grids and cells (the shareable layout state)
//! - Symbol tables (compact codes for tech and module keys)

pub mod grid;
pub mod symbols;

pub use grid::{Cell, Dimensions, Grid};
pub use symbols::{SymbolSpace, SymbolTable, SymbolTableBuilder};
