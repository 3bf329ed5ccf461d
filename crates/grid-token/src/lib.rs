//! Compact, URL-safe share tokens for fixed-size module grids.
//!
//! A grid of module slots (10x6 by default) is turned into one text token
//! that fits in a URL query parameter, and turned back into a grid on the
//! other side. The token carries only structural state; labels, images and
//! scores are rebuilt from a technology catalog when decoding.
//!
//! # Quick Start
//!
//! ```rust
//! use grid_token::{decode_structure, serialize, Cell, Dimensions, Grid};
//!
//! let mut grid = Grid::new(Dimensions::new(2, 1));
//! grid.cells[0][0] = Cell {
//!     active: true,
//!     supercharged: true,
//!     tech: Some("pulse".to_string()),
//!     module: Some("PE".to_string()),
//!     adjacency_bonus: 1.0,
//!     ..Cell::default()
//! };
//!
//! let token = serialize(&grid).unwrap();
//! let decoded = decode_structure(&token, Dimensions::new(2, 1)).unwrap().unwrap();
//! assert!(decoded.cells[0][0].same_structure(&grid.cells[0][0]));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Grid, cell and symbol table types
//! - [`codec`]: Token encoding/decoding (run-length and percent encoding)
//! - [`catalog`]: Tech tree model, sources and the per-ship-type cache
//! - [`share`]: Query-string glue and stale-load handling
//! - [`config`]: TOML configuration
//! - [`error`]: Error types
//! - [`limits`]: Wire constants and decoder limits
//!
//! # Wire Format
//!
//! ```text
//! percentEncode(grid "|" tech "|" module "|" bonus "|" techTable "|" moduleTable)
//! ```
//!
//! - `grid`: one of `0` (inactive), `1` (active), `2` (supercharged) per cell, uncompressed
//! - `tech`, `module`: one symbol code per cell, space for none, run-length encoded
//! - `bonus`: `T`/`F` per cell, run-length encoded
//! - tables: `key:code` pairs joined by `,`
//!
//! Dimensions are not encoded; both sides must agree on them.
//!
//! # Security
//!
//! Tokens come from URLs and are untrusted. Decoding never panics on
//! malformed input, rejects oversized tokens up front, and checks run
//! lengths before expanding them.

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod limits;
pub mod model;
pub mod share;

// Re-export commonly used types at crate root
pub use catalog::{CatalogCache, FetchStatus, ModuleRecord, StaticTechTreeSource, TechCatalog, TechTree, TechTreeSource};
#[cfg(feature = "http")]
pub use catalog::HttpTechTreeSource;
pub use codec::{decode_structure, deserialize, hydrate, serialize, LookupMiss, WireGrid};
pub use config::{CatalogConfig, Config};
pub use error::{CatalogError, ConfigError, DecodeError, EncodeError, ErrorCode, GridError};
pub use model::{Cell, Dimensions, Grid, SymbolSpace, SymbolTable, SymbolTableBuilder};
pub use share::{share_url, GridLoader, LoadOutcome, RequestSequencer, RequestTicket, ShareParams};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
