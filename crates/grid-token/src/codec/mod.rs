//! Text encoding/decoding of grid tokens.

pub mod grid;
pub mod percent;
pub mod rle;

pub use grid::{decode_structure, deserialize, hydrate, serialize, LookupMiss, WireGrid};
pub use percent::{decode_component, encode_component};
pub use rle::{compress, decompress};
