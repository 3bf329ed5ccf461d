//! Wire constants and decoder limits.

/// Number of `|`-delimited fields in a token.
pub const FIELD_COUNT: usize = 6;

/// Separates the six top-level fields of a token.
pub const FIELD_DELIMITER: char = '|';

/// Separates `key:code` entries inside a symbol table.
pub const TABLE_ENTRY_DELIMITER: char = ',';

/// Separates a key from its code inside a symbol table entry.
pub const TABLE_PAIR_DELIMITER: char = ':';

/// Marks a cell with no tech or no module in the tech/module streams.
pub const EMPTY_SYMBOL: char = ' ';

/// First code point handed out for tech keys.
pub const TECH_CODE_START: u32 = 3;

/// First code point handed out for module keys.
pub const MODULE_CODE_START: u32 = 'A' as u32;

/// Grid-stream symbol for an inactive cell.
pub const CELL_INACTIVE: char = '0';

/// Grid-stream symbol for an active, plain cell.
pub const CELL_ACTIVE: char = '1';

/// Grid-stream symbol for an active, supercharged cell.
pub const CELL_SUPERCHARGED: char = '2';

/// Bonus-stream symbol for a cell with a positive adjacency bonus.
pub const BONUS_SET: char = 'T';

/// Bonus-stream symbol for a cell without adjacency bonus.
pub const BONUS_UNSET: char = 'F';

/// Default grid width.
pub const DEFAULT_WIDTH: usize = 10;

/// Default grid height.
pub const DEFAULT_HEIGHT: usize = 6;

/// Maximum accepted token length in bytes, before percent-decoding.
pub const MAX_TOKEN_LEN: usize = 64 * 1024;

/// Query parameter carrying the token.
pub const GRID_PARAM: &str = "grid";

/// Query parameter selecting the ship type.
pub const SHIP_PARAM: &str = "ship";

/// Alternate query parameter selecting the ship type.
pub const PLATFORM_PARAM: &str = "platform";

/// Returns true for characters the wire format reserves and that must never
/// be handed out as a symbol code.
///
/// Digits are run-length counts, space is the empty-cell marker, and the
/// three punctuation characters delimit fields and table entries.
#[inline]
pub fn is_reserved_code(c: char) -> bool {
    c.is_ascii_digit()
        || c == EMPTY_SYMBOL
        || c == FIELD_DELIMITER
        || c == TABLE_ENTRY_DELIMITER
        || c == TABLE_PAIR_DELIMITER
}
