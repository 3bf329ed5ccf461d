//! Grid token encoding/decoding.
//!
//! A token is six `|`-delimited fields, percent-encoded once as a whole:
//!
//! ```text
//! grid | tech (RLE) | module (RLE) | bonus (RLE) | tech table | module table
//! ```
//!
//! The grid field holds one of `0`/`1`/`2` per cell and is never compressed,
//! so its length alone checks the agreed dimensions. The tech and module
//! fields hold one symbol code per cell (space for none) and the bonus field
//! holds `T`/`F`.

use crate::catalog::{CatalogCache, TechCatalog};
use crate::codec::percent::{decode_component, encode_component};
use crate::codec::rle::{compress, decompress_exact};
use crate::error::{DecodeError, EncodeError, ErrorCode, GridError};
use crate::limits::{
    BONUS_SET, BONUS_UNSET, CELL_ACTIVE, CELL_INACTIVE, CELL_SUPERCHARGED, EMPTY_SYMBOL,
    FIELD_COUNT, FIELD_DELIMITER, MAX_TOKEN_LEN,
};
use crate::model::{Cell, Dimensions, Grid, SymbolSpace, SymbolTable, SymbolTableBuilder};

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a grid into a percent-encoded token.
///
/// Deterministic: symbol codes are handed out in row-major first-seen order,
/// so the same grid always yields the same token.
///
/// Fails if a tech or module key is empty or contains `|` or `,`.
pub fn serialize(grid: &Grid) -> Result<String, EncodeError> {
    Ok(encode_component(&WireGrid::from_grid(grid)?.to_wire()))
}

// =============================================================================
// DECODING
// =============================================================================

/// The six fields of a token with the compressed streams expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct WireGrid {
    /// One of `0`/`1`/`2` per cell.
    pub grid: String,
    /// One tech code (or space) per cell.
    pub tech: String,
    /// One module code (or space) per cell.
    pub module: String,
    /// One `T`/`F` per cell.
    pub bonus: String,
    pub tech_table: SymbolTable,
    pub module_table: SymbolTable,
}

/// A module the catalog had no record for.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupMiss {
    /// Row-major cell index.
    pub index: usize,
    pub tech: String,
    pub module: String,
}

impl LookupMiss {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Lookup
    }
}

impl WireGrid {
    /// Builds the streams and symbol tables for a grid.
    pub fn from_grid(grid: &Grid) -> Result<Self, EncodeError> {
        let cells = grid.iter().count();
        let mut grid_stream = String::with_capacity(cells);
        let mut tech = String::with_capacity(cells);
        let mut module = String::with_capacity(cells);
        let mut bonus = String::with_capacity(cells);
        let mut tech_codes = SymbolTableBuilder::new(SymbolSpace::Tech);
        let mut module_codes = SymbolTableBuilder::new(SymbolSpace::Module);

        for cell in grid.iter() {
            // Supercharge is dropped on inactive cells.
            grid_stream.push(match (cell.active, cell.supercharged) {
                (true, true) => CELL_SUPERCHARGED,
                (true, false) => CELL_ACTIVE,
                (false, _) => CELL_INACTIVE,
            });
            tech.push(match &cell.tech {
                Some(key) => tech_codes.code_for(key)?,
                None => EMPTY_SYMBOL,
            });
            module.push(match &cell.module {
                Some(key) => module_codes.code_for(key)?,
                None => EMPTY_SYMBOL,
            });
            bonus.push(if cell.has_adjacency_bonus() {
                BONUS_SET
            } else {
                BONUS_UNSET
            });
        }

        Ok(Self {
            grid: grid_stream,
            tech,
            module,
            bonus,
            tech_table: tech_codes.build(),
            module_table: module_codes.build(),
        })
    }

    /// Joins the fields into the unencoded wire string, compressing the
    /// tech, module and bonus streams.
    pub fn to_wire(&self) -> String {
        let fields = [
            self.grid.clone(),
            compress(&self.tech),
            compress(&self.module),
            compress(&self.bonus),
            self.tech_table.to_wire(),
            self.module_table.to_wire(),
        ];
        fields.join(FIELD_DELIMITER.to_string().as_str())
    }

    /// Parses a token and validates every stream against `dims`.
    ///
    /// Returns `Ok(None)` for an empty token.
    pub fn parse(token: &str, dims: Dimensions) -> Result<Option<Self>, DecodeError> {
        if token.is_empty() {
            return Ok(None);
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(DecodeError::TokenTooLong {
                len: token.len(),
                max: MAX_TOKEN_LEN,
            });
        }

        let decoded = decode_component(token)?;
        let fields: Vec<&str> = decoded.split(FIELD_DELIMITER).collect();
        let [grid, tech, module, bonus, tech_table, module_table] =
            <[&str; FIELD_COUNT]>::try_from(fields)
                .map_err(|fields| DecodeError::FieldCount { found: fields.len() })?;

        let expected = dims.cell_count();
        let actual = grid.chars().count();
        if actual != expected {
            return Err(DecodeError::LengthMismatch {
                field: "grid",
                expected,
                actual,
            });
        }

        Ok(Some(Self {
            grid: grid.to_string(),
            tech: decompress_exact(tech, expected, "tech")?,
            module: decompress_exact(module, expected, "module")?,
            bonus: decompress_exact(bonus, expected, "bonus")?,
            tech_table: SymbolTable::parse(tech_table),
            module_table: SymbolTable::parse(module_table),
        }))
    }

    /// Rebuilds the structural state of every cell. Display fields are left
    /// at their defaults.
    pub fn to_skeleton(&self, dims: Dimensions) -> Grid {
        let mut grid = Grid::new(dims);
        let streams = self
            .grid
            .chars()
            .zip(self.tech.chars())
            .zip(self.module.chars())
            .zip(self.bonus.chars());

        for (index, (cell, (((state, tech), module), bonus))) in
            grid.iter_mut().zip(streams).enumerate()
        {
            cell.active = state != CELL_INACTIVE;
            cell.supercharged = state == CELL_SUPERCHARGED;
            cell.tech = resolve(&self.tech_table, tech, SymbolSpace::Tech, index);
            cell.module = resolve(&self.module_table, module, SymbolSpace::Module, index);
            cell.adjacency_bonus = if bonus == BONUS_SET { 1.0 } else { 0.0 };
        }
        grid
    }
}

fn resolve(table: &SymbolTable, code: char, space: SymbolSpace, index: usize) -> Option<String> {
    if code == EMPTY_SYMBOL {
        return None;
    }
    let key = table.key(code);
    if key.is_none() {
        log::warn!(
            "cell {index}: {} code U+{:04X} is not in the symbol table",
            space.name(),
            code as u32
        );
    }
    key.map(str::to_string)
}

/// Parses a token into a grid carrying only structural state.
///
/// Returns `Ok(None)` for an empty token.
pub fn decode_structure(token: &str, dims: Dimensions) -> Result<Option<Grid>, DecodeError> {
    Ok(WireGrid::parse(token, dims)?.map(|wire| wire.to_skeleton(dims)))
}

/// Copies display and scoring fields from the catalog into every cell that
/// has both a tech and a module.
///
/// `adjacency_bonus` is never touched: it records the bonus state at share
/// time. Cells whose module is missing from the catalog keep their keys and
/// default display fields; they are returned as misses.
pub fn hydrate(grid: &mut Grid, catalog: &TechCatalog) -> Vec<LookupMiss> {
    let mut misses = Vec::new();
    for (index, cell) in grid.iter_mut().enumerate() {
        let (Some(tech), Some(module)) = (cell.tech.as_deref(), cell.module.as_deref()) else {
            continue;
        };
        match catalog.module(tech, module) {
            Some(record) => apply_record(cell, record),
            None => {
                log::warn!("cell {index}: module {module:?} not found for tech {tech:?}");
                misses.push(LookupMiss {
                    index,
                    tech: tech.to_string(),
                    module: module.to_string(),
                });
            }
        }
    }
    misses
}

fn apply_record(cell: &mut Cell, record: &crate::catalog::ModuleRecord) {
    cell.label = record.label.clone();
    cell.image = record.image.clone();
    cell.bonus = record.bonus;
    cell.value = record.value;
    cell.adjacency = record.adjacency;
    cell.sc_eligible = record.sc_eligible;
}

/// Decodes a token into a fully hydrated grid.
///
/// Returns `Ok(None)` for an empty token. Structural errors are reported
/// before the catalog is fetched; a failed fetch aborts the whole decode.
pub async fn deserialize(
    token: &str,
    ship_type: &str,
    dims: Dimensions,
    catalog: &CatalogCache,
) -> Result<Option<Grid>, GridError> {
    let Some(mut grid) = decode_structure(token, dims).inspect_err(|e| {
        log::debug!("rejecting grid token: {e}");
    })?
    else {
        return Ok(None);
    };

    let catalog = catalog.get(ship_type).await?;
    hydrate(&mut grid, &catalog);
    Ok(Some(grid))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::catalog::{ModuleRecord, StaticTechTreeSource, TechEntry, TechTree};
    use crate::codec::percent::decode_component;

    fn cell(active: bool, supercharged: bool, tech: Option<&str>, module: Option<&str>, bonus: f64) -> Cell {
        Cell {
            active,
            supercharged,
            tech: tech.map(str::to_string),
            module: module.map(str::to_string),
            adjacency_bonus: bonus,
            ..Cell::default()
        }
    }

    fn fields(grid: &Grid) -> Vec<String> {
        let wire = decode_component(&serialize(grid).unwrap()).unwrap();
        wire.split('|').map(str::to_string).collect()
    }

    fn make_tree() -> TechTree {
        let module = |id: &str, label: &str| ModuleRecord {
            id: id.to_string(),
            label: label.to_string(),
            image: Some(format!("{id}.webp")),
            bonus: 0.5,
            value: 10.0,
            adjacency: true,
            sc_eligible: true,
        };
        let mut tree = TechTree::default();
        tree.categories.insert(
            "Weaponry".to_string(),
            vec![TechEntry {
                key: "pulse".to_string(),
                label: "Pulse Engine".to_string(),
                image: None,
                modules: vec![module("PE", "Pulse Engine"), module("Xa", "Sentinel Upgrade")],
            }],
        );
        tree
    }

    fn make_cache() -> CatalogCache {
        let source = StaticTechTreeSource::new().with_tree("standard", make_tree());
        CatalogCache::new(Arc::new(source))
    }

    // === Reference vectors ===

    #[test]
    fn test_empty_grid() {
        let grid = Grid::default();
        let token = serialize(&grid).unwrap();
        assert_eq!(token, "%7C%7C%7C%7C%7C");
        assert_eq!(decode_component(&token).unwrap(), "|||||");
    }

    #[test]
    fn test_single_cell() {
        let grid = Grid::from_rows(vec![vec![cell(true, true, Some("tech1"), Some("modA"), 1.0)]]);
        assert_eq!(
            fields(&grid),
            ["2", "\u{3}", "A", "T", "tech1:\u{3}", "modA:A"]
        );
    }

    #[test]
    fn test_shared_run() {
        let shared = cell(true, true, Some("techS"), Some("modS"), 1.0);
        let grid = Grid::from_rows(vec![vec![shared.clone(), shared]]);
        let f = fields(&grid);
        assert_eq!(f[0], "22");
        assert_eq!(f[1], "\u{3}2");
        assert_eq!(f[2], "A2");
        assert_eq!(f[3], "T2");
    }

    #[test]
    fn test_run_then_new_symbol() {
        let a = cell(true, true, Some("techA"), Some("modA"), 1.0);
        let b = cell(true, true, Some("techB"), Some("modB"), 1.0);
        let grid = Grid::from_rows(vec![vec![a.clone(), a, b]]);
        let f = fields(&grid);
        assert_eq!(f[0], "222");
        assert_eq!(f[1], "\u{3}2\u{4}");
        assert_eq!(f[2], "A2B");
        assert_eq!(f[3], "T3");
        assert_eq!(f[4], "techA:\u{3},techB:\u{4}");
        assert_eq!(f[5], "modA:A,modB:B");
    }

    #[test]
    fn test_mixed_rows_no_runs() {
        let grid = Grid::from_rows(vec![
            vec![
                cell(true, true, Some("t1"), Some("m1"), 1.0),
                cell(false, false, Some("t2"), Some("m2"), 0.0),
            ],
            vec![
                cell(true, false, Some("t1"), Some("m1"), 1.0),
                cell(false, true, Some("t2"), Some("m2"), 0.0),
            ],
        ]);
        let f = fields(&grid);
        assert_eq!(f[0], "2010");
        assert_eq!(f[1], "\u{3}\u{4}\u{3}\u{4}");
        assert_eq!(f[2], "ABAB");
        assert_eq!(f[3], "TFTF");
    }

    #[test]
    fn test_deterministic() {
        let grid = Grid::from_rows(vec![vec![
            cell(true, false, Some("hyper"), Some("HD"), 0.0),
            cell(true, true, Some("pulse"), Some("PE"), 2.0),
            cell(true, false, Some("hyper"), Some("Fa"), 0.0),
        ]]);
        assert_eq!(serialize(&grid), serialize(&grid.clone()));
        assert!(serialize(&grid).is_ok());
    }

    #[test]
    fn test_default_grid_size_token() {
        let grid = Grid::new(Dimensions::default());
        let f = fields(&grid);
        assert_eq!(f[0], "0".repeat(60));
        assert_eq!(f[1], " 60");
        assert_eq!(f[3], "F60");
        assert_eq!(f[4], "");
    }

    // === Structural decode ===

    #[test]
    fn test_empty_token() {
        assert_eq!(decode_structure("", Dimensions::default()), Ok(None));
    }

    #[test]
    fn test_wrong_field_count() {
        let dims = Dimensions::new(1, 1);
        for wire in ["2|\u{3}|A|T|t:\u{3}", "2|\u{3}|A|T|t:\u{3}|m:A|extra", "garbage"] {
            let token = encode_component(wire);
            assert!(matches!(
                decode_structure(&token, dims),
                Err(DecodeError::FieldCount { .. })
            ));
        }
    }

    #[test]
    fn test_length_mismatch() {
        let dims = Dimensions::new(2, 1);
        let short_grid = encode_component("2| 2| 2|F2||");
        assert_eq!(
            decode_structure(&short_grid, dims),
            Err(DecodeError::LengthMismatch { field: "grid", expected: 2, actual: 1 })
        );

        let long_bonus = encode_component("22| 2| 2|F3||");
        assert_eq!(
            decode_structure(&long_bonus, dims),
            Err(DecodeError::LengthMismatch { field: "bonus", expected: 2, actual: 3 })
        );
    }

    #[test]
    fn test_bad_percent_encoding() {
        assert!(matches!(
            decode_structure("%7C%7G", Dimensions::default()),
            Err(DecodeError::InvalidPercentEncoding { .. })
        ));
    }

    #[test]
    fn test_token_too_long() {
        let token = "a".repeat(MAX_TOKEN_LEN + 1);
        assert!(matches!(
            decode_structure(&token, Dimensions::default()),
            Err(DecodeError::TokenTooLong { .. })
        ));
    }

    #[test]
    fn test_unknown_code_resolves_to_none() {
        let token = encode_component("1|\u{5}|A|F||m:A");
        let grid = decode_structure(&token, Dimensions::new(1, 1)).unwrap().unwrap();
        let c = &grid.cells[0][0];
        assert!(c.active);
        assert_eq!(c.tech, None);
        assert_eq!(c.module.as_deref(), Some("m"));
    }

    #[test]
    fn test_inactive_supercharge_is_dropped() {
        let grid = Grid::from_rows(vec![vec![cell(false, true, None, None, 0.0)]]);
        let decoded = decode_structure(&serialize(&grid).unwrap(), Dimensions::new(1, 1))
            .unwrap()
            .unwrap();
        assert!(!decoded.cells[0][0].supercharged);
        assert!(decoded.cells[0][0].same_structure(&grid.cells[0][0]));
    }

    #[test]
    fn test_many_techs_survive_roundtrip() {
        let dims = Dimensions::new(10, 6);
        let mut grid = Grid::new(dims);
        for (i, c) in grid.iter_mut().enumerate() {
            *c = cell(true, i % 7 == 0, Some(&format!("tech{i}")), Some(&format!("mod{i}")), 0.0);
        }
        let decoded = decode_structure(&serialize(&grid).unwrap(), dims).unwrap().unwrap();
        for (a, b) in grid.iter().zip(decoded.iter()) {
            assert!(a.same_structure(b), "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_unrepresentable_keys_are_rejected() {
        let cases = [
            (cell(true, false, Some("a,b"), None, 0.0), "tech", "a,b"),
            (cell(true, false, Some("a|b"), None, 0.0), "tech", "a|b"),
            (cell(true, false, Some(""), None, 0.0), "tech", ""),
            (cell(true, false, Some("pulse"), Some("P|E"), 0.0), "module", "P|E"),
        ];
        for (c, space, key) in cases {
            let grid = Grid::from_rows(vec![vec![c]]);
            assert_eq!(
                serialize(&grid),
                Err(EncodeError::InvalidKey { space, key: key.to_string() })
            );
        }
    }

    #[test]
    fn test_colon_key_roundtrip() {
        let grid = Grid::from_rows(vec![vec![cell(true, false, Some("ns:pulse:"), Some("PE"), 0.0)]]);
        let decoded = decode_structure(&serialize(&grid).unwrap(), Dimensions::new(1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.cells[0][0].tech.as_deref(), Some("ns:pulse:"));
    }

    // === Hydration ===

    #[test]
    fn test_hydrate_keeps_bonus_flag() {
        let mut grid = Grid::from_rows(vec![vec![cell(true, false, Some("pulse"), Some("PE"), 1.0)]]);
        let misses = hydrate(&mut grid, &TechCatalog::from_tree(&make_tree()));
        assert!(misses.is_empty());
        let c = &grid.cells[0][0];
        assert_eq!(c.label, "Pulse Engine");
        assert_eq!(c.image.as_deref(), Some("PE.webp"));
        assert_eq!(c.bonus, 0.5);
        assert_eq!(c.value, 10.0);
        assert!(c.adjacency && c.sc_eligible);
        assert_eq!(c.adjacency_bonus, 1.0);
    }

    #[test]
    fn test_hydrate_reports_missing_module() {
        let mut grid = Grid::from_rows(vec![vec![
            cell(true, false, Some("pulse"), Some("Zz"), 0.0),
            cell(true, false, Some("pulse"), Some("Xa"), 0.0),
            cell(true, false, Some("pulse"), None, 0.0),
        ]]);
        let misses = hydrate(&mut grid, &TechCatalog::from_tree(&make_tree()));
        assert_eq!(
            misses,
            vec![LookupMiss { index: 0, tech: "pulse".into(), module: "Zz".into() }]
        );
        assert_eq!(misses[0].code(), ErrorCode::Lookup);

        let missing = &grid.cells[0][0];
        assert_eq!(missing.tech.as_deref(), Some("pulse"));
        assert_eq!(missing.module.as_deref(), Some("Zz"));
        assert!(missing.label.is_empty());
        assert_eq!(grid.cells[0][1].label, "Sentinel Upgrade");
        assert!(grid.cells[0][2].label.is_empty());
    }

    // === Async decode ===

    #[test_log::test(tokio::test)]
    async fn test_deserialize_roundtrip() {
        let grid = Grid::from_rows(vec![vec![
            cell(true, true, Some("pulse"), Some("PE"), 3.0),
            cell(true, false, Some("pulse"), Some("Xa"), 0.0),
            cell(false, false, None, None, 0.0),
        ]]);
        let dims = Dimensions::new(3, 1);
        let cache = make_cache();

        let decoded = deserialize(&serialize(&grid).unwrap(), "standard", dims, &cache)
            .await
            .unwrap()
            .unwrap();

        for (a, b) in grid.iter().zip(decoded.iter()) {
            assert!(a.same_structure(b));
        }
        assert_eq!(decoded.cells[0][0].label, "Pulse Engine");
        assert_eq!(decoded.cells[0][0].adjacency_bonus, 1.0);
        assert_eq!(serialize(&decoded), serialize(&grid));
    }

    #[test_log::test(tokio::test)]
    async fn test_deserialize_partial_hydration() {
        let grid = Grid::from_rows(vec![vec![
            cell(true, false, Some("pulse"), Some("retired"), 0.0),
            cell(true, false, Some("pulse"), Some("PE"), 0.0),
        ]]);
        let decoded = deserialize(&serialize(&grid).unwrap(), "standard", Dimensions::new(2, 1), &make_cache())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decoded.cells[0][0].tech.as_deref(), Some("pulse"));
        assert!(decoded.cells[0][0].label.is_empty());
        assert_eq!(decoded.cells[0][1].label, "Pulse Engine");
    }

    #[test_log::test(tokio::test)]
    async fn test_deserialize_fetch_failure_is_fatal() {
        let grid = Grid::from_rows(vec![vec![cell(true, false, Some("pulse"), Some("PE"), 0.0)]]);
        let result = deserialize(&serialize(&grid).unwrap(), "freighter", Dimensions::new(1, 1), &make_cache()).await;
        assert!(matches!(result, Err(GridError::Catalog(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_deserialize_format_error_skips_fetch() {
        let cache = make_cache();
        let result = deserialize("%7C%7C", "freighter", Dimensions::default(), &cache).await;
        assert_eq!(result, Err(GridError::Decode(DecodeError::FieldCount { found: 3 })));
        assert_eq!(cache.status("freighter"), crate::catalog::FetchStatus::NotRequested);
    }

    #[test_log::test(tokio::test)]
    async fn test_deserialize_empty_token() {
        let result = deserialize("", "standard", Dimensions::default(), &make_cache()).await;
        assert_eq!(result, Ok(None));
    }

    // === Properties ===

    fn arb_cell() -> impl Strategy<Value = Cell> {
        (
            any::<bool>(),
            any::<bool>(),
            proptest::option::of("[a-z]{1,6}"),
            proptest::option::of("[A-Za-z]{1,4}"),
            prop_oneof![Just(0.0), Just(0.5), Just(2.0)],
        )
            .prop_map(|(active, supercharged, tech, module, bonus)| Cell {
                active,
                supercharged,
                tech,
                module,
                adjacency_bonus: bonus,
                ..Cell::default()
            })
    }

    proptest! {
        #[test]
        fn prop_structural_roundtrip(cells in proptest::collection::vec(arb_cell(), 60)) {
            let dims = Dimensions::default();
            let grid = Grid::from_rows(cells.chunks(dims.width).map(<[Cell]>::to_vec).collect());
            let token = serialize(&grid).unwrap();
            let decoded = decode_structure(&token, dims).unwrap().unwrap();
            for (a, b) in grid.iter().zip(decoded.iter()) {
                prop_assert!(a.same_structure(b));
            }
            prop_assert_eq!(serialize(&decoded).unwrap(), token);
        }
    }
}
