//! Share links: reading and writing the token in a URL query string.
//!
//! A page reads `grid` plus `ship` (or `platform`) on load and on history
//! navigation, and writes them when the user shares. Loads can overlap, so
//! each one takes a ticket from a [`RequestSequencer`] and results from
//! superseded loads are discarded instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::catalog::CatalogCache;
use crate::codec::grid::{deserialize, serialize};
use crate::codec::percent::{decode_component, encode_component};
use crate::error::{DecodeError, EncodeError, GridError};
use crate::limits::{GRID_PARAM, PLATFORM_PARAM, SHIP_PARAM};
use crate::model::{Dimensions, Grid};

/// The query parameters a share link carries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShareParams {
    /// The token, as produced by [`serialize`].
    pub grid: Option<String>,
    pub ship: Option<String>,
    pub platform: Option<String>,
}

impl ShareParams {
    /// Parameters for sharing `grid` on `ship_type`.
    pub fn for_grid(grid: &Grid, ship_type: &str) -> Result<Self, EncodeError> {
        Ok(Self {
            grid: Some(serialize(grid)?),
            ship: Some(ship_type.to_string()),
            platform: None,
        })
    }

    /// Parses a query string (with or without a leading `?`).
    ///
    /// Unknown parameters are ignored; pairs that fail to decode are skipped.
    /// When a parameter repeats, the first occurrence wins.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let (Ok(key), Ok(value)) = (decode_query_part(key), decode_query_part(value)) else {
                log::debug!("skipping undecodable query pair {pair:?}");
                continue;
            };
            let slot = match key.as_str() {
                GRID_PARAM => &mut params.grid,
                SHIP_PARAM => &mut params.ship,
                PLATFORM_PARAM => &mut params.platform,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Writes the query string (without a leading `?`).
    pub fn to_query(&self) -> String {
        [
            (GRID_PARAM, &self.grid),
            (SHIP_PARAM, &self.ship),
            (PLATFORM_PARAM, &self.platform),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(|v| format!("{key}={}", encode_component(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
    }

    /// Ship type named by the link: `ship`, falling back to `platform`.
    pub fn ship_type(&self) -> Option<&str> {
        self.ship.as_deref().or(self.platform.as_deref())
    }
}

fn decode_query_part(part: &str) -> Result<String, DecodeError> {
    decode_component(&part.replace('+', " "))
}

/// Builds a share URL for `grid` on `ship_type` below `base_url`.
///
/// An existing query or fragment on `base_url` is replaced.
pub fn share_url(base_url: &str, grid: &Grid, ship_type: &str) -> Result<String, EncodeError> {
    let base = base_url
        .split(['?', '#'])
        .next()
        .unwrap_or(base_url);
    Ok(format!("{base}?{}", ShareParams::for_grid(grid, ship_type)?.to_query()))
}

/// Ticket identifying one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Hands out monotonically increasing tickets; only the newest is current.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding every earlier ticket.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns true if no request has started since `ticket`.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Result of loading a share link.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The link carries no token.
    Empty,
    /// The decoded, hydrated grid.
    Loaded(Grid),
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
}

/// Loads grids from share links, discarding results of superseded loads.
#[derive(Debug)]
pub struct GridLoader {
    catalog: Arc<CatalogCache>,
    dims: Dimensions,
    default_ship_type: String,
    sequencer: RequestSequencer,
}

impl GridLoader {
    pub fn new(catalog: Arc<CatalogCache>, dims: Dimensions, default_ship_type: impl Into<String>) -> Self {
        Self {
            catalog,
            dims,
            default_ship_type: default_ship_type.into(),
            sequencer: RequestSequencer::new(),
        }
    }

    /// Loads the grid named by a query string.
    pub async fn load_query(&self, query: &str) -> Result<LoadOutcome, GridError> {
        self.load(&ShareParams::from_query(query)).await
    }

    /// Loads the grid named by `params`.
    ///
    /// Errors of a superseded load are dropped along with its result.
    pub async fn load(&self, params: &ShareParams) -> Result<LoadOutcome, GridError> {
        let ticket = self.sequencer.begin();
        let token = params.grid.as_deref().unwrap_or_default();
        let ship_type = params.ship_type().unwrap_or(&self.default_ship_type);

        let result = deserialize(token, ship_type, self.dims, &self.catalog).await;
        if !self.sequencer.is_current(ticket) {
            log::debug!("discarding superseded grid load {ticket:?}");
            return Ok(LoadOutcome::Superseded);
        }
        Ok(match result? {
            Some(grid) => LoadOutcome::Loaded(grid),
            None => LoadOutcome::Empty,
        })
    }
}
