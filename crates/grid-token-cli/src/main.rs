//! Command-line front end for grid share tokens.
//!
//! ```text
//! grid-token encode layout.json
//! grid-token decode <token> --ship standard --catalog tree.json
//! grid-token inspect <token>
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grid_token::{
    deserialize, serialize, CatalogCache, Config, Dimensions, Grid, HttpTechTreeSource,
    StaticTechTreeSource, TechTree, TechTreeSource, WireGrid,
};

#[derive(Parser, Debug)]
#[command(name = "grid-token", version, about = "Encode and decode grid share tokens")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Grid width (overrides the config)
    #[arg(long, global = true)]
    width: Option<usize>,

    /// Grid height (overrides the config)
    #[arg(long, global = true)]
    height: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token for a grid JSON file
    Encode { grid: PathBuf },
    /// Decode a token and print the hydrated grid as JSON
    Decode {
        token: String,
        /// Ship type whose tech tree hydrates the grid
        #[arg(long)]
        ship: Option<String>,
        /// Read the tech tree from a JSON file instead of the catalog service
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print the raw fields and symbol tables of a token
    Inspect { token: String },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mut config = config.with_env_overrides(|key| std::env::var(key).ok());
    if let Some(width) = cli.width {
        config.grid.width = width;
    }
    if let Some(height) = cli.height {
        config.grid.height = height;
    }
    Ok(config)
}

fn encode(config: &Config, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let grid: Grid = serde_json::from_str(&text).context("parsing grid JSON")?;
    let dims = grid.dimensions();
    if dims != config.grid {
        log::warn!(
            "grid is {}x{} but decoders expect {}x{}",
            dims.width,
            dims.height,
            config.grid.width,
            config.grid.height
        );
    }
    println!("{}", serialize(&grid)?);
    Ok(())
}

async fn decode(config: &Config, token: &str, ship: Option<String>, catalog: Option<PathBuf>) -> Result<()> {
    let ship_type = ship.unwrap_or_else(|| config.catalog.default_ship_type.clone());
    let source: Arc<dyn TechTreeSource> = match catalog {
        Some(path) => {
            let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let tree = TechTree::from_json(&text)?;
            Arc::new(StaticTechTreeSource::new().with_tree(ship_type.clone(), tree))
        }
        None => Arc::new(HttpTechTreeSource::new(&config.catalog)?),
    };
    let cache = CatalogCache::new(source);

    match deserialize(token, &ship_type, config.grid, &cache).await? {
        Some(grid) => println!("{}", serde_json::to_string_pretty(&grid)?),
        None => log::info!("empty token, nothing to decode"),
    }
    Ok(())
}

fn inspect(dims: Dimensions, token: &str) -> Result<()> {
    let Some(wire) = WireGrid::parse(token, dims)? else {
        println!("(empty token)");
        return Ok(());
    };

    println!("=== Streams ({}x{}) ===", dims.width, dims.height);
    for (name, stream) in [("grid", &wire.grid), ("tech", &wire.tech), ("module", &wire.module), ("bonus", &wire.bonus)] {
        println!("{name:>7}: {}", printable(stream));
    }

    println!("\n=== Tech table ({}) ===", wire.tech_table.len());
    for (key, code) in wire.tech_table.entries() {
        println!("  U+{:04X} {key}", *code as u32);
    }
    println!("\n=== Module table ({}) ===", wire.module_table.len());
    for (key, code) in wire.module_table.entries() {
        println!("  U+{:04X} {key}", *code as u32);
    }
    Ok(())
}

/// Replaces control characters so symbol streams stay readable.
fn printable(stream: &str) -> String {
    stream
        .chars()
        .map(|c| if c.is_control() { '·' } else { c })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Encode { grid } => encode(&config, &grid),
        Command::Decode { token, ship, catalog } => decode(&config, &token, ship, catalog).await,
        Command::Inspect { token } => inspect(config.grid, &token),
    }
}
