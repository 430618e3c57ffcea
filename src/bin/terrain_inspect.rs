//! Terrain Inspect - Headless Map Summary
//!
//! Loads every block of a map directory and prints its height range and
//! bounding box.
//!
//! Run with: `cargo run --bin terrain_inspect -- <map-dir> [editor.json]`
//!
//! Set `RUST_LOG=debug` for per-block load messages.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::error;

use tile_terrain_engine::terrain::block_file::list_blocks;
use tile_terrain_engine::{EditorConfig, TerrainEditor, TerrainError};

fn load_config(path: Option<&Path>) -> Result<EditorConfig, TerrainError> {
    match path {
        Some(path) => {
            let mut config = EditorConfig::load(path)?;
            if let Some(base) = path.parent() {
                config.resolve_paths(base);
            }
            Ok(config)
        }
        None => Ok(EditorConfig::default()),
    }
}

fn run(map_dir: &Path, config_path: Option<&Path>) -> Result<(), TerrainError> {
    let config = load_config(config_path)?;
    let mut editor = TerrainEditor::from_config(&config)?;
    let coords = list_blocks(map_dir)?;
    let loaded = editor.load_map(map_dir, coords)?;

    println!("=== {} ===", map_dir.display());
    println!("{loaded} blocks, cell size {}", config.terrain.cell_size);
    for block in editor.grid().blocks() {
        let coord = block.coord();
        let (low, high) = block.heights().range();
        let bounds = block.bounds();
        println!(
            "block ({:>3}, {:>3})  height {low:>9.3} .. {high:>9.3}  aabb [{:.1}, {:.1}, {:.1}] - [{:.1}, {:.1}, {:.1}]",
            coord.x, coord.y, bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
    }
    println!("{} textures resident", editor.grid().textures().len());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(map_dir) = args.next().map(PathBuf::from) else {
        eprintln!("usage: terrain_inspect <map-dir> [editor.json]");
        return ExitCode::FAILURE;
    };
    let config_path = args.next().map(PathBuf::from);

    match run(&map_dir, config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("terrain_inspect: {e}");
            ExitCode::FAILURE
        }
    }
}
