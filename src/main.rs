//! wfc_terrain CLI - Binary terrain generator.
//!
//! Collapses a lattice of above/below vertices guided by layered noise and
//! triangulates the result with marching cubes.

use clap::{Parser, Subcommand, ValueEnum};
use std::time::Instant;

use wfc_terrain::geometry::GridDims;
use wfc_terrain::noise::NoiseConfig;
use wfc_terrain::pipeline::{Pipeline, StageConfig, CELL_SIZE_PARAM};
use wfc_terrain::solver::SolverConfig;
use wfc_terrain::terrain::Terrain;

/// Largest accepted grid extent on any axis.
const MAX_EXTENT: u32 = 80;

/// Worst-case triangle vertices emitted by one marching cell.
const MAX_VERTICES_PER_CELL: u64 = 15;

/// Binary terrain generator.
#[derive(Parser)]
#[command(name = "wfc_terrain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a terrain grid and triangulate its surface.
    Generate {
        /// Grid width in cells.
        #[arg(long, default_value = "16")]
        width: u32,

        /// Grid height in cells.
        #[arg(long, default_value = "16")]
        height: u32,

        /// Grid depth in cells.
        #[arg(long, default_value = "16")]
        depth: u32,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Noise preset the individual noise flags override.
        #[arg(long, default_value = "default")]
        preset: NoisePreset,

        /// Number of noise octaves (1-16).
        #[arg(long)]
        octaves: Option<u8>,

        /// Grid units covered by one unit of base noise.
        #[arg(long)]
        scale: Option<f32>,

        /// Amplitude decay per octave.
        #[arg(long)]
        persistence: Option<f32>,

        /// Frequency multiplier per octave.
        #[arg(long)]
        lacunarity: Option<f32>,

        /// Lock a solid floor with air directly above it.
        #[arg(long)]
        floor: bool,

        /// Forbid overhangs above the floor (implies --floor).
        #[arg(long)]
        no_overhang: bool,

        /// Flatten the lowest unlocked row of cells next to uneven neighbors.
        #[arg(long)]
        flatten: bool,

        /// World size of one cell in the output mesh.
        #[arg(long, default_value = "1.0")]
        cell_size: f32,
    },

    /// Display information about a grid configuration.
    Info {
        /// Grid width in cells.
        #[arg(long, default_value = "16")]
        width: u32,

        /// Grid height in cells.
        #[arg(long, default_value = "16")]
        height: u32,

        /// Grid depth in cells.
        #[arg(long, default_value = "16")]
        depth: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NoisePreset {
    /// Three octaves at scale 20.
    Default,
    /// Broad, low-frequency hills.
    RollingHills,
    /// Busy high-frequency terrain.
    Rugged,
}

impl NoisePreset {
    fn config(self, seed: u64) -> NoiseConfig {
        match self {
            NoisePreset::Default => NoiseConfig::with_seed(seed),
            NoisePreset::RollingHills => NoiseConfig::rolling_hills(seed),
            NoisePreset::Rugged => NoiseConfig::rugged(seed),
        }
    }
}

/// Noise flags given on the command line.
struct NoiseOverrides {
    octaves: Option<u8>,
    scale: Option<f32>,
    persistence: Option<f32>,
    lacunarity: Option<f32>,
}

/// Solver flags given on the command line.
struct SolverFlags {
    floor: bool,
    no_overhang: bool,
    flatten: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            width,
            height,
            depth,
            seed,
            preset,
            octaves,
            scale,
            persistence,
            lacunarity,
            floor,
            no_overhang,
            flatten,
            cell_size,
        } => {
            let dims = parse_dims(width, height, depth);
            run_generate(
                dims,
                seed,
                preset,
                NoiseOverrides {
                    octaves,
                    scale,
                    persistence,
                    lacunarity,
                },
                SolverFlags {
                    floor,
                    no_overhang,
                    flatten,
                },
                cell_size,
            );
        }
        Commands::Info { width, height, depth } => {
            run_info(parse_dims(width, height, depth));
        }
    }
}

/// Validates the extents and exits with an error message if they are unusable.
fn parse_dims(width: u32, height: u32, depth: u32) -> GridDims {
    for (axis, value) in [("Width", width), ("Height", height), ("Depth", depth)] {
        if value > MAX_EXTENT {
            eprintln!("Error: {} must be between 2 and {}", axis, MAX_EXTENT);
            std::process::exit(1);
        }
    }

    GridDims::new(width, height, depth).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

fn run_generate(
    dims: GridDims,
    seed: Option<u64>,
    preset: NoisePreset,
    overrides: NoiseOverrides,
    flags: SolverFlags,
    cell_size: f32,
) {
    if let Some(octaves) = overrides.octaves {
        if !(1..=16).contains(&octaves) {
            eprintln!("Error: Octaves must be between 1 and 16");
            std::process::exit(1);
        }
    }

    if let Some(scale) = overrides.scale {
        if !(scale.is_finite() && scale > 0.0) {
            eprintln!("Error: Scale must be positive");
            std::process::exit(1);
        }
    }

    if !(cell_size.is_finite() && cell_size > 0.0) {
        eprintln!("Error: Cell size must be positive");
        std::process::exit(1);
    }

    // Generate seed if not provided
    let seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    });

    let mut noise_config = preset.config(seed);
    if let Some(octaves) = overrides.octaves {
        noise_config.octaves = octaves;
    }
    if let Some(scale) = overrides.scale {
        noise_config.scale = scale;
    }
    if let Some(persistence) = overrides.persistence {
        noise_config.persistence = persistence;
    }
    if let Some(lacunarity) = overrides.lacunarity {
        noise_config.lacunarity = lacunarity;
    }

    println!("wfc_terrain - Binary Terrain Generator");
    println!("======================================");
    println!("Grid: {}x{}x{} cells", dims.width, dims.height, dims.depth);
    println!("Seed: {}", seed);
    println!(
        "Noise: {} octaves, scale {}, persistence {}, lacunarity {}",
        noise_config.octaves, noise_config.scale, noise_config.persistence, noise_config.lacunarity
    );

    let mut solver_config = if flags.no_overhang {
        println!("Constraints: seeded floor, no overhangs above it");
        SolverConfig::no_overhang_above_floor(dims)
    } else if flags.floor {
        println!("Constraints: seeded floor");
        SolverConfig::seeded_floor(dims)
    } else {
        SolverConfig::default()
    };
    if flags.flatten {
        println!(
            "Constraints: flatten cell row {}",
            solver_config.lowest_free_row(dims)
        );
        solver_config = solver_config.with_flattened_base(dims);
    }

    let start = Instant::now();

    let mut terrain = Terrain::new(dims, noise_config);
    let mut stage_config = StageConfig::default();
    stage_config.set_param(CELL_SIZE_PARAM, cell_size);

    println!("\nRunning generation pipeline...");
    Pipeline::standard(solver_config, stage_config)
        .run_with_callbacks(
            &mut terrain,
            |name, i, total| {
                println!("  [{}/{}] Starting: {}", i + 1, total, name);
            },
            |name, i, total| {
                println!("  [{}/{}] Completed: {}", i + 1, total, name);
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("Error during generation: {}", e);
            std::process::exit(1);
        });

    let gen_time = start.elapsed();
    println!("Generation completed in {:.2?}", gen_time);

    println!();
    if let Some(stats) = terrain.stats {
        println!("Solver:");
        println!("  Resolve calls:       {:>10}", stats.resolve_calls);
        println!("  Corners resolved:    {:>10}", stats.corners_resolved);
        println!("  Corners overwritten: {:>10}", stats.corners_overwritten);
        println!("  Corners locked:      {:>10}", stats.corners_locked);
    }
    println!("Solid nodes: {:.1}%", terrain.solid_fraction() * 100.0);
    if let Some(mesh) = &terrain.mesh {
        println!("Mesh: {} triangles, {} vertices", mesh.triangle_count(), mesh.vertex_count());
        if let Some((lo, hi)) = mesh.bounds() {
            println!(
                "Bounds: [{:.1}, {:.1}, {:.1}] .. [{:.1}, {:.1}, {:.1}]",
                lo.x, lo.y, lo.z, hi.x, hi.y, hi.z
            );
        }
    }
}

fn run_info(dims: GridDims) {
    let cells = dims.cell_count() as u64;
    let nodes = dims.node_count() as u64;
    let padded = dims.nodes() + 2;
    let field_nodes = padded.x as u64 * padded.y as u64 * padded.z as u64;
    let field_cells = (padded.x - 1) as u64 * (padded.y - 1) as u64 * (padded.z - 1) as u64;
    let max_vertices = field_cells * MAX_VERTICES_PER_CELL;

    println!("wfc_terrain - Grid Configuration Info");
    println!("=====================================");
    println!();
    println!("Grid: {}x{}x{} cells", dims.width, dims.height, dims.depth);
    println!();
    println!("Counts:");
    println!("  Solver cells:       {:>12}", cells);
    println!("  Solver vertices:    {:>12}", nodes);
    println!("  Heightfield nodes:  {:>12}", field_nodes);
    println!("  Heightfield cells:  {:>12}", field_cells);
    println!();
    println!("Mesh upper bound:");
    println!("  Vertices:  {:>12}", max_vertices);
    println!("  Triangles: {:>12}", max_vertices / 3);
    let bytes = max_vertices * 2 * 12 + max_vertices * 4;
    println!("  Memory:    {:>12} bytes ({:.2} MB)", bytes, bytes as f64 / 1024.0 / 1024.0);
}
