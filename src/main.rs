//! terrain-erosion CLI - fractal terrain with droplet erosion.
//!
//! Builds a planar height grid, fills it with fractal noise, erodes it and
//! writes PNG previews of the result.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use terrain_erosion::export::{
    export_grid_normal_map_png, export_grid_png, NormalMapOptions, PngExportOptions,
};
use terrain_erosion::pipeline::{ErosionStage, HeightmapStage, Pipeline, StageConfig};
use terrain_erosion::{ErosionConfig, FbmConfig, HeightBuffer, HeightGrid, PlaneConfig};

/// Fractal terrain generator with droplet erosion.
#[derive(Parser)]
#[command(name = "terrain-erosion")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and erode a terrain grid.
    Generate {
        #[command(flatten)]
        plane: PlaneArgs,

        #[command(flatten)]
        fbm: FbmArgs,

        #[command(flatten)]
        erosion: ErosionArgs,

        /// Skip the erosion pass.
        #[arg(long)]
        skip_erosion: bool,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "terrain")]
        name: String,

        /// Also export a normal map.
        #[arg(long)]
        normal_map: bool,
    },
    /// Show grid dimensions for a plane configuration.
    Info {
        #[command(flatten)]
        plane: PlaneArgs,
    },
}

#[derive(Args)]
struct PlaneArgs {
    /// Plane extent along x.
    #[arg(long, default_value = "100")]
    width: f32,

    /// Plane extent along z.
    #[arg(long, default_value = "100")]
    height: f32,

    /// Quads along x.
    #[arg(long, default_value = "100")]
    width_segments: u32,

    /// Quads along z.
    #[arg(long, default_value = "100")]
    height_segments: u32,
}

impl From<PlaneArgs> for PlaneConfig {
    fn from(args: PlaneArgs) -> Self {
        PlaneConfig {
            width: args.width,
            height: args.height,
            width_segments: args.width_segments,
            height_segments: args.height_segments,
        }
    }
}

#[derive(Args)]
struct FbmArgs {
    /// Number of noise octaves.
    #[arg(long, default_value = "8")]
    octaves: u32,

    /// Amplitude of the first octave.
    #[arg(long, default_value = "15")]
    amplitude: f32,

    /// Frequency multiplier per octave.
    #[arg(long, default_value = "2.0")]
    lacunarity: f32,

    /// Amplitude multiplier per octave.
    #[arg(long, default_value = "0.5")]
    gain: f32,

    /// World units per noise unit.
    #[arg(long, default_value = "100")]
    scale: f32,

    /// Height of a noise value of 1.
    #[arg(long, default_value = "10")]
    max_height: f32,

    /// Noise seed.
    #[arg(short, long, default_value = "seed")]
    seed: String,
}

impl From<FbmArgs> for FbmConfig {
    fn from(args: FbmArgs) -> Self {
        FbmConfig {
            octaves: args.octaves,
            amplitude: args.amplitude,
            lacunarity: args.lacunarity,
            gain: args.gain,
            scale: args.scale,
            max_height: args.max_height,
            seed: args.seed,
        }
    }
}

#[derive(Args)]
struct ErosionArgs {
    /// Number of droplets.
    #[arg(long, default_value = "1")]
    drops: u32,

    /// Seed for droplet start positions.
    #[arg(long, default_value = "seed")]
    erosion_seed: String,

    /// Initial sediment capacity per droplet.
    #[arg(long, default_value = "30")]
    capacity: f32,

    /// Erosion rate.
    #[arg(long, default_value = "1")]
    erosion_rate: f32,

    /// Deposition rate.
    #[arg(long, default_value = "1")]
    deposition_rate: f32,

    /// Evaporation rate (0-1].
    #[arg(long, default_value = "0.1")]
    evaporation_rate: f32,

    /// Step limit per droplet.
    #[arg(long, default_value = "10000")]
    max_steps: u32,
}

impl From<ErosionArgs> for ErosionConfig {
    fn from(args: ErosionArgs) -> Self {
        ErosionConfig {
            drop_count: args.drops,
            seed: args.erosion_seed,
            capacity: args.capacity,
            erosion_rate: args.erosion_rate,
            deposition_rate: args.deposition_rate,
            evaporation_rate: args.evaporation_rate,
            max_steps_per_drop: args.max_steps,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            plane,
            fbm,
            erosion,
            skip_erosion,
            output,
            name,
            normal_map,
        } => {
            run_generate(
                plane.into(),
                StageConfig {
                    fbm: fbm.into(),
                    erosion: erosion.into(),
                },
                skip_erosion,
                output,
                name,
                normal_map,
            );
        }
        Commands::Info { plane } => {
            run_info(&plane.into());
        }
    }
}

fn run_generate(
    plane: PlaneConfig,
    config: StageConfig,
    skip_erosion: bool,
    output: PathBuf,
    name: String,
    normal_map: bool,
) {
    if let Err(e) = config.fbm.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    println!("terrain-erosion");
    println!("===============");
    println!(
        "Grid: {}x{} segments over {}x{} units",
        plane.width_segments, plane.height_segments, plane.width, plane.height
    );
    println!("Noise seed: {:?}, erosion seed: {:?}", config.fbm.seed, config.erosion.seed);
    println!("Output: {}", output.display());

    let start = Instant::now();
    let mut grid = HeightGrid::plane(&plane);

    println!("\nRunning generation pipeline...");
    let erosion_stage = ErosionStage::new();
    let erosion_stats = erosion_stage.stats_handle();
    let mut pipeline = Pipeline::new(config);
    pipeline.add_stage(HeightmapStage);

    if !skip_erosion {
        pipeline.add_stage(erosion_stage);
        println!("Erosion enabled: {} drops", pipeline.config().erosion.drop_count);
    } else {
        println!("Erosion: SKIPPED");
    }

    pipeline
        .run_with_callbacks(
            &mut grid,
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

    println!("Generation completed in {:.2?}", start.elapsed());

    if let Some(stats) = erosion_stats.lock().ok().and_then(|s| s.clone()) {
        println!(
            "Erosion: {} drops, {} steps, eroded {:.4}, deposited {:.4}",
            stats.drops, stats.steps, stats.eroded, stats.deposited
        );
        println!(
            "  stops: {} basin, {} capacity, {} step limit",
            stats.basin_stops, stats.capacity_stops, stats.step_limit_stops
        );
    }

    let (min_h, max_h) = grid.height_range();
    println!("Height range: [{:.4}, {:.4}]", min_h, max_h);

    println!("\nExporting previews...");
    std::fs::create_dir_all(&output).unwrap_or_else(|e| {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    });

    let height_path = output.join(format!("{}_height.png", name));
    export_grid_png(&grid, &height_path, &PngExportOptions::auto_range(&grid)).unwrap_or_else(|e| {
        eprintln!("Error exporting PNG: {}", e);
        std::process::exit(1);
    });
    println!("  Exported {}", height_path.display());

    if normal_map {
        let normal_path = output.join(format!("{}_normal.png", name));
        export_grid_normal_map_png(&grid, &normal_path, &NormalMapOptions::default())
            .unwrap_or_else(|e| {
                eprintln!("Error exporting normal map: {}", e);
                std::process::exit(1);
            });
        println!("  Exported {}", normal_path.display());
    }

    println!("\nDone.");
}

fn run_info(plane: &PlaneConfig) {
    let grid = HeightGrid::plane(plane);
    println!("Grid Information");
    println!("================");
    println!("Row width: {} vertices", grid.row_width());
    println!("Rows: {}", grid.rows());
    println!("Vertices: {}", grid.vertex_count());
    println!(
        "Spacing: {:.4} x {:.4} units",
        plane.width / plane.width_segments.max(1) as f32,
        plane.height / plane.height_segments.max(1) as f32
    );
}
