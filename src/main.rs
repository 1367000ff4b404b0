//! Statuary - posed-character bake and export tool
//!
//! Command-line driver over the core pipeline: loads a scene and a pose
//! document, poses the named character, freezes it, and writes the
//! resulting OBJ/MTL/TGA bundle to disk.

mod scene;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use statuary_export::PipelineOptions;
use statuary_rig::{NodeId, PoseSet, Renderer};

/// Statuary - bakes posed, skinned characters into static asset bundles
#[derive(Parser)]
#[command(name = "statuary")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pose a character, freeze it, and export the asset bundle
    Export(ExportArgs),

    /// Show information about a scene document
    Info(InfoArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Path to the scene document (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Path to the pose document (JSON)
    #[arg(short, long)]
    pose: PathBuf,

    /// Name of the scene node to bake
    #[arg(short, long)]
    root: String,

    /// Output directory for the bundle
    #[arg(short, long)]
    output: PathBuf,

    /// File name prefix for produced documents
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Args)]
struct InfoArgs {
    /// Path to the scene document (JSON)
    scene: PathBuf,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => cmd_export(args),
        Commands::Info(args) => cmd_info(args),
    }
}

fn load_pose(path: &PathBuf) -> Result<PoseSet> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read pose document {:?}", path))?;
    let poses: PoseSet = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse pose document {:?}", path))?;

    if poses.is_empty() {
        bail!("no posed bones in {:?}", path);
    }

    Ok(poses)
}

/// Find the first node with the given name across every tree in the scene
fn find_root(scene: &scene::LoadedScene, name: &str) -> Option<NodeId> {
    scene
        .hierarchy
        .roots()
        .into_iter()
        .find_map(|root| scene.hierarchy.find_by_name(root, name))
}

fn cmd_export(args: ExportArgs) -> Result<()> {
    info!("Loading scene: {:?}", args.scene);
    let mut scene = scene::load_scene(&args.scene)?;
    let poses = load_pose(&args.pose)?;

    let root = match find_root(&scene, &args.root) {
        Some(root) => root,
        None => bail!("could not find node {:?} in the scene", args.root),
    };

    let options = PipelineOptions { prefix: args.prefix };
    let bundle = statuary_export::run(&mut scene.hierarchy, root, &poses, &options)
        .context("bake pipeline failed")?;

    fs::create_dir_all(&args.output).context("failed to create output directory")?;

    for artifact in &bundle.artifacts {
        let path = args.output.join(&artifact.file_name);
        fs::write(&path, artifact.payload.bytes())
            .with_context(|| format!("failed to write {:?}", path))?;
        debug!("Wrote {:?}", path);
    }

    println!("Export complete:");
    println!("  Bones matched:    {}", bundle.bones_matched);
    println!("  Meshes baked:     {}", bundle.meshes_baked);
    println!("  Textures written: {}", bundle.textures_written);
    if bundle.textures_failed > 0 {
        println!("  Textures failed:  {}", bundle.textures_failed);
    }
    println!("  Files:            {}", bundle.artifacts.len());

    Ok(())
}

fn cmd_info(args: InfoArgs) -> Result<()> {
    let scene = scene::load_scene(&args.scene)?;

    let mut static_renderers = 0;
    let mut skinned_renderers = 0;
    let mut vertices = 0;

    for id in scene.hierarchy.ids() {
        match &scene.hierarchy.node(id).renderer {
            Some(Renderer::Static(source)) => {
                static_renderers += 1;
                vertices += source.vertex_count();
            }
            Some(Renderer::Skinned(source, _)) => {
                skinned_renderers += 1;
                vertices += source.vertex_count();
            }
            None => {}
        }
    }

    let textured = scene
        .materials
        .iter()
        .filter(|m| m.main_texture.is_some())
        .count();

    println!("Scene: {:?}", args.scene);
    println!("  Nodes:             {}", scene.hierarchy.len());
    println!("  Roots:             {}", scene.hierarchy.roots().len());
    println!("  Static renderers:  {}", static_renderers);
    println!("  Skinned renderers: {}", skinned_renderers);
    println!("  Total vertices:    {}", vertices);
    println!("  Materials:         {}", scene.materials.len());
    println!("  Textured:          {}", textured);

    Ok(())
}
