use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use haunt_assembler::{HauntSession, ModelSlot, SceneConfig, place_graves};
use haunt_render::{DebugTextRenderer, Renderer, extract_frame};
use haunt_stream::AssetStreamer;
use haunt_tools::{FrameTimer, SceneInspector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "haunt-cli", about = "Inspect the haunted house scene without a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the scene configuration summary
    Info,
    /// Print the generated grave placements
    Graves {
        /// RNG seed for placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the assembled scene graph
    Dump {
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Load assets and run the frame loop for a number of frames
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Simulated frame rate
        #[arg(long, default_value = "60")]
        fps: f64,
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Asset root directory
        #[arg(long)]
        assets: Option<PathBuf>,
        /// How long to wait for loads before running frames, in seconds
        #[arg(long, default_value = "30")]
        load_timeout: u64,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn frame_step(fps: f64) -> anyhow::Result<Duration> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("--fps must be positive, got {fps}");
    }
    Duration::try_from_secs_f64(1.0 / fps)
        .with_context(|| format!("--fps {fps} gives no representable frame step"))
}

/// Simulated wall-clock time of `frame`, counted from `start`.
fn frame_instant(start: Instant, step: Duration, frame: u64) -> anyhow::Result<Instant> {
    Duration::try_from_secs_f64(step.as_secs_f64() * frame as f64)
        .ok()
        .and_then(|offset| start.checked_add(offset))
        .with_context(|| format!("frame {frame} at {step:?} per frame overflows the clock"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            let session = HauntSession::new(config, &mut StdRng::seed_from_u64(0), Instant::now())?;
            let config = &session.config;
            println!("haunt-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "assets: root={} textures=.{}",
                config.assets.root.display(),
                config.assets.texture_extension
            );
            println!(
                "graves: count={} radius=[{}, {})",
                config.graves.count, config.graves.min_radius, config.graves.max_radius
            );
            println!(
                "lights: ambient={} directional={} door={} shadow map={}",
                config.lights.ambient_intensity,
                config.lights.directional_intensity,
                config.house.door_light_intensity,
                config.lights.shadow.map_size
            );
            println!(
                "fog: color={} density={}",
                config.environment.fog.color.to_hex(),
                config.environment.fog.density
            );
            for slot in ModelSlot::ALL {
                let placement = slot.placement(config);
                println!(
                    "model {}: {} scale={}",
                    slot.key(),
                    config.asset_path(&placement.path).display(),
                    placement.scale
                );
            }
            println!("textures to load: {}", session.textures().len());
            let roots: Vec<String> = SceneInspector::list_roots(&session.scene)
                .into_iter()
                .map(|(_, name)| name)
                .collect();
            println!("roots: {}", roots.join(", "));
            println!("{}", SceneInspector::summary(&session.scene, &session.tracker, None));
        }
        Commands::Graves { seed, json } => {
            let graves = place_graves(&config.graves, &mut StdRng::seed_from_u64(seed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&graves)?);
            } else {
                println!("{} graves (seed {seed})", graves.len());
                for (i, g) in graves.iter().enumerate() {
                    println!(
                        "{i:>3}  angle={:.3} radius={:.3} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
                        g.angle,
                        g.radius,
                        g.position.x,
                        g.position.y,
                        g.position.z,
                        g.rotation.x,
                        g.rotation.y,
                        g.rotation.z
                    );
                }
            }
        }
        Commands::Dump { seed } => {
            let session =
                HauntSession::new(config, &mut StdRng::seed_from_u64(seed), Instant::now())?;
            let camera = session.config.camera.camera(16.0 / 9.0);
            print!("{}", DebugTextRenderer::collapsed().render(&session.scene, &camera));
        }
        Commands::Simulate {
            frames,
            fps,
            seed,
            assets,
            load_timeout,
        } => {
            let step = frame_step(fps)?;
            let start = Instant::now();
            frame_instant(start, step, frames)?;
            if let Some(root) = assets {
                config.assets.root = root;
            }

            let mut session = HauntSession::new(config, &mut StdRng::seed_from_u64(seed), start)?;
            let mut streamer = AssetStreamer::spawn()?;
            let requested = session.request_assets(&mut streamer)?;
            let events = streamer.wait_all(Duration::from_secs(load_timeout));
            let applied = session.apply_all(events);
            if applied < requested {
                tracing::warn!("{} loads still pending after timeout", requested - applied);
            }
            if !session.tracker.settled() {
                tracing::warn!("models not settled after {load_timeout}s");
            }

            let mut camera = session.config.camera.camera(16.0 / 9.0);
            let mut orbit = session.config.camera.orbit_controls();
            let mut timer = FrameTimer::default();
            for frame in 1..=frames {
                let tick = session.tick(frame_instant(start, step, frame)?, camera.position);
                timer.record(tick.delta);
                orbit.update(&mut camera);
            }

            let frame = extract_frame(&session.scene, &camera);
            println!(
                "Simulated {frames} frames at {fps} fps ({:.2}s)",
                session.frame_loop.clock().elapsed()
            );
            println!(
                "Loads: {applied}/{requested} finished, models settled={}, {:?}",
                session.tracker.settled(),
                session.tracker.counts()
            );
            println!(
                "Last frame: {} draws, {} instances, shadow={}",
                frame.draw_count(),
                frame.instance_count(),
                frame.shadow.is_some()
            );
            match timer.worst() {
                Some(worst) => println!("Measured: {:.1} fps, worst frame {worst:?}", timer.fps()),
                None => println!("Measured: no frames"),
            }
            println!(
                "{}",
                SceneInspector::summary(
                    &session.scene,
                    &session.tracker,
                    session.frame_loop.ghost()
                )
            );
        }
    }

    Ok(())
}
