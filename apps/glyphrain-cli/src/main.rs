use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, ensure};
use clap::{Args, Parser, Subcommand};
use glyphrain_assets::{DeferredLoader, FontLibrary, FontLoader, FsLoader, TextureLoader};
use glyphrain_common::{DeviceTier, Profile};
use glyphrain_render::{DebugTextRenderer, FrameOutcome, Viewport};
use glyphrain_rig::ViewEvent;
use glyphrain_stage::Stage;
use glyphrain_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glyphrain-cli", about = "Headless host for the falling glyph field")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print a device-tier profile as YAML
    Profile {
        /// standard or constrained
        #[arg(long, default_value = "standard")]
        tier: DeviceTier,
    },
    /// Run the field headlessly on a virtual clock
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding fonts/ and img/
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,
    /// YAML profile; overrides --tier and --user-agent
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Device tier to use when no profile file is given
    #[arg(long)]
    tier: Option<DeviceTier>,
    /// User agent to classify when neither a profile nor a tier is given
    #[arg(long)]
    user_agent: Option<String>,
    /// Virtual seconds to simulate
    #[arg(long, default_value = "5")]
    seconds: f64,
    /// Host frame callback rate
    #[arg(long, default_value = "60")]
    host_hz: f64,
    /// Simulated continuous scroll in pixels per second
    #[arg(long, default_value = "0")]
    scroll_speed: f32,
    #[arg(long, default_value = "1280")]
    width: u32,
    #[arg(long, default_value = "720")]
    height: u32,
    /// RNG seed for agent placement and swaps
    #[arg(long, default_value = "42")]
    seed: u64,
    /// Resolve asset loads on the next host tick instead of immediately
    #[arg(long)]
    deferred: bool,
    /// Print the last rendered text frame
    #[arg(long)]
    dump: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("glyphrain-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", glyphrain_common::crate_info());
            println!("assets: {}", glyphrain_assets::crate_info());
            println!("geometry: {}", glyphrain_geometry::crate_info());
            println!("scene: {}", glyphrain_scene::crate_info());
            println!("field: {}", glyphrain_field::crate_info());
            println!("render: {}", glyphrain_render::crate_info());
            println!("rig: {}", glyphrain_rig::crate_info());
            println!("stage: {}", glyphrain_stage::crate_info());
            println!("tools: {}", glyphrain_tools::crate_info());
        }
        Commands::Profile { tier } => {
            print!("{}", Profile::for_tier(tier).to_yaml()?);
        }
        Commands::Run(args) => run(args)?,
    }

    Ok(())
}

fn select_profile(args: &RunArgs) -> anyhow::Result<Profile> {
    if let Some(path) = &args.profile {
        return Profile::load(path).with_context(|| format!("loading profile {}", path.display()));
    }
    let tier = match (&args.tier, &args.user_agent) {
        (Some(tier), _) => *tier,
        (None, Some(ua)) => DeviceTier::from_user_agent(ua),
        (None, None) => DeviceTier::Standard,
    };
    Ok(Profile::for_tier(tier))
}

fn check_run_args(args: &RunArgs) -> anyhow::Result<()> {
    ensure!(
        args.host_hz.is_finite() && args.host_hz > 0.0,
        "--host-hz must be positive and finite"
    );
    ensure!(
        args.seconds.is_finite() && args.seconds >= 0.0,
        "--seconds must be finite and not negative"
    );
    ensure!(args.scroll_speed.is_finite(), "--scroll-speed must be finite");
    Ok(())
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    check_run_args(&args)?;

    let profile = select_profile(&args)?;
    let fs = FsLoader::new(&args.assets);
    tracing::info!(tier = %profile.tier, assets = %args.assets.display(), "starting headless run");

    if args.deferred {
        let library = FontLibrary::new(DeferredLoader::new(fs));
        host(&args, profile, &library, |l| l.loader().pump())
    } else {
        let library = FontLibrary::new(fs);
        host(&args, profile, &library, |_| 0)
    }
}

/// Drive one stage from a virtual frame clock until `--seconds` elapse.
fn host<L, P>(args: &RunArgs, profile: Profile, loader: &L, pump: P) -> anyhow::Result<()>
where
    L: FontLoader + TextureLoader,
    P: Fn(&L) -> usize,
{
    let viewport = Viewport::new(args.width, args.height);
    let mut stage = Stage::new(profile, DebugTextRenderer::new(), loader, viewport, args.seed)?;

    let callbacks = (args.seconds * args.host_hz).round() as u64;
    let report_every = (args.host_hz.round() as u64).max(1);
    let mut last_frame = None;
    let (mut created, mut swaps) = (0, 0);

    for i in 0..=callbacks {
        let now = Duration::from_secs_f64(i as f64 / args.host_hz);
        let settled = pump(loader);
        if settled > 0 {
            tracing::debug!(settled, "loads settled");
        }

        if args.scroll_speed != 0.0 {
            let offset = -(args.scroll_speed * now.as_secs_f32());
            stage.handle(ViewEvent::Scroll(offset));
        }

        let report = stage.update(now);
        created += report.created;
        swaps += report.swaps;

        if let FrameOutcome::Rendered { output, .. } = stage.frame(now) {
            last_frame = Some(output);
        }

        if i % report_every == 0 {
            tracing::info!("t={:.2}s {}", now.as_secs_f64(), SceneInspector::summary(&stage));
        }
    }

    let summary = SceneInspector::summary(&stage);
    println!("{summary}");
    println!("created={created} swaps={swaps}");
    let timer = stage.render_loop().timer();
    println!(
        "frame interval: avg={:.2}ms min={:.2}ms max={:.2}ms",
        timer.average().as_secs_f64() * 1000.0,
        timer.min().as_secs_f64() * 1000.0,
        timer.max().as_secs_f64() * 1000.0
    );

    if args.dump {
        if let Some(frame) = last_frame {
            print!("{frame}");
        }
    }

    Ok(())
}
