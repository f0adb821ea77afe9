use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use prize_wheel::{AppConfig, Job, Selection, SpeedLevel};

#[derive(Parser, Debug)]
#[command(name = "prize-wheel", version)]
struct Cli {
    /// Catalog JSON file (overrides `CATALOG_PATH`).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Render one MP4 (requires `ffmpeg`).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Bind address (overrides `HOST`).
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides `PORT`).
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
#[group(id = "winner", required = true, multiple = false)]
struct WinnerArgs {
    /// Catalog position of the winner.
    #[arg(long)]
    number: Option<u32>,

    /// Draw the winner at random.
    #[arg(long)]
    random: bool,
}

#[derive(Args, Debug)]
struct SpinArgs {
    #[command(flatten)]
    winner: WinnerArgs,

    /// Speed level (1-5).
    #[arg(long, default_value_t = 3)]
    speed: i64,

    /// Spin-phase duration in milliseconds.
    #[arg(long)]
    spin_duration: Option<u64>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    spin: SpinArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    spin: SpinArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prize_wheel=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("load configuration")?;
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }

    match cli.cmd {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Render(args) => cmd_render(&config, args),
        Command::Frame(args) => cmd_frame(&config, args),
    }
}

fn cmd_serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    runtime.block_on(prize_wheel::serve(config))
}

fn load(
    config: &AppConfig,
    spin: &SpinArgs,
) -> anyhow::Result<(prize_wheel::RenderAssets, Job)> {
    let catalog = prize_wheel::load_catalog(&config.catalog_path)?;
    let selection = match spin.winner.number {
        Some(number) => Selection::Manual { number },
        None => Selection::Random,
    };
    let entry = prize_wheel::resolve(&catalog, selection)?;
    tracing::info!(position = entry.position, caption = %entry.caption(), "winner");

    let assets = prize_wheel::RenderAssets::load(&config.assets, config.session.video.canvas)?;
    let job = Job {
        entry,
        speed: SpeedLevel::clamped(spin.speed),
        spin_duration_ms: spin.spin_duration,
    };
    Ok((assets, job))
}

fn cmd_render(config: &AppConfig, args: RenderArgs) -> anyhow::Result<()> {
    let (assets, job) = load(config, &args.spin)?;
    let session = &config.session;
    let scratch = session
        .scratch_dir
        .join(format!("cli-{}", std::process::id()));
    let cancel = CancellationToken::new();
    let mut sink =
        prize_wheel::make_sink(session.encoder, &session.encode, &scratch, &args.out, &cancel);

    let mut last = u8::MAX;
    let outcome = prize_wheel::generate(
        &session.video,
        &assets,
        &job,
        sink.as_mut(),
        &cancel,
        &mut |p: prize_wheel::Progress| {
            if p.progress / 10 != last / 10 {
                last = p.progress;
                eprintln!("{:>3}% {}", p.progress, p.message);
            }
        },
    )?;

    eprintln!(
        "wrote {} ({} frames, winner #{})",
        args.out.display(),
        outcome.frames,
        outcome.entry.position
    );
    Ok(())
}

fn cmd_frame(config: &AppConfig, args: FrameArgs) -> anyhow::Result<()> {
    let (assets, job) = load(config, &args.spin)?;
    let frame = prize_wheel::render_frame(
        &config.session.video,
        &assets,
        &job,
        prize_wheel::FrameIndex(args.frame),
    )?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.write_png(&args.out, config.session.encode.bg_rgba)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
