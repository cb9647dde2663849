use anyhow::Result;
use clap::Parser;
use homelab_hud::api::{self, ApiState};
use homelab_hud::{builtin_registry, FileConfigProvider, FrameExportSink, FramebufferSink, PlaceholderRenderer};
use homelab_hud_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use homelab_hud_core::{CollectorPool, ConfigProvider, CurrentSlidePublisher, SlideRenderer, SlideScheduler};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// homelab-hud - A rotating status display for homelab services
#[derive(Parser, Debug)]
#[command(name = "homelab-hud")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding slides.json and api_config.json
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Port for the status / preview API
    #[arg(short = 'p', long = "port", default_value_t = 8181)]
    port: u16,

    /// Write every frame as a PNG into this directory instead of a framebuffer
    #[arg(long = "export-frames", value_name = "DIR")]
    export_frames: Option<PathBuf>,

    /// Framebuffer device to draw on (e.g. /dev/fb0)
    #[arg(long = "framebuffer", value_name = "DEVICE")]
    framebuffer: Option<PathBuf>,

    /// Serve fixture data instead of contacting real services
    #[arg(long = "mock", env = "HUD_USE_MOCKS")]
    mock: bool,

    /// Display width in pixels
    #[arg(long = "width", default_value_t = DISPLAY_WIDTH)]
    width: u32,

    /// Display height in pixels
    #[arg(long = "height", default_value_t = DISPLAY_HEIGHT)]
    height: u32,

    /// List the built-in slide types and exit
    #[arg(short = 'l', long = "list-types")]
    list_types: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG overrides the CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting homelab-hud v{}", env!("CARGO_PKG_VERSION"));

    if cli.list_types {
        list_slide_types();
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(cli))
}

fn list_slide_types() {
    let registry = builtin_registry();
    println!("Built-in slide types ({}):", registry.len());
    for name in registry.list() {
        if let Some(slide_type) = registry.lookup(&name) {
            println!("  {:<18} {}", name, slide_type.display_name());
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let provider = match &cli.data_dir {
        Some(dir) => FileConfigProvider::new(dir),
        None => FileConfigProvider::from_project_dirs()?,
    };
    info!("Reading configuration from {}", provider.dir().display());
    if cli.mock {
        warn!("Mock mode: collectors return fixture data");
    }

    // The API previews slides through the scheduler's own pool and snapshot
    let config: Arc<dyn ConfigProvider> = Arc::new(provider);
    let registry = Arc::new(builtin_registry());
    let renderer: Arc<dyn SlideRenderer> = Arc::new(PlaceholderRenderer::new(cli.width, cli.height));
    let state = ApiState {
        publisher: CurrentSlidePublisher::new(),
        collectors: CollectorPool::new(),
        config: config.clone(),
        registry: registry.clone(),
        renderer: renderer.clone(),
        use_mocks: cli.mock,
    };

    let mut scheduler = SlideScheduler::new(config, registry, renderer)
        .with_publisher(state.publisher.clone())
        .with_pool(state.collectors.clone())
        .with_mocks(cli.mock);

    if let Some(dir) = &cli.export_frames {
        scheduler = scheduler.with_sink(Arc::new(FrameExportSink::new(dir)?));
    } else if let Some(device) = &cli.framebuffer {
        info!("Drawing on framebuffer {}", device.display());
        scheduler = scheduler.with_sink(Arc::new(FramebufferSink::new(device)));
    } else {
        warn!("No output configured; frames are only visible through /api/preview/current");
    }

    let running = scheduler.running_flag();
    let scheduler = Arc::new(scheduler);

    let display = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.run().await }
    });
    let mut status_api = tokio::spawn(api::serve(state, cli.port, running));

    let mut api_finished = false;
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            warn!("Shutting down");
        }
        result = &mut status_api => {
            api_finished = true;
            match result {
                Ok(Ok(())) => warn!("Status API stopped"),
                Ok(Err(e)) => error!("{:#}", e),
                Err(e) => error!("Status API task failed: {}", e),
            }
        }
    }

    scheduler.stop();
    if let Err(e) = display.await {
        error!("Display loop task failed: {}", e);
    }
    if !api_finished {
        if let Ok(Err(e)) = status_api.await {
            error!("{:#}", e);
        }
    }
    info!("Stopped");
    Ok(())
}
