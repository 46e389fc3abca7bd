use clap::Parser;
use retrodiff::{
    logger::{self, LogLevel, LoggerConfig},
    Config, CostEstimationOrchestrator, DirectoryMediaStore, GenerationClient, GenerationParameters,
    GenerationSession, ModelStyle, PermissionedSaver, RawImage, SaveOutcome, StaticAuthorization,
};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Generate pixel art with Retro Diffusion and save it locally.
#[derive(Parser, Debug)]
#[command(name = "retrodiff", version, about = "Retro Diffusion pixel-art client")]
struct Args {
    /// Prompt words; joined with spaces.
    prompt: Vec<String>,

    /// Prompt style identifier, e.g. rd_fast__retro.
    #[arg(long, default_value_t = ModelStyle::Default)]
    style: ModelStyle,

    /// Output size as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size, default_value = "256x256")]
    size: (u32, u32),

    /// Reference image to pixelate instead of generating from the prompt.
    #[arg(long, value_name = "IMAGE")]
    input: Option<PathBuf>,
}

impl Args {
    fn prompt(&self) -> String {
        self.prompt.join(" ")
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {}", value))?;
    let width: u32 = w.parse().map_err(|e| format!("bad width {:?}: {}", w, e))?;
    let height: u32 = h.parse().map_err(|e| format!("bad height {:?}: {}", h, e))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be positive, got {}", value));
    }
    Ok((width, height))
}

fn log_styles() {
    log::info!("🎨 Available styles:");
    for style in ModelStyle::all() {
        log::info!("  {} - {}", style.identifier(), style.display_name());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(LoggerConfig::development().with_level(LogLevel::Debug))?;
    logger::log_startup_info("retrodiff", env!("CARGO_PKG_VERSION"));

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let prompt = args.prompt();
    if prompt.is_empty() && args.input.is_none() {
        log::warn!("⚠️  Nothing to do: pass a prompt or --input <IMAGE>");
        log_styles();
        return Ok(());
    }

    if !config.client.has_credentials() {
        log::error!(
            "❌ No API key. Set RETRO_DIFFUSION_API_KEY or RETRO_DIFFUSION_CUSTOM_API_KEY"
        );
        return Err("missing API key".into());
    }

    log::info!("🔄 Creating generation client...");
    let client = Arc::new(GenerationClient::new(config.client.clone())?);

    let image: RawImage = match &args.input {
        Some(path) => {
            log::info!(
                "🖼️  Pixelating {} with {}",
                path.display(),
                args.style.display_name()
            );
            let source = client.codec().decode_bytes(&std::fs::read(path)?)?;
            let result = client.pixelate(source, args.style).await?;
            if let Some(cost) = result.cost {
                log::info!("💰 Charged {}", cost);
            }
            result.image
        }
        None => {
            let params =
                GenerationParameters::new(prompt, args.style, args.size.0, args.size.1);

            let orchestrator =
                CostEstimationOrchestrator::new(Arc::clone(&client), &config.estimator);
            let mut states = orchestrator.subscribe();
            orchestrator.update(params.clone());

            log::info!("🔄 Checking cost...");
            let settled = states.wait_for(|state| !state.is_checking()).await?.clone();
            match settled.estimate() {
                Some(estimate) => log::info!("💰 Estimated cost: {}", estimate),
                None => log::warn!("⚠️  No estimate available, generating anyway"),
            }

            log::info!(
                "🎨 Generating \"{}\" at {}x{}...",
                params.prompt,
                params.width,
                params.height
            );
            let session = GenerationSession::new(Arc::clone(&client));
            let image = session.generate(&params, None).await?;
            if let Some(balance) = session.remaining_balance() {
                log::info!("💳 Remaining balance: {:.3}", balance);
            }
            (*image).clone()
        }
    };

    log::info!("✅ Received {}x{} image", image.width(), image.height());

    let output_dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
    let saver = PermissionedSaver::new(
        StaticAuthorization::granted(),
        DirectoryMediaStore::new(output_dir),
    );

    match saver.save(&image).await {
        SaveOutcome::Success => {
            if let Some(path) = saver.store().last_written() {
                log::info!("🎉 Done: {}", path.display());
            }
            Ok(())
        }
        SaveOutcome::Failure(e) => {
            log::error!("❌ {}", e);
            Err(e.into())
        }
    }
}
