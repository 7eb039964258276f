//! DeepGuard backdrop viewer and one-shot analysis client.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::{Parser, Subcommand};
    use deepguard_viz::analysis::{self, HttpTransport, UploadFile, UploadSession, UploadState};
    use deepguard_viz::config::{AnalysisConfig, AppConfig, SceneKind};

    #[derive(Parser)]
    #[command(name = "deepguard-viz")]
    #[command(about = "Animated DeepGuard backdrop and media analysis client")]
    #[command(version)]
    struct Cli {
        #[command(subcommand)]
        command: Option<Commands>,

        /// Backdrop to show (mesh, network)
        #[arg(long, global = true)]
        scene: Option<SceneKind>,

        /// JSON configuration file
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        /// Fixed RNG seed
        #[arg(long)]
        seed: Option<u64>,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// Upload a media file and print the verdict as JSON
        Analyze {
            /// Image or video to analyze
            file: PathBuf,

            /// Override the service origin
            #[arg(long)]
            origin: Option<String>,
        },
    }

    pub fn main() -> anyhow::Result<()> {
        deepguard_viz::init_logging();
        let cli = Cli::parse();

        let mut config = match &cli.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(scene) = cli.scene {
            config.scene = scene;
        }
        if cli.seed.is_some() {
            config.seed = cli.seed;
        }

        match cli.command {
            Some(Commands::Analyze { file, origin }) => {
                if let Some(origin) = origin {
                    config.analysis.origin = origin;
                }
                cmd_analyze(&config.analysis, file)
            }
            None => deepguard_viz::run(config),
        }
    }

    fn cmd_analyze(config: &AnalysisConfig, path: PathBuf) -> anyhow::Result<()> {
        let mut session = UploadSession::new(config.max_upload_bytes);
        session
            .select(UploadFile::from_path(&path)?)
            .with_context(|| format!("cannot upload {}", path.display()))?;
        let Some(file) = session.begin() else {
            anyhow::bail!("no file selected");
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let transport = HttpTransport::new();
        let outcome = runtime.block_on(analysis::analyze(
            &transport,
            &config.endpoint(),
            &file,
            analysis::deadline(config.timeout()),
        ));

        if let Some(message) = session.finish(outcome) {
            anyhow::bail!(message);
        }
        let UploadState::Finished(result) = session.state() else {
            anyhow::bail!("analysis did not finish");
        };
        log::info!("{}: {}% likely fake ({:?})", result.verdict.headline(), result.fake_percent(), result.score_band());
        println!("{}", serde_json::to_string_pretty(result)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::main()
}

// The browser build starts from `run_web`.
#[cfg(target_arch = "wasm32")]
fn main() {}
