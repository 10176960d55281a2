//! Application entry point: Truck Inspect.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line.
//! 3. Load [`AppConfig`] (defaults on first run; a file given with
//!    `--config` must parse).
//! 4. Create the [`tokio`] runtime (Ctrl-C watcher, image endpoint).
//! 5. Dispatch the subcommand:
//!    * `collect`: open the database, build the voice (or typed) prompter,
//!      run one inspection on the main thread, save it, write the PDF.
//!    * `serve-images`: serve `GET /image/{filename}` until Ctrl-C.
//!    * `register-image`: add a filename → path entry to the image catalog.
//!    * `init-config`: write a default `settings.toml`.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use truck_inspect::{
    app::{AppError, InspectionApp},
    audio::{ListenWindow, Microphone},
    config::{AppConfig, AppPaths},
    images::{self, ImageCatalog},
    session::{watch_interrupts, AbortHandle, SessionError, SessionEvent},
    speech::{speaker_from_config, ConsolePrompter, PromptListener, VoicePrompter},
    store::{SaveOutcome, SledStore},
    stt::{SttEngine, TranscribeParams, WhisperEngine},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(version, about = "Spoken-dialogue truck inspection")]
struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one inspection, save it and write the PDF report.
    Collect {
        /// Type answers instead of speaking them.
        #[arg(long, default_value_t = false)]
        typed: bool,

        /// Directory for the report (default: the data directory's `reports/`).
        #[arg(long, short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Serve registered inspection images over HTTP.
    ServeImages {
        /// Address to listen on (default from settings).
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Register an image file under a filename.
    RegisterImage {
        filename: String,
        path: PathBuf,
    },

    /// Write a settings file with every default spelled out.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Command line
    let cli = Cli::parse();
    let paths = AppPaths::new();
    let settings_file = cli
        .config
        .clone()
        .unwrap_or_else(|| paths.settings_file.clone());

    if let Command::InitConfig { force } = cli.command {
        return init_config(&settings_file, force);
    }

    // 3. Configuration
    let config = AppConfig::load_for_cli(&settings_file, cli.config.is_some())?;

    // 4. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    // 5. Dispatch
    match cli.command {
        Command::Collect { typed, output } => {
            let output = output.unwrap_or_else(|| paths.reports_dir.clone());
            collect(&config, &paths, &rt, typed, &output)
        }
        Command::ServeImages { bind } => {
            let bind = bind.unwrap_or_else(|| config.images.bind.clone());
            serve_images(&config, &paths, &rt, &bind)
        }
        Command::RegisterImage { filename, path } => {
            register_image(&config, &paths, &filename, &path)
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

fn open_store(config: &AppConfig, paths: &AppPaths) -> Result<SledStore> {
    let dir = config.database_dir(paths);
    SledStore::open_path(&dir).with_context(|| format!("opening database {}", dir.display()))
}

// ---------------------------------------------------------------------------
// collect
// ---------------------------------------------------------------------------

fn collect(
    config: &AppConfig,
    paths: &AppPaths,
    rt: &tokio::runtime::Runtime,
    typed: bool,
    output: &Path,
) -> Result<()> {
    let store = open_store(config, paths)?;

    // First Ctrl-C stops the session before its next attempt, the second
    // exits even while an answer is still being read.
    let abort = AbortHandle::new();
    {
        let abort = abort.clone();
        rt.spawn(async move {
            if watch_interrupts(&abort, tokio::signal::ctrl_c).await {
                log::warn!("Second interrupt received; exiting");
                std::process::exit(130);
            }
        });
    }

    let mut app = InspectionApp::new(store, config)?;
    let (mut prompter, voice) = build_prompter(config, paths, typed);

    // The console prompter echoes its own prompts; voice sessions get a
    // transcript on stdout.
    let mut printer = None;
    if voice {
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>();
        printer = Some(
            std::thread::Builder::new()
                .name("session-events".into())
                .spawn(move || print_events(event_rx))
                .context("spawning event printer")?,
        );
        app = app.with_events(event_tx);
    }

    let mut result = app.start_collection(&mut prompter, &abort).map(|_| ());
    while let Err(AppError::Session(SessionError::RetriesExhausted { field, .. })) = &result {
        let question = format!(
            "I still don't have the {}. Shall we try again?",
            field.to_lowercase()
        );
        if !agrees(prompter.as_mut(), &question) {
            break;
        }
        result = app.resume_collection(&mut prompter, &abort).map(|_| ());
    }
    result.context("collecting inspection")?;

    let receipt = app.save().context("saving inspection")?;
    app.store().flush()?;

    std::fs::create_dir_all(output)
        .with_context(|| format!("creating {}", output.display()))?;
    let report_path = output.join(&receipt.file_name);
    std::fs::write(&report_path, &receipt.report)
        .with_context(|| format!("writing {}", report_path.display()))?;

    let verb = match receipt.outcome {
        SaveOutcome::Inserted => "saved",
        SaveOutcome::Updated => "updated",
    };
    println!(
        "Inspection {} {verb}; report ({}) written to {}",
        receipt.inspection_id,
        receipt.mime,
        report_path.display()
    );

    drop(app);
    if let Some(printer) = printer {
        let _ = printer.join();
    }
    Ok(())
}

/// Voice prompter when the microphone and model are usable, typed otherwise.
/// The flag is `true` for voice.
fn build_prompter(
    config: &AppConfig,
    paths: &AppPaths,
    typed: bool,
) -> (Box<dyn PromptListener>, bool) {
    if !typed {
        match voice_prompter(config, paths) {
            Ok(prompter) => return (prompter, true),
            Err(e) => log::warn!("Voice input unavailable ({e:#}); falling back to typed answers"),
        }
    }
    let console = ConsolePrompter::new(
        std::io::stdin().lock(),
        std::io::stdout(),
        speaker_from_config(&config.speech),
    );
    (Box::new(console), false)
}

fn voice_prompter(config: &AppConfig, paths: &AppPaths) -> Result<Box<dyn PromptListener>> {
    let model_path = config.model_path(paths);
    let stt: Arc<dyn SttEngine> = Arc::new(
        WhisperEngine::load(&model_path, TranscribeParams::from(&config.stt))
            .with_context(|| format!("loading Whisper model {}", model_path.display()))?,
    );
    let microphone =
        Microphone::open(config.listen.device.as_deref()).context("opening microphone")?;
    log::info!(
        "Microphone ready ({} Hz, {} ch)",
        microphone.sample_rate(),
        microphone.channels()
    );

    Ok(Box::new(VoicePrompter::new(
        speaker_from_config(&config.speech),
        microphone,
        stt,
        ListenWindow::from(&config.listen),
    )))
}

fn agrees(prompter: &mut dyn PromptListener, question: &str) -> bool {
    prompter
        .prompt_and_listen(question)
        .usable_text()
        .map(|answer| answer.trim().to_lowercase())
        .is_some_and(|answer| answer.starts_with('y') || answer.starts_with("sure"))
}

fn print_events(rx: mpsc::Receiver<SessionEvent>) {
    for event in rx {
        match event {
            SessionEvent::Started { inspection_id } => {
                println!("Inspection {inspection_id}");
            }
            SessionEvent::Listening {
                prompt, attempt, ..
            } => {
                if attempt == 1 {
                    println!("  {prompt}");
                }
            }
            SessionEvent::Heard { text, .. } => println!("    You said: '{text}'"),
            SessionEvent::Retrying { reason, .. } => {
                println!("    ({reason}) Sorry, I didn't catch that.");
            }
            SessionEvent::SectionComplete { section } => println!("  {section} done"),
            SessionEvent::Complete => println!("All questions answered."),
        }
    }
}

// ---------------------------------------------------------------------------
// images
// ---------------------------------------------------------------------------

fn serve_images(
    config: &AppConfig,
    paths: &AppPaths,
    rt: &tokio::runtime::Runtime,
    bind: &str,
) -> Result<()> {
    let store = open_store(config, paths)?;
    let catalog = Arc::new(ImageCatalog::new(store.images_tree()?));
    log::info!("{} image(s) registered", catalog.len());

    rt.block_on(images::serve(bind, catalog, async {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("Shutting down image endpoint");
    }))?;
    Ok(())
}

fn register_image(config: &AppConfig, paths: &AppPaths, filename: &str, path: &Path) -> Result<()> {
    let image_path = std::fs::canonicalize(path)
        .with_context(|| format!("resolving {}", path.display()))?;
    let store = open_store(config, paths)?;
    let catalog = ImageCatalog::new(store.images_tree()?);
    catalog.register(filename, &image_path)?;
    println!("Registered {filename} → {}", image_path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// init-config
// ---------------------------------------------------------------------------

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let mut config = AppConfig::default();
    config.schedule = Some(config.schedule());
    config.save_to(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
