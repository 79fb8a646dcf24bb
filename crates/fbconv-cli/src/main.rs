//! fbconv - batch FB2 to MOBI/AZW3/EPUB conversion frontend

mod external;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use external::{CommandConverter, CommandCoverSync};
use fbconv_core::{
    collect_book_files, init_database, is_device_connected, ControllerCommand, ConvertService,
    CoverSync, Error, HistoryDb, NoopCoverSync, Result, Settings, SettingsDb, UiMessage,
};

#[derive(Parser)]
#[command(
    name = "fbconv",
    version,
    about = "Convert FB2 books and copy them to an e-reader"
)]
struct Cli {
    /// Book files or directories to convert (.fb2, .fb2.zip, .zip)
    inputs: Vec<PathBuf>,

    /// Output format: mobi, azw3 or epub
    #[arg(long)]
    format: Option<String>,

    /// Directory for converted files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write each converted file next to its source instead
    #[arg(long)]
    to_source_dir: bool,

    /// Conversion profile name
    #[arg(long)]
    profile: Option<String>,

    /// Hyphenation: yes, no or profile
    #[arg(long)]
    hyphens: Option<String>,

    /// Copy converted files to the device after conversion
    #[arg(long)]
    copy_to_device: bool,

    /// Documents directory on the device
    #[arg(long)]
    device_path: Option<PathBuf>,

    /// Generate cover thumbnails on the device
    #[arg(long)]
    sync_covers: bool,

    /// Conversion engine binary
    #[arg(long, default_value = "fb2c")]
    converter_cmd: String,

    /// Cover thumbnail tool binary
    #[arg(long)]
    cover_sync_cmd: Option<String>,

    /// Persist the effective settings for future runs
    #[arg(long)]
    save_settings: bool,

    /// Show the N most recent conversions and exit
    #[arg(long, value_name = "N")]
    history: Option<usize>,

    /// Report whether the configured device is connected and exit
    #[arg(long)]
    device_status: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(failed) if failed > 0 => std::process::exit(1),
        Ok(_) => {}
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    }
}

/// Returns the number of failed conversions.
fn run(cli: Cli) -> Result<usize> {
    let db = init_database()?;
    let mut settings = SettingsDb::load(&db)?;
    apply_overrides(&mut settings, &cli)?;

    if cli.device_status {
        let connected = is_device_connected(Path::new(&settings.device_path));
        println!(
            "device {}",
            if connected { "connected" } else { "not connected" }
        );
        return Ok(0);
    }

    if let Some(limit) = cli.history {
        for entry in HistoryDb::recent(&db, limit)? {
            println!(
                "{} {} {} -> {}",
                entry.finished_at,
                if entry.success { "ok  " } else { "fail" },
                entry.source,
                entry.destination.as_deref().unwrap_or("-"),
            );
        }
        return Ok(0);
    }

    if cli.save_settings {
        SettingsDb::save(&db, &settings)?;
        log::info!("settings saved");
        if cli.inputs.is_empty() {
            return Ok(0);
        }
    }

    let files = collect_book_files(&cli.inputs);
    if files.is_empty() {
        return Err(Error::InvalidInput(
            "no supported book files found (expected .fb2, .fb2.zip or .zip)".to_string(),
        ));
    }

    let converter = Arc::new(CommandConverter::new(cli.converter_cmd.clone()));
    let cover_sync: Arc<dyn CoverSync> = match &cli.cover_sync_cmd {
        Some(program) => Arc::new(CommandCoverSync::new(program.clone())),
        None => Arc::new(NoopCoverSync),
    };

    let (cmd_tx, cmd_rx) = async_channel::unbounded();
    let (ui_tx, ui_rx) = async_channel::unbounded();
    ConvertService::new(settings, converter, cover_sync)
        .with_database(db)
        .spawn(ui_tx, cmd_rx);

    // Ctrl-C cancels between items; the in-flight conversion finishes
    let cancel_tx = cmd_tx.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        let _ = cancel_tx.send_blocking(ControllerCommand::CancelBatch);
        eprintln!("cancelling after the current file...");
    }) {
        log::warn!("could not install Ctrl-C handler: {}", err);
    }

    cmd_tx.send_blocking(ControllerCommand::StartBatch { files })?;

    let mut failed = 0usize;
    loop {
        let msg = ui_rx
            .recv_blocking()
            .map_err(|e| Error::Channel(e.to_string()))?;
        match msg {
            UiMessage::BatchStarted { total } => {
                println!("converting {} file(s)", total);
            }
            UiMessage::ConvertBegin(source) => {
                println!("  converting {}", source.display());
            }
            UiMessage::ConvertDone(outcome) => {
                if outcome.success {
                    if let Some(dest) = &outcome.destination {
                        println!("    -> {}", dest.display());
                    }
                } else {
                    failed += 1;
                    println!("    failed: {}", outcome.source.display());
                }
            }
            UiMessage::ConvertFinished { converted, total } => {
                println!("converted {}/{} file(s)", converted, total);
            }
            UiMessage::CopyBegin(source) => {
                println!("  copying {}", source.display());
            }
            UiMessage::CopyFileDone(_) => {}
            UiMessage::CopyFinished { copied } => {
                println!("copied {} file(s) to device", copied);
            }
            UiMessage::BatchFinished => break,
            UiMessage::DeviceStatus(_) => {}
            UiMessage::Error(message) => {
                log::error!("{}", message);
                failed += 1;
            }
        }
    }

    let _ = cmd_tx.send_blocking(ControllerCommand::Shutdown);
    Ok(failed)
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) -> Result<()> {
    if let Some(format) = &cli.format {
        settings.output_format = format.parse()?;
    }
    if let Some(output_dir) = &cli.output_dir {
        settings.output_folder = output_dir.to_string_lossy().to_string();
        settings.convert_to_source_dir = false;
    }
    if cli.to_source_dir {
        settings.convert_to_source_dir = true;
    }
    if let Some(profile) = &cli.profile {
        settings.current_profile = profile.clone();
    }
    if let Some(hyphens) = &cli.hyphens {
        settings.hyphens = hyphens.parse()?;
    }
    if cli.copy_to_device {
        settings.copy_to_device = true;
    }
    if let Some(device_path) = &cli.device_path {
        settings.device_path = device_path.to_string_lossy().to_string();
    }
    if cli.sync_covers {
        settings.sync_covers = true;
    }
    Ok(())
}
