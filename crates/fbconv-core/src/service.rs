//! Conversion service - bridges the worker queues with a UI main loop
//!
//! The service runs on its own thread and owns the batch state machine:
//! a conversion queue first, then, if copying is enabled, a device-copy
//! queue fed with the successfully converted files. Frontends talk to it
//! exclusively over channels; queue workers never touch UI state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::convert::{ConvertConfig, ConvertProcessor, Converter};
use crate::db::{Database, HistoryDb};
use crate::device::{is_device_connected, CopyProcessor, CoverSync};
use crate::queue::{JobQueue, QueueEvent};
use crate::types::{ConversionOutcome, CopyOutcome, Settings};

/// Commands sent from a frontend to the service (via async channel)
#[derive(Debug, Clone)]
pub enum ControllerCommand {
    /// Convert the given files, then copy to the device if enabled
    StartBatch { files: Vec<PathBuf> },
    /// Cooperatively cancel the running batch
    CancelBatch,
    /// Ask for the current device connection state
    QueryDeviceStatus,
    /// Shut the service down
    Shutdown,
}

/// Messages sent from the service to a frontend (via channel)
#[derive(Debug, Clone)]
pub enum UiMessage {
    /// A batch was accepted and its conversion queue started
    BatchStarted { total: usize },
    /// Conversion of one file began
    ConvertBegin(PathBuf),
    /// Conversion of one file finished, successfully or not
    ConvertDone(ConversionOutcome),
    /// The conversion phase finished
    ConvertFinished { converted: usize, total: usize },
    /// Copy of one file to the device began
    CopyBegin(PathBuf),
    /// Copy of one file finished. Deliberately carries no success flag;
    /// copy faults are logged, not surfaced per item.
    CopyFileDone(PathBuf),
    /// The copy phase finished
    CopyFinished { copied: usize },
    /// The whole batch is over; the frontend may re-enable its controls
    BatchFinished,
    /// Device connection state
    DeviceStatus(bool),
    /// Error message
    Error(String),
}

/// Events forwarded from queue workers into the service loop
enum WorkerEvent {
    Convert(QueueEvent<ConversionOutcome>),
    Copy(QueueEvent<CopyOutcome>),
}

enum Phase {
    Converting,
    Copying,
}

struct BatchState {
    queue: JobQueue,
    phase: Phase,
    total: usize,
    /// Destinations of successful conversions, input to the copy phase
    converted: Vec<PathBuf>,
    copied: usize,
    cancelled: bool,
}

/// Conversion service that runs in a separate thread with tokio
pub struct ConvertService {
    settings: Settings,
    converter: Arc<dyn Converter>,
    cover_sync: Arc<dyn CoverSync>,
    db: Option<Database>,
}

impl ConvertService {
    pub fn new(
        settings: Settings,
        converter: Arc<dyn Converter>,
        cover_sync: Arc<dyn CoverSync>,
    ) -> Self {
        Self {
            settings,
            converter,
            cover_sync,
            db: None,
        }
    }

    /// Record finished conversions into the history table
    pub fn with_database(mut self, db: Database) -> Self {
        self.db = Some(db);
        self
    }

    /// Spawn the service in a background thread.
    /// Takes the command receiver to process commands from the frontend.
    pub fn spawn(
        self,
        ui_sender: async_channel::Sender<UiMessage>,
        cmd_receiver: async_channel::Receiver<ControllerCommand>,
    ) {
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime");

            rt.block_on(self.run(ui_sender, cmd_receiver));
        });
    }

    async fn run(
        self,
        ui_sender: async_channel::Sender<UiMessage>,
        cmd_receiver: async_channel::Receiver<ControllerCommand>,
    ) {
        let (event_tx, event_rx) = async_channel::unbounded::<WorkerEvent>();
        let mut batch: Option<BatchState> = None;

        loop {
            tokio::select! {
                // Handle commands from the frontend
                cmd_result = cmd_receiver.recv() => {
                    match cmd_result {
                        Ok(ControllerCommand::Shutdown) => {
                            log::info!("Conversion service shutting down");
                            if let Some(state) = batch.take() {
                                state.queue.request_cancel();
                            }
                            break;
                        }
                        Ok(cmd) => {
                            self.handle_command(cmd, &mut batch, &event_tx, &ui_sender).await;
                        }
                        Err(_) => {
                            log::warn!("Command channel closed");
                            break;
                        }
                    }
                }

                // Handle events from queue workers
                event_result = event_rx.recv() => {
                    if let Ok(event) = event_result {
                        self.handle_worker_event(event, &mut batch, &event_tx, &ui_sender).await;
                    }
                }
            }
        }
    }

    async fn handle_command(
        &self,
        cmd: ControllerCommand,
        batch: &mut Option<BatchState>,
        event_tx: &async_channel::Sender<WorkerEvent>,
        ui_sender: &async_channel::Sender<UiMessage>,
    ) {
        match cmd {
            ControllerCommand::StartBatch { files } => {
                if batch.is_some() {
                    let _ = ui_sender
                        .send(UiMessage::Error(crate::error::Error::BatchRunning.to_string()))
                        .await;
                    return;
                }

                let config = ConvertConfig::from_settings(&self.settings);

                // Pre-flight: the queue itself never creates directories
                if let Some(output_dir) = &config.output_dir {
                    if !output_dir.is_dir() {
                        let _ = ui_sender
                            .send(UiMessage::Error(format!(
                                "output folder does not exist: {}",
                                output_dir.display()
                            )))
                            .await;
                        // A rejected batch never starts, so close its
                        // stream; frontends wait for this to re-enable
                        // controls or exit.
                        let _ = ui_sender.send(UiMessage::BatchFinished).await;
                        return;
                    }
                }

                let total = files.len();
                let processor = ConvertProcessor::new(config, self.converter.clone());
                let forward = event_tx.clone();
                let queue = JobQueue::start(files, processor, move |ev| {
                    let _ = forward.send_blocking(WorkerEvent::Convert(ev));
                });

                log::info!("Starting conversion batch of {} file(s)", total);
                let _ = ui_sender.send(UiMessage::BatchStarted { total }).await;

                *batch = Some(BatchState {
                    queue,
                    phase: Phase::Converting,
                    total,
                    converted: Vec::new(),
                    copied: 0,
                    cancelled: false,
                });
            }

            ControllerCommand::CancelBatch => {
                if let Some(state) = batch {
                    log::info!("Batch cancellation requested");
                    state.cancelled = true;
                    state.queue.request_cancel();
                }
            }

            ControllerCommand::QueryDeviceStatus => {
                let connected = is_device_connected(Path::new(&self.settings.device_path));
                let _ = ui_sender.send(UiMessage::DeviceStatus(connected)).await;
            }

            ControllerCommand::Shutdown => {
                // Handled in the main loop
            }
        }
    }

    async fn handle_worker_event(
        &self,
        event: WorkerEvent,
        batch: &mut Option<BatchState>,
        event_tx: &async_channel::Sender<WorkerEvent>,
        ui_sender: &async_channel::Sender<UiMessage>,
    ) {
        let Some(state) = batch else {
            // Late events from a queue of an already-finished batch
            return;
        };

        // Conversion and copy events never interleave: the copy queue only
        // starts after the conversion queue's final event.
        if matches!(event, WorkerEvent::Convert(_)) && !matches!(state.phase, Phase::Converting) {
            return;
        }

        match event {
            WorkerEvent::Convert(QueueEvent::JobBegin(source)) => {
                let _ = ui_sender.send(UiMessage::ConvertBegin(source)).await;
            }

            WorkerEvent::Convert(QueueEvent::JobDone(_, outcome)) => {
                if outcome.success {
                    if let Some(destination) = &outcome.destination {
                        state.converted.push(destination.clone());
                    }
                }
                if let Some(db) = &self.db {
                    if let Err(err) =
                        HistoryDb::append(db, &outcome, self.settings.output_format)
                    {
                        log::warn!("failed to record conversion history: {}", err);
                    }
                }
                let _ = ui_sender.send(UiMessage::ConvertDone(outcome)).await;
            }

            WorkerEvent::Convert(QueueEvent::AllDone) => {
                let converted = state.converted.len();
                let _ = ui_sender
                    .send(UiMessage::ConvertFinished {
                        converted,
                        total: state.total,
                    })
                    .await;

                if self.settings.copy_to_device && !state.cancelled {
                    let device_root = PathBuf::from(&self.settings.device_path);
                    if is_device_connected(&device_root) {
                        let processor = CopyProcessor::new(
                            device_root,
                            self.settings.sync_covers,
                            self.cover_sync.clone(),
                        );
                        let files = state.converted.clone();
                        let forward = event_tx.clone();
                        log::info!("Copying {} file(s) to device", files.len());
                        state.phase = Phase::Copying;
                        state.queue = JobQueue::start(files, processor, move |ev| {
                            let _ = forward.send_blocking(WorkerEvent::Copy(ev));
                        });
                        return;
                    }

                    let _ = ui_sender
                        .send(UiMessage::Error(
                            "error when copying files - device not found".to_string(),
                        ))
                        .await;
                }

                let _ = ui_sender.send(UiMessage::BatchFinished).await;
                *batch = None;
            }

            WorkerEvent::Copy(QueueEvent::JobBegin(source)) => {
                let _ = ui_sender.send(UiMessage::CopyBegin(source)).await;
            }

            WorkerEvent::Copy(QueueEvent::JobDone(source, outcome)) => {
                if matches!(outcome, CopyOutcome::Copied { .. }) {
                    state.copied += 1;
                }
                let _ = ui_sender.send(UiMessage::CopyFileDone(source)).await;
            }

            WorkerEvent::Copy(QueueEvent::AllDone) => {
                let _ = ui_sender
                    .send(UiMessage::CopyFinished {
                        copied: state.copied,
                    })
                    .await;
                let _ = ui_sender.send(UiMessage::BatchFinished).await;
                *batch = None;
            }
        }
    }
}
