use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use mirror_core::RunResultKind;
use mirror_logging::{mirror_error, mirror_info};

use crate::control::RunControl;
use crate::fetch::ChannelProgressSink;
use crate::pipeline::{MirrorConfig, MirrorPipeline, PipelineError};
use crate::EngineEvent;

/// A mirroring run on its own worker thread and Tokio runtime.
///
/// Progress arrives through [`EngineHandle::try_recv`]; the last event of a
/// run is always [`EngineEvent::Finished`].
pub struct EngineHandle {
    control: RunControl,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn start(config: MirrorConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let control = RunControl::new();
        let worker_control = control.clone();

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    mirror_error!("Failed to start async runtime: {}", err);
                    let _ = event_tx.send(EngineEvent::Finished {
                        result: RunResultKind::Failed(err.to_string()),
                        output_dir: None,
                    });
                    return;
                }
            };
            let sink = ChannelProgressSink::new(event_tx.clone());
            let pipeline = MirrorPipeline::new(config);
            let result = runtime.block_on(pipeline.run(&sink, &worker_control));

            let finished = match result {
                Ok(report) => {
                    mirror_info!(
                        "Run finished: {} pages, {} resources",
                        report.pages_written,
                        report.resources_downloaded
                    );
                    EngineEvent::Finished {
                        result: RunResultKind::Completed(report.summary()),
                        output_dir: Some(report.output_dir),
                    }
                }
                Err(PipelineError::Cancelled) => EngineEvent::Finished {
                    result: RunResultKind::Cancelled,
                    output_dir: None,
                },
                Err(err) => {
                    mirror_error!("Run failed: {}", err);
                    EngineEvent::Finished {
                        result: RunResultKind::Failed(err.to_string()),
                        output_dir: None,
                    }
                }
            };
            let _ = event_tx.send(finished);
        });

        Self {
            control,
            event_rx,
            worker: Some(worker),
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    /// The worker thread has exited; every event it sent is already queued.
    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(true, |worker| worker.is_finished())
    }

    /// Waits for the worker thread to exit.
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
