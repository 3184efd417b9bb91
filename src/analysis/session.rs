use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{error, info, warn};

use super::{AnalysisError, AnalysisResult, AnalysisService, UploadImage};
use crate::permission::PermissionStatus;
use crate::picker::ImagePicker;

/// Shown for every failed upload, whatever the cause.
pub const FAILURE_ALERT: &str = "Analysis failed. Please try again.";

type Outcome = Result<AnalysisResult, AnalysisError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// Library access is not granted; the picker was never opened.
    NotAllowed,
    Cancelled,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStart {
    NoImage,
    Busy,
    Started,
    /// The worker could not be started; the failure alert is already raised.
    Failed,
}

/// State of the upload-analyze screen. At most one request is in flight,
/// gated by `loading`.
pub struct UploadSession {
    service: Arc<dyn AnalysisService>,
    image: Option<UploadImage>,
    loading: bool,
    result: Option<AnalysisResult>,
    alert: Option<&'static str>,
    pending: Option<Receiver<Outcome>>,
    task: Option<JoinHandle<()>>,
}

impl UploadSession {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            service,
            image: None,
            loading: false,
            result: None,
            alert: None,
            pending: None,
            task: None,
        }
    }

    pub fn image(&self) -> Option<&UploadImage> {
        self.image.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn take_alert(&mut self) -> Option<&'static str> {
        self.alert.take()
    }

    pub fn select(&mut self, path: impl Into<PathBuf>) {
        let image = UploadImage::new(path);
        info!("selected {}", image.path().display());
        self.image = Some(image);
    }

    pub fn pick_image(&mut self, access: PermissionStatus, picker: &mut dyn ImagePicker) -> PickOutcome {
        if access != PermissionStatus::Granted {
            warn!("picker not opened, library access is {access:?}");
            return PickOutcome::NotAllowed;
        }
        match picker.pick() {
            Ok(Some(path)) => {
                self.select(path);
                PickOutcome::Selected
            }
            Ok(None) => PickOutcome::Cancelled,
            Err(err) => {
                error!("image picker failed: {err:?}");
                PickOutcome::Cancelled
            }
        }
    }

    pub fn upload(&mut self) -> UploadStart {
        let Some(image) = self.image.clone() else {
            return UploadStart::NoImage;
        };
        if self.loading {
            return UploadStart::Busy;
        }
        self.loading = true;

        let (sender, receiver) = channel();
        let service = self.service.clone();
        let spawned = std::thread::Builder::new()
            .name("analysis-upload".to_string())
            .spawn(move || {
                let outcome = service.analyze(&image);
                // receiver gone means the screen was dropped
                let _ = sender.send(outcome);
            });
        match spawned {
            Ok(handle) => {
                self.pending = Some(receiver);
                self.task = Some(handle);
                UploadStart::Started
            }
            Err(err) => self.start_failed(err),
        }
    }

    fn start_failed(&mut self, err: std::io::Error) -> UploadStart {
        error!("could not start upload worker: {err}");
        self.settle(Err(AnalysisError::Io(err)));
        UploadStart::Failed
    }

    /// Applies the outcome of the in-flight request if it has arrived.
    /// Returns true when a request settled during this call.
    pub fn poll(&mut self) -> bool {
        let Some(receiver) = &self.pending else {
            return false;
        };
        let outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(AnalysisError::WorkerLost),
        };
        self.settle(outcome);
        true
    }

    /// Blocks until the in-flight request settles.
    pub fn wait(&mut self) {
        let Some(receiver) = &self.pending else {
            return;
        };
        let outcome = receiver.recv().unwrap_or(Err(AnalysisError::WorkerLost));
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: Outcome) {
        self.pending = None;
        if let Some(task) = self.task.take() {
            if task.join().is_err() {
                error!("upload worker panicked");
            }
        }
        self.loading = false;
        match outcome {
            Ok(result) => {
                info!("analysis result: {:?}", result.display_lines());
                self.result = Some(result);
            }
            Err(err) => {
                error!("analysis failed: {err}");
                self.result = None;
                self.alert = Some(FAILURE_ALERT);
            }
        }
    }
}
