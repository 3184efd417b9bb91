#![allow(dead_code)]

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use footmeasure::analysis::{AnalysisError, AnalysisResult, AnalysisService, UploadImage};
use footmeasure::permission::{Permission, PermissionProbe};
use footmeasure::picker::ImagePicker;

pub fn sample_result() -> AnalysisResult {
    AnalysisResult {
        foot_length_mm: Some(250.0),
        foot_width_mm: Some(95.0),
        mm_per_pixel: Some(0.26),
        ..AnalysisResult::default()
    }
}

pub enum Reply {
    Success(AnalysisResult),
    Rejected,
}

/// Analysis service answering every call with the same reply.
pub struct FakeService {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
    uploaded: Mutex<Vec<UploadImage>>,
    gate: Option<Mutex<Receiver<()>>>,
}

impl FakeService {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            uploaded: Mutex::new(vec![]),
            gate: None,
        })
    }

    /// Each call blocks until the returned sender fires once.
    pub fn gated(reply: Reply) -> (Arc<Self>, Sender<()>) {
        let (sender, receiver) = channel();
        let service = Arc::new(Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            uploaded: Mutex::new(vec![]),
            gate: Some(Mutex::new(receiver)),
        });
        (service, sender)
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self) -> Vec<UploadImage> {
        self.uploaded.lock().unwrap().clone()
    }
}

impl AnalysisService for FakeService {
    fn analyze(&self, image: &UploadImage) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploaded.lock().unwrap().push(image.clone());
        if let Some(gate) = &self.gate {
            gate.lock().unwrap().recv().unwrap();
        }
        match &*self.reply.lock().unwrap() {
            Reply::Success(result) => Ok(result.clone()),
            Reply::Rejected => Err(AnalysisError::Status {
                status: 500,
                message: Some("A4 outline not found".to_string()),
            }),
        }
    }
}

/// Permission probe with a scripted answer.
pub struct FakeProbe {
    pub granted: Cell<bool>,
    pub rationale: Cell<bool>,
    pub fail: bool,
    pub requests: Cell<usize>,
}

impl FakeProbe {
    pub fn granted() -> Self {
        Self {
            granted: Cell::new(true),
            rationale: Cell::new(false),
            fail: false,
            requests: Cell::new(0),
        }
    }

    pub fn refused() -> Self {
        Self {
            granted: Cell::new(false),
            rationale: Cell::new(false),
            fail: false,
            requests: Cell::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            granted: Cell::new(false),
            rationale: Cell::new(false),
            fail: true,
            requests: Cell::new(0),
        }
    }
}

impl PermissionProbe for FakeProbe {
    fn check(&self, _permission: Permission) -> anyhow::Result<bool> {
        if self.fail {
            anyhow::bail!("no activity");
        }
        Ok(self.granted.get())
    }

    fn request(&self, _permission: Permission) -> anyhow::Result<()> {
        self.requests.set(self.requests.get() + 1);
        Ok(())
    }

    fn rationale(&self, _permission: Permission) -> anyhow::Result<bool> {
        Ok(self.rationale.get())
    }
}

/// Picker returning a fixed answer and counting how often it was opened.
pub struct CountingPicker {
    pub answer: Option<PathBuf>,
    pub opened: usize,
}

impl CountingPicker {
    pub fn choosing(path: &str) -> Self {
        Self {
            answer: Some(PathBuf::from(path)),
            opened: 0,
        }
    }

    pub fn cancelling() -> Self {
        Self {
            answer: None,
            opened: 0,
        }
    }
}

impl ImagePicker for CountingPicker {
    fn pick(&mut self) -> anyhow::Result<Option<PathBuf>> {
        self.opened += 1;
        Ok(self.answer.clone())
    }
}
