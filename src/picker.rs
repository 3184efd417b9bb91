use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use log::info;
use slint::{Rgba8Pixel, SharedPixelBuffer};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "heic"];

/// Single-selection image chooser. `Ok(None)` means the user cancelled.
pub trait ImagePicker {
    fn pick(&mut self) -> Result<Option<PathBuf>>;
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Native file dialog.
#[cfg(not(target_os = "android"))]
pub struct DialogPicker {
    start_dir: PathBuf,
}

#[cfg(not(target_os = "android"))]
impl DialogPicker {
    pub fn new(start_dir: PathBuf) -> Self {
        Self { start_dir }
    }
}

#[cfg(not(target_os = "android"))]
impl ImagePicker for DialogPicker {
    fn pick(&mut self) -> Result<Option<PathBuf>> {
        Ok(rfd::FileDialog::new()
            .set_title("Choose a foot photo")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .set_directory(&self.start_dir)
            .pick_file())
    }
}

/// Image files directly inside `dir`, newest first.
pub fn list_gallery(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = vec![];
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_image(&path) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push((modified, path));
    }
    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    info!("gallery {}: {} images", dir.display(), entries.len());
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

/// The choice made in the in-app gallery list.
pub struct GalleryChoice(Option<PathBuf>);

impl GalleryChoice {
    pub fn chosen(path: PathBuf) -> Self {
        Self(Some(path))
    }

    pub fn cancelled() -> Self {
        Self(None)
    }
}

impl ImagePicker for GalleryChoice {
    fn pick(&mut self) -> Result<Option<PathBuf>> {
        Ok(self.0.take())
    }
}

/// Decodes `path` into a thumbnail no larger than `max_side` pixels.
pub fn load_preview(path: &Path, max_side: u32) -> Result<SharedPixelBuffer<Rgba8Pixel>> {
    let image = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .thumbnail(max_side, max_side)
        .into_rgba8();
    Ok(SharedPixelBuffer::clone_from_slice(
        image.as_raw(),
        image.width(),
        image.height(),
    ))
}
