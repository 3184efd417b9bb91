use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use footmeasure::picker::{list_gallery, load_preview};

fn touch(dir: &Path, name: &str, age_secs: u64) {
    let file = File::create(dir.join(name)).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}

#[test]
fn test_gallery_lists_images_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "old.jpg", 300);
    touch(dir.path(), "new.PNG", 10);
    touch(dir.path(), "middle.jpeg", 100);
    touch(dir.path(), "notes.txt", 1);
    fs::create_dir(dir.path().join("album.jpg")).unwrap();

    let names: Vec<String> = list_gallery(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["new.PNG", "middle.jpeg", "old.jpg"]);
}

#[test]
fn test_gallery_missing_dir_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(list_gallery(&dir.path().join("missing")).is_err());
}

#[test]
fn test_preview_is_thumbnailed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foot.png");
    image::RgbaImage::from_pixel(1024, 512, image::Rgba([200, 180, 160, 255]))
        .save(&path)
        .unwrap();

    let preview = load_preview(&path, 256).unwrap();
    assert_eq!((preview.width(), preview.height()), (256, 128));
}

#[test]
fn test_preview_of_non_image_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foot.jpg");
    fs::write(&path, b"definitely not a jpeg").unwrap();
    assert!(load_preview(&path, 256).is_err());
}
