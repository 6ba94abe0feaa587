use sketchbook::sketch::export::EXPORT_FILE_NAME;
use sketchbook::sketch::model::Rgba;
use sketchbook::sketch::{DecodeMode, Sketchbook, SketchbookConfig};
use tempfile::tempdir;

#[test]
fn save_png_writes_current_pixels() {
    let mut book = Sketchbook::new(SketchbookConfig {
        width: 24,
        height: 16,
        decode_mode: DecodeMode::Inline,
        ..SketchbookConfig::default()
    });
    book.set_color(Rgba::rgba(0, 0, 255, 255));
    book.pointer_down((2.0, 8.0));
    book.pointer_move((22.0, 8.0));
    book.pointer_up();

    let dir = tempdir().unwrap();
    let path = book
        .save_png(&dir.path().join("exports"), EXPORT_FILE_NAME)
        .unwrap();
    assert!(path.ends_with("exports/sketchbook.png"));

    let saved = image::open(&path).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), (24, 16));
    assert_eq!(saved.get_pixel(12, 8).0, [0, 0, 255, 255]);
    assert_eq!(saved.get_pixel(12, 0).0[3], 0);
    assert_eq!(&saved, book.surface().pixels());
}

#[test]
fn empty_surface_exports_no_bytes() {
    let book = Sketchbook::new(SketchbookConfig {
        decode_mode: DecodeMode::Inline,
        ..SketchbookConfig::default()
    });
    assert!(book.export_png().unwrap().is_empty());
}

#[test]
fn saving_an_empty_canvas_is_an_error() {
    let book = Sketchbook::new(SketchbookConfig {
        decode_mode: DecodeMode::Inline,
        ..SketchbookConfig::default()
    });
    let dir = tempdir().unwrap();
    assert!(book.save_png(dir.path(), EXPORT_FILE_NAME).is_err());
    assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
}
