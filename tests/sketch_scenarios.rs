use image::RgbaImage;
use sketchbook::sketch::background::{BackgroundLibrary, BackgroundRef};
use sketchbook::sketch::snapshot::encode_png;
use sketchbook::sketch::{DecodeMode, SketchEvent, Sketchbook, SketchbookConfig};

const SIZE: u32 = 40;
const FLOWER: [u8; 4] = [230, 120, 180, 255];

fn flower() -> BackgroundRef {
    let image = RgbaImage::from_pixel(SIZE, SIZE, image::Rgba(FLOWER));
    BackgroundRef::from_bytes("Flower", encode_png(&image).unwrap())
}

fn book() -> Sketchbook {
    Sketchbook::new(SketchbookConfig {
        width: SIZE,
        height: SIZE,
        backgrounds: BackgroundLibrary::new(vec![flower()]),
        decode_mode: DecodeMode::Inline,
        ..SketchbookConfig::default()
    })
}

fn stroke(book: &mut Sketchbook, y: f32) {
    book.pointer_down((5.0, y));
    book.pointer_move((20.0, y));
    book.pointer_move((35.0, y));
    book.pointer_up();
}

fn alpha_at(book: &Sketchbook, x: u32, y: u32) -> u8 {
    book.surface().pixels().get_pixel(x, y).0[3]
}

#[test]
fn stroke_then_clear_then_undo_returns_the_stroke() {
    let mut book = book();
    stroke(&mut book, 20.0);
    let drawn = book.current().cloned().unwrap();
    assert!(drawn.background().is_none());
    assert!(!drawn.is_blank().unwrap());

    book.clear();
    let cleared = book.current().unwrap();
    assert!(cleared.background().is_none());
    assert!(cleared.is_blank().unwrap());
    assert_eq!(alpha_at(&book, 20, 20), 0);

    assert!(book.undo());
    book.pump();
    assert_eq!(book.current(), Some(&drawn));
    assert_ne!(alpha_at(&book, 20, 20), 0);
}

#[test]
fn background_then_undo_returns_to_previous_background() {
    let mut book = book();
    stroke(&mut book, 20.0);

    assert!(book.select_background(0));
    // Nothing changes until the image has decoded.
    assert_eq!(book.history().len(), 1);
    book.pump();

    let current = book.current().unwrap();
    assert_eq!(current.background().map(|b| b.name()), Some("Flower"));
    assert_eq!(book.surface().pixels().get_pixel(0, 0).0, FLOWER);
    assert_eq!(book.surface().pixels().get_pixel(20, 20).0, FLOWER);

    assert!(book.undo());
    book.pump();
    assert!(book.surface().background().is_none());
    assert_eq!(alpha_at(&book, 0, 0), 0);
    assert_ne!(alpha_at(&book, 20, 20), 0);

    assert!(book.redo());
    book.pump();
    assert_eq!(book.surface().background().map(|b| b.name()), Some("Flower"));
    assert_eq!(book.surface().pixels().get_pixel(0, 0).0, FLOWER);
}

#[test]
fn undo_then_redo_everything_restores_last_commit() {
    let mut book = book();
    for y in [4.0, 12.0, 20.0, 28.0, 36.0] {
        stroke(&mut book, y);
    }
    let last = book.current().cloned().unwrap();
    let pixels = book.surface().pixels().clone();

    for _ in 0..4 {
        assert!(book.undo());
    }
    assert!(!book.undo());
    for _ in 0..4 {
        assert!(book.redo());
    }
    assert!(!book.redo());
    book.pump();

    assert_eq!(book.current(), Some(&last));
    assert_eq!(book.surface().pixels(), &pixels);
}

#[test]
fn commit_after_undo_discards_the_future() {
    let mut book = book();
    stroke(&mut book, 4.0);
    stroke(&mut book, 12.0);
    stroke(&mut book, 20.0);
    assert!(book.undo());
    book.pump();
    stroke(&mut book, 36.0);

    assert_eq!(book.history().len(), 3);
    assert!(!book.can_redo());
    assert_eq!(alpha_at(&book, 20, 20), 0);
    assert_ne!(alpha_at(&book, 20, 36), 0);
}

#[test]
fn undo_on_single_entry_is_a_no_op() {
    let mut book = book();
    assert!(!book.undo());
    stroke(&mut book, 20.0);
    book.drain_events();

    assert!(!book.undo());
    assert!(!book.redo());
    assert!(!book.pump());
    assert!(book.drain_events().is_empty());
    assert_eq!(book.history().cursor(), Some(0));
}

#[test]
fn eraser_leaves_transparent_pixels_over_a_background() {
    let mut book = book();
    book.select_background(0);
    book.pump();
    book.set_line_width(6);
    stroke(&mut book, 20.0);

    book.toggle_eraser();
    stroke(&mut book, 20.0);
    assert_eq!(book.surface().pixels().get_pixel(20, 20).0, [0, 0, 0, 0]);
    assert_eq!(book.surface().pixels().get_pixel(20, 2).0, FLOWER);
    assert_eq!(book.current().unwrap().background().map(|b| b.name()), Some("Flower"));
}

#[test]
fn history_changes_are_published() {
    let mut book = book();
    stroke(&mut book, 10.0);
    stroke(&mut book, 30.0);
    book.drain_events();

    book.undo();
    assert_eq!(
        book.drain_events(),
        vec![SketchEvent::HistoryChanged {
            can_undo: false,
            can_redo: true
        }]
    );
}

#[test]
fn drawing_right_after_undo_leaves_the_undone_stroke_out() {
    let mut book = book();
    stroke(&mut book, 4.0);
    stroke(&mut book, 12.0);
    assert!(book.undo());
    stroke(&mut book, 30.0);
    book.pump();

    let tip = book.current().unwrap().decode().unwrap();
    assert_ne!(tip.get_pixel(20, 4).0[3], 0);
    assert_eq!(tip.get_pixel(20, 12).0[3], 0);
    assert_ne!(tip.get_pixel(20, 30).0[3], 0);
    assert_eq!(book.surface().pixels(), &tip);
}

#[test]
fn drawing_right_after_resize_keeps_earlier_strokes() {
    let mut book = book();
    stroke(&mut book, 4.0);
    book.resize(60, 50);
    stroke(&mut book, 30.0);
    book.pump();

    assert_eq!(book.history().len(), 2);
    let tip = book.current().unwrap().decode().unwrap();
    assert_eq!(tip.dimensions(), (60, 50));
    assert_ne!(tip.get_pixel(20, 4).0[3], 0);
    assert_ne!(tip.get_pixel(20, 30).0[3], 0);
}
