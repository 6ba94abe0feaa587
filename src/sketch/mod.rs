pub mod background;
pub mod composite;
pub mod export;
pub mod history;
pub mod loader;
pub mod messages;
pub mod model;
pub mod raster;
pub mod session;
pub mod snapshot;
pub mod surface;

pub use background::{BackgroundLibrary, BackgroundPreset, BackgroundRef, ImageSource};
pub use history::History;
pub use loader::DecodeMode;
pub use messages::SketchEvent;
pub use model::{BrushCap, Point, Rgba, ToolState};
pub use session::{Sketchbook, SketchbookConfig};
pub use snapshot::Snapshot;
