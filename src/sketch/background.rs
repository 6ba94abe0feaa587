use anyhow::{Context, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    pub fn load(&self) -> Result<RgbaImage> {
        let decoded = match self {
            ImageSource::Path(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read background image {}", path.display()))?;
                image::load_from_memory(&bytes)
                    .with_context(|| format!("decode background image {}", path.display()))?
            }
            ImageSource::Bytes(bytes) => {
                image::load_from_memory(bytes).context("decode in-memory background image")?
            }
        };
        Ok(decoded.to_rgba8())
    }
}

/// Reference to one selectable background image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackgroundRef {
    name: Arc<str>,
    source: ImageSource,
}

impl BackgroundRef {
    pub fn new(name: impl Into<Arc<str>>, source: ImageSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn from_path(name: impl Into<Arc<str>>, path: impl AsRef<Path>) -> Self {
        Self::new(name, ImageSource::Path(path.as_ref().to_path_buf()))
    }

    pub fn from_bytes(name: impl Into<Arc<str>>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(name, ImageSource::Bytes(bytes.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundPreset {
    pub name: String,
    pub path: String,
}

pub fn default_presets() -> Vec<BackgroundPreset> {
    [("Birds", "Birds.png"), ("Cat", "cat.png"), ("Flower", "flower.png")]
        .into_iter()
        .map(|(name, file)| BackgroundPreset {
            name: name.to_owned(),
            path: format!("assets/backgrounds/{file}"),
        })
        .collect()
}

/// The fixed set of backgrounds plus every image decoded so far.
#[derive(Debug, Default)]
pub struct BackgroundLibrary {
    presets: Vec<BackgroundRef>,
    decoded: HashMap<BackgroundRef, Arc<RgbaImage>>,
}

impl BackgroundLibrary {
    pub fn new(presets: Vec<BackgroundRef>) -> Self {
        Self {
            presets,
            decoded: HashMap::new(),
        }
    }

    /// Relative preset paths resolve against `base_dir`.
    pub fn from_presets(presets: &[BackgroundPreset], base_dir: &Path) -> Self {
        Self::new(
            presets
                .iter()
                .map(|preset| {
                    let path = Path::new(&preset.path);
                    let path = if path.is_absolute() {
                        path.to_path_buf()
                    } else {
                        base_dir.join(path)
                    };
                    BackgroundRef::from_path(preset.name.as_str(), path)
                })
                .collect(),
        )
    }

    pub fn presets(&self) -> &[BackgroundRef] {
        &self.presets
    }

    pub fn get(&self, index: usize) -> Option<&BackgroundRef> {
        self.presets.get(index)
    }

    pub fn cached(&self, background: &BackgroundRef) -> Option<Arc<RgbaImage>> {
        self.decoded.get(background).cloned()
    }

    pub fn remember(&mut self, background: BackgroundRef, image: Arc<RgbaImage>) {
        self.decoded.insert(background, image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba(color));
        crate::sketch::snapshot::encode_png(&img).expect("encode")
    }

    #[test]
    fn bytes_source_decodes_to_rgba() {
        let background = BackgroundRef::from_bytes("dot", png_bytes([1, 2, 3, 255]));
        let img = background.source().load().expect("load");
        assert_eq!(img.get_pixel(1, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let background = BackgroundRef::from_path("missing", "/definitely/not/here.png");
        assert!(background.source().load().is_err());
    }

    #[test]
    fn relative_presets_resolve_against_base_dir() {
        let library = BackgroundLibrary::from_presets(&default_presets(), Path::new("/opt/sketch"));
        assert_eq!(library.presets().len(), 3);
        assert_eq!(library.get(2).map(|b| b.name()), Some("Flower"));
        assert_eq!(
            library.get(1).map(|b| b.source().clone()),
            Some(ImageSource::Path(PathBuf::from(
                "/opt/sketch/assets/backgrounds/cat.png"
            )))
        );
    }

    #[test]
    fn decoded_images_are_cached_by_reference() {
        let mut library = BackgroundLibrary::default();
        let background = BackgroundRef::from_bytes("dot", png_bytes([9, 9, 9, 255]));
        assert!(library.cached(&background).is_none());
        let image = Arc::new(background.source().load().expect("load"));
        library.remember(background.clone(), image);
        assert!(library.cached(&background).is_some());
    }
}
