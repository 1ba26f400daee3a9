//! Object/skin loader: parse the car model, upload its skin and compile the
//! textured display list in one go.

use std::path::{Path, PathBuf};

use asset::{DEFAULT_SKINS_DIR, ObjModel, ObjOptions, SkinImage, TextureFilter, load_obj_from_path};
use corelib::{LoadResult, SkinColor};

use crate::backend::{ListHandle, RenderBackend, TextureHandle};
use crate::display_list::record_mesh;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Directory holding `skin{N}.BMP`.
    pub skins_dir: PathBuf,
    pub obj: ObjOptions,
    pub filter: TextureFilter,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            skins_dir: PathBuf::from(DEFAULT_SKINS_DIR),
            obj: ObjOptions::default(),
            filter: TextureFilter::Linear,
        }
    }
}

/// A loaded model with its skin uploaded and its faces compiled.
///
/// Immutable once built. The texture and display list belong to the backend
/// that created them and live as long as it does.
#[derive(Debug)]
pub struct Loader {
    model: ObjModel,
    color: SkinColor,
    texture: TextureHandle,
    mesh: ListHandle,
}

impl Loader {
    /// Load `path` with skin `color` (0..=6) using the default config.
    pub fn new<B: RenderBackend>(backend: &mut B, path: impl AsRef<Path>, color: i64) -> LoadResult<Self> {
        Self::with_config(backend, path, color, &LoaderConfig::default())
    }

    pub fn with_config<B: RenderBackend>(
        backend: &mut B,
        path: impl AsRef<Path>,
        color: i64,
        config: &LoaderConfig,
    ) -> LoadResult<Self> {
        // Validated before touching the filesystem.
        let color = SkinColor::new(color)?;
        let path = path.as_ref();

        let model = load_obj_from_path(path, &config.obj)?;

        let skin = SkinImage::load_for(&config.skins_dir, color)?;
        let texture = backend.upload_texture(&skin, config.filter)?;

        // Dangling face indices only surface once the skin is in place.
        model.validate()?;
        let list = record_mesh(&model, texture)?;
        let mesh = backend.compile_list(&list)?;

        log::info!(
            "Loaded {:?} with skin {} on {} backend: {} faces, {} commands",
            path,
            color,
            backend.name(),
            model.faces.len(),
            list.len()
        );

        Ok(Self {
            model,
            color,
            texture,
            mesh,
        })
    }

    pub fn model(&self) -> &ObjModel {
        &self.model
    }

    pub fn color(&self) -> SkinColor {
        self.color
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Compiled display list for the whole model.
    pub fn mesh(&self) -> ListHandle {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_list::{Capability, DrawCommand, Primitive, Winding};
    use crate::recording::RecordingBackend;
    use asset::skin_path;
    use corelib::{IndexKind, LoadError, vec3};

    const TRIANGLE: &str = "v 0.0 0.0 0.0\nv 1.0 0.0 0.0\nv 0.0 1.0 0.0\nf 1 2 3\n";

    /// Scratch directory with `model.obj` and a 2x2 skin for every color.
    struct Fixture {
        dir: PathBuf,
    }

    impl Fixture {
        fn new(name: &str, obj: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("livery-loader-{}-{}", std::process::id(), name));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("model.obj"), obj).unwrap();
            for color in SkinColor::ALL {
                image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]))
                    .save_with_format(skin_path(&dir, color), image::ImageFormat::Bmp)
                    .unwrap();
            }
            Self { dir }
        }

        fn model(&self) -> PathBuf {
            self.dir.join("model.obj")
        }

        fn config(&self) -> LoaderConfig {
            LoaderConfig {
                skins_dir: self.dir.clone(),
                ..Default::default()
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    #[test]
    fn loads_minimal_mesh_with_valid_color() {
        let fx = Fixture::new("minimal", TRIANGLE);
        let mut backend = RecordingBackend::new();
        let loader = Loader::with_config(&mut backend, fx.model(), 3, &fx.config()).unwrap();

        assert_eq!(loader.color().index(), 3);
        assert_eq!(loader.model().faces.len(), 1);
        assert!(loader.texture().get() > 0);
        assert!(loader.mesh().get() > 0);

        let texture = backend.texture(loader.texture()).unwrap();
        assert_eq!((texture.width, texture.height), (2, 2));
        assert_eq!(texture.min_filter, TextureFilter::Linear);
        assert_eq!(texture.mag_filter, TextureFilter::Linear);
        assert_eq!(&texture.pixels[0..4], &[10, 20, 30, 255]);

        let commands: Vec<DrawCommand> = backend.replay(loader.mesh()).copied().collect();
        assert_eq!(
            commands,
            vec![
                DrawCommand::Enable(Capability::Texture2D),
                DrawCommand::FrontFace(Winding::Ccw),
                DrawCommand::BindTexture(loader.texture()),
                DrawCommand::Begin(Primitive::Polygon),
                DrawCommand::Vertex(vec3(0.0, 0.0, 0.0)),
                DrawCommand::Vertex(vec3(1.0, 0.0, 0.0)),
                DrawCommand::Vertex(vec3(0.0, 0.0, 1.0)),
                DrawCommand::End,
                DrawCommand::Disable(Capability::Texture2D),
            ]
        );
    }

    #[test]
    fn every_color_in_range_loads() {
        let fx = Fixture::new("all-colors", TRIANGLE);
        let mut backend = RecordingBackend::new();
        for color in 0..=6 {
            Loader::with_config(&mut backend, fx.model(), color, &fx.config()).unwrap();
        }
        assert_eq!(backend.texture_count(), 7);
        assert_eq!(backend.list_count(), 7);
    }

    #[test]
    fn color_out_of_range_fails_before_io() {
        let mut backend = RecordingBackend::new();
        let missing = std::env::temp_dir().join("livery-loader-never-created.obj");
        for color in [-1, 7, 42] {
            match Loader::new(&mut backend, &missing, color) {
                Err(LoadError::InvalidArgument { color: c }) => assert_eq!(c, color),
                other => panic!("expected InvalidArgument, got {other:?}"),
            }
        }
        assert_eq!(backend.texture_count(), 0);
        assert_eq!(backend.list_count(), 0);
    }

    #[test]
    fn missing_mesh_is_io_error() {
        let fx = Fixture::new("missing-mesh", TRIANGLE);
        let mut backend = RecordingBackend::new();
        let err = Loader::with_config(&mut backend, fx.dir.join("nope.obj"), 0, &fx.config()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn missing_skin_is_io_error_without_upload() {
        let fx = Fixture::new("missing-skin", TRIANGLE);
        std::fs::remove_file(skin_path(&fx.dir, SkinColor::new(5).unwrap())).unwrap();
        let mut backend = RecordingBackend::new();
        let err = Loader::with_config(&mut backend, fx.model(), 5, &fx.config()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(backend.texture_count(), 0);
    }

    #[test]
    fn garbage_skin_is_decode_error_without_upload() {
        let fx = Fixture::new("garbage-skin", TRIANGLE);
        std::fs::write(skin_path(&fx.dir, SkinColor::new(2).unwrap()), b"BM not really").unwrap();
        let mut backend = RecordingBackend::new();
        let err = Loader::with_config(&mut backend, fx.model(), 2, &fx.config()).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }), "got {err:?}");
        assert_eq!(backend.texture_count(), 0);
        assert_eq!(backend.list_count(), 0);
    }

    #[test]
    fn missing_skin_reported_before_dangling_index() {
        let fx = Fixture::new("dangling-no-skin", "v 0 0 0\nf 1 2 3\n");
        let mut backend = RecordingBackend::new();
        let config = LoaderConfig {
            skins_dir: fx.dir.join("no-skins-here"),
            ..Default::default()
        };
        let err = Loader::with_config(&mut backend, fx.model(), 0, &config).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn malformed_mesh_is_parse_error() {
        let fx = Fixture::new("malformed", "v 0.0 zero 0.0\n");
        let mut backend = RecordingBackend::new();
        let err = Loader::with_config(&mut backend, fx.model(), 0, &fx.config()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));
    }

    #[test]
    fn dangling_face_index_fails() {
        let fx = Fixture::new("dangling", "v 0 0 0\nv 1 0 0\nvt 0 0\nf 1/1 2/2 1/1\n");
        let mut backend = RecordingBackend::new();
        let err = Loader::with_config(&mut backend, fx.model(), 1, &fx.config()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::IndexOutOfRange {
                kind: IndexKind::TexCoord,
                index: 2,
                ..
            }
        ));
        assert_eq!(backend.list_count(), 0);
    }

    #[test]
    fn loads_bundled_car() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets");
        let config = LoaderConfig {
            skins_dir: root.join("skins"),
            ..Default::default()
        };
        let mut backend = RecordingBackend::new();
        let loader =
            Loader::with_config(&mut backend, root.join("models/car.obj"), 4, &config).unwrap();

        assert_eq!(loader.model().faces.len(), 10);
        assert_eq!(loader.model().corner_count(), 40);
        let texture = backend.texture(loader.texture()).unwrap();
        assert_eq!((texture.width, texture.height), (16, 16));
        assert_eq!(backend.list(loader.mesh()).unwrap().primitive_count(), 10);
    }
}
