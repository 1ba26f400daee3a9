//! Asset loading/parsers for the car model and its skins.
//! OBJ geometry is kept as face records (no re-indexing); skins are decoded
//! to RGBA8 ready for upload.

pub mod mesh;
pub mod obj;
pub mod skin;

pub use mesh::{Face, FaceCorner, ObjModel};
pub use obj::{ObjOptions, UnknownTagPolicy, load_obj_from_path, load_obj_from_reader, load_obj_from_str};
pub use skin::{DEFAULT_SKINS_DIR, SkinImage, TextureFilter, skin_path};
