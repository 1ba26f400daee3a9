//! CPU-side model representation produced by the OBJ loader.

use std::num::NonZeroU32;

use corelib::{IndexKind, LoadError, LoadResult, Vec2, Vec3};

/// One polygon corner. Indices are 1-based as written in the file;
/// `None` means the attribute is absent for this corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceCorner {
    pub vertex: NonZeroU32,
    pub texcoord: Option<NonZeroU32>,
    pub normal: Option<NonZeroU32>,
}

impl FaceCorner {
    pub fn new(vertex: NonZeroU32, texcoord: Option<NonZeroU32>, normal: Option<NonZeroU32>) -> Self {
        Self {
            vertex,
            texcoord,
            normal,
        }
    }
}

/// Polygon face, corners in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Face {
    pub corners: Vec<FaceCorner>,
}

impl Face {
    pub fn new(corners: Vec<FaceCorner>) -> Self {
        Self { corners }
    }

    pub fn len(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    pub fn vertex_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.corners.iter().map(|c| c.vertex.get())
    }

    pub fn texture_indices(&self) -> impl Iterator<Item = Option<NonZeroU32>> + '_ {
        self.corners.iter().map(|c| c.texcoord)
    }

    pub fn normal_indices(&self) -> impl Iterator<Item = Option<NonZeroU32>> + '_ {
        self.corners.iter().map(|c| c.normal)
    }

    /// Texture indices in file form, `0` standing in for "absent".
    pub fn raw_texture_indices(&self) -> Vec<u32> {
        self.texture_indices().map(raw).collect()
    }

    /// Normal indices in file form, `0` standing in for "absent".
    pub fn raw_normal_indices(&self) -> Vec<u32> {
        self.normal_indices().map(raw).collect()
    }
}

fn raw(index: Option<NonZeroU32>) -> u32 {
    index.map_or(0, NonZeroU32::get)
}

/// Geometry as read from an OBJ file. Vertices and normals are already in
/// renderer axes (file Y and Z swapped).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjModel {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub faces: Vec<Face>,
}

impl ObjModel {
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(Face::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn vertex(&self, index: NonZeroU32) -> Option<Vec3> {
        lookup(&self.vertices, index)
    }

    pub fn normal(&self, index: NonZeroU32) -> Option<Vec3> {
        lookup(&self.normals, index)
    }

    pub fn texcoord(&self, index: NonZeroU32) -> Option<Vec2> {
        lookup(&self.texcoords, index)
    }

    /// Check every face index against the element counts.
    ///
    /// Faces may refer to elements declared later in the file, so this runs
    /// after the whole file has been read.
    pub fn validate(&self) -> LoadResult<()> {
        for (face_no, face) in self.faces.iter().enumerate() {
            for (corner_no, corner) in face.corners.iter().enumerate() {
                let checks = [
                    (IndexKind::Vertex, Some(corner.vertex), self.vertices.len()),
                    (IndexKind::TexCoord, corner.texcoord, self.texcoords.len()),
                    (IndexKind::Normal, corner.normal, self.normals.len()),
                ];
                for (kind, index, len) in checks {
                    if let Some(index) = index {
                        if index.get() as usize > len {
                            return Err(LoadError::IndexOutOfRange {
                                face: face_no,
                                corner: corner_no,
                                kind,
                                index: index.get(),
                                len,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[inline]
fn lookup<T: Copy>(items: &[T], index: NonZeroU32) -> Option<T> {
    items.get(index.get() as usize - 1).copied()
}
