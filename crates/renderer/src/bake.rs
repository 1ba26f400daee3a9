//! Replays a display list with fixed-function semantics and bakes its
//! polygons into a flat triangle list.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use corelib::{LoadError, LoadResult, Vec2, Vec3};

use crate::backend::TextureHandle;
use crate::display_list::{Capability, DisplayList, DrawCommand, Primitive, Winding};

/// Vertex: position + normal + uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BakedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Contiguous run of vertices drawn with the same texture state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub texture: Option<TextureHandle>,
    pub textured: bool,
    pub range: Range<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BakedMesh {
    pub vertices: Vec<BakedVertex>,
    pub batches: Vec<Batch>,
    pub front_face: Winding,
}

impl BakedMesh {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Current-attribute state, as left by the last command.
struct ReplayState {
    normal: Vec3,
    uv: Vec2,
    texture: Option<TextureHandle>,
    textured: bool,
    polygon: Option<Vec<BakedVertex>>,
}

impl Default for ReplayState {
    fn default() -> Self {
        Self {
            normal: Vec3::Z,
            uv: Vec2::ZERO,
            texture: None,
            textured: false,
            polygon: None,
        }
    }
}

pub fn bake(list: &DisplayList) -> LoadResult<BakedMesh> {
    let mut state = ReplayState::default();
    let mut mesh = BakedMesh::default();

    for command in list {
        match *command {
            DrawCommand::Enable(Capability::Texture2D) => state.textured = true,
            DrawCommand::Disable(Capability::Texture2D) => state.textured = false,
            DrawCommand::FrontFace(winding) => mesh.front_face = winding,
            DrawCommand::BindTexture(texture) => state.texture = Some(texture),
            DrawCommand::Begin(Primitive::Polygon) => {
                if state.polygon.is_some() {
                    return Err(LoadError::Backend("nested begin in display list".into()));
                }
                state.polygon = Some(Vec::new());
            }
            DrawCommand::Normal(n) => state.normal = n,
            DrawCommand::TexCoord(uv) => state.uv = uv,
            DrawCommand::Vertex(position) => {
                let polygon = state
                    .polygon
                    .as_mut()
                    .ok_or_else(|| LoadError::Backend("vertex outside begin/end".into()))?;
                polygon.push(BakedVertex {
                    position: position.to_array(),
                    normal: state.normal.to_array(),
                    uv: state.uv.to_array(),
                });
            }
            DrawCommand::End => {
                let polygon = state
                    .polygon
                    .take()
                    .ok_or_else(|| LoadError::Backend("end without begin".into()))?;
                emit_fan(&mut mesh, &polygon, state.texture, state.textured)?;
            }
        }
    }

    if state.polygon.is_some() {
        return Err(LoadError::Backend("display list ends inside begin/end".into()));
    }

    log::debug!(
        "Baked {} triangles in {} batches",
        mesh.triangle_count(),
        mesh.batches.len()
    );
    Ok(mesh)
}

/// Fan-triangulate a convex polygon; fewer than 3 corners draw nothing.
fn emit_fan(
    mesh: &mut BakedMesh,
    polygon: &[BakedVertex],
    texture: Option<TextureHandle>,
    textured: bool,
) -> LoadResult<()> {
    if polygon.len() < 3 {
        return Ok(());
    }

    let start = vertex_count(mesh)?;
    for tri in 1..(polygon.len() - 1) {
        mesh.vertices.push(polygon[0]);
        mesh.vertices.push(polygon[tri]);
        mesh.vertices.push(polygon[tri + 1]);
    }
    let end = vertex_count(mesh)?;

    match mesh.batches.last_mut() {
        Some(last) if last.texture == texture && last.textured == textured && last.range.end == start => {
            last.range.end = end;
        }
        _ => mesh.batches.push(Batch {
            texture,
            textured,
            range: start..end,
        }),
    }
    Ok(())
}

fn vertex_count(mesh: &BakedMesh) -> LoadResult<u32> {
    u32::try_from(mesh.vertices.len())
        .map_err(|_| LoadError::Backend(format!("Too many vertices in display list (>{})", u32::MAX)))
}
