//! Display lists: immutable, replayable sequences of fixed-function draw
//! commands.

use std::num::NonZeroU32;

use asset::ObjModel;
use corelib::{IndexKind, LoadError, LoadResult, Vec2, Vec3};

use crate::backend::TextureHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Texture2D,
}

/// Front-face winding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Winding {
    #[default]
    Ccw,
    Cw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    /// Convex polygon, corners in drawing order.
    Polygon,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    Enable(Capability),
    Disable(Capability),
    FrontFace(Winding),
    BindTexture(TextureHandle),
    Begin(Primitive),
    Normal(Vec3),
    TexCoord(Vec2),
    Vertex(Vec3),
    End,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of `Begin`/`End` blocks.
    pub fn primitive_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Begin(_)))
            .count()
    }
}

impl<'a> IntoIterator for &'a DisplayList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Records commands; `begin`/`end` must pair and may not nest.
#[derive(Debug, Default)]
pub struct DisplayListBuilder {
    commands: Vec<DrawCommand>,
    open: Option<Primitive>,
}

impl DisplayListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, cap: Capability) -> &mut Self {
        self.commands.push(DrawCommand::Enable(cap));
        self
    }

    pub fn disable(&mut self, cap: Capability) -> &mut Self {
        self.commands.push(DrawCommand::Disable(cap));
        self
    }

    pub fn front_face(&mut self, winding: Winding) -> &mut Self {
        self.commands.push(DrawCommand::FrontFace(winding));
        self
    }

    pub fn bind_texture(&mut self, texture: TextureHandle) -> &mut Self {
        self.commands.push(DrawCommand::BindTexture(texture));
        self
    }

    pub fn begin(&mut self, primitive: Primitive) -> LoadResult<&mut Self> {
        if let Some(open) = self.open {
            return Err(LoadError::Backend(format!(
                "begin({primitive:?}) while {open:?} is still open"
            )));
        }
        self.open = Some(primitive);
        self.commands.push(DrawCommand::Begin(primitive));
        Ok(self)
    }

    /// Set the current normal.
    pub fn normal(&mut self, n: Vec3) -> &mut Self {
        self.commands.push(DrawCommand::Normal(n));
        self
    }

    /// Set the current texture coordinate.
    pub fn tex_coord(&mut self, uv: Vec2) -> &mut Self {
        self.commands.push(DrawCommand::TexCoord(uv));
        self
    }

    pub fn vertex(&mut self, position: Vec3) -> LoadResult<&mut Self> {
        if self.open.is_none() {
            return Err(LoadError::Backend("vertex outside begin/end".into()));
        }
        self.commands.push(DrawCommand::Vertex(position));
        Ok(self)
    }

    pub fn end(&mut self) -> LoadResult<&mut Self> {
        if self.open.take().is_none() {
            return Err(LoadError::Backend("end without begin".into()));
        }
        self.commands.push(DrawCommand::End);
        Ok(self)
    }

    pub fn finish(self) -> LoadResult<DisplayList> {
        if let Some(open) = self.open {
            return Err(LoadError::Backend(format!("{open:?} left open")));
        }
        Ok(DisplayList {
            commands: self.commands,
        })
    }
}

/// Record every face of `model` as a textured polygon.
///
/// Corners are emitted in file order. A normal or texture coordinate is only
/// emitted for corners that reference one.
pub fn record_mesh(model: &ObjModel, texture: TextureHandle) -> LoadResult<DisplayList> {
    let mut list = DisplayListBuilder::new();
    list.enable(Capability::Texture2D).front_face(Winding::Ccw);

    for (face_no, face) in model.faces.iter().enumerate() {
        list.bind_texture(texture).begin(Primitive::Polygon)?;

        for (corner_no, corner) in face.corners.iter().enumerate() {
            let out_of_range = |kind: IndexKind, index: NonZeroU32, len: usize| {
                LoadError::IndexOutOfRange {
                    face: face_no,
                    corner: corner_no,
                    kind,
                    index: index.get(),
                    len,
                }
            };

            if let Some(ni) = corner.normal {
                let n = model
                    .normal(ni)
                    .ok_or_else(|| out_of_range(IndexKind::Normal, ni, model.normals.len()))?;
                list.normal(n);
            }
            if let Some(ti) = corner.texcoord {
                let uv = model
                    .texcoord(ti)
                    .ok_or_else(|| out_of_range(IndexKind::TexCoord, ti, model.texcoords.len()))?;
                list.tex_coord(uv);
            }
            let position = model.vertex(corner.vertex).ok_or_else(|| {
                out_of_range(IndexKind::Vertex, corner.vertex, model.vertices.len())
            })?;
            list.vertex(position)?;
        }

        list.end()?;
    }

    list.disable(Capability::Texture2D);
    list.finish()
}
