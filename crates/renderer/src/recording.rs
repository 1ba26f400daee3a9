//! Headless backend that keeps uploaded skins and compiled lists in memory.

use asset::{SkinImage, TextureFilter};
use corelib::{LoadError, LoadResult};

use crate::backend::{ListHandle, RenderBackend, TextureHandle};
use crate::display_list::{DisplayList, DrawCommand};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedTexture {
    pub width: u32,
    pub height: u32,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    textures: Vec<RecordedTexture>,
    lists: Vec<DisplayList>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&RecordedTexture> {
        self.textures.get(handle.slot())
    }

    pub fn list(&self, handle: ListHandle) -> Option<&DisplayList> {
        self.lists.get(handle.slot())
    }

    /// Commands of a compiled list, in recording order.
    pub fn replay(&self, handle: ListHandle) -> impl Iterator<Item = &DrawCommand> {
        self.list(handle).into_iter().flat_map(DisplayList::iter)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn upload_texture(&mut self, skin: &SkinImage, filter: TextureFilter) -> LoadResult<TextureHandle> {
        if !skin.is_valid() {
            return Err(LoadError::Backend(format!(
                "Refusing to upload {}x{} skin with {} bytes",
                skin.width,
                skin.height,
                skin.data.len()
            )));
        }
        let handle = TextureHandle::for_slot(self.textures.len())?;
        self.textures.push(RecordedTexture {
            width: skin.width,
            height: skin.height,
            min_filter: filter,
            mag_filter: filter,
            pixels: skin.data.clone(),
        });
        log::debug!("Recorded texture {:?} ({}x{})", handle, skin.width, skin.height);
        Ok(handle)
    }

    fn compile_list(&mut self, list: &DisplayList) -> LoadResult<ListHandle> {
        let handle = ListHandle::for_slot(self.lists.len())?;
        self.lists.push(list.clone());
        log::debug!("Recorded display list {:?} ({} commands)", handle, list.len());
        Ok(handle)
    }
}
