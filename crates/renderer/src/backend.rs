//! Graphics backend seam.
//!
//! Every call assumes the backend's context is current on the calling thread.
//! Resources live as long as the backend value; there is no release path.

use std::num::NonZeroU32;

use asset::{SkinImage, TextureFilter};
use corelib::{LoadError, LoadResult};

use crate::display_list::DisplayList;

/// Opaque texture handle. Never null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(NonZeroU32);

/// Opaque compiled display list handle. Never null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListHandle(NonZeroU32);

macro_rules! handle_impl {
    ($name:ident) => {
        impl $name {
            #[inline]
            pub fn from_raw(raw: NonZeroU32) -> Self {
                Self(raw)
            }

            #[inline]
            pub fn get(self) -> u32 {
                self.0.get()
            }

            /// Handle for the element stored at `slot` (0-based).
            pub(crate) fn for_slot(slot: usize) -> LoadResult<Self> {
                slot.checked_add(1)
                    .and_then(|n| u32::try_from(n).ok())
                    .and_then(NonZeroU32::new)
                    .map(Self)
                    .ok_or_else(|| {
                        LoadError::Backend(format!("Out of {} slots", stringify!($name)))
                    })
            }

            #[inline]
            pub(crate) fn slot(self) -> usize {
                self.0.get() as usize - 1
            }
        }
    };
}

handle_impl!(TextureHandle);
handle_impl!(ListHandle);

pub trait RenderBackend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Upload a decoded skin as a 2D texture.
    fn upload_texture(&mut self, skin: &SkinImage, filter: TextureFilter) -> LoadResult<TextureHandle>;

    /// Compile a recorded display list into a replayable unit.
    fn compile_list(&mut self, list: &DisplayList) -> LoadResult<ListHandle>;
}
