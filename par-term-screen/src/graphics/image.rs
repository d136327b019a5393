//! Image and frame storage (spec §3 "Image", §4.4.6 "Animation").

use std::sync::Arc;

/// Opaque handle to a GPU texture, shared by refcount between an image and
/// its paused-rendering clone (spec §5 "Shared resources").
#[derive(Debug, Clone)]
pub struct TextureHandle(pub Arc<TextureSlot>);

#[derive(Debug)]
pub struct TextureSlot {
    pub width: u32,
    pub height: u32,
    /// Decoded RGBA bytes. The core owns pixels up to GPU upload; the
    /// actual upload call is a host/renderer concern outside this crate.
    pub rgba: Vec<u8>,
}

impl TextureHandle {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self(Arc::new(TextureSlot { width, height, rgba }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaBlend {
    /// Composite RGBA over RGB destination (no destination alpha).
    BlendOnOpaque,
    /// Composite RGBA over RGBA with proper alpha compositing.
    AlphaBlend,
}

/// One frame of a (possibly animated) image.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub is_opaque: bool,
    pub is_4byte_aligned: bool,
    pub alpha_blend: AlphaBlend,
    pub gap_ms: u32,
    pub bgcolor: [u8; 4],
    /// `None` for the root frame; otherwise the frame this one composites
    /// on top of (spec §4.4.6 "Coalesce").
    pub base_frame_id: Option<u32>,
    pub rgba: Vec<u8>,
    /// Cached fully-coalesced bitmap, populated lazily by
    /// [`super::animation::coalesce`].
    pub coalesced: Option<Vec<u8>>,
}

impl Frame {
    pub fn root(id: u32, width: u32, height: u32, rgba: Vec<u8>, is_opaque: bool) -> Self {
        Self {
            id,
            x: 0,
            y: 0,
            width,
            height,
            is_opaque,
            is_4byte_aligned: width % 4 == 0,
            alpha_blend: AlphaBlend::BlendOnOpaque,
            gap_ms: 0,
            bgcolor: [0, 0, 0, 0],
            base_frame_id: None,
            rgba,
            coalesced: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Stopped,
    Loading,
    Running,
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub state: AnimationState,
    pub current_frame_index: usize,
    pub current_frame_shown_at_ms: u64,
    pub current_loop: u32,
    pub max_loops: u32,
    pub total_duration_ms: u64,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            state: AnimationState::Stopped,
            current_frame_index: 0,
            current_frame_shown_at_ms: 0,
            current_loop: 0,
            max_loops: 0,
            total_duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub internal_id: u32,
    pub client_id: Option<u32>,
    pub client_number: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub frames: Vec<Frame>,
    pub animation: Animation,
    pub texture: Option<TextureHandle>,
    pub atime_ms: u64,
    pub payload_bytes: usize,
}

impl Image {
    pub fn new(internal_id: u32, width: u32, height: u32, root: Frame) -> Self {
        Self {
            internal_id,
            client_id: None,
            client_number: None,
            width,
            height,
            frames: vec![root],
            animation: Animation::default(),
            texture: None,
            atime_ms: 0,
            payload_bytes: 0,
        }
    }

    pub fn root_frame(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn frame(&self, id: u32) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn frame_mut(&mut self, id: u32) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id == id)
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.animation.current_frame_index.min(self.frames.len() - 1)]
    }
}
