//! Wire-level `GraphicsCommand` and the transmission state machine that
//! assembles payload bytes into a decoded image (spec §4.4.1/§4.4.2).

use crate::error::{GraphicsError, GraphicsResult};
use std::collections::HashMap;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TransmitOnly,  // t
    TransmitAndPlace, // T
    Query,         // q
    Place,         // p
    Animation,     // a
    Frame,         // f
    Compose,       // c
    Delete,        // d
}

impl Action {
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            b't' => Self::TransmitOnly,
            b'T' => Self::TransmitAndPlace,
            b'q' => Self::Query,
            b'p' => Self::Place,
            b'a' => Self::Animation,
            b'f' => Self::Frame,
            b'c' => Self::Compose,
            b'd' => Self::Delete,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Rgb,
    Rgba,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zlib,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionMedium {
    Direct,
    File,
    TempFile,
    SharedMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    ById,
    ByNumber,
    ByCoordinate,
    ByRange,
    CellImagesOnly,
}

/// Decoded `G` APC key-value command, field names matching the kitty
/// graphics protocol letters (spec §4.4.1).
#[derive(Debug, Clone, Default)]
pub struct GraphicsCommand {
    pub action: Option<Action>,
    pub id: Option<u32>,
    pub image_number: Option<u32>,
    pub placement_id: Option<u32>,
    pub parent_id: Option<u32>,
    pub parent_placement_id: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub x_offset: Option<u32>,
    pub y_offset: Option<u32>,
    pub frame_number: Option<u32>,
    pub compression: Option<Compression>,
    pub format: Option<Format>,
    pub medium: Option<TransmissionMedium>,
    pub z_index: Option<i32>,
    pub cursor_movement: Option<u8>,
    pub num_lines: Option<u32>,
    pub num_cells: Option<u32>,
    pub unicode_placement: bool,
    pub quiet: u8,
    pub delete_action: Option<DeleteAction>,
    pub delete_target: Option<u32>,
    pub more: bool,
    pub gap_ms: Option<u32>,
    pub loop_count: Option<u32>,
    /// `c` (compose): the frame being blitted *into* (`frame_number` is the
    /// source), spec §4.4.1 `other_frame_number`.
    pub other_frame_number: Option<u32>,
    /// `c` (compose): destination top-left, distinct from `x_offset`/
    /// `y_offset` which address the *source* rectangle.
    pub dest_x: Option<u32>,
    pub dest_y: Option<u32>,
    pub bgcolor: Option<[u8; 4]>,
    pub alpha_blend: Option<bool>,
    /// `a` (animation control): 0=stopped, 1=running, 2=loading.
    pub animation_state: Option<u8>,
}

/// In-flight payload accumulation across `more=1` chunks, keyed by
/// `(image_id, frame_id)` (spec §4.4.2).
#[derive(Debug, Default)]
pub struct TransmissionState {
    pending: HashMap<(u32, u32), Vec<u8>>,
}

impl TransmissionState {
    /// Append `chunk`; when `more` is false, returns the assembled payload
    /// and forgets the entry.
    pub fn accept(&mut self, key: (u32, u32), chunk: &[u8], more: bool) -> Option<Vec<u8>> {
        let buf = self.pending.entry(key).or_default();
        buf.extend_from_slice(chunk);
        if more {
            None
        } else {
            self.pending.remove(&key)
        }
    }

    pub fn discard(&mut self, key: (u32, u32)) {
        self.pending.remove(&key);
    }
}

/// Inflate a zlib-compressed payload to `expected_len` bytes (spec §4.4.2
/// "compression == 'z'").
pub fn inflate(data: &[u8], expected_len: usize) -> GraphicsResult<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(expected_len);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| GraphicsError::InvalidSequence(format!("zlib inflate failed: {e}")))?;
    Ok(out)
}

/// Decode a PNG payload to RGBA8 (spec §4.4.2 "format == PNG").
pub fn decode_png(data: &[u8]) -> GraphicsResult<(u32, u32, Vec<u8>)> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| GraphicsError::InvalidSequence(format!("PNG decode failed: {e}")))?;
    let rgba = img.to_rgba8();
    Ok((rgba.width(), rgba.height(), rgba.into_raw()))
}

/// Verify a raw RGB/RGBA payload's length matches `width * height * bpp`
/// (spec §4.4.2).
pub fn verify_raw_len(format: Format, width: u32, height: u32, len: usize) -> GraphicsResult<()> {
    let bpp = match format {
        Format::Rgb => 3,
        Format::Rgba => 4,
        Format::Png => return Ok(()),
    };
    let expected = width as usize * height as usize * bpp;
    if expected != len {
        return Err(GraphicsError::Invalid(format!(
            "payload length {len} does not match {width}x{height}x{bpp} = {expected}"
        )));
    }
    Ok(())
}
