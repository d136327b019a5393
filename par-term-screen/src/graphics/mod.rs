//! The graphics manager: a content-addressed image store with multi-frame
//! animation, reference placements anchored to grid cells, z-ordered
//! composition, and image-aware scroll/clip semantics (spec §4.4).

pub mod animation;
pub mod command;
pub mod image;
pub mod placement;

use crate::error::{GraphicsError, GraphicsResult};
use crate::host::ScreenHost;
use crate::line::Line;
use command::{Action, Compression, DeleteAction, Format, GraphicsCommand, TransmissionState};
use image::{AlphaBlend, AnimationState, Frame, Image, TextureHandle};
use placement::{ImageRef, NormalizedRect, PlacementKey, SrcRect, PARENT_DEPTH_LIMIT};
use std::collections::HashMap;

/// Default storage quota before the LRU eviction pass runs (spec §4.4.2).
pub const DEFAULT_STORAGE_LIMIT: usize = 320 * 1024 * 1024;

/// External disk cache for frame payload bytes, keyed by
/// `(internal_id, frame_id)` (spec §1 "Disk cache for image payloads" is an
/// external collaborator; this is the put/get/delete/size-query interface
/// the core requires of it).
pub trait DiskCache {
    fn put(&mut self, key: (u32, u32), data: &[u8]);
    fn get(&mut self, key: (u32, u32)) -> Option<Vec<u8>>;
    fn delete(&mut self, key: (u32, u32));
    fn size(&mut self, key: (u32, u32)) -> Option<usize>;
}

/// A no-op cache for embedders that don't need payload persistence across
/// restarts, and for the default-constructed manager.
#[derive(Debug, Default)]
pub struct NullDiskCache;

impl DiskCache for NullDiskCache {
    fn put(&mut self, _key: (u32, u32), _data: &[u8]) {}
    fn get(&mut self, _key: (u32, u32)) -> Option<Vec<u8>> {
        None
    }
    fn delete(&mut self, _key: (u32, u32)) {}
    fn size(&mut self, _key: (u32, u32)) -> Option<usize> {
        None
    }
}

/// One visible placement, ready for the renderer to interleave with cells
/// (spec §4.4.4 `update_layers`).
#[derive(Debug, Clone)]
pub struct ImageRenderData {
    pub key: PlacementKey,
    pub image_id: u32,
    pub dest: NormalizedRect,
    pub src_rect: NormalizedRect,
    pub z_index: i32,
    pub texture: Option<TextureHandle>,
    /// Length of the run of identical `image_id` starting at this entry in
    /// the sorted render list (spec §4.4.4 "batched texture upload path").
    pub group_count: u32,
}

/// Scroll/insert/delete notification from the `Screen` (spec §4.4.5).
#[derive(Debug, Clone, Copy)]
pub struct ScrollData {
    pub amount: i64,
    pub limit: i64,
    pub margin_top: usize,
    pub margin_bottom: usize,
    pub has_margins: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PendingPlaceholder {
    image_id: u32,
    placement_id: u32,
    row: i32,
    col: i32,
}

#[derive(Debug, Default)]
pub struct GraphicsManager {
    images: HashMap<u32, Image>,
    by_client_id: HashMap<u32, u32>,
    placements: HashMap<PlacementKey, ImageRef>,
    next_internal_id: u32,
    next_ref_id: u32,
    transmission: TransmissionState,
    render_data: Vec<ImageRenderData>,
    layers_dirty: bool,
    last_scrolled_by: i64,
    used_storage: usize,
    storage_limit: usize,
    frame_bytes: usize,
}

impl GraphicsManager {
    pub fn new() -> Self {
        Self {
            storage_limit: DEFAULT_STORAGE_LIMIT,
            layers_dirty: true,
            last_scrolled_by: -1,
            ..Default::default()
        }
    }

    pub fn with_storage_limit(limit: usize) -> Self {
        Self {
            storage_limit: limit,
            ..Self::new()
        }
    }

    pub fn image(&self, id: u32) -> Option<&Image> {
        self.images.get(&id)
    }

    pub fn image_by_client_id(&self, client_id: u32) -> Option<&Image> {
        self.by_client_id.get(&client_id).and_then(|id| self.images.get(id))
    }

    pub fn placement(&self, key: PlacementKey) -> Option<&ImageRef> {
        self.placements.get(&key)
    }

    pub fn placements(&self) -> impl Iterator<Item = (&PlacementKey, &ImageRef)> {
        self.placements.iter()
    }

    fn alloc_image_id(&mut self) -> u32 {
        self.next_internal_id += 1;
        self.next_internal_id
    }

    fn alloc_ref_id(&mut self) -> u32 {
        self.next_ref_id += 1;
        self.next_ref_id
    }

    /// Deep-clone for the paused-rendering snapshot: textures share their
    /// refcount, placements are copied by value, no disk cache handle rides
    /// along (spec §4.4.7).
    pub fn clone_for_pause(&self) -> Self {
        Self {
            images: self.images.clone(),
            by_client_id: self.by_client_id.clone(),
            placements: self.placements.clone(),
            next_internal_id: self.next_internal_id,
            next_ref_id: self.next_ref_id,
            transmission: TransmissionState::default(),
            render_data: self.render_data.clone(),
            layers_dirty: true,
            last_scrolled_by: -1,
            used_storage: self.used_storage,
            storage_limit: self.storage_limit,
            frame_bytes: self.frame_bytes,
        }
    }

    // ---- command dispatch (spec §4.4.1) --------------------------------

    /// Handle one decoded `G` command. Returns `None` when no reply should
    /// be echoed (either `quiet >= 1` suppressed a success, or the command
    /// is still accumulating `more=1` payload chunks).
    pub fn handle_command(
        &mut self,
        cmd: &GraphicsCommand,
        payload: &[u8],
        cursor: (usize, usize),
        host: &mut dyn ScreenHost,
        cache: &mut dyn DiskCache,
    ) -> Option<String> {
        let quiet = cmd.quiet;
        let result = match cmd.action {
            Some(Action::TransmitOnly) => self.transmit(cmd, payload, cache, host).map(|id| id.map(|i| format!("i={i}"))),
            Some(Action::TransmitAndPlace) => self.transmit(cmd, payload, cache, host).map(|id| {
                id.map(|i| {
                    if let Some(key) = self.handle_put(i, cmd, cursor) {
                        format!("i={i},p={}", key.ref_id)
                    } else {
                        format!("i={i}")
                    }
                })
            }),
            Some(Action::Query) => self.query(cmd, payload).map(|id| id.map(|i| format!("i={i}"))),
            Some(Action::Place) => {
                let id = self.resolve_id(cmd);
                match id {
                    Some(id) => Ok(self
                        .handle_put(id, cmd, cursor)
                        .map(|key| format!("i={id},p={}", key.ref_id))),
                    None => Err(GraphicsError::NotFound("no such image".into())),
                }
            }
            Some(Action::Animation) => self.animation_control(cmd).map(|()| None),
            Some(Action::Frame) => self.add_frame(cmd, payload, cache).map(|fid| Some(format!("i={},r={fid}", cmd.id.unwrap_or(0)))),
            Some(Action::Compose) => self.compose(cmd).map(|()| None),
            Some(Action::Delete) => {
                self.delete(cmd);
                Ok(None)
            }
            None => Err(GraphicsError::Invalid("missing action".into())),
        };

        match result {
            Ok(Some(msg)) => {
                if quiet >= 1 {
                    None
                } else {
                    Some(format!("G{msg};OK"))
                }
            }
            Ok(None) => None,
            Err(e) => {
                if quiet >= 2 {
                    None
                } else {
                    Some(format!("G;{}", e.to_reply()))
                }
            }
        }
    }

    fn resolve_id(&self, cmd: &GraphicsCommand) -> Option<u32> {
        if let Some(id) = cmd.id {
            if self.images.contains_key(&id) {
                return Some(id);
            }
        }
        if let Some(number) = cmd.image_number {
            if let Some(&id) = self.by_client_id.get(&number) {
                return Some(id);
            }
        }
        None
    }

    fn decode_payload(&self, cmd: &GraphicsCommand, payload: &[u8]) -> GraphicsResult<(u32, u32, Vec<u8>)> {
        let raw = match cmd.compression {
            Some(Compression::Zlib) => {
                let expected = (cmd.width.unwrap_or(0) * cmd.height.unwrap_or(0) * 4) as usize;
                command::inflate(payload, expected)?
            }
            _ => payload.to_vec(),
        };
        match cmd.format {
            Some(Format::Png) | None => command::decode_png(&raw).or_else(|e| {
                let w = cmd.width.ok_or_else(|| e.clone())?;
                let h = cmd.height.ok_or(e)?;
                command::verify_raw_len(Format::Rgba, w, h, raw.len())?;
                Ok((w, h, raw))
            }),
            Some(fmt @ (Format::Rgb | Format::Rgba)) => {
                let w = cmd
                    .width
                    .ok_or_else(|| GraphicsError::Invalid("missing width".into()))?;
                let h = cmd
                    .height
                    .ok_or_else(|| GraphicsError::Invalid("missing height".into()))?;
                command::verify_raw_len(fmt, w, h, raw.len())?;
                let rgba = if fmt == Format::Rgb { rgb_to_rgba(&raw) } else { raw };
                Ok((w, h, rgba))
            }
        }
    }

    fn transmit(
        &mut self,
        cmd: &GraphicsCommand,
        payload: &[u8],
        cache: &mut dyn DiskCache,
        host: &mut dyn ScreenHost,
    ) -> GraphicsResult<Option<u32>> {
        if matches!(cmd.medium, Some(command::TransmissionMedium::File | command::TransmissionMedium::TempFile)) {
            // File-backed transmission asks the host before touching disk
            // (spec §4.4.2). We don't have a path field decoded separately
            // from the payload here; the parser is expected to have already
            // resolved the path into `payload` when permission was granted.
            if !host.is_ok_to_read_image_file("") {
                return Err(GraphicsError::PermissionDenied("read denied by host".into()));
            }
        }
        let key = (cmd.id.unwrap_or(0), cmd.frame_number.unwrap_or(0));
        let Some(assembled) = self.transmission.accept(key, payload, cmd.more) else {
            return Ok(None);
        };
        let (w, h, rgba) = self.decode_payload(cmd, &assembled)?;

        let id = cmd.id.unwrap_or_else(|| self.alloc_image_id());
        if cmd.id.is_some() && id >= self.next_internal_id {
            self.next_internal_id = id;
        }
        let is_opaque = cmd.format != Some(Format::Rgba) && !rgba.chunks(4).any(|p| p[3] != 255);
        let root = Frame::root(0, w, h, rgba, is_opaque);
        let payload_bytes = root.rgba.len();
        let mut image = Image::new(id, w, h, root);
        image.client_number = cmd.image_number;
        if let Some(number) = cmd.image_number {
            self.by_client_id.insert(number, id);
        }
        image.payload_bytes = payload_bytes;
        cache.put((id, 0), &assembled);
        self.used_storage += payload_bytes;
        self.images.insert(id, image);
        self.evict_if_over_quota();
        Ok(Some(id))
    }

    /// `q`: same decode/validate pass as transmit, but nothing persists
    /// (spec §4.4.1 "results are reported and no placement persists").
    fn query(&mut self, cmd: &GraphicsCommand, payload: &[u8]) -> GraphicsResult<Option<u32>> {
        let (_w, _h, _rgba) = self.decode_payload(cmd, payload)?;
        Ok(cmd.id)
    }

    /// Evict un-placed, zero-client-id images in LRU (`atime`) order until
    /// storage is back under the quota (spec §4.4.2).
    fn evict_if_over_quota(&mut self) {
        if self.used_storage <= self.storage_limit {
            return;
        }
        let mut candidates: Vec<(u32, u64)> = self
            .images
            .iter()
            .filter(|(id, img)| img.client_id.is_none() && !self.placements.values().any(|p| p.internal_id == **id))
            .map(|(id, img)| (*id, img.atime_ms))
            .collect();
        candidates.sort_by_key(|(_, atime)| *atime);
        for (id, _) in candidates {
            if self.used_storage <= self.storage_limit {
                break;
            }
            if let Some(img) = self.images.remove(&id) {
                self.used_storage = self.used_storage.saturating_sub(img.payload_bytes);
                self.by_client_id.retain(|_, v| *v != id);
            }
        }
    }

    // ---- placements (spec §4.4.3) --------------------------------------

    /// Create or replace a placement anchored at `cursor` (or at an
    /// explicit parent offset). Returns `None` if the image doesn't exist.
    fn handle_put(&mut self, image_id: u32, cmd: &GraphicsCommand, cursor: (usize, usize)) -> Option<PlacementKey> {
        let image = self.images.get(&image_id)?;
        let (img_w, img_h) = (image.width, image.height);

        let src_x = cmd.x_offset.unwrap_or(0).min(img_w);
        let src_y = cmd.y_offset.unwrap_or(0).min(img_h);
        let src_w = cmd.width.map(|w| w.min(img_w - src_x)).unwrap_or(img_w - src_x);
        let src_h = cmd.height.map(|h| h.min(img_h - src_y)).unwrap_or(img_h - src_y);

        const CELL_PX: u32 = 16;
        let (num_cols, num_rows) = match (cmd.num_cells, cmd.num_lines) {
            (Some(0) | None, Some(0) | None) => (
                src_w.div_ceil(CELL_PX).max(1),
                src_h.div_ceil(CELL_PX).max(1),
            ),
            (Some(c), Some(0) | None) if c > 0 => {
                let r = ((src_h as u64 * c as u64) / (src_w.max(1) as u64 * CELL_PX as u64)).max(1) as u32;
                (c, r)
            }
            (Some(0) | None, Some(r)) if r > 0 => {
                let c = ((src_w as u64 * r as u64) / (src_h.max(1) as u64 * CELL_PX as u64)).max(1) as u32;
                (c, r)
            }
            (Some(c), Some(r)) => (c, r),
            _ => (1, 1),
        };

        let key = PlacementKey {
            image_id,
            ref_id: cmd.placement_id.unwrap_or_else(|| self.alloc_ref_id()),
        };
        let parent = match (cmd.parent_id, cmd.parent_placement_id) {
            (Some(pid), Some(prid)) => Some((
                PlacementKey { image_id: pid, ref_id: prid },
                cmd.dest_x.unwrap_or(0) as i32,
                cmd.dest_y.unwrap_or(0) as i32,
            )),
            _ => None,
        };
        let (start_row, start_column) = if parent.is_some() {
            (0, 0)
        } else {
            (cursor.0 as i64, cursor.1 as i64)
        };

        let src_rect = NormalizedRect {
            x0: src_x as f32 / img_w.max(1) as f32,
            y0: src_y as f32 / img_h.max(1) as f32,
            x1: (src_x + src_w) as f32 / img_w.max(1) as f32,
            y1: (src_y + src_h) as f32 / img_h.max(1) as f32,
        };

        self.placements.insert(
            key,
            ImageRef {
                internal_id: image_id,
                client_id: cmd.image_number,
                start_row,
                start_column,
                cell_x_offset: 0,
                cell_y_offset: 0,
                num_rows,
                num_cols,
                effective_num_rows: num_rows,
                effective_num_cols: num_cols,
                src: SrcRect { x: src_x, y: src_y, width: src_w, height: src_h },
                src_rect,
                z_index: cmd.z_index.unwrap_or(0),
                parent,
                is_virtual_ref: cmd.unicode_placement,
                virtual_ref_id: if cmd.unicode_placement { key.ref_id } else { 0 },
                is_hyperlink: false,
                last_rendered_ms: 0,
            },
        );
        self.layers_dirty = true;
        Some(key)
    }

    fn delete(&mut self, cmd: &GraphicsCommand) {
        match cmd.delete_action {
            Some(DeleteAction::ById) => {
                if let Some(id) = cmd.delete_target.or(cmd.id) {
                    self.images.remove(&id);
                    self.placements.retain(|k, _| k.image_id != id);
                }
            }
            Some(DeleteAction::ByNumber) => {
                if let Some(number) = cmd.image_number {
                    if let Some(id) = self.by_client_id.remove(&number) {
                        self.images.remove(&id);
                        self.placements.retain(|k, _| k.image_id != id);
                    }
                }
            }
            Some(DeleteAction::ByCoordinate) => {
                if let Some(id) = cmd.delete_target {
                    self.placements.retain(|k, _| k.image_id != id);
                }
            }
            Some(DeleteAction::ByRange) => {
                self.placements.clear();
            }
            Some(DeleteAction::CellImagesOnly) => {
                self.placements.retain(|_, r| r.is_virtual_ref);
            }
            None => {}
        }
        self.layers_dirty = true;
    }

    // ---- animation (spec §4.4.6) ----------------------------------------

    fn animation_control(&mut self, cmd: &GraphicsCommand) -> GraphicsResult<()> {
        let id = self
            .resolve_id(cmd)
            .ok_or_else(|| GraphicsError::NotFound("no such image".into()))?;
        let image = self.images.get_mut(&id).unwrap();
        if let Some(loops) = cmd.loop_count {
            image.animation.max_loops = loops;
        }
        if let Some(gap) = cmd.gap_ms {
            if let Some(frame_no) = cmd.frame_number {
                if let Some(frame) = image.frame_mut(frame_no) {
                    frame.gap_ms = gap;
                }
            }
        }
        match cmd.animation_state {
            Some(0) => image.animation.state = AnimationState::Stopped,
            Some(1) => image.animation.state = AnimationState::Running,
            Some(2) => image.animation.state = AnimationState::Loading,
            _ => {}
        }
        Ok(())
    }

    pub fn scan_active_animations(&mut self, now_ms: u64) -> (Option<u64>, bool) {
        let ids: Vec<u32> = self.images.keys().copied().collect();
        let mut batch: Vec<Image> = ids.iter().map(|id| self.images[id].clone()).collect();
        let result = animation::scan_active_animations(&mut batch, now_ms);
        for img in batch {
            self.images.insert(img.internal_id, img);
        }
        if result.1 {
            self.layers_dirty = true;
        }
        result
    }

    fn add_frame(&mut self, cmd: &GraphicsCommand, payload: &[u8], cache: &mut dyn DiskCache) -> GraphicsResult<u32> {
        let id = self
            .resolve_id(cmd)
            .ok_or_else(|| GraphicsError::NotFound("no such image".into()))?;
        let (w, h, rgba) = self.decode_payload(cmd, payload)?;
        let frame_id = cmd.frame_number.unwrap_or(0);

        let frame_bytes = rgba.len();
        // spec §4.4.2: "a separate 5x cap governs frame addition."
        if self.frame_bytes + frame_bytes > self.storage_limit * 5 {
            return Err(GraphicsError::NoSpace("frame quota exceeded".into()));
        }

        let image = self.images.get_mut(&id).unwrap();
        let mut frame = Frame::root(frame_id, w, h, rgba, false);
        frame.x = cmd.x_offset.unwrap_or(0);
        frame.y = cmd.y_offset.unwrap_or(0);
        frame.gap_ms = cmd.gap_ms.unwrap_or(0);
        frame.bgcolor = cmd.bgcolor.unwrap_or([0, 0, 0, 0]);
        frame.alpha_blend = if cmd.alpha_blend.unwrap_or(false) {
            AlphaBlend::AlphaBlend
        } else {
            AlphaBlend::BlendOnOpaque
        };
        frame.base_frame_id = cmd.other_frame_number;

        if let Some(base_id) = frame.base_frame_id {
            // Depth >= 5 in the base chain: materialize fully-coalesced at
            // ingestion rather than chaining further (spec §4.4.6).
            let depth = chain_depth(image, base_id);
            if depth >= 5 {
                let bitmap = animation::coalesce(image, base_id);
                let composited = composite_onto(&bitmap, image.width, image.height, &frame);
                frame.rgba = composited;
                frame.base_frame_id = None;
            }
        }

        cache.put((id, frame_id), &frame.rgba);
        if let Some(existing) = image.frame_mut(frame_id) {
            *existing = frame;
        } else {
            image.frames.push(frame);
        }
        self.frame_bytes += frame_bytes;
        Ok(frame_id)
    }

    fn compose(&mut self, cmd: &GraphicsCommand) -> GraphicsResult<()> {
        let id = self
            .resolve_id(cmd)
            .ok_or_else(|| GraphicsError::NotFound("no such image".into()))?;
        let src_id = cmd.frame_number.ok_or_else(|| GraphicsError::Invalid("missing source frame".into()))?;
        let dst_id = cmd
            .other_frame_number
            .ok_or_else(|| GraphicsError::Invalid("missing destination frame".into()))?;

        let image = self.images.get_mut(&id).unwrap();
        let src_bitmap = animation::coalesce(image, src_id);
        let dst_bitmap = animation::coalesce(image, dst_id);

        let sx = cmd.x_offset.unwrap_or(0);
        let sy = cmd.y_offset.unwrap_or(0);
        let dx = cmd.dest_x.unwrap_or(0);
        let dy = cmd.dest_y.unwrap_or(0);
        let w = cmd.width.unwrap_or(image.width);
        let h = cmd.height.unwrap_or(image.height);

        if src_id == dst_id {
            let overlap_x = dx < sx + w && sx < dx + w;
            let overlap_y = dy < sy + h && sy < dy + h;
            if overlap_x && overlap_y {
                return Err(GraphicsError::Invalid(
                    "compose source and destination rectangles overlap".into(),
                ));
            }
        }

        let stride = image.width as usize * 4;
        let mut out = dst_bitmap;
        for row in 0..h {
            if sy + row >= image.height || dy + row >= image.height {
                break;
            }
            for col in 0..w {
                if sx + col >= image.width || dx + col >= image.width {
                    break;
                }
                let src_idx = ((sy + row) as usize * stride) + (sx + col) as usize * 4;
                let dst_idx = ((dy + row) as usize * stride) + (dx + col) as usize * 4;
                if src_idx + 4 > src_bitmap.len() || dst_idx + 4 > out.len() {
                    continue;
                }
                out[dst_idx..dst_idx + 4].copy_from_slice(&src_bitmap[src_idx..src_idx + 4]);
            }
        }

        if let Some(frame) = image.frame_mut(dst_id) {
            frame.rgba = out;
            frame.base_frame_id = None;
            frame.coalesced = None;
        }
        for frame in &mut image.frames {
            if frame.base_frame_id == Some(dst_id) {
                frame.coalesced = None;
            }
        }
        Ok(())
    }

    // ---- scroll interaction (spec §4.4.5) -------------------------------

    pub fn on_scroll(&mut self, data: ScrollData) {
        self.placements.retain(|_, r| {
            if r.is_virtual_ref {
                return true; // exempt: rebuilt per-render
            }
            if !data.has_margins {
                r.start_row += data.amount;
                return !r.scrolled_off(data.limit);
            }
            let top = data.margin_top as i64;
            let bottom = data.margin_bottom as i64;
            let ref_bottom = r.start_row + r.effective_num_rows as i64 - 1;
            if ref_bottom < top || r.start_row > bottom {
                return true; // fully outside region: unaffected
            }
            if r.start_row >= top && ref_bottom <= bottom {
                r.start_row -= data.amount;
                return r.start_row + r.effective_num_rows as i64 > top && r.start_row <= bottom;
            }
            // straddles the region boundary after the shift: clip.
            r.start_row -= data.amount;
            if r.start_row < top {
                let dropped = (top - r.start_row) as u32;
                r.src.y += dropped;
                r.src.height = r.src.height.saturating_sub(dropped);
                r.effective_num_rows = r.effective_num_rows.saturating_sub(dropped);
                r.start_row = top;
            }
            r.effective_num_rows > 0
        });
        self.layers_dirty = true;
    }

    /// `insert_lines`/`delete_lines`/erase-in-display: drop only cell-image
    /// placements in the touched rows (history-independent), spec §4.4.5.
    pub fn remove_cell_images_in_range(&mut self, top: usize, bottom: usize) {
        let (top, bottom) = (top as i64, bottom as i64);
        self.placements.retain(|_, r| {
            !(r.is_virtual_ref && r.start_row >= top && r.start_row <= bottom)
        });
        self.layers_dirty = true;
    }

    /// Resize reaction (spec §4.2 resize step 7, "grman_resize"): cell-image
    /// and virtual placements don't carry coordinates that survive a
    /// reflow, so they're dropped and rebuilt by the next placeholder scan;
    /// real pixel-anchored placements are shifted by `row_delta` (the
    /// number of rows the reflow pushed into, or pulled back out of,
    /// scrollback).
    pub fn resize(&mut self, row_delta: i64) {
        self.placements.retain(|_, r| !r.is_virtual_ref);
        for r in self.placements.values_mut() {
            r.start_row += row_delta;
        }
        self.layers_dirty = true;
    }

    // ---- render-data production (spec §4.4.4) --------------------------

    pub fn update_layers(
        &mut self,
        scrolled_by: usize,
        rows: usize,
        cols: usize,
    ) -> &[ImageRenderData] {
        let scrolled_by = scrolled_by as i64;
        if !self.layers_dirty && scrolled_by == self.last_scrolled_by {
            return &self.render_data;
        }
        let mut visible: Vec<ImageRenderData> = Vec::new();
        for (key, r) in &self.placements {
            if r.is_virtual_ref {
                continue; // concretized separately via scan_placeholder_lines
            }
            let top = r.start_row;
            let bottom = r.start_row + r.effective_num_rows as i64;
            if bottom <= 0 || top >= rows as i64 {
                continue;
            }
            let dest = NormalizedRect {
                x0: r.start_column as f32 / cols.max(1) as f32,
                y0: top as f32 / rows.max(1) as f32,
                x1: (r.start_column + r.effective_num_cols as i64) as f32 / cols.max(1) as f32,
                y1: bottom as f32 / rows.max(1) as f32,
            };
            let texture = self.images.get(&r.internal_id).and_then(|i| i.texture.clone());
            visible.push(ImageRenderData {
                key: *key,
                image_id: r.internal_id,
                dest,
                src_rect: r.src_rect,
                z_index: r.z_index,
                texture,
                group_count: 1,
            });
        }
        visible.sort_by_key(|v| (v.z_index, v.image_id, v.key.ref_id));
        let mut i = 0;
        while i < visible.len() {
            let mut j = i + 1;
            while j < visible.len() && visible[j].image_id == visible[i].image_id {
                j += 1;
            }
            let count = (j - i) as u32;
            for entry in &mut visible[i..j] {
                entry.group_count = count;
            }
            i = j;
        }
        self.render_data = visible;
        self.layers_dirty = false;
        self.last_scrolled_by = scrolled_by;
        &self.render_data
    }

    // ---- virtual placements (spec §4.4.3) -------------------------------

    /// Scan a line carrying `has_image_placeholders` for placeholder runs
    /// and merge adjacent matching runs into concrete cell-image
    /// placements (spec §4.4.3 "Virtual placements"). Returns the
    /// concretized placement keys so the caller can fold them into the
    /// next `update_layers` pass.
    pub fn concretize_placeholders(&mut self, y: usize, line: &Line) -> Vec<PlacementKey> {
        let mut out = Vec::new();
        if !line.attrs.has_image_placeholders {
            return out;
        }
        let mut run: Option<(u32, u32, i32)> = None; // (image_id, placement_id, start_col)
        let mut x = 0usize;
        while x < line.columns() {
            let cell = &line.cells()[x];
            if !cell.flags.contains(crate::cell::CellFlags::IMAGE_PLACEHOLDER) {
                if let Some((img, pid, start)) = run.take() {
                    out.push(self.finish_placeholder_run(img, pid, y, start, x));
                }
                x += 1;
                continue;
            }
            let image_id = match cell.fg {
                crate::color::Color::Indexed(i) => i as u32,
                crate::color::Color::Rgb(r, g, b) => {
                    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
                }
                _ => 0,
            };
            let placement_id = match cell.decoration {
                crate::color::Color::Indexed(i) => i as u32,
                _ => 0,
            };
            match run {
                Some((img, pid, start)) if img == image_id && pid == placement_id => {
                    // contiguous run continues
                    let _ = start;
                }
                Some((img, pid, start)) => {
                    out.push(self.finish_placeholder_run(img, pid, y, start, x));
                    run = Some((image_id, placement_id, x as i32));
                }
                None => run = Some((image_id, placement_id, x as i32)),
            }
            x += 1;
        }
        if let Some((img, pid, start)) = run {
            out.push(self.finish_placeholder_run(img, pid, y, start, line.columns()));
        }
        out
    }

    fn finish_placeholder_run(&mut self, image_id: u32, placement_id: u32, y: usize, start_x: i32, end_x: usize) -> PlacementKey {
        let key = PlacementKey { image_id, ref_id: placement_id };
        let width = (end_x as i32 - start_x).max(1) as u32;
        if let Some(existing) = self.placements.get_mut(&key) {
            existing.start_row = y as i64;
            existing.start_column = start_x as i64;
            existing.num_cols = width;
            existing.effective_num_cols = width;
        } else {
            self.placements.insert(
                key,
                ImageRef {
                    internal_id: image_id,
                    client_id: None,
                    start_row: y as i64,
                    start_column: start_x as i64,
                    cell_x_offset: 0,
                    cell_y_offset: 0,
                    num_rows: 1,
                    num_cols: width,
                    effective_num_rows: 1,
                    effective_num_cols: width,
                    src: SrcRect { x: 0, y: 0, width: 0, height: 0 },
                    src_rect: NormalizedRect { x0: 0.0, y0: 0.0, x1: 1.0, y1: 1.0 },
                    z_index: 0,
                    parent: None,
                    is_virtual_ref: true,
                    virtual_ref_id: placement_id,
                    is_hyperlink: false,
                    last_rendered_ms: 0,
                },
            );
        }
        self.layers_dirty = true;
        key
    }

    /// Resolve a parented placement's effective position (spec §4.4.3);
    /// thin wrapper over [`placement::resolve_position`] bound to this
    /// manager's placement table.
    pub fn resolve_position(&self, key: PlacementKey) -> Option<(i64, i64)> {
        placement::resolve_position(key, |k| self.placements.get(&k).cloned())
    }

    pub const fn parent_depth_limit() -> usize {
        PARENT_DEPTH_LIMIT
    }
}

fn chain_depth(image: &Image, mut frame_id: u32) -> usize {
    let mut depth = 0;
    let mut visited = Vec::new();
    while let Some(frame) = image.frame(frame_id) {
        if visited.contains(&frame_id) {
            break;
        }
        visited.push(frame_id);
        match frame.base_frame_id {
            Some(next) => {
                depth += 1;
                frame_id = next;
            }
            None => break,
        }
    }
    depth
}

fn composite_onto(base: &[u8], width: u32, height: u32, frame: &Frame) -> Vec<u8> {
    // Mirrors `animation::composite` but is kept local since that helper is
    // private to the animation module.
    let mut img = Image::new(0, width, height, Frame::root(0, width, height, base.to_vec(), true));
    img.frames.push(frame.clone());
    animation::coalesce(&mut img, frame.id)
}

fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for chunk in rgb.chunks_exact(3) {
        out.extend_from_slice(chunk);
        out.push(255);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    fn rgba_payload(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
        let mut v = Vec::with_capacity((w * h) as usize * 4);
        for _ in 0..(w * h) {
            v.extend_from_slice(&color);
        }
        v
    }

    #[test]
    fn transmit_and_place_creates_placement_at_cursor() {
        let mut gm = GraphicsManager::new();
        let mut host = NullHost;
        let mut cache = NullDiskCache;
        let cmd = GraphicsCommand {
            action: Some(Action::TransmitAndPlace),
            id: Some(1),
            width: Some(2),
            height: Some(2),
            format: Some(Format::Rgba),
            more: false,
            quiet: 0,
            ..Default::default()
        };
        let payload = rgba_payload(2, 2, [255, 0, 0, 255]);
        let reply = gm.handle_command(&cmd, &payload, (3, 4), &mut host, &mut cache);
        assert!(reply.unwrap().starts_with("Gi=1"));
        assert!(gm.placements.values().any(|r| r.internal_id == 1 && r.start_row == 3 && r.start_column == 4));
    }

    #[test]
    fn quota_eviction_drops_unplaced_images_first() {
        let mut gm = GraphicsManager::with_storage_limit(20 * 4);
        let mut host = NullHost;
        let mut cache = NullDiskCache;
        for id in 1..=3u32 {
            let cmd = GraphicsCommand {
                action: Some(Action::TransmitOnly),
                id: Some(id),
                width: Some(4),
                height: Some(4),
                format: Some(Format::Rgba),
                quiet: 2,
                ..Default::default()
            };
            let payload = rgba_payload(4, 4, [0, 0, 0, 255]);
            gm.handle_command(&cmd, &payload, (0, 0), &mut host, &mut cache);
        }
        // Each image is 64 bytes; quota is 80, so eviction must have run.
        assert!(gm.images.len() < 3);
    }

    #[test]
    fn scroll_without_margins_deletes_ref_past_history_limit() {
        let mut gm = GraphicsManager::new();
        gm.placements.insert(
            PlacementKey { image_id: 1, ref_id: 1 },
            ImageRef {
                internal_id: 1,
                client_id: None,
                start_row: 0,
                start_column: 0,
                cell_x_offset: 0,
                cell_y_offset: 0,
                num_rows: 1,
                num_cols: 1,
                effective_num_rows: 1,
                effective_num_cols: 1,
                src: SrcRect { x: 0, y: 0, width: 1, height: 1 },
                src_rect: NormalizedRect { x0: 0.0, y0: 0.0, x1: 1.0, y1: 1.0 },
                z_index: 0,
                parent: None,
                is_virtual_ref: false,
                virtual_ref_id: 0,
                is_hyperlink: false,
                last_rendered_ms: 0,
            },
        );
        gm.on_scroll(ScrollData { amount: 5, limit: 0, margin_top: 0, margin_bottom: 0, has_margins: false });
        assert!(gm.placements.is_empty());
    }
}
