//! `ImageRef`: a placement anchoring an image (or a region of one) to grid
//! cells (spec §3 "ImageRef", §4.4.3 "Placements").
//!
//! Parent references are stored as `(image_id, ref_id)` pairs rather than
//! pointers, per spec §9's re-architecture note on cyclic parent
//! references — resolution walks the arena with an explicit depth counter.

/// Maximum parent-chain depth walked before giving up (spec §4.4.3).
pub const PARENT_DEPTH_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacementKey {
    pub image_id: u32,
    pub ref_id: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct SrcRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct NormalizedRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

#[derive(Debug, Clone)]
pub struct ImageRef {
    pub internal_id: u32,
    pub client_id: Option<u32>,
    pub start_row: i64,
    pub start_column: i64,
    pub cell_x_offset: u32,
    pub cell_y_offset: u32,
    pub num_rows: u32,
    pub num_cols: u32,
    pub effective_num_rows: u32,
    pub effective_num_cols: u32,
    pub src: SrcRect,
    pub src_rect: NormalizedRect,
    pub z_index: i32,
    pub parent: Option<(PlacementKey, i32, i32)>,
    pub is_virtual_ref: bool,
    pub virtual_ref_id: u32,
    pub is_hyperlink: bool,
    pub last_rendered_ms: u64,
}

impl ImageRef {
    /// True once the placement has scrolled entirely off the top of the
    /// retained history (spec §4.4.5: "the ref is deleted when
    /// `start_row + effective_num_rows <= limit`").
    pub fn scrolled_off(&self, limit: i64) -> bool {
        self.start_row + self.effective_num_rows as i64 <= limit
    }
}

/// Resolve a parented placement's effective `(start_row, start_column)` by
/// walking the parent chain, honoring [`PARENT_DEPTH_LIMIT`] and detecting
/// cycles by tracking visited keys (spec §4.4.3).
pub fn resolve_position(
    key: PlacementKey,
    lookup: impl Fn(PlacementKey) -> Option<ImageRef>,
) -> Option<(i64, i64)> {
    let mut visited = Vec::with_capacity(PARENT_DEPTH_LIMIT);
    let mut current = lookup(key)?;
    let mut row = current.start_row;
    let mut col = current.start_column;
    visited.push(key);

    loop {
        let Some((parent_key, dx, dy)) = current.parent else {
            return Some((row, col));
        };
        if visited.len() >= PARENT_DEPTH_LIMIT || visited.contains(&parent_key) {
            return None;
        }
        let Some(parent) = lookup(parent_key) else {
            return None;
        };
        row = parent.start_row + dy as i64;
        col = parent.start_column + dx as i64;
        visited.push(parent_key);
        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_ref(id: u32, start_row: i64, start_column: i64) -> ImageRef {
        ImageRef {
            internal_id: id,
            client_id: None,
            start_row,
            start_column,
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
        }
    }

    #[test]
    fn resolves_through_one_parent_hop() {
        let parent_key = PlacementKey { image_id: 1, ref_id: 1 };
        let child_key = PlacementKey { image_id: 1, ref_id: 2 };
        let mut table = HashMap::new();
        table.insert(parent_key, base_ref(1, 10, 10));
        let mut child = base_ref(1, 0, 0);
        child.parent = Some((parent_key, 2, 3));
        table.insert(child_key, child);

        let pos = resolve_position(child_key, |k| table.get(&k).cloned());
        assert_eq!(pos, Some((13, 12)));
    }

    #[test]
    fn cycle_is_detected_and_refused() {
        let a = PlacementKey { image_id: 1, ref_id: 1 };
        let b = PlacementKey { image_id: 1, ref_id: 2 };
        let mut table = HashMap::new();
        let mut ra = base_ref(1, 0, 0);
        ra.parent = Some((b, 0, 0));
        let mut rb = base_ref(1, 0, 0);
        rb.parent = Some((a, 0, 0));
        table.insert(a, ra);
        table.insert(b, rb);

        assert!(resolve_position(a, |k| table.get(&k).cloned()).is_none());
    }

    #[test]
    fn chain_deeper_than_limit_is_refused() {
        let mut table = HashMap::new();
        for i in 0..(PARENT_DEPTH_LIMIT as u32 + 2) {
            let key = PlacementKey { image_id: 1, ref_id: i };
            let mut r = base_ref(1, i as i64, 0);
            if i > 0 {
                r.parent = Some((PlacementKey { image_id: 1, ref_id: i - 1 }, 0, 1));
            }
            table.insert(key, r);
        }
        let deepest = PlacementKey { image_id: 1, ref_id: PARENT_DEPTH_LIMIT as u32 + 1 };
        assert!(resolve_position(deepest, |k| table.get(&k).cloned()).is_none());
    }
}
