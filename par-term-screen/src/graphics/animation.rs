//! Animation ticking and frame coalescing (spec §4.4.6).

use super::image::{AlphaBlend, AnimationState, Frame, Image};

/// Depth cap for a frame's `base_frame_id` chain (spec §4.4.6 "Depth is
/// capped at 32 levels").
pub const COALESCE_DEPTH_LIMIT: usize = 32;

/// Advance every image's animation state by one tick. Returns the smallest
/// next-gap across all running images and whether any image's displayed
/// frame changed (spec §4.4.6 `scan_active_animations`).
pub fn scan_active_animations(images: &mut [Image], now_ms: u64) -> (Option<u64>, bool) {
    let mut next_gap: Option<u64> = None;
    let mut dirtied = false;

    for image in images.iter_mut() {
        if image.animation.state != AnimationState::Running {
            continue;
        }
        if image.animation.max_loops > 0 && image.animation.current_loop >= image.animation.max_loops {
            continue;
        }
        let frame_count = image.frames.len();
        if frame_count <= 1 {
            continue;
        }
        let gap = image.current_frame().gap_ms as u64;
        let elapsed = now_ms.saturating_sub(image.animation.current_frame_shown_at_ms);
        if gap == 0 {
            // Zero-gap frames are skipped within the same tick (spec §4.4.6).
            let mut idx = image.animation.current_frame_index;
            while image.frames[idx].gap_ms == 0 {
                idx = advance_index(idx, frame_count, &mut image.animation.current_loop);
                if idx == image.animation.current_frame_index {
                    break; // every frame is zero-gap; avoid an infinite loop
                }
            }
            image.animation.current_frame_index = idx;
            image.animation.current_frame_shown_at_ms = now_ms;
            dirtied = true;
            continue;
        }
        if elapsed >= gap {
            image.animation.current_frame_index = advance_index(
                image.animation.current_frame_index,
                frame_count,
                &mut image.animation.current_loop,
            );
            image.animation.current_frame_shown_at_ms = now_ms;
            dirtied = true;
        }
        let remaining = gap.saturating_sub(elapsed).max(1);
        next_gap = Some(next_gap.map_or(remaining, |g| g.min(remaining)));
    }

    (next_gap, dirtied)
}

fn advance_index(idx: usize, frame_count: usize, current_loop: &mut u32) -> usize {
    let next = (idx + 1) % frame_count;
    if next == 0 {
        *current_loop += 1;
    }
    next
}

/// Recursively composite a frame's base-frame chain, caching the result on
/// the frame itself. Cycles are detected by tracking visited frame ids; a
/// chain longer than [`COALESCE_DEPTH_LIMIT`] bails out and returns the
/// frame's own bitmap unmodified rather than panicking.
pub fn coalesce(image: &mut Image, frame_id: u32) -> Vec<u8> {
    let mut chain = Vec::new();
    coalesce_inner(image, frame_id, &mut chain)
}

fn coalesce_inner(image: &mut Image, frame_id: u32, visited: &mut Vec<u32>) -> Vec<u8> {
    if let Some(frame) = image.frame(frame_id) {
        if let Some(cached) = &frame.coalesced {
            return cached.clone();
        }
    }
    if visited.len() >= COALESCE_DEPTH_LIMIT || visited.contains(&frame_id) {
        return image.frame(frame_id).map(|f| f.rgba.clone()).unwrap_or_default();
    }
    visited.push(frame_id);

    let Some(frame) = image.frame(frame_id).cloned() else {
        return Vec::new();
    };

    let base_bitmap = match frame.base_frame_id {
        Some(base_id) => coalesce_inner(image, base_id, visited),
        None => frame.rgba.clone(),
    };

    let result = if frame.base_frame_id.is_some() {
        composite(&base_bitmap, image.width, image.height, &frame)
    } else {
        base_bitmap
    };

    if let Some(f) = image.frame_mut(frame_id) {
        f.coalesced = Some(result.clone());
    }
    result
}

/// Alpha-blend `frame`'s rectangle on top of `base` (full-image RGBA8
/// buffers). `alpha_blend` selects whether the destination is treated as
/// opaque (spec §4.4.6 "Alpha blending kinds").
fn composite(base: &[u8], image_width: u32, image_height: u32, frame: &Frame) -> Vec<u8> {
    let mut out = base.to_vec();
    let stride = image_width as usize * 4;
    for row in 0..frame.height {
        let dst_y = frame.y + row;
        if dst_y >= image_height {
            break;
        }
        for col in 0..frame.width {
            let dst_x = frame.x + col;
            if dst_x >= image_width {
                break;
            }
            let src_idx = (row as usize * frame.width as usize + col as usize) * 4;
            let dst_idx = dst_y as usize * stride + dst_x as usize * 4;
            if src_idx + 4 > frame.rgba.len() || dst_idx + 4 > out.len() {
                continue;
            }
            let src = &frame.rgba[src_idx..src_idx + 4];
            let a = src[3] as u32;
            match frame.alpha_blend {
                AlphaBlend::BlendOnOpaque => {
                    for c in 0..3 {
                        let s = src[c] as u32;
                        let d = out[dst_idx + c] as u32;
                        out[dst_idx + c] = ((s * a + d * (255 - a)) / 255) as u8;
                    }
                    out[dst_idx + 3] = 255;
                }
                AlphaBlend::AlphaBlend => {
                    let da = out[dst_idx + 3] as u32;
                    let out_a = a + da * (255 - a) / 255;
                    for c in 0..3 {
                        let s = src[c] as u32;
                        let d = out[dst_idx + c] as u32;
                        out[dst_idx + c] = if out_a == 0 {
                            0
                        } else {
                            ((s * a + d * da * (255 - a) / 255) / out_a.max(1)) as u8
                        };
                    }
                    out[dst_idx + 3] = out_a.min(255) as u8;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with_two_frames(gap_ms: u32) -> Image {
        let root = Frame::root(0, 2, 2, vec![255, 0, 0, 255, 255, 0, 0, 255, 255, 0, 0, 255, 255, 0, 0, 255], true);
        let mut second = Frame::root(1, 2, 2, vec![0, 255, 0, 128; 4]);
        second.gap_ms = gap_ms;
        second.base_frame_id = Some(0);
        second.alpha_blend = AlphaBlend::BlendOnOpaque;
        let mut img = Image::new(0, 2, 2, root);
        img.frames.push(second);
        img.animation.state = AnimationState::Running;
        img
    }

    #[test]
    fn advances_frame_after_gap_elapses() {
        let mut images = vec![image_with_two_frames(40)];
        let (next_gap, dirtied) = scan_active_animations(&mut images, 40);
        assert!(dirtied);
        assert_eq!(images[0].animation.current_frame_index, 1);
        assert!(next_gap.is_some());
    }

    #[test]
    fn stopped_images_are_skipped() {
        let mut images = vec![image_with_two_frames(40)];
        images[0].animation.state = AnimationState::Stopped;
        let (next_gap, dirtied) = scan_active_animations(&mut images, 1000);
        assert!(!dirtied);
        assert!(next_gap.is_none());
    }

    #[test]
    fn coalesced_frame_blends_base() {
        let mut img = image_with_two_frames(40);
        let bitmap = coalesce(&mut img, 1);
        assert_eq!(bitmap.len(), img.root_frame().rgba.len());
        // green channel of the blended pixel should have moved toward the overlay
        assert!(bitmap[1] > img.root_frame().rgba[1]);
    }
}
