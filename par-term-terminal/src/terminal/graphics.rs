//! Graphics render-data pull and animation ticking.
//!
//! Font rasterization and GPU upload are out of scope for the screen
//! engine (spec §1); this module only exposes the z-ordered placement list
//! [`par_term_screen::graphics::GraphicsManager::update_layers`] produces
//! and the per-frame animation tick, concretizing any virtual (Unicode
//! placeholder) placements on visible rows first so they fold into the
//! same render-data pass as ordinary placements (spec §4.4.3/§4.4.4).

use super::TerminalManager;
use par_term_screen::graphics::ImageRenderData;

impl TerminalManager {
    /// Render-ready placement list for the currently visible viewport,
    /// z-ordered and grouped for batched texture upload.
    pub fn get_render_data(&self) -> Vec<ImageRenderData> {
        let mut screen = self.screen.lock();
        let rows = screen.rows();
        let cols = screen.columns();
        let scrolled_by = screen.scrolled_by_amount();

        for y in 0..rows {
            let line = screen.visible_line(y).clone();
            if line.attrs.has_image_placeholders {
                screen.graphics.concretize_placeholders(y, &line);
            }
        }

        screen.graphics.update_layers(scrolled_by, rows, cols).to_vec()
    }

    /// Total number of live placements across all images.
    pub fn graphics_count(&self) -> usize {
        self.screen.lock().graphics.placements().count()
    }

    /// Advance animation state for all images. Returns `(next_gap_ms,
    /// dirtied)`: `next_gap_ms` is the soonest a frame will next need to
    /// advance, `dirtied` is true if any frame changed and the render data
    /// should be re-pulled (spec §4.4.6).
    pub fn tick_animations(&self, now_ms: u64) -> (Option<u64>, bool) {
        self.screen.lock().graphics.scan_active_animations(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_placements_means_empty_render_data() {
        let term = TerminalManager::new(80, 24);
        assert!(term.get_render_data().is_empty());
        assert_eq!(term.graphics_count(), 0);
    }

    #[test]
    fn ticking_animations_with_no_images_is_a_no_op() {
        let term = TerminalManager::new(80, 24);
        let (next_gap, dirtied) = term.tick_animations(0);
        assert!(next_gap.is_none());
        assert!(!dirtied);
    }
}
