//! Cross-module scenario tests: resize interacting with reflow, and
//! scrolling interacting with the graphics manager's placement lifecycle.

use par_term_screen::graphics::command::{Action, Format, GraphicsCommand};
use par_term_screen::graphics::NullDiskCache;
use par_term_screen::host::NullHost;
use par_term_screen::Screen;

fn screen(rows: usize, cols: usize) -> Screen {
    Screen::new(rows, cols, 1000, Box::new(NullHost))
}

fn rgba_payload(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
    let mut v = Vec::with_capacity((w * h) as usize * 4);
    for _ in 0..(w * h) {
        v.extend_from_slice(&color);
    }
    v
}

#[test]
fn resize_preserves_wrapped_text_across_two_narrowings() {
    let mut s = screen(24, 80);
    s.draw_text("the quick brown fox jumps over the lazy dog and then some");
    s.resize(24, 40);
    s.resize(24, 20);
    // The logical content must still be present somewhere in the visible
    // buffer or scrollback after two successive rewraps.
    let mut all_text = String::new();
    for i in 0..s.history().len() {
        all_text.push_str(&s.history().line(i).unwrap().text());
    }
    assert!(all_text.contains("quick brown fox"));
}

#[test]
fn growing_then_shrinking_rows_round_trips_without_losing_history() {
    let mut s = screen(10, 40);
    for i in 0..20 {
        s.draw_text(&format!("line {i}"));
        s.linefeed();
        s.carriage_return();
    }
    let history_after_fill = s.history().len();
    assert!(history_after_fill > 0);

    s.resize(20, 40);
    s.resize(10, 40);
    // Shrinking back should not have thrown away everything that was
    // previously evicted; scrollback should still hold a comparable amount.
    assert!(s.history().len() >= history_after_fill.saturating_sub(10));
}

#[test]
fn scrolling_past_a_placement_evicts_it_from_the_graphics_manager() {
    let mut s = screen(5, 20);
    let mut cache = NullDiskCache;
    let cmd = GraphicsCommand {
        action: Some(Action::TransmitAndPlace),
        id: Some(7),
        width: Some(2),
        height: Some(2),
        format: Some(Format::Rgba),
        quiet: 1,
        ..Default::default()
    };
    let payload = rgba_payload(2, 2, [10, 20, 30, 255]);
    let cursor = (s.cursor().y, s.cursor().x);
    let mut host = NullHost;
    s.graphics.handle_command(&cmd, &payload, cursor, &mut host, &mut cache);
    assert!(s.graphics.placements().count() > 0);

    // Push far more lines through than the scrollback can hold so the
    // placement's anchor row is guaranteed to fall off the back of history.
    for i in 0..2000 {
        s.draw_text(&format!("filler {i}"));
        s.linefeed();
        s.carriage_return();
    }

    assert_eq!(s.graphics.placements().count(), 0);
}

#[test]
fn resize_clamps_cursor_into_the_new_geometry() {
    let mut s = screen(24, 80);
    s.cursor_position(24, 80);
    s.resize(10, 10);
    assert!(s.cursor().x < 10);
    assert!(s.cursor().y < 10);
}

#[derive(Default)]
struct RecordingHost {
    opened: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
}

impl par_term_screen::host::ScreenHost for RecordingHost {
    fn on_open_url(&mut self, url: &str) {
        self.opened.borrow_mut().push(url.to_string());
    }
    fn resolve_hyperlink_url(&mut self, id: u16) -> Option<String> {
        (id != 0).then(|| format!("https://resolved/{id}"))
    }
}

#[test]
fn detect_url_then_open_url_round_trips_through_the_host() {
    let opened = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let host = RecordingHost { opened: opened.clone() };
    let mut s = Screen::new(5, 40, 100, Box::new(host));
    s.draw_text("go to https://example.com/x now");
    assert!(s.detect_url(9, 0));
    s.open_url();
    assert_eq!(*opened.borrow(), vec!["https://example.com/x".to_string()]);
}

#[test]
fn detect_url_resolves_hyperlink_id_through_the_host() {
    let opened = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let host = RecordingHost { opened: opened.clone() };
    let mut s = Screen::new(5, 40, 100, Box::new(host));
    s.set_active_hyperlink(Some(42));
    s.draw_text("link");
    s.set_active_hyperlink(None);
    assert!(s.detect_url(1, 0));
    s.open_url();
    assert_eq!(*opened.borrow(), vec!["https://resolved/42".to_string()]);
}
