//! `HistoryBuffer`: bounded scrollback ring evicted from the main screen's
//! top row (spec §3/§4.3).

use crate::line::Line;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    lines: VecDeque<Line>,
    capacity: usize,
}

/// Sentinel amounts accepted by [`crate::screen::Screen::history_scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAmount {
    Lines(usize),
    /// One full page (`rows - 1` lines).
    Page,
    /// All the way to the oldest/newest line.
    Full,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Push a newly-evicted row onto the bottom (most recent end) of
    /// history, evicting the oldest line if full.
    pub fn push(&mut self, line: Line) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Pop the most-recently-pushed line back out (used when enlarging the
    /// window pulls rows back from scrollback, or `reverse_scroll` with
    /// `fill_from_scrollback`, spec §4.2/§4.3).
    pub fn pop_line_to(&mut self) -> Option<Line> {
        self.lines.pop_back()
    }

    /// `index` counts from the oldest (0) line.
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.lines.get_mut(index)
    }

    /// Lines in oldest-to-newest order, as stored.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Line> {
        self.lines.iter()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn resize_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.lines.len() > capacity {
            self.lines.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_beyond_capacity_evicts_oldest() {
        let mut h = HistoryBuffer::new(2);
        h.push(Line::new(1));
        let mut second = Line::new(1);
        second.cell_mut(0).unwrap().set_char('a');
        h.push(second);
        let mut third = Line::new(1);
        third.cell_mut(0).unwrap().set_char('b');
        h.push(third);
        assert_eq!(h.len(), 2);
        assert_eq!(h.line(0).unwrap().cell(0).unwrap().base_char(), 'a');
        assert_eq!(h.line(1).unwrap().cell(0).unwrap().base_char(), 'b');
    }

    #[test]
    fn pop_line_to_removes_newest() {
        let mut h = HistoryBuffer::new(4);
        h.push(Line::new(1));
        let mut second = Line::new(1);
        second.cell_mut(0).unwrap().set_char('z');
        h.push(second);
        let popped = h.pop_line_to().unwrap();
        assert_eq!(popped.cell(0).unwrap().base_char(), 'z');
        assert_eq!(h.len(), 1);
    }
}
