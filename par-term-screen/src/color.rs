//! Cell color representation: 24-bit RGB with a palette-index fallback.

/// One of the 16 standard ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl NamedColor {
    /// The index this color occupies in the standard 256-color palette.
    pub const fn palette_index(self) -> u8 {
        self as u8
    }

    /// Default RGB triple used when no external palette/theme is attached.
    pub const fn default_rgb(self) -> (u8, u8, u8) {
        match self {
            NamedColor::Black => (0, 0, 0),
            NamedColor::Red => (205, 0, 0),
            NamedColor::Green => (0, 205, 0),
            NamedColor::Yellow => (205, 205, 0),
            NamedColor::Blue => (0, 0, 238),
            NamedColor::Magenta => (205, 0, 205),
            NamedColor::Cyan => (0, 205, 205),
            NamedColor::White => (229, 229, 229),
            NamedColor::BrightBlack => (127, 127, 127),
            NamedColor::BrightRed => (255, 0, 0),
            NamedColor::BrightGreen => (0, 255, 0),
            NamedColor::BrightYellow => (255, 255, 0),
            NamedColor::BrightBlue => (92, 92, 255),
            NamedColor::BrightMagenta => (255, 0, 255),
            NamedColor::BrightCyan => (0, 255, 255),
            NamedColor::BrightWhite => (255, 255, 255),
        }
    }
}

/// A cell foreground/background/decoration color.
///
/// Kept small and `Copy` because it lives inline in every [`crate::cell::Cell`].
/// `Indexed` carries a raw palette index (0-255) so that a 256-color escape
/// sequence round-trips without needing a theme/profile to resolve it
/// immediately — color-profile lookup is an external collaborator (spec §1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Use the surrounding default foreground or background.
    Default,
    Named(NamedColor),
    /// A raw 256-color palette index (16-255 for cube/grayscale entries).
    Indexed(u8),
    /// A direct 24-bit truecolor value.
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

impl Color {
    /// Resolve to an RGB triple without consulting an external color profile.
    ///
    /// `Indexed` entries 0-15 fall back to the matching `NamedColor`; 16-231
    /// resolve the standard 6x6x6 color cube; 232-255 resolve the grayscale
    /// ramp. This is the engine's built-in fallback — a real frontend is
    /// expected to override indexed/default colors via its own color
    /// profile before rendering.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Default => (229, 229, 229),
            Color::Named(n) => n.default_rgb(),
            Color::Indexed(i) => indexed_to_rgb(i),
            Color::Rgb(r, g, b) => (r, g, b),
        }
    }
}

fn indexed_to_rgb(index: u8) -> (u8, u8, u8) {
    const NAMED: [NamedColor; 16] = [
        NamedColor::Black,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Blue,
        NamedColor::Magenta,
        NamedColor::Cyan,
        NamedColor::White,
        NamedColor::BrightBlack,
        NamedColor::BrightRed,
        NamedColor::BrightGreen,
        NamedColor::BrightYellow,
        NamedColor::BrightBlue,
        NamedColor::BrightMagenta,
        NamedColor::BrightCyan,
        NamedColor::BrightWhite,
    ];
    match index {
        0..=15 => NAMED[index as usize].default_rgb(),
        16..=231 => {
            let i = index - 16;
            let r = i / 36;
            let g = (i % 36) / 6;
            let b = i % 6;
            const RAMP: [u8; 6] = [0, 95, 135, 175, 215, 255];
            (RAMP[r as usize], RAMP[g as usize], RAMP[b as usize])
        }
        232..=255 => {
            let level = 8 + (index - 232) * 10;
            (level, level, level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_roundtrips_through_indexed() {
        assert_eq!(
            Color::Named(NamedColor::Red).to_rgb(),
            Color::Indexed(1).to_rgb()
        );
    }

    #[test]
    fn grayscale_ramp_is_monotonic() {
        let a = Color::Indexed(232).to_rgb().0;
        let b = Color::Indexed(255).to_rgb().0;
        assert!(b > a);
    }
}
