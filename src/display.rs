//! The seam between the settings core and the windowing/toolkit layer.
//!
//! Everything the core needs from the X server or the widget style goes
//! through the [`Display`] trait: color allocation, graphics contexts,
//! themed pixmap decoding, fonts, key resolution and global key grabs.
//! Handles are opaque ids in the X11 XID style so the trait stays
//! object-safe and test doubles can issue their own.

use std::path::Path;

use anyhow::Result;

use crate::color::Rgb;

/// A server-side color allocation (the colormap pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorHandle(pub u32);

/// A graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcHandle(pub u32);

/// A decoded themed image uploaded to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixmapHandle(pub u32);

/// The two title color roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Active,
    Inactive,
}

/// The two shared monochrome contexts mirrored from the style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonoGc {
    Black,
    White,
}

/// A key capture: hardware keycode plus modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub keycode: u8,
    pub modifiers: u16,
}

/// A parsed title font, in the `"Family [Style ...] [Size]"` shape the
/// `title_font` option uses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontDescription {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    pub size: Option<f32>,
}

impl FontDescription {
    /// Parse a font description string. Only a blank string fails; an
    /// unrecognized trailing word is simply part of the family name.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut tokens: Vec<&str> = spec.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }
        let mut desc = Self::default();
        if let Some(last) = tokens.last()
            && let Ok(size) = last.parse::<f32>()
            && size > 0.0
        {
            desc.size = Some(size);
            tokens.pop();
        }
        while let Some(last) = tokens.last() {
            match last.to_ascii_lowercase().as_str() {
                "bold" | "heavy" => {
                    desc.bold = true;
                    tokens.pop();
                }
                "italic" | "oblique" => {
                    desc.italic = true;
                    tokens.pop();
                }
                "regular" | "normal" | "medium" => {
                    tokens.pop();
                }
                _ => break,
            }
        }
        desc.family = tokens.join(" ");
        Some(desc)
    }
}

/// Operations the settings core needs from the display layer.
///
/// Allocation methods may fail (the server can refuse); release methods
/// never do, they log and move on. The core guarantees release-before-
/// reallocate, so implementations do not need to defend against leaks.
pub trait Display {
    /// Widget-style color for a themed element/state pair, e.g.
    /// `("fg", "selected")`. `None` when the style does not define one.
    fn style_color(&self, element: &str, state: &str) -> Option<String>;

    fn alloc_color(&mut self, color: Rgb) -> Result<ColorHandle>;
    fn free_color(&mut self, handle: ColorHandle);

    /// Derive a title GC by copying the style text context for the role
    /// and overwriting its foreground.
    fn create_title_gc(&mut self, role: ColorRole, foreground: ColorHandle) -> Result<GcHandle>;
    /// The XOR context used for box move/resize outlines.
    fn create_invert_gc(&mut self) -> Result<GcHandle>;
    /// Add a reference to a style-owned monochrome context. Paired with
    /// [`free_gc`](Self::free_gc); the style is the longest holder.
    fn ref_mono_gc(&mut self, which: MonoGc) -> GcHandle;
    fn free_gc(&mut self, handle: GcHandle);

    /// Decode `dir/file` with the given color substitution table and
    /// upload it as a pixmap.
    fn load_asset(
        &mut self,
        dir: &Path,
        file: &str,
        color_symbols: &[(&str, &str)],
    ) -> Result<PixmapHandle>;
    fn free_asset(&mut self, handle: PixmapHandle);

    fn set_title_font(&mut self, font: &FontDescription);
    /// Toolkit-wide double-click time, when the toolkit publishes one.
    fn double_click_time(&self) -> Option<u32>;

    /// Map a keysym name to a hardware keycode on the current keyboard.
    fn resolve_keysym(&self, name: &str) -> Option<u8>;
    fn grab_key(&mut self, key: KeyEvent);
    /// Release every global key capture.
    fn ungrab_keys(&mut self);

    /// Root-window desktop count hint, if some other client already set it.
    fn desktop_count_hint(&self) -> Option<u32>;
    fn set_desktop_count_hint(&mut self, count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_family_style_and_size() {
        let desc = FontDescription::parse("DejaVu Sans Bold Italic 12").unwrap();
        assert_eq!(desc.family, "DejaVu Sans");
        assert!(desc.bold);
        assert!(desc.italic);
        assert_eq!(desc.size, Some(12.0));
    }

    #[test]
    fn parses_bare_family() {
        let desc = FontDescription::parse("Sans").unwrap();
        assert_eq!(desc.family, "Sans");
        assert!(!desc.bold);
        assert_eq!(desc.size, None);
    }

    #[test]
    fn fractional_sizes_are_accepted() {
        let desc = FontDescription::parse("Sans 9.5").unwrap();
        assert_eq!(desc.size, Some(9.5));
    }

    #[test]
    fn normal_weight_words_are_dropped() {
        let desc = FontDescription::parse("Sans Regular 10").unwrap();
        assert_eq!(desc.family, "Sans");
        assert!(!desc.bold);
    }

    #[test]
    fn blank_string_fails_to_parse() {
        assert_eq!(FontDescription::parse(""), None);
        assert_eq!(FontDescription::parse("   "), None);
    }

    #[test]
    fn unknown_trailing_word_stays_in_family() {
        let desc = FontDescription::parse("Comic Relief").unwrap();
        assert_eq!(desc.family, "Comic Relief");
    }
}
