//! Color string parsing.
//!
//! Theme files use the X11 hex notations `#RGB`, `#RRGGBB` and
//! `#RRRRGGGGBBBB`, plus the handful of color names stock themes rely on.
//! Channels are widened to the 16-bit range the X colormap protocol
//! expects.

/// A parsed color with 16-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb {
    /// Pack into 0x00RRGGBB with 8-bit channels, for raw pixel data.
    pub fn to_rgb24(self) -> u32 {
        let r = (self.red >> 8) as u32;
        let g = (self.green >> 8) as u32;
        let b = (self.blue >> 8) as u32;
        (r << 16) | (g << 8) | b
    }
}

/// Color names accepted alongside hex, matched case-insensitively. The
/// subset of the server color database that theme files actually use.
const NAMED: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x00ff00),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("gray", 0xbebebe),
    ("grey", 0xbebebe),
    ("orange", 0xffa500),
    ("brown", 0xa52a2a),
];

/// Parse an X11-style color specification, hex or named.
///
/// Returns `None` for anything that is neither `#` followed by 3, 6 or 12
/// hex digits nor a recognized color name.
pub fn parse(spec: &str) -> Option<Rgb> {
    let spec = spec.trim();
    let Some(hex) = spec.strip_prefix('#') else {
        return NAMED
            .iter()
            .find(|(name, _)| spec.eq_ignore_ascii_case(name))
            .map(|&(_, rgb)| Rgb {
                red: ((rgb >> 16) & 0xff) as u16 * 257,
                green: ((rgb >> 8) & 0xff) as u16 * 257,
                blue: (rgb & 0xff) as u16 * 257,
            });
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u16::from_str_radix(s, 16).ok();
    match hex.len() {
        // #RGB: replicate the nibble across the full 16-bit channel
        3 => {
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            Some(Rgb {
                red: r * 0x1111,
                green: g * 0x1111,
                blue: b * 0x1111,
            })
        }
        // #RRGGBB: scale 8-bit channels by 257 so 0xff maps to 0xffff
        6 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            Some(Rgb {
                red: r * 257,
                green: g * 257,
                blue: b * 257,
            })
        }
        12 => {
            let r = channel(&hex[0..4])?;
            let g = channel(&hex[4..8])?;
            let b = channel(&hex[8..12])?;
            Some(Rgb { red: r, green: g, blue: b })
        }
        _ => None,
    }
}
