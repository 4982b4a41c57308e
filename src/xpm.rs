//! XPM3 decoder with color symbol substitution.
//!
//! Theme assets are XPM images whose palette entries can carry a symbolic
//! name (`s active_color_1`). The loader replaces those entries with the
//! colors resolved from the current theme before uploading, which is how
//! one set of image files follows the color scheme.

use anyhow::{Context, Result, bail};

use crate::color;

/// A decoded image: row-major 0x00RRGGBB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpmImage {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u32>,
}

/// Transparent palette entries have no color of their own; they render as
/// black when uploaded to a depth without alpha.
const TRANSPARENT: u32 = 0x000000;

/// Decode XPM source text, overriding palette entries whose symbolic name
/// appears in `color_symbols`.
pub fn parse(source: &str, color_symbols: &[(&str, &str)]) -> Result<XpmImage> {
    let strings = extract_strings(source)?;
    let mut iter = strings.iter();

    let header = iter.next().context("missing XPM header string")?;
    let mut fields = header.split_whitespace();
    let width: u16 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .context("bad XPM width")?;
    let height: u16 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .context("bad XPM height")?;
    let ncolors: usize = fields
        .next()
        .and_then(|f| f.parse().ok())
        .context("bad XPM color count")?;
    let cpp: usize = fields
        .next()
        .and_then(|f| f.parse().ok())
        .context("bad XPM chars-per-pixel")?;
    if cpp == 0 {
        bail!("XPM chars-per-pixel must be non-zero");
    }

    // Palette: chunk of `cpp` chars, then key/value tokens. We honor the
    // `c` (color) and `s` (symbolic name) keys and ignore the mono keys.
    let mut palette: Vec<(String, u32)> = Vec::with_capacity(ncolors);
    for _ in 0..ncolors {
        let line = iter.next().context("truncated XPM palette")?;
        if line.chars().count() < cpp {
            bail!("palette entry shorter than chars-per-pixel");
        }
        let chars: String = line.chars().take(cpp).collect();
        let rest: Vec<&str> = line[chars.len()..].split_whitespace().collect();

        let mut color_spec: Option<&str> = None;
        let mut symbol: Option<&str> = None;
        let mut i = 0;
        while i < rest.len() {
            match rest[i] {
                "c" => color_spec = rest.get(i + 1).copied(),
                "s" => symbol = rest.get(i + 1).copied(),
                _ => {}
            }
            i += 2;
        }

        let spec = symbol
            .and_then(|name| {
                color_symbols
                    .iter()
                    .find(|(sym, _)| *sym == name)
                    .map(|&(_, value)| value)
            })
            .or(color_spec)
            .with_context(|| format!("palette entry '{chars}' has no color"))?;

        let pixel = if spec.eq_ignore_ascii_case("none") {
            TRANSPARENT
        } else {
            color::parse(spec)
                .with_context(|| format!("unparsable palette color '{spec}'"))?
                .to_rgb24()
        };
        palette.push((chars, pixel));
    }

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for _ in 0..height {
        let row = iter.next().context("truncated XPM pixel rows")?;
        let chars: Vec<char> = row.chars().collect();
        if chars.len() < width as usize * cpp {
            bail!("pixel row shorter than declared width");
        }
        for x in 0..width as usize {
            let key: String = chars[x * cpp..(x + 1) * cpp].iter().collect();
            let pixel = palette
                .iter()
                .find(|(k, _)| *k == key)
                .map(|&(_, p)| p)
                .with_context(|| format!("pixel '{key}' not in palette"))?;
            pixels.push(pixel);
        }
    }

    Ok(XpmImage {
        width,
        height,
        pixels,
    })
}

/// Pull the double-quoted strings out of the C array syntax, in order.
fn extract_strings(source: &str) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (&mut current, c) {
            (None, '"') => current = Some(String::new()),
            (Some(s), '"') => {
                strings.push(std::mem::take(s));
                current = None;
            }
            (Some(s), '\\') => {
                // Rare in image data but legal in C strings.
                if let Some(&next) = chars.peek() {
                    s.push(next);
                    chars.next();
                }
            }
            (Some(s), c) => s.push(c),
            (None, _) => {}
        }
    }
    if current.is_some() {
        bail!("unterminated string in XPM source");
    }
    if strings.is_empty() {
        bail!("no strings found in XPM source");
    }
    Ok(strings)
}
