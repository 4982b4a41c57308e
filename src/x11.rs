//! The x11rb-backed [`Display`] implementation.
//!
//! Owns the connection plus the style-level resources shared across
//! reloads: the monochrome contexts, the style palette and the cached
//! keyboard mapping. Handles returned to the core are the raw XIDs (or
//! colormap pixels), so freeing maps one-to-one onto protocol requests.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::color::Rgb;
use crate::display::{
    ColorHandle, ColorRole, Display, FontDescription, GcHandle, KeyEvent, MonoGc, PixmapHandle,
};
use crate::xpm;

/// Fallback widget style: one color per (element, state) pair queried by
/// the resolver, in a plain gray scheme.
const STYLE_PALETTE: &[(&str, &str, &str)] = &[
    ("fg", "selected", "#ffffff"),
    ("fg", "normal", "#000000"),
    ("fg", "active", "#000000"),
    ("bg", "selected", "#4a6984"),
    ("light", "selected", "#7c9cb4"),
    ("dark", "selected", "#314657"),
    ("mid", "selected", "#567185"),
    ("bg", "normal", "#dcdcdc"),
    ("light", "normal", "#f5f5f5"),
    ("dark", "normal", "#a9a9a9"),
    ("mid", "normal", "#c2c2c2"),
    ("bg", "active", "#c0c0c0"),
    ("light", "active", "#e0e0e0"),
    ("dark", "active", "#808080"),
    ("mid", "active", "#a0a0a0"),
];

pub struct X11Display {
    conn: RustConnection,
    root: Window,
    colormap: Colormap,
    depth: u8,
    black_pixel: u32,
    white_pixel: u32,
    black_gc: Gcontext,
    white_gc: Gcontext,
    mono_refs: [u32; 2],
    /// Keysyms per keycode, from the server's current mapping.
    keymap: Vec<u32>,
    keysyms_per_keycode: u8,
    min_keycode: u8,
    net_number_of_desktops: Atom,
    title_font: Option<FontDescription>,
}

impl X11Display {
    /// Connect and create the style-level server resources.
    pub fn open(display_name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(display_name).context("Failed to connect to X server")?;
        let setup = conn.setup();
        let screen = &setup.roots[screen_num];
        let root = screen.root;
        let colormap = screen.default_colormap;
        let depth = screen.root_depth;
        let black_pixel = screen.black_pixel;
        let white_pixel = screen.white_pixel;
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;
        info!(screen = screen_num, depth, "connected to X server");

        let black_gc = conn.generate_id().context("Failed to allocate GC id")?;
        conn.create_gc(
            black_gc,
            root,
            &CreateGCAux::new().foreground(black_pixel).background(white_pixel),
        )
        .context("Failed to create black GC")?;
        let white_gc = conn.generate_id().context("Failed to allocate GC id")?;
        conn.create_gc(
            white_gc,
            root,
            &CreateGCAux::new().foreground(white_pixel).background(black_pixel),
        )
        .context("Failed to create white GC")?;

        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)
            .context("Failed to request keyboard mapping")?
            .reply()
            .context("Failed to get keyboard mapping reply")?;

        let net_number_of_desktops = conn
            .intern_atom(false, b"_NET_NUMBER_OF_DESKTOPS")
            .context("Failed to intern _NET_NUMBER_OF_DESKTOPS atom")?
            .reply()
            .context("Failed to get reply for _NET_NUMBER_OF_DESKTOPS atom")?
            .atom;

        Ok(Self {
            conn,
            root,
            colormap,
            depth,
            black_pixel,
            white_pixel,
            black_gc,
            white_gc,
            mono_refs: [0, 0],
            keymap: mapping.keysyms,
            keysyms_per_keycode: mapping.keysyms_per_keycode,
            min_keycode,
            net_number_of_desktops,
            title_font: None,
        })
    }

    /// `*doubleClickTime` from the root RESOURCE_MANAGER property, the
    /// closest thing to a toolkit-wide setting available over the wire.
    /// Queried fresh on every load so runtime edits take effect.
    fn read_resource_double_click_time(&self) -> Option<u32> {
        let prop = self
            .conn
            .get_property(
                false,
                self.root,
                AtomEnum::RESOURCE_MANAGER,
                AtomEnum::STRING,
                0,
                u32::MAX,
            )
            .ok()?
            .reply()
            .ok()?;
        let text = String::from_utf8_lossy(&prop.value).into_owned();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            if key.trim().trim_start_matches('*') == "doubleClickTime" {
                return value.trim().parse().ok();
            }
        }
        None
    }

    /// Flush pending requests. Called once per main-loop iteration.
    pub fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            warn!(error = %e, "cannot flush X connection");
        }
    }

    /// Non-blocking event poll.
    pub fn poll_event(&self) -> Option<Event> {
        match self.conn.poll_for_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "error polling X events");
                None
            }
        }
    }

    pub fn title_font(&self) -> Option<&FontDescription> {
        self.title_font.as_ref()
    }

    fn keysym_to_keycode(&self, keysym: u32) -> Option<u8> {
        let per = self.keysyms_per_keycode as usize;
        if per == 0 {
            return None;
        }
        self.keymap
            .chunks(per)
            .position(|syms| syms.contains(&keysym))
            .map(|i| self.min_keycode + i as u8)
    }

    /// Pack decoded pixels into the server's Z format for our depth.
    fn pack_image(&self, image: &xpm::XpmImage) -> Result<Vec<u8>> {
        let setup = self.conn.setup();
        let format = setup
            .pixmap_formats
            .iter()
            .find(|f| f.depth == self.depth)
            .context("no pixmap format for root depth")?;
        let bytes_per_pixel = match format.bits_per_pixel {
            32 => 4,
            24 => 3,
            other => bail!("unsupported bits-per-pixel {other}"),
        };
        let pad = format.scanline_pad as usize / 8;
        let stride = (image.width as usize * bytes_per_pixel).div_ceil(pad) * pad;
        let little = setup.image_byte_order == ImageOrder::LSB_FIRST;

        let mut data = vec![0u8; stride * image.height as usize];
        for (i, &pixel) in image.pixels.iter().enumerate() {
            let x = i % image.width as usize;
            let y = i / image.width as usize;
            let off = y * stride + x * bytes_per_pixel;
            let bytes = if little {
                pixel.to_le_bytes()
            } else {
                pixel.to_be_bytes()
            };
            let src = if little {
                &bytes[..bytes_per_pixel]
            } else {
                &bytes[4 - bytes_per_pixel..]
            };
            data[off..off + bytes_per_pixel].copy_from_slice(src);
        }
        Ok(data)
    }
}

impl Display for X11Display {
    fn style_color(&self, element: &str, state: &str) -> Option<String> {
        STYLE_PALETTE
            .iter()
            .find(|&&(e, s, _)| e == element && s == state)
            .map(|&(_, _, color)| color.to_string())
    }

    fn alloc_color(&mut self, color: Rgb) -> Result<ColorHandle> {
        let reply = self
            .conn
            .alloc_color(self.colormap, color.red, color.green, color.blue)
            .context("Failed to request color allocation")?
            .reply()
            .context("Failed to allocate color")?;
        Ok(ColorHandle(reply.pixel))
    }

    fn free_color(&mut self, handle: ColorHandle) {
        if let Err(e) = self.conn.free_colors(self.colormap, 0, &[handle.0]) {
            warn!(pixel = handle.0, error = %e, "cannot free color");
        }
    }

    fn create_title_gc(&mut self, role: ColorRole, foreground: ColorHandle) -> Result<GcHandle> {
        let gc = self.conn.generate_id().context("Failed to allocate GC id")?;
        let background = match role {
            ColorRole::Active => self.black_pixel,
            ColorRole::Inactive => self.white_pixel,
        };
        self.conn
            .create_gc(
                gc,
                self.root,
                &CreateGCAux::new()
                    .foreground(foreground.0)
                    .background(background),
            )
            .context("Failed to create title GC")?;
        Ok(GcHandle(gc))
    }

    fn create_invert_gc(&mut self) -> Result<GcHandle> {
        let gc = self.conn.generate_id().context("Failed to allocate GC id")?;
        self.conn
            .create_gc(
                gc,
                self.root,
                &CreateGCAux::new()
                    .function(GX::XOR)
                    .foreground(self.black_pixel ^ self.white_pixel)
                    .subwindow_mode(SubwindowMode::INCLUDE_INFERIORS),
            )
            .context("Failed to create invert GC")?;
        Ok(GcHandle(gc))
    }

    fn ref_mono_gc(&mut self, which: MonoGc) -> GcHandle {
        self.mono_refs[which as usize] += 1;
        match which {
            MonoGc::Black => GcHandle(self.black_gc),
            MonoGc::White => GcHandle(self.white_gc),
        }
    }

    fn free_gc(&mut self, handle: GcHandle) {
        // The monochrome contexts outlive every reload; only drop the ref.
        if handle.0 == self.black_gc {
            self.mono_refs[MonoGc::Black as usize] =
                self.mono_refs[MonoGc::Black as usize].saturating_sub(1);
            return;
        }
        if handle.0 == self.white_gc {
            self.mono_refs[MonoGc::White as usize] =
                self.mono_refs[MonoGc::White as usize].saturating_sub(1);
            return;
        }
        if let Err(e) = self.conn.free_gc(handle.0) {
            warn!(gc = handle.0, error = %e, "cannot free GC");
        }
    }

    fn load_asset(
        &mut self,
        dir: &Path,
        file: &str,
        color_symbols: &[(&str, &str)],
    ) -> Result<PixmapHandle> {
        let path = dir.join(file);
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let image = xpm::parse(&source, color_symbols)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        let data = self.pack_image(&image)?;

        let pixmap = self
            .conn
            .generate_id()
            .context("Failed to allocate pixmap id")?;
        self.conn
            .create_pixmap(self.depth, pixmap, self.root, image.width, image.height)
            .context("Failed to create pixmap")?;
        let gc = self.conn.generate_id().context("Failed to allocate GC id")?;
        self.conn
            .create_gc(gc, pixmap, &CreateGCAux::new())
            .context("Failed to create upload GC")?;
        self.conn
            .put_image(
                ImageFormat::Z_PIXMAP,
                pixmap,
                gc,
                image.width,
                image.height,
                0,
                0,
                0,
                self.depth,
                &data,
            )
            .context("Failed to upload image")?;
        if let Err(e) = self.conn.free_gc(gc) {
            warn!(error = %e, "cannot free upload GC");
        }
        debug!(file = %file, width = image.width, height = image.height, "uploaded themed image");
        Ok(PixmapHandle(pixmap))
    }

    fn free_asset(&mut self, handle: PixmapHandle) {
        if let Err(e) = self.conn.free_pixmap(handle.0) {
            warn!(pixmap = handle.0, error = %e, "cannot free pixmap");
        }
    }

    fn set_title_font(&mut self, font: &FontDescription) {
        debug!(family = %font.family, size = ?font.size, "title font selected");
        self.title_font = Some(font.clone());
    }

    fn double_click_time(&self) -> Option<u32> {
        self.read_resource_double_click_time()
    }

    fn resolve_keysym(&self, name: &str) -> Option<u8> {
        keysym_from_name(name).and_then(|sym| self.keysym_to_keycode(sym))
    }

    fn grab_key(&mut self, key: KeyEvent) {
        // Also grab with Lock and Num Lock held so the chord works
        // regardless of lock state.
        let lock = u16::from(ModMask::LOCK);
        let num = u16::from(ModMask::M2);
        for extra in [0, lock, num, lock | num] {
            if let Err(e) = self.conn.grab_key(
                true,
                self.root,
                ModMask::from(key.modifiers | extra),
                key.keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            ) {
                warn!(keycode = key.keycode, error = %e, "cannot grab key");
            }
        }
    }

    fn ungrab_keys(&mut self) {
        if let Err(e) = self.conn.ungrab_key(Grab::ANY, self.root, ModMask::ANY) {
            warn!(error = %e, "cannot release key grabs");
        }
    }

    fn desktop_count_hint(&self) -> Option<u32> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.net_number_of_desktops,
                AtomEnum::CARDINAL,
                0,
                1,
            )
            .ok()?
            .reply()
            .ok()?;
        reply.value32().and_then(|mut v| v.next())
    }

    fn set_desktop_count_hint(&mut self, count: u32) {
        if let Err(e) = self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.net_number_of_desktops,
            AtomEnum::CARDINAL,
            &[count],
        ) {
            warn!(count, error = %e, "cannot publish desktop count");
        }
    }
}

/// Map a key name from a binding spec to its keysym. Single characters
/// use their Latin-1 keysym; the rest is the named-key set bindings
/// actually use.
fn keysym_from_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let code = c as u32;
        if (0x20..=0x7e).contains(&code) || (0xa0..=0xff).contains(&code) {
            return Some(code);
        }
        return None;
    }
    if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok())
        && (1..=35).contains(&n)
    {
        return Some(0xffbe + n - 1);
    }
    match name {
        "space" => Some(0x20),
        "BackSpace" => Some(0xff08),
        "Tab" => Some(0xff09),
        "Return" => Some(0xff0d),
        "Escape" => Some(0xff1b),
        "Home" => Some(0xff50),
        "Left" => Some(0xff51),
        "Up" => Some(0xff52),
        "Right" => Some(0xff53),
        "Down" => Some(0xff54),
        "Prior" | "Page_Up" => Some(0xff55),
        "Next" | "Page_Down" => Some(0xff56),
        "End" => Some(0xff57),
        "Insert" => Some(0xff63),
        "Delete" => Some(0xffff),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_characters_map_to_latin1_keysyms() {
        assert_eq!(keysym_from_name("a"), Some('a' as u32));
        assert_eq!(keysym_from_name("Z"), Some('Z' as u32));
        assert_eq!(keysym_from_name("5"), Some('5' as u32));
    }

    #[test]
    fn function_keys_map_into_their_range() {
        assert_eq!(keysym_from_name("F1"), Some(0xffbe));
        assert_eq!(keysym_from_name("F12"), Some(0xffc9));
        assert_eq!(keysym_from_name("F35"), Some(0xffe0));
        assert_eq!(keysym_from_name("F36"), None);
        assert_eq!(keysym_from_name("F0"), None);
    }

    #[test]
    fn named_keys_resolve_and_unknown_names_do_not() {
        assert_eq!(keysym_from_name("Tab"), Some(0xff09));
        assert_eq!(keysym_from_name("Left"), Some(0xff51));
        assert_eq!(keysym_from_name("Page_Up"), Some(0xff55));
        assert_eq!(keysym_from_name("NoSuchKey"), None);
        assert_eq!(keysym_from_name(""), None);
    }
}
