//! Resource lifecycle management for derived graphical assets.
//!
//! Owns every server-side resource the theme produces: the two title
//! color/context pairs, the shared monochrome contexts, the box outline
//! context and all themed pixmaps. The discipline throughout is release
//! before reallocate, so repeated reloads never accumulate allocations and
//! a failed load leaves a slot empty rather than dangling.

use std::path::Path;

use tracing::{debug, warn};

use crate::catalog::ResolutionTable;
use crate::color::{self, Rgb};
use crate::display::{
    ColorHandle, ColorRole, Display, FontDescription, GcHandle, MonoGc, PixmapHandle,
};

pub const ACTIVE: usize = 0;
pub const INACTIVE: usize = 1;
pub const PRESSED: usize = 2;

pub const SIDE_COUNT: usize = 3;
pub const CORNER_COUNT: usize = 4;
pub const BUTTON_COUNT: usize = 6;
pub const TITLE_COUNT: usize = 5;

/// Image files for each slot, indexed by part then state.
const SIDE_FILES: [[&str; 2]; SIDE_COUNT] = [
    ["left-active.xpm", "left-inactive.xpm"],
    ["right-active.xpm", "right-inactive.xpm"],
    ["bottom-active.xpm", "bottom-inactive.xpm"],
];
const CORNER_FILES: [[&str; 2]; CORNER_COUNT] = [
    ["top-left-active.xpm", "top-left-inactive.xpm"],
    ["top-right-active.xpm", "top-right-inactive.xpm"],
    ["bottom-left-active.xpm", "bottom-left-inactive.xpm"],
    ["bottom-right-active.xpm", "bottom-right-inactive.xpm"],
];
const BUTTON_FILES: [[&str; 3]; BUTTON_COUNT] = [
    ["hide-active.xpm", "hide-inactive.xpm", "hide-pressed.xpm"],
    ["close-active.xpm", "close-inactive.xpm", "close-pressed.xpm"],
    [
        "maximize-active.xpm",
        "maximize-inactive.xpm",
        "maximize-pressed.xpm",
    ],
    ["shade-active.xpm", "shade-inactive.xpm", "shade-pressed.xpm"],
    ["stick-active.xpm", "stick-inactive.xpm", "stick-pressed.xpm"],
    ["menu-active.xpm", "menu-inactive.xpm", "menu-pressed.xpm"],
];
const TITLE_FILES: [[&str; 2]; TITLE_COUNT] = [
    ["title-1-active.xpm", "title-1-inactive.xpm"],
    ["title-2-active.xpm", "title-2-inactive.xpm"],
    ["title-3-active.xpm", "title-3-inactive.xpm"],
    ["title-4-active.xpm", "title-4-inactive.xpm"],
    ["title-5-active.xpm", "title-5-inactive.xpm"],
];

/// Color options feeding the two title roles, indexed by role.
const TITLE_COLOR_OPTIONS: [&str; 2] = ["active_text_color", "inactive_text_color"];

/// One title color role. `allocated` is true only while `handle` holds a
/// live colormap entry; `gc`, when present, mirrors the color.
#[derive(Debug, Default)]
pub struct TitleColor {
    pub parsed: Option<Rgb>,
    pub handle: Option<ColorHandle>,
    pub allocated: bool,
    pub gc: Option<GcHandle>,
}

/// Every themed resource the settings core owns.
#[derive(Debug, Default)]
pub struct ThemeResources {
    pub title_colors: [TitleColor; 2],
    pub black_gc: Option<GcHandle>,
    pub white_gc: Option<GcHandle>,
    pub box_gc: Option<GcHandle>,
    pub sides: [[Option<PixmapHandle>; 2]; SIDE_COUNT],
    pub corners: [[Option<PixmapHandle>; 2]; CORNER_COUNT],
    pub buttons: [[Option<PixmapHandle>; 3]; BUTTON_COUNT],
    pub title: [[Option<PixmapHandle>; 2]; TITLE_COUNT],
}

impl ThemeResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a resolved table: (re)allocate title colors, refresh the
    /// shared contexts, reload every themed image from `theme_dir` and
    /// apply the title font. Local failures are logged and leave the
    /// affected slot in its empty state.
    pub fn apply(&mut self, display: &mut dyn Display, table: &ResolutionTable, theme_dir: &Path) {
        debug!(theme_dir = %theme_dir.display(), "applying theme");

        self.apply_title_color(display, ACTIVE, table.get(TITLE_COLOR_OPTIONS[ACTIVE]));

        // The monochrome contexts mirror the style; drop our old reference
        // after taking the new one so the style stays the longest holder.
        let black = display.ref_mono_gc(MonoGc::Black);
        if let Some(old) = self.black_gc.replace(black) {
            display.free_gc(old);
        }
        let white = display.ref_mono_gc(MonoGc::White);
        if let Some(old) = self.white_gc.replace(white) {
            display.free_gc(old);
        }

        self.apply_title_color(display, INACTIVE, table.get(TITLE_COLOR_OPTIONS[INACTIVE]));

        if let Some(font) = table.get("title_font").filter(|f| !f.is_empty()) {
            // Unparsable font strings are ignored; no fallback is forced.
            if let Some(desc) = FontDescription::parse(font) {
                display.set_title_font(&desc);
            }
        }

        let symbols = table.color_symbols();
        for (part, files) in SIDE_FILES.iter().enumerate() {
            for (state, file) in files.iter().enumerate() {
                load_slot(display, &mut self.sides[part][state], theme_dir, file, &symbols);
            }
        }
        for (part, files) in CORNER_FILES.iter().enumerate() {
            for (state, file) in files.iter().enumerate() {
                load_slot(display, &mut self.corners[part][state], theme_dir, file, &symbols);
            }
        }
        for (part, files) in BUTTON_FILES.iter().enumerate() {
            for (state, file) in files.iter().enumerate() {
                load_slot(display, &mut self.buttons[part][state], theme_dir, file, &symbols);
            }
        }
        for (part, files) in TITLE_FILES.iter().enumerate() {
            for (state, file) in files.iter().enumerate() {
                load_slot(display, &mut self.title[part][state], theme_dir, file, &symbols);
            }
        }

        if let Some(old) = self.box_gc.take() {
            display.free_gc(old);
        }
        match display.create_invert_gc() {
            Ok(gc) => self.box_gc = Some(gc),
            Err(e) => warn!(error = %e, "cannot create box outline context"),
        }
    }

    /// Release the previous allocation for a role, then parse, allocate
    /// and derive the context for the new color. Any failure leaves the
    /// role unallocated, already-released state included.
    fn apply_title_color(
        &mut self,
        display: &mut dyn Display,
        role_idx: usize,
        spec: Option<&str>,
    ) {
        let role = if role_idx == ACTIVE {
            ColorRole::Active
        } else {
            ColorRole::Inactive
        };
        self.release_title_color(display, role_idx);
        let slot = &mut self.title_colors[role_idx];

        let Some(spec) = spec else {
            warn!(role = ?role, "no title color resolved");
            return;
        };
        let Some(parsed) = color::parse(spec) else {
            warn!(role = ?role, color = %spec, "cannot parse title color");
            return;
        };
        slot.parsed = Some(parsed);
        let handle = match display.alloc_color(parsed) {
            Ok(h) => h,
            Err(e) => {
                warn!(role = ?role, color = %spec, error = %e, "cannot allocate title color");
                return;
            }
        };
        slot.handle = Some(handle);
        slot.allocated = true;
        match display.create_title_gc(role, handle) {
            Ok(gc) => slot.gc = Some(gc),
            Err(e) => warn!(role = ?role, error = %e, "cannot derive title context"),
        }
    }

    fn release_title_color(&mut self, display: &mut dyn Display, role_idx: usize) {
        let slot = &mut self.title_colors[role_idx];
        if slot.allocated
            && let Some(handle) = slot.handle.take()
        {
            display.free_color(handle);
        }
        slot.handle = None;
        slot.allocated = false;
        slot.parsed = None;
        if let Some(gc) = slot.gc.take() {
            display.free_gc(gc);
        }
    }

    /// Release everything. Safe to call repeatedly; called before every
    /// reload and at teardown.
    pub fn release_all(&mut self, display: &mut dyn Display) {
        debug!("releasing theme resources");
        self.release_title_color(display, ACTIVE);
        self.release_title_color(display, INACTIVE);
        for gc in [
            self.black_gc.take(),
            self.white_gc.take(),
            self.box_gc.take(),
        ]
        .into_iter()
        .flatten()
        {
            display.free_gc(gc);
        }
        let slots = self
            .sides
            .iter_mut()
            .flatten()
            .chain(self.corners.iter_mut().flatten())
            .chain(self.buttons.iter_mut().flatten())
            .chain(self.title.iter_mut().flatten());
        for slot in slots {
            if let Some(pixmap) = slot.take() {
                display.free_asset(pixmap);
            }
        }
    }

    /// Number of asset slots currently holding a pixmap.
    pub fn loaded_asset_count(&self) -> usize {
        self.sides
            .iter()
            .flatten()
            .chain(self.corners.iter().flatten())
            .chain(self.buttons.iter().flatten())
            .chain(self.title.iter().flatten())
            .filter(|s| s.is_some())
            .count()
    }
}

/// Release-then-load for one asset slot; a load failure leaves it empty
/// until the next reload.
fn load_slot(
    display: &mut dyn Display,
    slot: &mut Option<PixmapHandle>,
    theme_dir: &Path,
    file: &str,
    symbols: &[(&str, &str)],
) {
    if let Some(old) = slot.take() {
        display.free_asset(old);
    }
    match display.load_asset(theme_dir, file, symbols) {
        Ok(pixmap) => *slot = Some(pixmap),
        Err(e) => {
            warn!(file = %file, theme_dir = %theme_dir.display(), error = %e, "cannot load themed image");
        }
    }
}
