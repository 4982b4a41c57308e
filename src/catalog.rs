//! The option catalog and the resolution table built from it.
//!
//! The catalog is the universe of recognized options, in declaration order.
//! A fresh table is built from it at the start of every resolution pass and
//! filled in by the cascading sources; the first [`COLOR_SYMBOL_COUNT`]
//! entries double as the color substitution table handed to the themed
//! asset loader, so their order matters.

use std::collections::HashMap;
use tracing::debug;

/// Number of leading catalog entries that form the color substitution table.
pub const COLOR_SYMBOL_COUNT: usize = 20;

/// One recognized option. `required` means absence after a full resolution
/// pass is a fatal configuration error.
#[derive(Debug, Clone)]
pub struct OptionEntry {
    pub name: &'static str,
    pub value: Option<String>,
    pub required: bool,
}

/// Every option the settings core understands, in declaration order.
/// The 20 color roles come first and are optional: they fall back to the
/// display style palette and may be overridden per theme.
const CATALOG: &[(&str, bool)] = &[
    ("active_text_color", false),
    ("inactive_text_color", false),
    ("active_border_color", false),
    ("inactive_border_color", false),
    ("active_color_1", false),
    ("active_hilight_1", false),
    ("active_shadow_1", false),
    ("active_mid_1", false),
    ("active_color_2", false),
    ("active_hilight_2", false),
    ("active_shadow_2", false),
    ("active_mid_2", false),
    ("inactive_color_1", false),
    ("inactive_hilight_1", false),
    ("inactive_shadow_1", false),
    ("inactive_mid_1", false),
    ("inactive_color_2", false),
    ("inactive_hilight_2", false),
    ("inactive_shadow_2", false),
    ("inactive_mid_2", false),
    ("theme", true),
    ("keytheme", true),
    ("title_font", false),
    ("title_alignment", true),
    ("full_width_title", true),
    ("title_shadow_active", true),
    ("title_shadow_inactive", true),
    ("button_layout", true),
    ("button_spacing", true),
    ("title_vertical_offset_active", true),
    ("title_vertical_offset_inactive", true),
    ("title_horizontal_offset", true),
    ("button_offset", true),
    ("double_click_action", true),
    ("box_move", true),
    ("box_resize", true),
    ("click_to_focus", true),
    ("focus_hint", true),
    ("focus_new", true),
    ("raise_on_focus", true),
    ("raise_delay", true),
    ("snap_to_border", true),
    ("snap_width", true),
    ("dbl_click_time", true),
    ("workspace_count", true),
    ("wrap_workspaces", true),
    ("close_window_key", true),
    ("hide_window_key", true),
    ("maximize_window_key", true),
    ("maximize_vert_key", true),
    ("maximize_horiz_key", true),
    ("shade_window_key", true),
    ("cycle_windows_key", true),
    ("move_window_up_key", true),
    ("move_window_down_key", true),
    ("move_window_left_key", true),
    ("move_window_right_key", true),
    ("resize_window_up_key", true),
    ("resize_window_down_key", true),
    ("resize_window_left_key", true),
    ("resize_window_right_key", true),
    ("next_workspace_key", true),
    ("prev_workspace_key", true),
    ("add_workspace_key", true),
    ("del_workspace_key", true),
    ("stick_window_key", true),
    ("workspace_1_key", true),
    ("workspace_2_key", true),
    ("workspace_3_key", true),
    ("workspace_4_key", true),
    ("workspace_5_key", true),
    ("workspace_6_key", true),
    ("workspace_7_key", true),
    ("workspace_8_key", true),
    ("workspace_9_key", true),
    ("move_window_next_workspace_key", true),
    ("move_window_prev_workspace_key", true),
    ("move_window_workspace_1_key", true),
    ("move_window_workspace_2_key", true),
    ("move_window_workspace_3_key", true),
    ("move_window_workspace_4_key", true),
    ("move_window_workspace_5_key", true),
    ("move_window_workspace_6_key", true),
    ("move_window_workspace_7_key", true),
    ("move_window_workspace_8_key", true),
    ("move_window_workspace_9_key", true),
    ("raise_on_click", true),
];

/// The ordered option/value table for one resolution pass.
#[derive(Debug, Clone)]
pub struct ResolutionTable {
    entries: Vec<OptionEntry>,
    index: HashMap<&'static str, usize>,
}

impl ResolutionTable {
    /// A fresh table with every catalog option unset.
    pub fn catalog() -> Self {
        let entries: Vec<OptionEntry> = CATALOG
            .iter()
            .map(|&(name, required)| OptionEntry {
                name,
                value: None,
                required,
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name, i))
            .collect();
        Self { entries, index }
    }

    /// Overwrite an option's value. Names outside the catalog are ignored;
    /// a source file may carry options newer or older than this build.
    pub fn set(&mut self, name: &str, value: String) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].value = Some(value),
            None => debug!(option = %name, "ignoring unrecognized option"),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .and_then(|&i| self.entries[i].value.as_deref())
    }

    /// Locale-independent decimal parse; a null or unparsable value is 0.
    pub fn get_int(&self, name: &str) -> i32 {
        self.get(name)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(0)
    }

    /// Like [`get_int`](Self::get_int) but magnitude-clamped, for options
    /// with delay/width/count semantics where a negative value means its
    /// magnitude, never a sentinel.
    pub fn get_unsigned(&self, name: &str) -> u32 {
        self.get_int(name).unsigned_abs()
    }

    /// Case-insensitive comparison against the literal `"true"`; everything
    /// else, including an unset value, is false.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// First required option still without a value, if any.
    pub fn missing_required(&self) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.required && e.value.is_none())
            .map(|e| e.name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &OptionEntry> {
        self.entries.iter()
    }

    /// The color substitution table for themed asset loading: the leading
    /// color-role options that currently have a value, in catalog order.
    pub fn color_symbols(&self) -> Vec<(&'static str, &str)> {
        self.entries[..COLOR_SYMBOL_COUNT]
            .iter()
            .filter_map(|e| e.value.as_deref().map(|v| (e.name, v)))
            .collect()
    }
}
