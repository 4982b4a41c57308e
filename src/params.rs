//! The published configuration state consumed by the rest of the window
//! manager, plus the mask describing what has to react to a reload.

use bitflags::bitflags;

bitflags! {
    /// Which downstream subsystems must react to a just-applied settings
    /// change. Empty means "state updated, nothing visible to redo".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReloadMask: u32 {
        /// Global key captures must be re-installed.
        const KEYGRABS = 1 << 0;
        /// Frame geometry changed enough to move client windows.
        const GRAVITY = 1 << 1;
        /// Frames must be redrawn.
        const FRAME = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoubleClickAction {
    #[default]
    None,
    Shade,
    Hide,
    Maximize,
}

impl DoubleClickAction {
    /// Anything other than the three recognized words maps to `None`.
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("shade") => Self::Shade,
            Some(v) if v.eq_ignore_ascii_case("hide") => Self::Hide,
            Some(v) if v.eq_ignore_ascii_case("maximize") => Self::Maximize,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl TitleAlignment {
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("left") => Self::Left,
            Some(v) if v.eq_ignore_ascii_case("right") => Self::Right,
            _ => Self::Center,
        }
    }
}

/// Maximum number of characters kept from the `button_layout` option.
pub const BUTTON_LAYOUT_LEN: usize = 7;

/// Resolved scalar configuration, replaced wholesale after each successful
/// resolve+apply pass. Server-side resources (colors, GCs, themed pixmaps,
/// key grabs) are owned separately by the resource and key-binding managers;
/// this struct stays plain data so two snapshots can be compared directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamsSnapshot {
    pub box_move: bool,
    pub box_resize: bool,
    pub button_layout: String,
    pub button_offset: i32,
    pub button_spacing: i32,
    pub click_to_focus: bool,
    pub dbl_click_time: u32,
    pub double_click_action: DoubleClickAction,
    pub focus_hint: bool,
    pub focus_new: bool,
    pub full_width_title: bool,
    pub raise_delay: u32,
    pub raise_on_click: bool,
    pub raise_on_focus: bool,
    pub snap_to_border: bool,
    pub snap_width: u32,
    pub title_alignment: TitleAlignment,
    pub title_font: String,
    pub title_horizontal_offset: i32,
    pub title_shadow_active: bool,
    pub title_shadow_inactive: bool,
    pub title_vertical_offset_active: i32,
    pub title_vertical_offset_inactive: i32,
    pub workspace_count: u32,
    pub wrap_workspaces: bool,
}
