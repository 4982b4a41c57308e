//! Key actions, key-spec parsing and the global capture table.
//!
//! Every action has a named `*_key` option whose value is a textual key
//! specification like `Control+Alt+Right`. Bindings are rebuilt as one
//! batch: parse everything, release every existing capture, then grab the
//! subset of actions that work without a focused client window.

use tracing::{debug, warn};

use crate::catalog::ResolutionTable;
use crate::display::{Display, KeyEvent};
use crate::errors::SettingsError;
use crate::rcfile;
use crate::resolver::Paths;

/// X modifier mask bits.
pub mod modmask {
    pub const SHIFT: u16 = 1 << 0;
    pub const LOCK: u16 = 1 << 1;
    pub const CONTROL: u16 = 1 << 2;
    pub const MOD1: u16 = 1 << 3;
    pub const MOD2: u16 = 1 << 4;
    pub const MOD3: u16 = 1 << 5;
    pub const MOD4: u16 = 1 << 6;
    pub const MOD5: u16 = 1 << 7;

    /// Bits compared when matching a key press against a binding; Lock and
    /// Num Lock state must not change what a chord means.
    pub const MATCH: u16 = SHIFT | CONTROL | MOD1 | MOD3 | MOD4 | MOD5;
}

macro_rules! key_actions {
    ($(($variant:ident, $option:literal)),+ $(,)?) => {
        /// Window manager actions bindable to a key, in catalog order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum KeyAction {
            $($variant,)+
        }

        impl KeyAction {
            pub const ALL: &[KeyAction] = &[$(KeyAction::$variant,)+];

            /// The rc option holding this action's key specification.
            pub fn option_name(self) -> &'static str {
                match self {
                    $(KeyAction::$variant => $option,)+
                }
            }
        }
    };
}

key_actions![
    (MoveUp, "move_window_up_key"),
    (MoveDown, "move_window_down_key"),
    (MoveLeft, "move_window_left_key"),
    (MoveRight, "move_window_right_key"),
    (ResizeUp, "resize_window_up_key"),
    (ResizeDown, "resize_window_down_key"),
    (ResizeLeft, "resize_window_left_key"),
    (ResizeRight, "resize_window_right_key"),
    (CycleWindows, "cycle_windows_key"),
    (CloseWindow, "close_window_key"),
    (HideWindow, "hide_window_key"),
    (MaximizeWindow, "maximize_window_key"),
    (MaximizeVert, "maximize_vert_key"),
    (MaximizeHoriz, "maximize_horiz_key"),
    (ShadeWindow, "shade_window_key"),
    (NextWorkspace, "next_workspace_key"),
    (PrevWorkspace, "prev_workspace_key"),
    (AddWorkspace, "add_workspace_key"),
    (DelWorkspace, "del_workspace_key"),
    (StickWindow, "stick_window_key"),
    (Workspace1, "workspace_1_key"),
    (Workspace2, "workspace_2_key"),
    (Workspace3, "workspace_3_key"),
    (Workspace4, "workspace_4_key"),
    (Workspace5, "workspace_5_key"),
    (Workspace6, "workspace_6_key"),
    (Workspace7, "workspace_7_key"),
    (Workspace8, "workspace_8_key"),
    (Workspace9, "workspace_9_key"),
    (MoveNextWorkspace, "move_window_next_workspace_key"),
    (MovePrevWorkspace, "move_window_prev_workspace_key"),
    (MoveWorkspace1, "move_window_workspace_1_key"),
    (MoveWorkspace2, "move_window_workspace_2_key"),
    (MoveWorkspace3, "move_window_workspace_3_key"),
    (MoveWorkspace4, "move_window_workspace_4_key"),
    (MoveWorkspace5, "move_window_workspace_5_key"),
    (MoveWorkspace6, "move_window_workspace_6_key"),
    (MoveWorkspace7, "move_window_workspace_7_key"),
    (MoveWorkspace8, "move_window_workspace_8_key"),
    (MoveWorkspace9, "move_window_workspace_9_key"),
];

/// Actions captured globally on the root window. Workspace navigation and
/// window cycling work without a focused client; everything else is
/// handled from the focused frame and deliberately not grabbed here.
pub const GRAB_ACTIONS: &[KeyAction] = &[
    KeyAction::CycleWindows,
    KeyAction::NextWorkspace,
    KeyAction::PrevWorkspace,
    KeyAction::AddWorkspace,
    KeyAction::Workspace1,
    KeyAction::Workspace2,
    KeyAction::Workspace3,
    KeyAction::Workspace4,
    KeyAction::Workspace5,
    KeyAction::Workspace6,
    KeyAction::Workspace7,
    KeyAction::Workspace8,
    KeyAction::Workspace9,
];

/// One action's binding. `resolved` is `None` when the spec did not parse
/// or names a key the current keyboard cannot produce.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub action: KeyAction,
    pub spec: String,
    pub resolved: Option<KeyEvent>,
}

/// All bindings, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct KeyTable {
    pub bindings: Vec<KeyBinding>,
}

impl KeyTable {
    /// Match a key press against the table. When two actions share a
    /// physical key, the later one in catalog order owns it.
    pub fn lookup(&self, keycode: u8, modifiers: u16) -> Option<KeyAction> {
        let modifiers = modifiers & modmask::MATCH;
        self.bindings
            .iter()
            .rev()
            .find(|b| {
                b.resolved
                    .is_some_and(|ev| ev.keycode == keycode && ev.modifiers == modifiers)
            })
            .map(|b| b.action)
    }
}

/// A key spec split into modifier bits and a keysym name. `none` and the
/// empty string mean "deliberately unbound".
fn parse_spec(spec: &str) -> Option<(u16, &str)> {
    let spec = spec.trim();
    if spec.is_empty() || spec.eq_ignore_ascii_case("none") {
        return None;
    }
    let mut modifiers = 0u16;
    let mut key = None;
    for part in spec.split('+').map(str::trim) {
        match part.to_ascii_lowercase().as_str() {
            "shift" => modifiers |= modmask::SHIFT,
            "control" | "ctrl" => modifiers |= modmask::CONTROL,
            "alt" | "meta" | "mod1" => modifiers |= modmask::MOD1,
            "mod2" => modifiers |= modmask::MOD2,
            "hyper" | "mod3" => modifiers |= modmask::MOD3,
            "super" | "mod4" => modifiers |= modmask::MOD4,
            "mod5" => modifiers |= modmask::MOD5,
            _ => {
                if key.is_some() {
                    // two non-modifier tokens, not a valid chord
                    return None;
                }
                key = Some(part);
            }
        }
    }
    key.map(|k| (modifiers, k))
}

/// Parse one binding; failures yield an unbound action, never an error.
fn parse_binding(action: KeyAction, spec: &str, display: &dyn Display) -> KeyBinding {
    let resolved = match parse_spec(spec) {
        Some((modifiers, keysym)) => match display.resolve_keysym(keysym) {
            Some(keycode) => Some(KeyEvent { keycode, modifiers }),
            None => {
                warn!(action = ?action, spec = %spec, keysym = %keysym, "unknown key in binding");
                None
            }
        },
        None => {
            debug!(action = ?action, spec = %spec, "action left unbound");
            None
        }
    };
    KeyBinding {
        action,
        spec: spec.to_string(),
        resolved,
    }
}

/// Build the key table from a resolved configuration and re-install the
/// global captures.
///
/// If a key theme is named, its `keythemerc` is layered over the table
/// first; a required option left unset after that aborts the rebuild and
/// the caller keeps its previous bindings and grabs.
pub fn build(
    table: &mut ResolutionTable,
    display: &mut dyn Display,
    paths: &Paths,
) -> Result<KeyTable, SettingsError> {
    if let Some(keytheme) = table.get("keytheme").filter(|k| !k.is_empty()) {
        let dir = paths.theme_dir(keytheme);
        if let Some(pairs) = rcfile::parse_file(&dir.join("keythemerc")) {
            for (option, value) in pairs {
                table.set(&option, value);
            }
        }
        if let Some(name) = table.missing_required() {
            return Err(SettingsError::MissingKeyThemeOption(name));
        }
    }

    let bindings: Vec<KeyBinding> = KeyAction::ALL
        .iter()
        .map(|&action| {
            let spec = table.get(action.option_name()).unwrap_or_default();
            parse_binding(action, spec, display)
        })
        .collect();
    let key_table = KeyTable { bindings };

    // One atomic batch: drop every capture, then re-grab the root set.
    display.ungrab_keys();
    for &action in GRAB_ACTIONS {
        let binding = &key_table.bindings[KeyAction::ALL
            .iter()
            .position(|&a| a == action)
            .expect("grab set is a subset of the catalog")];
        if let Some(event) = binding.resolved {
            display.grab_key(event);
        }
    }

    Ok(key_table)
}
