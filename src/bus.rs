//! Live settings bus types and the static classification table.
//!
//! The bus carries named, typed values on a channel and delivers change
//! notifications for them. One table maps every bus setting to its rc
//! option, its wire type, and what has to happen when it changes; the
//! resolver's point-query pass and the notification handler both read it,
//! so the two can never disagree about a name.

use crate::params::{ParamsSnapshot, ReloadMask};

/// The channel this window manager listens on.
pub const CHANNEL: &str = "xfwm4";

/// A typed value carried by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusValue {
    Int(i32),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusAction {
    New,
    Changed,
    Deleted,
}

/// A change notification as delivered by the bus client library.
#[derive(Debug, Clone)]
pub struct BusEvent {
    pub name: String,
    pub channel: String,
    pub action: BusAction,
    pub value: BusValue,
}

/// Synchronous point-query interface of the bus client.
pub trait SettingsBus {
    fn get(&self, name: &str, channel: &str) -> Option<BusValue>;
}

/// Stand-in when no settings manager is running on the bus: every query
/// comes back absent and no notifications ever arrive.
pub struct NoBus;

impl SettingsBus for NoBus {
    fn get(&self, _name: &str, _channel: &str) -> Option<BusValue> {
        None
    }
}

/// Wire type of a bus setting, which also decides how its value is encoded
/// into the resolution table (bools and ints become `"true"`/`"false"` or
/// decimal text, strings are copied verbatim).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Int,
    Str,
}

/// What a change to a setting does to live state.
#[derive(Clone, Copy)]
pub enum Effect {
    /// Write the value straight into the snapshot; no reload.
    Direct(fn(&mut ParamsSnapshot, i32)),
    /// Run a full reload scoped by this mask.
    Reload(ReloadMask),
}

pub struct BusBinding {
    pub setting: &'static str,
    pub option: &'static str,
    pub kind: OptionKind,
    pub effect: Effect,
}

/// Every setting this process consumes from the bus.
pub const BUS_BINDINGS: &[BusBinding] = &[
    BusBinding {
        setting: "Xfwm/ClickToFocus",
        option: "click_to_focus",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.click_to_focus = v != 0),
    },
    BusBinding {
        setting: "Xfwm/FocusNewWindow",
        option: "focus_new",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.focus_new = v != 0),
    },
    BusBinding {
        setting: "Xfwm/FocusRaise",
        option: "raise_on_focus",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.raise_on_focus = v != 0),
    },
    BusBinding {
        setting: "Xfwm/RaiseDelay",
        option: "raise_delay",
        kind: OptionKind::Int,
        effect: Effect::Direct(|p, v| p.raise_delay = v.unsigned_abs()),
    },
    BusBinding {
        setting: "Xfwm/RaiseOnClick",
        option: "raise_on_click",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.raise_on_click = v != 0),
    },
    BusBinding {
        setting: "Xfwm/SnapToBorder",
        option: "snap_to_border",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.snap_to_border = v != 0),
    },
    BusBinding {
        setting: "Xfwm/SnapWidth",
        option: "snap_width",
        kind: OptionKind::Int,
        effect: Effect::Direct(|p, v| p.snap_width = v.unsigned_abs()),
    },
    BusBinding {
        setting: "Xfwm/WrapWorkspaces",
        option: "wrap_workspaces",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.wrap_workspaces = v != 0),
    },
    BusBinding {
        setting: "Xfwm/BoxMove",
        option: "box_move",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.box_move = v != 0),
    },
    BusBinding {
        setting: "Xfwm/BoxResize",
        option: "box_resize",
        kind: OptionKind::Bool,
        effect: Effect::Direct(|p, v| p.box_resize = v != 0),
    },
    BusBinding {
        setting: "Xfwm/DblClickAction",
        option: "double_click_action",
        kind: OptionKind::Str,
        effect: Effect::Reload(ReloadMask::empty()),
    },
    BusBinding {
        setting: "Xfwm/KeyThemeName",
        option: "keytheme",
        kind: OptionKind::Str,
        effect: Effect::Reload(ReloadMask::KEYGRABS),
    },
    BusBinding {
        setting: "Xfwm/ThemeName",
        option: "theme",
        kind: OptionKind::Str,
        effect: Effect::Reload(ReloadMask::GRAVITY),
    },
    BusBinding {
        setting: "Xfwm/ButtonLayout",
        option: "button_layout",
        kind: OptionKind::Str,
        effect: Effect::Reload(ReloadMask::FRAME),
    },
    BusBinding {
        setting: "Xfwm/TitleAlign",
        option: "title_alignment",
        kind: OptionKind::Str,
        effect: Effect::Reload(ReloadMask::FRAME),
    },
    BusBinding {
        setting: "Xfwm/TitleFont",
        option: "title_font",
        kind: OptionKind::Str,
        effect: Effect::Reload(ReloadMask::FRAME),
    },
];

/// Find the binding for a bus setting name.
pub fn lookup(setting: &str) -> Option<&'static BusBinding> {
    BUS_BINDINGS.iter().find(|b| b.setting == setting)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_binding_is_found_by_lookup() {
        for binding in BUS_BINDINGS {
            let found = lookup(binding.setting).unwrap();
            assert_eq!(found.option, binding.option);
        }
        assert!(lookup("Xfwm/NoSuchSetting").is_none());
    }

    #[test]
    fn reload_masks_match_the_option_scope() {
        let mask = |name: &str| match lookup(name).unwrap().effect {
            Effect::Reload(m) => m,
            Effect::Direct(_) => panic!("{name} should be a reload binding"),
        };
        assert_eq!(mask("Xfwm/KeyThemeName"), ReloadMask::KEYGRABS);
        assert_eq!(mask("Xfwm/ThemeName"), ReloadMask::GRAVITY);
        assert_eq!(mask("Xfwm/ButtonLayout"), ReloadMask::FRAME);
        assert_eq!(mask("Xfwm/TitleAlign"), ReloadMask::FRAME);
        assert_eq!(mask("Xfwm/TitleFont"), ReloadMask::FRAME);
        assert_eq!(mask("Xfwm/DblClickAction"), ReloadMask::empty());
    }

    #[test]
    fn direct_bindings_are_ints_or_bools_and_reloads_are_strings() {
        for binding in BUS_BINDINGS {
            match binding.effect {
                Effect::Direct(_) => {
                    assert_ne!(binding.kind, OptionKind::Str, "{}", binding.setting)
                }
                Effect::Reload(_) => {
                    assert_eq!(binding.kind, OptionKind::Str, "{}", binding.setting)
                }
            }
        }
    }

    #[test]
    fn direct_setters_write_the_snapshot() {
        let mut params = ParamsSnapshot::default();
        let Effect::Direct(set) = lookup("Xfwm/ClickToFocus").unwrap().effect else {
            panic!("expected direct binding");
        };
        set(&mut params, 1);
        assert!(params.click_to_focus);
        set(&mut params, 0);
        assert!(!params.click_to_focus);
    }

    #[test]
    fn direct_integer_setters_take_the_magnitude() {
        let mut params = ParamsSnapshot::default();
        let Effect::Direct(set) = lookup("Xfwm/RaiseDelay").unwrap().effect else {
            panic!("expected direct binding");
        };
        set(&mut params, -50);
        assert_eq!(params.raise_delay, 50);
    }

    #[test]
    fn no_bus_answers_nothing() {
        assert_eq!(NoBus.get("Xfwm/ThemeName", CHANNEL), None);
    }
}
