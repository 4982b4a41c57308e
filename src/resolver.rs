//! The cascading configuration resolver.
//!
//! Sources apply in a fixed order and later sources overwrite earlier ones
//! per option; absence in a source leaves the prior value alone. The theme
//! override runs last because locating it needs the already-merged `theme`
//! option.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::bus::{BUS_BINDINGS, BusValue, CHANNEL, OptionKind, SettingsBus};
use crate::catalog::{COLOR_SYMBOL_COUNT, ResolutionTable};
use crate::display::Display;
use crate::errors::SettingsError;
use crate::rcfile;

/// Name of the built-in defaults file under the data directory.
const DEFAULTS_FILE: &str = "defaults";
/// Per-user override file in the home directory.
const USER_RC: &str = ".rfwmrc";
/// Per-theme override file.
const THEME_RC: &str = "themerc";

/// Style elements feeding the leading color-role options, in catalog
/// order: (element, state) per role.
const STYLE_SOURCES: [(&str, &str); COLOR_SYMBOL_COUNT] = [
    ("fg", "selected"),
    ("fg", "normal"),
    ("fg", "active"),
    ("fg", "normal"),
    ("bg", "selected"),
    ("light", "selected"),
    ("dark", "selected"),
    ("mid", "selected"),
    ("bg", "normal"),
    ("light", "normal"),
    ("dark", "normal"),
    ("mid", "normal"),
    ("bg", "active"),
    ("light", "active"),
    ("dark", "active"),
    ("mid", "active"),
    ("bg", "normal"),
    ("light", "normal"),
    ("dark", "normal"),
    ("mid", "normal"),
];

/// Where configuration sources live for this process.
#[derive(Debug, Clone)]
pub struct Paths {
    datadir: PathBuf,
    home: PathBuf,
}

impl Paths {
    pub fn new(datadir: PathBuf, home: PathBuf) -> Self {
        Self { datadir, home }
    }

    /// System data directory from `RFWM_DATADIR` or the install default;
    /// home from the platform lookup.
    pub fn discover() -> Self {
        let datadir = env::var_os("RFWM_DATADIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/usr/share/rfwm"));
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self { datadir, home }
    }

    pub fn defaults_file(&self) -> PathBuf {
        self.datadir.join(DEFAULTS_FILE)
    }

    pub fn user_rc(&self) -> PathBuf {
        self.home.join(USER_RC)
    }

    /// Resolve a theme name to its directory. An absolute name is taken as
    /// is; otherwise user themes shadow system themes. The path returned
    /// for an uninstalled theme simply does not exist, which is not itself
    /// an error.
    pub fn theme_dir(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            return candidate.to_path_buf();
        }
        let user = self.home.join(".rfwm/themes").join(name);
        if user.is_dir() {
            return user;
        }
        self.datadir.join("themes").join(name)
    }
}

fn apply_pairs(table: &mut ResolutionTable, pairs: Vec<(String, String)>) {
    for (option, value) in pairs {
        table.set(&option, value);
    }
}

/// Merge every configuration source into one table.
///
/// Order: built-in defaults, per-user rc, live-bus snapshot, style colors,
/// theme override. Afterwards every required option must have a value.
pub fn resolve(
    bus: &dyn SettingsBus,
    display: &dyn Display,
    paths: &Paths,
) -> Result<ResolutionTable, SettingsError> {
    let mut table = ResolutionTable::catalog();

    let defaults = paths.defaults_file();
    match rcfile::parse_file(&defaults) {
        Some(pairs) => apply_pairs(&mut table, pairs),
        None => return Err(SettingsError::MissingDefaults(defaults)),
    }

    if let Some(pairs) = rcfile::parse_file(&paths.user_rc()) {
        apply_pairs(&mut table, pairs);
    }

    for binding in BUS_BINDINGS {
        let Some(value) = bus.get(binding.setting, CHANNEL) else {
            continue;
        };
        match (binding.kind, value) {
            (OptionKind::Bool, BusValue::Int(v)) => {
                table.set(binding.option, if v != 0 { "true" } else { "false" }.to_string());
            }
            (OptionKind::Int, BusValue::Int(v)) => table.set(binding.option, v.to_string()),
            (OptionKind::Str, BusValue::Str(v)) => table.set(binding.option, v),
            (kind, value) => {
                warn!(setting = %binding.setting, expected = ?kind, got = ?value,
                      "bus value has the wrong type, ignoring");
            }
        }
    }

    // Seed the color roles from the widget style so the theme override can
    // replace them; style values deliberately shadow earlier sources.
    let style_colors: Vec<(usize, String)> = STYLE_SOURCES
        .iter()
        .enumerate()
        .filter_map(|(i, &(element, state))| {
            display.style_color(element, state).map(|c| (i, c))
        })
        .collect();
    {
        let names: Vec<&'static str> = table
            .entries()
            .take(COLOR_SYMBOL_COUNT)
            .map(|e| e.name)
            .collect();
        for (i, color) in style_colors {
            table.set(names[i], color);
        }
    }

    if let Some(theme) = table.get("theme").map(str::to_owned) {
        let dir = paths.theme_dir(&theme);
        debug!(theme = %theme, dir = %dir.display(), "applying theme overrides");
        if let Some(pairs) = rcfile::parse_file(&dir.join(THEME_RC)) {
            apply_pairs(&mut table, pairs);
        }
    }

    if let Some(name) = table.missing_required() {
        return Err(SettingsError::MissingRequiredOption(name));
    }
    Ok(table)
}
