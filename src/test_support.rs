//! Shared test doubles and fixtures.
//!
//! [`FakeDisplay`] tracks live allocations by handle so leak assertions can
//! compare counts across reloads; keysyms resolve to deterministic keycodes
//! derived from the name.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tempfile::TempDir;

use crate::bus::{BusValue, CHANNEL, SettingsBus};
use crate::catalog::ResolutionTable;
use crate::color::Rgb;
use crate::display::{
    ColorHandle, ColorRole, Display, FontDescription, GcHandle, KeyEvent, MonoGc, PixmapHandle,
};
use crate::params::ReloadMask;
use crate::resolver::Paths;
use crate::settings::FrameUpdater;

const MONO_BLACK: GcHandle = GcHandle(0xfff0);
const MONO_WHITE: GcHandle = GcHandle(0xfff1);

pub struct FakeDisplay {
    pub fail_color_alloc: bool,
    pub unresolvable: HashSet<String>,
    pub grabbed: Vec<KeyEvent>,
    pub ungrab_calls: u32,
    pub title_font: Option<FontDescription>,
    pub last_symbols: Vec<(String, String)>,
    pub last_asset_dir: Option<PathBuf>,
    pub desktop_hint: Option<u32>,
    pub hint_writes: Vec<u32>,
    pub dbl_click_time: Option<u32>,
    style: HashMap<(String, String), String>,
    style_queries: Cell<u32>,
    all_assets: bool,
    missing_assets: HashSet<String>,
    next_id: u32,
    live_colors: HashSet<ColorHandle>,
    live_gcs: HashSet<GcHandle>,
    live_pixmaps: HashSet<PixmapHandle>,
    mono_refs: [u32; 2],
}

impl FakeDisplay {
    pub fn new() -> Self {
        Self {
            fail_color_alloc: false,
            unresolvable: HashSet::new(),
            grabbed: Vec::new(),
            ungrab_calls: 0,
            title_font: None,
            last_symbols: Vec::new(),
            last_asset_dir: None,
            desktop_hint: None,
            hint_writes: Vec::new(),
            dbl_click_time: None,
            style: HashMap::new(),
            style_queries: Cell::new(0),
            all_assets: false,
            missing_assets: HashSet::new(),
            next_id: 1,
            live_colors: HashSet::new(),
            live_gcs: HashSet::new(),
            live_pixmaps: HashSet::new(),
            mono_refs: [0, 0],
        }
    }

    /// Make every asset file loadable.
    pub fn add_all_assets(&mut self) {
        self.all_assets = true;
    }

    /// Make one asset file fail to load.
    pub fn remove_asset(&mut self, file: &str) {
        self.missing_assets.insert(file.to_string());
    }

    pub fn set_style_color(&mut self, element: &str, state: &str, color: &str) {
        self.style
            .insert((element.to_string(), state.to_string()), color.to_string());
    }

    pub fn style_query_count(&self) -> u32 {
        self.style_queries.get()
    }

    pub fn live_color_count(&self) -> usize {
        self.live_colors.len()
    }

    pub fn live_pixmap_count(&self) -> usize {
        self.live_pixmaps.len()
    }

    pub fn live_gc_count(&self) -> usize {
        self.live_gcs.len() + self.mono_refs.iter().sum::<u32>() as usize
    }

    pub fn mono_ref_count(&self, which: MonoGc) -> u32 {
        self.mono_refs[which as usize]
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Display for FakeDisplay {
    fn style_color(&self, element: &str, state: &str) -> Option<String> {
        self.style_queries.set(self.style_queries.get() + 1);
        self.style
            .get(&(element.to_string(), state.to_string()))
            .cloned()
    }

    fn alloc_color(&mut self, _color: Rgb) -> Result<ColorHandle> {
        if self.fail_color_alloc {
            bail!("colormap full");
        }
        let handle = ColorHandle(self.fresh_id());
        self.live_colors.insert(handle);
        Ok(handle)
    }

    fn free_color(&mut self, handle: ColorHandle) {
        assert!(self.live_colors.remove(&handle), "double free of {handle:?}");
    }

    fn create_title_gc(&mut self, _role: ColorRole, _foreground: ColorHandle) -> Result<GcHandle> {
        let handle = GcHandle(self.fresh_id());
        self.live_gcs.insert(handle);
        Ok(handle)
    }

    fn create_invert_gc(&mut self) -> Result<GcHandle> {
        let handle = GcHandle(self.fresh_id());
        self.live_gcs.insert(handle);
        Ok(handle)
    }

    fn ref_mono_gc(&mut self, which: MonoGc) -> GcHandle {
        self.mono_refs[which as usize] += 1;
        match which {
            MonoGc::Black => MONO_BLACK,
            MonoGc::White => MONO_WHITE,
        }
    }

    fn free_gc(&mut self, handle: GcHandle) {
        let which = match handle {
            MONO_BLACK => Some(MonoGc::Black),
            MONO_WHITE => Some(MonoGc::White),
            _ => None,
        };
        match which {
            Some(mono) => {
                let refs = &mut self.mono_refs[mono as usize];
                assert!(*refs > 0, "unbalanced mono release of {mono:?}");
                *refs -= 1;
            }
            None => assert!(self.live_gcs.remove(&handle), "double free of {handle:?}"),
        }
    }

    fn load_asset(
        &mut self,
        dir: &Path,
        file: &str,
        color_symbols: &[(&str, &str)],
    ) -> Result<PixmapHandle> {
        self.last_asset_dir = Some(dir.to_path_buf());
        self.last_symbols = color_symbols
            .iter()
            .map(|&(n, v)| (n.to_string(), v.to_string()))
            .collect();
        if !self.all_assets || self.missing_assets.contains(file) {
            bail!("no such file: {file}");
        }
        let handle = PixmapHandle(self.fresh_id());
        self.live_pixmaps.insert(handle);
        Ok(handle)
    }

    fn free_asset(&mut self, handle: PixmapHandle) {
        assert!(self.live_pixmaps.remove(&handle), "double free of {handle:?}");
    }

    fn set_title_font(&mut self, font: &FontDescription) {
        self.title_font = Some(font.clone());
    }

    fn double_click_time(&self) -> Option<u32> {
        self.dbl_click_time
    }

    fn resolve_keysym(&self, name: &str) -> Option<u8> {
        if self.unresolvable.contains(name) {
            return None;
        }
        // stable keycode per name, in the hardware range
        let hash = name
            .bytes()
            .fold(7u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
        Some(8 + (hash % 248) as u8)
    }

    fn grab_key(&mut self, key: KeyEvent) {
        self.grabbed.push(key);
    }

    fn ungrab_keys(&mut self) {
        self.grabbed.clear();
        self.ungrab_calls += 1;
    }

    fn desktop_count_hint(&self) -> Option<u32> {
        self.desktop_hint
    }

    fn set_desktop_count_hint(&mut self, count: u32) {
        self.hint_writes.push(count);
    }
}

pub struct FakeBus {
    values: HashMap<String, BusValue>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: BusValue) {
        self.values.insert(name.to_string(), value);
    }
}

impl SettingsBus for FakeBus {
    fn get(&self, name: &str, channel: &str) -> Option<BusValue> {
        assert_eq!(channel, CHANNEL);
        self.values.get(name).cloned()
    }
}

#[derive(Default)]
pub struct RecordingFrames {
    pub masks: Vec<ReloadMask>,
}

impl FrameUpdater for RecordingFrames {
    fn notify_frames_changed(&mut self, mask: ReloadMask) {
        self.masks.push(mask);
    }
}

/// Write an rc file, creating parent directories as needed.
pub fn write_rc(path: &Path, pairs: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let body: String = pairs
        .iter()
        .map(|(option, value)| format!("{option}={value}\n"))
        .collect();
    fs::write(path, body).unwrap();
}

/// A value for every required option, in no particular order.
pub fn required_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("theme", "Default"),
        ("keytheme", "Default"),
        ("title_alignment", "center"),
        ("full_width_title", "true"),
        ("title_shadow_active", "false"),
        ("title_shadow_inactive", "false"),
        ("button_layout", "O|SHMC"),
        ("button_spacing", "2"),
        ("title_vertical_offset_active", "0"),
        ("title_vertical_offset_inactive", "0"),
        ("title_horizontal_offset", "0"),
        ("button_offset", "0"),
        ("double_click_action", "maximize"),
        ("box_move", "false"),
        ("box_resize", "false"),
        ("click_to_focus", "false"),
        ("focus_hint", "true"),
        ("focus_new", "true"),
        ("raise_on_focus", "false"),
        ("raise_delay", "250"),
        ("snap_to_border", "true"),
        ("snap_width", "10"),
        ("dbl_click_time", "250"),
        ("workspace_count", "4"),
        ("wrap_workspaces", "false"),
        ("raise_on_click", "true"),
        ("close_window_key", "Alt+F4"),
        ("hide_window_key", "Alt+F6"),
        ("maximize_window_key", "Alt+F5"),
        ("maximize_vert_key", "Alt+F7"),
        ("maximize_horiz_key", "Alt+F8"),
        ("shade_window_key", "Alt+F9"),
        ("cycle_windows_key", "Alt+Tab"),
        ("move_window_up_key", "Control+Shift+Up"),
        ("move_window_down_key", "Control+Shift+Down"),
        ("move_window_left_key", "Control+Shift+Left"),
        ("move_window_right_key", "Control+Shift+Right"),
        ("resize_window_up_key", "Control+Shift+Alt+Up"),
        ("resize_window_down_key", "Control+Shift+Alt+Down"),
        ("resize_window_left_key", "Control+Shift+Alt+Left"),
        ("resize_window_right_key", "Control+Shift+Alt+Right"),
        ("next_workspace_key", "Control+Right"),
        ("prev_workspace_key", "Control+Left"),
        ("add_workspace_key", "Control+Insert"),
        ("del_workspace_key", "Control+Delete"),
        ("stick_window_key", "Control+Alt+S"),
        ("workspace_1_key", "Control+F1"),
        ("workspace_2_key", "Control+F2"),
        ("workspace_3_key", "Control+F3"),
        ("workspace_4_key", "Control+F4"),
        ("workspace_5_key", "Control+F5"),
        ("workspace_6_key", "Control+F6"),
        ("workspace_7_key", "Control+F7"),
        ("workspace_8_key", "Control+F8"),
        ("workspace_9_key", "Control+F9"),
        ("move_window_next_workspace_key", "Control+Alt+Right"),
        ("move_window_prev_workspace_key", "Control+Alt+Left"),
        ("move_window_workspace_1_key", "Control+Alt+F1"),
        ("move_window_workspace_2_key", "Control+Alt+F2"),
        ("move_window_workspace_3_key", "Control+Alt+F3"),
        ("move_window_workspace_4_key", "Control+Alt+F4"),
        ("move_window_workspace_5_key", "Control+Alt+F5"),
        ("move_window_workspace_6_key", "Control+Alt+F6"),
        ("move_window_workspace_7_key", "Control+Alt+F7"),
        ("move_window_workspace_8_key", "Control+Alt+F8"),
        ("move_window_workspace_9_key", "Control+Alt+F9"),
    ]
}

/// Fill every required option directly, bypassing the file cascade.
pub fn fill_required(table: &mut ResolutionTable) {
    for (option, value) in required_defaults() {
        table.set(option, value.to_string());
    }
}

/// A throwaway directory tree with `share/` as the data dir and `home/`
/// as the home dir. The `TempDir` must outlive the paths.
pub fn temp_paths() -> (TempDir, Paths) {
    let dir = tempfile::tempdir().unwrap();
    let datadir = dir.path().join("share");
    let home = dir.path().join("home");
    fs::create_dir_all(&datadir).unwrap();
    fs::create_dir_all(&home).unwrap();
    let paths = Paths::new(datadir, home);
    (dir, paths)
}
