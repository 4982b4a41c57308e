//! Settings orchestration: full loads, scoped reloads and live bus events.
//!
//! Everything here runs on the single control thread that also pumps the
//! X event queue, so a reload always completes before the next event is
//! looked at and no two reloads interleave.

use tracing::{debug, error, info, warn};

use crate::bus::{BusAction, BusEvent, CHANNEL, Effect, SettingsBus};
use crate::catalog::ResolutionTable;
use crate::display::Display;
use crate::errors::SettingsError;
use crate::keybindings::{self, KeyTable};
use crate::params::{
    BUTTON_LAYOUT_LEN, DoubleClickAction, ParamsSnapshot, ReloadMask, TitleAlignment,
};
use crate::resolver::{self, Paths};
use crate::theme::ThemeResources;

/// Downstream collaborator told which subsystems must react after a
/// completed reload.
pub trait FrameUpdater {
    fn notify_frames_changed(&mut self, mask: ReloadMask);
}

/// The settings core. Owns the published snapshot, the themed resources
/// and the key table, and drives the resolve/apply pipeline.
pub struct SettingsManager<D, B, F> {
    display: D,
    bus: B,
    frames: F,
    paths: Paths,
    /// False until the first full load completes; bus `New` events are
    /// ignored while cold because the full resolver is about to read the
    /// same values anyway.
    warm: bool,
    /// The desktop count is adopted once, from the root hint or the first
    /// resolution, and never changed by later reloads.
    workspace_count_adopted: bool,
    params: ParamsSnapshot,
    theme: ThemeResources,
    keys: KeyTable,
}

impl<D, B, F> SettingsManager<D, B, F>
where
    D: Display,
    B: SettingsBus,
    F: FrameUpdater,
{
    pub fn new(display: D, bus: B, frames: F, paths: Paths) -> Self {
        Self {
            display,
            bus,
            frames,
            paths,
            warm: false,
            workspace_count_adopted: false,
            params: ParamsSnapshot::default(),
            theme: ThemeResources::new(),
            keys: KeyTable::default(),
        }
    }

    /// First full load. Adopts the desktop count another client may have
    /// already published, resolves and applies everything, then goes warm.
    /// Failure here is fatal to the process.
    pub fn init(&mut self) -> Result<(), SettingsError> {
        if let Some(count) = self.display.desktop_count_hint() {
            debug!(workspace_count = count, "adopting desktop count from root hint");
            self.params.workspace_count = count;
            self.workspace_count_adopted = true;
        }
        self.load_settings()?;
        self.warm = true;
        info!("settings loaded, honoring live bus notifications");
        Ok(())
    }

    /// One resolve+apply pass. On error the previous snapshot and key
    /// table stay active; theme resources may already be degraded, which
    /// the next successful reload repairs.
    fn load_settings(&mut self) -> Result<(), SettingsError> {
        let mut table = resolver::resolve(&self.bus, &self.display, &self.paths)?;

        let theme_dir = self
            .paths
            .theme_dir(table.get("theme").unwrap_or_default());
        self.theme.apply(&mut self.display, &table, &theme_dir);

        self.keys = keybindings::build(&mut table, &mut self.display, &self.paths)?;

        self.params = self.build_snapshot(&table);
        debug!(params = ?self.params, "published settings snapshot");
        Ok(())
    }

    fn build_snapshot(&mut self, table: &ResolutionTable) -> ParamsSnapshot {
        let workspace_count = if self.workspace_count_adopted {
            self.params.workspace_count
        } else {
            let count = table.get_unsigned("workspace_count");
            self.display.set_desktop_count_hint(count);
            self.workspace_count_adopted = true;
            count
        };

        let mut dbl_click_time = table.get_unsigned("dbl_click_time");
        if let Some(toolkit) = self.display.double_click_time() {
            dbl_click_time = toolkit;
        }

        // Clamp in characters, not bytes; the option may hold multibyte text.
        let button_layout: String = table
            .get("button_layout")
            .unwrap_or_default()
            .chars()
            .take(BUTTON_LAYOUT_LEN)
            .collect();

        ParamsSnapshot {
            box_move: table.get_bool("box_move"),
            box_resize: table.get_bool("box_resize"),
            button_layout,
            button_offset: table.get_int("button_offset"),
            button_spacing: table.get_int("button_spacing"),
            click_to_focus: table.get_bool("click_to_focus"),
            dbl_click_time,
            double_click_action: DoubleClickAction::from_option(table.get("double_click_action")),
            focus_hint: table.get_bool("focus_hint"),
            focus_new: table.get_bool("focus_new"),
            full_width_title: table.get_bool("full_width_title"),
            raise_delay: table.get_unsigned("raise_delay"),
            raise_on_click: table.get_bool("raise_on_click"),
            raise_on_focus: table.get_bool("raise_on_focus"),
            snap_to_border: table.get_bool("snap_to_border"),
            snap_width: table.get_unsigned("snap_width"),
            title_alignment: TitleAlignment::from_option(table.get("title_alignment")),
            title_font: table.get("title_font").unwrap_or_default().to_string(),
            title_horizontal_offset: table.get_int("title_horizontal_offset"),
            title_shadow_active: table.get_bool("title_shadow_active"),
            title_shadow_inactive: table.get_bool("title_shadow_inactive"),
            title_vertical_offset_active: table.get_int("title_vertical_offset_active"),
            title_vertical_offset_inactive: table.get_int("title_vertical_offset_inactive"),
            workspace_count,
            wrap_workspaces: table.get_bool("wrap_workspaces"),
        }
    }

    /// Release current resources, re-run the whole pipeline, then tell the
    /// frame layer what to redo. The resolver is not incremental, so every
    /// reload is a full pass regardless of which option triggered it.
    pub fn reload(&mut self, mask: ReloadMask) -> Result<(), SettingsError> {
        debug!(?mask, "reloading settings");
        self.theme.release_all(&mut self.display);
        self.load_settings()?;
        if !mask.is_empty() {
            self.frames.notify_frames_changed(mask);
        }
        Ok(())
    }

    /// Serialized entry point for bus change notifications.
    pub fn handle_bus_event(&mut self, event: &BusEvent) {
        if !event.channel.eq_ignore_ascii_case(CHANNEL) {
            return;
        }
        match event.action {
            // options are never removed from the resolved table
            BusAction::Deleted => return,
            // the startup resolver reads the same values momentarily
            BusAction::New if !self.warm => return,
            BusAction::New | BusAction::Changed => {}
        }
        let Some(binding) = crate::bus::lookup(&event.name) else {
            debug!(setting = %event.name, "ignoring unclassified bus setting");
            return;
        };
        match (binding.effect, &event.value) {
            (Effect::Direct(set), crate::bus::BusValue::Int(v)) => {
                debug!(setting = %event.name, value = v, "direct field update");
                set(&mut self.params, *v);
            }
            (Effect::Reload(mask), crate::bus::BusValue::Str(_)) => {
                if let Err(e) = self.reload(mask) {
                    error!(setting = %event.name, error = %e,
                           "reload failed, keeping previous configuration");
                }
            }
            _ => {
                warn!(setting = %event.name, value = ?event.value,
                      "bus event value has the wrong type, ignoring");
            }
        }
    }

    /// Release every owned server resource. Called once at process exit.
    pub fn shutdown(&mut self) {
        info!("releasing settings resources");
        self.theme.release_all(&mut self.display);
    }

    pub fn params(&self) -> &ParamsSnapshot {
        &self.params
    }

    pub fn keys(&self) -> &KeyTable {
        &self.keys
    }

    pub fn theme(&self) -> &ThemeResources {
        &self.theme
    }

    pub fn is_warm(&self) -> bool {
        self.warm
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }
}
