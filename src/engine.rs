/*
 * Public surface of the crate: one engine object the host window procedure
 * owns and forwards messages into. Construction joins the process-wide
 * capability probe (which runs exactly once, whatever the number of engine
 * instances) and then tracks the live enabled flag per engine.
 *
 * The probe's success side effects happen inside the one-time
 * initialization: the process opts into dark rendering, the OS color
 * policy cache is refreshed, menu themes are flushed, and the scroll-bar
 * redirect is installed. A failed probe leaves a permanently disabled
 * engine and every entry point below degrades to "not handled".
 */
use std::sync::OnceLock;

use windows::Win32::{
    Foundation::{HWND, LPARAM, LRESULT, WPARAM},
    Graphics::Gdi::{RDW_ALLCHILDREN, RDW_ERASE, RDW_FRAME, RDW_INVALIDATE, RedrawWindow},
    UI::Controls::HTHEME,
    UI::WindowsAndMessaging::WM_THEMECHANGED,
};

use crate::capability::{self, CapabilityState, PlatformVersion};
use crate::menu_paint::{
    self, UahDrawMenuItem, UahMenu, WM_UAHDRAWMENU, WM_UAHDRAWMENUITEM,
};
use crate::os_theme::{self, OsThemeApi};
use crate::resolver::SymbolCache;
use crate::scrollbar_patch;

struct ProbeState {
    version: Option<PlatformVersion>,
    api: OsThemeApi,
    supported: bool,
}

/// Process-wide symbol cache; resolutions survive for the process lifetime
/// so a failed lookup is never retried.
fn symbol_cache() -> &'static SymbolCache {
    static SYMBOLS: OnceLock<SymbolCache> = OnceLock::new();
    SYMBOLS.get_or_init(SymbolCache::new)
}

/*
 * One-shot capability probe. Fails fast on a foreign platform family or an
 * ineligible build without touching uxtheme at all; otherwise resolves the
 * full entry-point table and requires every mandatory symbol.
 */
fn probe() -> &'static ProbeState {
    static PROBE: OnceLock<ProbeState> = OnceLock::new();
    PROBE.get_or_init(|| {
        let cache = symbol_cache();

        let Some(version) = os_theme::query_platform_version(cache) else {
            log::debug!("OS version query unavailable; dark mode disabled.");
            return ProbeState {
                version: None,
                api: OsThemeApi::unresolved(),
                supported: false,
            };
        };
        if !version.is_supported_platform() {
            log::debug!(
                "Platform {}.{} build {} does not carry dark mode; staying light.",
                version.major,
                version.minor,
                version.build
            );
            return ProbeState {
                version: Some(version),
                api: OsThemeApi::unresolved(),
                supported: false,
            };
        }

        let api = OsThemeApi::resolve(cache, version.generation());
        let supported = capability::probe_support(&version, api.required_entry_points());
        if supported {
            api.allow_app_dark_mode(true);
            api.refresh_color_policy();
            api.flush_menu_themes();
            scrollbar_patch::install(api.open_nc_theme_data.unwrap_or(0));
            log::debug!("Dark mode supported on build {}.", version.build);
        } else {
            log::debug!("Required theming entry points missing; dark mode disabled.");
        }

        ProbeState {
            version: Some(version),
            api,
            supported,
        }
    })
}

/// Dark-mode engine for one host window procedure.
pub struct DarkModeEngine {
    capability: CapabilityState,
    menu_theme: Option<HTHEME>,
}

impl DarkModeEngine {
    /// Runs (or joins) the process-wide probe and computes the initial
    /// enabled flag from the current OS preference and contrast state.
    pub fn initialize() -> Self {
        let probe = probe();
        let mut capability = CapabilityState::from_probe(probe.supported);
        capability.reevaluate(probe.api.prefers_dark(), os_theme::is_high_contrast());
        Self {
            capability,
            menu_theme: None,
        }
    }

    /// Current effective dark-mode state.
    pub fn is_enabled(&self) -> bool {
        self.capability.is_enabled()
    }

    /*
     * WM_SETTINGCHANGE entry point. `lparam` is the notification payload
     * pointer from the broadcast. Returns whether dark mode toggled so the
     * host can refresh its own chrome; on a toggle the title bar attribute
     * is propagated and the window tree invalidated here.
     */
    pub fn on_setting_change(&mut self, hwnd: HWND, lparam: LPARAM) -> bool {
        let probe = probe();
        let payload = unsafe { os_theme::wide_string_at(lparam.0 as *const u16) };

        let toggled = capability::apply_setting_change(
            &mut self.capability,
            payload.as_deref(),
            || probe.api.refresh_color_policy(),
            || probe.api.prefers_dark(),
            os_theme::is_high_contrast,
        );

        if toggled {
            log::debug!("Dark mode toggled to {}.", self.capability.is_enabled());
            self.refresh_title_bar(hwnd);
            unsafe {
                let _ = RedrawWindow(
                    Some(hwnd),
                    None,
                    None,
                    RDW_INVALIDATE | RDW_ERASE | RDW_FRAME | RDW_ALLCHILDREN,
                );
            }
        }
        toggled
    }

    /*
     * Owner-draw menu dispatch. `Some(lresult)` means the message is fully
     * handled and the host must return that value; `None` means the host
     * continues normal processing. Inactive while dark mode is off.
     */
    pub fn handle_menu_message(
        &mut self,
        hwnd: HWND,
        msg: u32,
        _wparam: WPARAM,
        lparam: LPARAM,
    ) -> Option<LRESULT> {
        if !self.capability.is_enabled() {
            return None;
        }

        match msg {
            WM_UAHDRAWMENU => {
                let uah = lparam.0 as *const UahMenu;
                if uah.is_null() {
                    return None;
                }
                unsafe { menu_paint::paint_menu_bar(hwnd, (*uah).hdc) };
                Some(LRESULT(0))
            }
            WM_UAHDRAWMENUITEM => {
                let udmi = lparam.0 as *const UahDrawMenuItem;
                if udmi.is_null() {
                    return None;
                }
                if self.menu_theme.is_none() {
                    self.menu_theme = menu_paint::open_menu_theme(hwnd);
                }
                unsafe { menu_paint::paint_menu_bar_item(self.menu_theme, &*udmi) };
                Some(LRESULT(0))
            }
            WM_THEMECHANGED => {
                // Drop the cached handle so the next draw reopens it against
                // the new theme; the host's own handling must still run.
                if let Some(theme) = self.menu_theme.take() {
                    menu_paint::close_menu_theme(theme);
                }
                None
            }
            _ => None,
        }
    }

    /// One-way opt-in: `hwnd` and all its descendants get dark scroll bars
    /// from the redirected visual-style open. There is no opt-out.
    pub fn register_dark_scroll_bars(&self, hwnd: HWND) {
        scrollbar_patch::registry().register(hwnd.0 as isize);
    }

    /// Per-window dark-rendering opt-in, forwarded to the OS when the entry
    /// point exists. Returns false on unsupported platforms.
    pub fn allow_dark_mode_for_window(&self, hwnd: HWND, allow: bool) -> bool {
        if !self.capability.is_supported() {
            return false;
        }
        probe().api.allow_dark_mode_for_window(hwnd, allow)
    }

    /// Pushes the current dark state to the window's title bar. Useful at
    /// window creation; also called internally on every toggle.
    pub fn refresh_title_bar(&self, hwnd: HWND) {
        let probe = probe();
        if !self.capability.is_supported() {
            return;
        }
        let Some(version) = probe.version else {
            return;
        };
        os_theme::apply_title_bar_attribute(hwnd, self.capability.is_enabled(), &version, &probe.api);
    }

    /// Repaints the bright separator line under the menu bar; call after
    /// the host's WM_NCPAINT / WM_NCACTIVATE processing while enabled.
    pub fn paint_menu_bar_edge(&self, hwnd: HWND) {
        if !self.capability.is_enabled() {
            return;
        }
        unsafe { menu_paint::paint_menu_bar_edge(hwnd) };
    }
}
