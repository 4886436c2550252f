/*
 * Typed access to the OS theming surface. Almost everything here is
 * undocumented and exported from uxtheme.dll by ordinal only, so every
 * entry point is resolved through the symbol cache (name first, ordinal
 * fallback) and kept as an `Option` of a typed function pointer; call sites
 * degrade to light-mode behavior when a pointer is absent.
 *
 * Local `#[repr(C)]` mirrors are used for the two structures whose Win32
 * definitions live in feature families this crate otherwise has no use for
 * (high-contrast query, composition-attribute data).
 */
use std::ffi::c_void;

use windows::{
    Win32::{
        Foundation::{HANDLE, HWND},
        Graphics::Dwm::{DWMWINDOWATTRIBUTE, DwmSetWindowAttribute},
        System::LibraryLoader::{GetProcAddress, LoadLibraryW},
        UI::WindowsAndMessaging::{
            GA_ROOT, GetAncestor, SPI_GETHIGHCONTRAST, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
            SetPropW, SystemParametersInfoW,
        },
    },
    core::{BOOL, HSTRING, PCSTR, PCWSTR, PWSTR, w},
};

use crate::capability::{ApiGeneration, PlatformVersion, RequiredEntryPoints};
use crate::resolver::{SymbolCache, SymbolKey};

pub(crate) const UXTHEME: &str = "uxtheme.dll";

pub(crate) const UXTHEME_ORD_OPEN_NC_THEME_DATA: u16 = 49;
pub(crate) const UXTHEME_ORD_REFRESH_IMMERSIVE_COLOR_POLICY_STATE: u16 = 104;
pub(crate) const UXTHEME_ORD_SHOULD_APPS_USE_DARK_MODE: u16 = 132;
pub(crate) const UXTHEME_ORD_ALLOW_DARK_MODE_FOR_WINDOW: u16 = 133;
/// Ordinal 135 changed identity across builds: `AllowDarkModeForApp` before
/// 18362, `SetPreferredAppMode` afterwards. Same slot, different shape.
pub(crate) const UXTHEME_ORD_APP_MODE_SETTER: u16 = 135;
pub(crate) const UXTHEME_ORD_FLUSH_MENU_THEMES: u16 = 136;
pub(crate) const UXTHEME_ORD_IS_DARK_MODE_ALLOWED_FOR_WINDOW: u16 = 137;

#[repr(i32)]
#[derive(Clone, Copy)]
enum PreferredAppMode {
    AllowDark = 1,
}

type ShouldAppsUseDarkModeFn = unsafe extern "system" fn() -> BOOL;
type AllowDarkModeForWindowFn = unsafe extern "system" fn(HWND, BOOL) -> BOOL;
type AllowDarkModeForAppFn = unsafe extern "system" fn(BOOL) -> BOOL;
type SetPreferredAppModeFn = unsafe extern "system" fn(PreferredAppMode) -> i32;
type RefreshImmersiveColorPolicyStateFn = unsafe extern "system" fn();
type FlushMenuThemesFn = unsafe extern "system" fn();
type IsDarkModeAllowedForWindowFn = unsafe extern "system" fn(HWND) -> BOOL;
type SetWindowCompositionAttributeFn =
    unsafe extern "system" fn(HWND, *mut WindowCompositionAttribData) -> BOOL;
type RtlGetNtVersionNumbersFn = unsafe extern "system" fn(*mut u32, *mut u32, *mut u32);

/// The two calling conventions behind uxtheme ordinal 135.
#[derive(Clone, Copy)]
pub(crate) enum AppModeSetter {
    Legacy(AllowDarkModeForAppFn),
    Preferred(SetPreferredAppModeFn),
}

/// Loader-backed resolution: export name first, ordinal fallback. Used as
/// the production backend for `SymbolCache::resolve_with`.
pub(crate) fn win32_symbol_lookup(key: &SymbolKey) -> Option<usize> {
    let module = match unsafe { LoadLibraryW(&HSTRING::from(key.module)) } {
        Ok(module) => module,
        Err(err) => {
            log::debug!(
                "Failed to load {} while resolving {}: {err:?}",
                key.module,
                key.describe()
            );
            return None;
        }
    };
    if let Some(name) = key.name {
        let name_z = format!("{name}\0");
        if let Some(func) = unsafe { GetProcAddress(module, PCSTR(name_z.as_ptr())) } {
            return Some(func as usize);
        }
    }
    if let Some(ordinal) = key.ordinal {
        if let Some(func) = unsafe { GetProcAddress(module, PCSTR(ordinal as usize as *const u8)) }
        {
            return Some(func as usize);
        }
    }
    None
}

/// Queries the kernel for the raw version triple. Goes through ntdll
/// directly because the documented query is subject to compatibility
/// shimming; absence means the platform is unknown and thus unsupported.
pub(crate) fn query_platform_version(cache: &SymbolCache) -> Option<PlatformVersion> {
    let addr = cache.resolve_with(
        SymbolKey::named("ntdll.dll", "RtlGetNtVersionNumbers"),
        win32_symbol_lookup,
    )?;
    let rtl_get_version: RtlGetNtVersionNumbersFn = unsafe { std::mem::transmute(addr) };

    let mut major = 0u32;
    let mut minor = 0u32;
    let mut build = 0u32;
    unsafe { rtl_get_version(&mut major, &mut minor, &mut build) };
    Some(PlatformVersion::from_raw(major, minor, build))
}

/*
 * Resolved theming entry points for this process. Built once during the
 * capability probe; every field is optional and every accessor tolerates
 * absence.
 */
pub(crate) struct OsThemeApi {
    should_apps_use_dark_mode: Option<ShouldAppsUseDarkModeFn>,
    allow_dark_mode_for_window: Option<AllowDarkModeForWindowFn>,
    app_mode: Option<AppModeSetter>,
    refresh_immersive_color_policy: Option<RefreshImmersiveColorPolicyStateFn>,
    flush_menu_themes: Option<FlushMenuThemesFn>,
    is_dark_mode_allowed_for_window: Option<IsDarkModeAllowedForWindowFn>,
    set_window_composition_attribute: Option<SetWindowCompositionAttributeFn>,
    /// Raw address; the scroll-bar patch owns the typed view.
    pub(crate) open_nc_theme_data: Option<usize>,
}

impl OsThemeApi {
    /// All-absent table for early probe failures.
    pub(crate) fn unresolved() -> Self {
        Self {
            should_apps_use_dark_mode: None,
            allow_dark_mode_for_window: None,
            app_mode: None,
            refresh_immersive_color_policy: None,
            flush_menu_themes: None,
            is_dark_mode_allowed_for_window: None,
            set_window_composition_attribute: None,
            open_nc_theme_data: None,
        }
    }

    pub(crate) fn resolve(cache: &SymbolCache, generation: ApiGeneration) -> Self {
        let resolve = |key: SymbolKey| cache.resolve_with(key, win32_symbol_lookup);

        let app_mode_key = match generation {
            ApiGeneration::AllowDark => SymbolKey::named_or_ordinal(
                UXTHEME,
                "AllowDarkModeForApp",
                UXTHEME_ORD_APP_MODE_SETTER,
            ),
            ApiGeneration::PreferredAppMode => SymbolKey::named_or_ordinal(
                UXTHEME,
                "SetPreferredAppMode",
                UXTHEME_ORD_APP_MODE_SETTER,
            ),
        };
        let app_mode = resolve(app_mode_key).map(|addr| match generation {
            ApiGeneration::AllowDark => {
                AppModeSetter::Legacy(unsafe { std::mem::transmute::<usize, AllowDarkModeForAppFn>(addr) })
            }
            ApiGeneration::PreferredAppMode => AppModeSetter::Preferred(unsafe {
                std::mem::transmute::<usize, SetPreferredAppModeFn>(addr)
            }),
        });

        Self {
            should_apps_use_dark_mode: resolve(SymbolKey::named_or_ordinal(
                UXTHEME,
                "ShouldAppsUseDarkMode",
                UXTHEME_ORD_SHOULD_APPS_USE_DARK_MODE,
            ))
            .map(|addr| unsafe { std::mem::transmute::<usize, ShouldAppsUseDarkModeFn>(addr) }),
            allow_dark_mode_for_window: resolve(SymbolKey::named_or_ordinal(
                UXTHEME,
                "AllowDarkModeForWindow",
                UXTHEME_ORD_ALLOW_DARK_MODE_FOR_WINDOW,
            ))
            .map(|addr| unsafe { std::mem::transmute::<usize, AllowDarkModeForWindowFn>(addr) }),
            app_mode,
            refresh_immersive_color_policy: resolve(SymbolKey::named_or_ordinal(
                UXTHEME,
                "RefreshImmersiveColorPolicyState",
                UXTHEME_ORD_REFRESH_IMMERSIVE_COLOR_POLICY_STATE,
            ))
            .map(|addr| unsafe {
                std::mem::transmute::<usize, RefreshImmersiveColorPolicyStateFn>(addr)
            }),
            flush_menu_themes: resolve(SymbolKey::named_or_ordinal(
                UXTHEME,
                "FlushMenuThemes",
                UXTHEME_ORD_FLUSH_MENU_THEMES,
            ))
            .map(|addr| unsafe { std::mem::transmute::<usize, FlushMenuThemesFn>(addr) }),
            is_dark_mode_allowed_for_window: resolve(SymbolKey::named_or_ordinal(
                UXTHEME,
                "IsDarkModeAllowedForWindow",
                UXTHEME_ORD_IS_DARK_MODE_ALLOWED_FOR_WINDOW,
            ))
            .map(|addr| unsafe { std::mem::transmute::<usize, IsDarkModeAllowedForWindowFn>(addr) }),
            set_window_composition_attribute: resolve(SymbolKey::named(
                "user32.dll",
                "SetWindowCompositionAttribute",
            ))
            .map(|addr| unsafe {
                std::mem::transmute::<usize, SetWindowCompositionAttributeFn>(addr)
            }),
            open_nc_theme_data: resolve(SymbolKey::named_or_ordinal(
                UXTHEME,
                "OpenNcThemeData",
                UXTHEME_ORD_OPEN_NC_THEME_DATA,
            )),
        }
    }

    /// Presence report for the probe decision.
    pub(crate) fn required_entry_points(&self) -> RequiredEntryPoints {
        RequiredEntryPoints {
            should_apps_use_dark_mode: self.should_apps_use_dark_mode.is_some(),
            allow_dark_mode_for_window: self.allow_dark_mode_for_window.is_some(),
            app_mode_setter: self.app_mode.is_some(),
            refresh_immersive_color_policy: self.refresh_immersive_color_policy.is_some(),
            flush_menu_themes: self.flush_menu_themes.is_some(),
            open_nc_theme_data: self.open_nc_theme_data.is_some(),
        }
    }

    pub(crate) fn prefers_dark(&self) -> bool {
        match self.should_apps_use_dark_mode {
            Some(should_apps_use_dark_mode) => unsafe { should_apps_use_dark_mode() }.as_bool(),
            None => false,
        }
    }

    pub(crate) fn allow_app_dark_mode(&self, allow: bool) {
        match self.app_mode {
            Some(AppModeSetter::Legacy(allow_dark_mode_for_app)) => unsafe {
                let _ = allow_dark_mode_for_app(allow.into());
            },
            Some(AppModeSetter::Preferred(set_preferred_app_mode)) => {
                if allow {
                    unsafe {
                        let _ = set_preferred_app_mode(PreferredAppMode::AllowDark);
                    }
                }
            }
            None => {}
        }
    }

    pub(crate) fn allow_dark_mode_for_window(&self, hwnd: HWND, allow: bool) -> bool {
        match self.allow_dark_mode_for_window {
            Some(allow_dark_mode_for_window) => {
                unsafe { allow_dark_mode_for_window(hwnd, allow.into()) }.as_bool()
            }
            None => false,
        }
    }

    pub(crate) fn refresh_color_policy(&self) {
        if let Some(refresh) = self.refresh_immersive_color_policy {
            unsafe { refresh() };
        }
    }

    pub(crate) fn flush_menu_themes(&self) {
        if let Some(flush) = self.flush_menu_themes {
            unsafe { flush() };
        }
    }

    fn window_allows_dark(&self, hwnd: HWND) -> bool {
        match self.is_dark_mode_allowed_for_window {
            Some(is_dark_mode_allowed_for_window) => {
                unsafe { is_dark_mode_allowed_for_window(hwnd) }.as_bool()
            }
            // Treat the per-window veto as granted when the query is absent.
            None => true,
        }
    }
}

// Composition-attribute plumbing for the title bar. The call itself is
// undocumented, so its data block is mirrored locally.
const WCA_USEDARKMODECOLORS: u32 = 26;

#[repr(C)]
struct WindowCompositionAttribData {
    attrib: u32,
    pv_data: *mut c_void,
    cb_data: usize,
}

/*
 * Pushes the dark title-bar attribute to one window. Builds before the
 * preferred-app-mode split read a window property; later builds take the
 * composition attribute. The documented DWM attribute is attempted as well
 * (both IDs, some builds expect 19 instead of 20); every path is
 * best-effort.
 */
pub(crate) fn apply_title_bar_attribute(
    hwnd: HWND,
    dark: bool,
    version: &PlatformVersion,
    api: &OsThemeApi,
) {
    let dark = dark && api.window_allows_dark(hwnd);

    if version.uses_legacy_title_bar_property() {
        let value = HANDLE((dark as usize) as *mut c_void);
        if let Err(err) = unsafe { SetPropW(hwnd, w!("UseImmersiveDarkModeColors"), Some(value)) } {
            log::debug!("SetPropW(UseImmersiveDarkModeColors) failed: {err:?}");
        }
    } else if let Some(set_window_composition_attribute) = api.set_window_composition_attribute {
        let mut state = BOOL::from(dark);
        let mut data = WindowCompositionAttribData {
            attrib: WCA_USEDARKMODECOLORS,
            pv_data: (&mut state) as *mut BOOL as *mut c_void,
            cb_data: size_of::<BOOL>(),
        };
        unsafe {
            let _ = set_window_composition_attribute(hwnd, &mut data);
        }
    }

    unsafe {
        let value: i32 = dark as i32;
        const DWMWA_USE_IMMERSIVE_DARK_MODE: DWMWINDOWATTRIBUTE = DWMWINDOWATTRIBUTE(20);
        let _ = DwmSetWindowAttribute(
            hwnd,
            DWMWA_USE_IMMERSIVE_DARK_MODE,
            &value as *const _ as *const c_void,
            size_of_val(&value) as u32,
        );
        let _ = DwmSetWindowAttribute(
            hwnd,
            DWMWINDOWATTRIBUTE(19),
            &value as *const _ as *const c_void,
            size_of_val(&value) as u32,
        );
    }
}

// High-contrast query. Local mirror of HIGHCONTRASTW (avoids pulling in
// Win32_UI_Accessibility for one struct).
const HCF_HIGHCONTRASTON: u32 = 0x0000_0001;

#[repr(C)]
struct HighContrast {
    cb_size: u32,
    dw_flags: u32,
    lpsz_default_scheme: PWSTR,
}

pub(crate) fn is_high_contrast() -> bool {
    let mut hc = HighContrast {
        cb_size: size_of::<HighContrast>() as u32,
        dw_flags: 0,
        lpsz_default_scheme: PWSTR::null(),
    };
    let queried = unsafe {
        SystemParametersInfoW(
            SPI_GETHIGHCONTRAST,
            hc.cb_size,
            Some((&mut hc) as *mut HighContrast as *mut c_void),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
    };
    queried.is_ok() && (hc.dw_flags & HCF_HIGHCONTRASTON) != 0
}

/// Reads a NUL-terminated wide string out of a notification payload.
pub(crate) unsafe fn wide_string_at(ptr: *const u16) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { PCWSTR(ptr).to_string() }.ok()
}

/// Root ancestor lookup for the opt-in registry; identity for windows the
/// OS no longer resolves.
pub(crate) fn root_window(window: isize) -> isize {
    let root = unsafe { GetAncestor(HWND(window as *mut c_void), GA_ROOT) };
    if root.0.is_null() { window } else { root.0 as isize }
}
