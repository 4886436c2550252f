/*
 * Version gating and the process-wide capability state machine.
 *
 * The OS only gained the dark theming entry points in a specific build, and
 * changed the shape of one of them (the app-mode opt-in) in a later build,
 * so every capability decision starts from the (major, minor, build) triple.
 * The decisions themselves are pure functions over that triple plus the
 * live OS answers; the native layer supplies those answers and this module
 * stays testable on any target.
 */

/// First build that ships the dark-mode entry points (October 2018 update).
pub const MIN_SUPPORTED_BUILD: u32 = 17763;

/// Build where ordinal 135 changed from `AllowDarkModeForApp(BOOL)` to
/// `SetPreferredAppMode(i32)`, and where the title-bar attribute moved from
/// a window property to the composition-attribute call.
pub const PREFERRED_APP_MODE_BUILD: u32 = 18362;

/// The raw build number carries a vendor-reserved marker in the high nibble.
const BUILD_RESERVED_MASK: u32 = 0xF000_0000;

/// Which calling convention the app-mode opt-in expects on this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGeneration {
    /// `AllowDarkModeForApp(BOOL)`, builds before 18362.
    AllowDark,
    /// `SetPreferredAppMode(i32)`, build 18362 and later.
    PreferredAppMode,
}

/// OS version triple, populated once before any capability decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl PlatformVersion {
    /// Normalizes a raw version triple as reported by the OS; the reserved
    /// high nibble is stripped from the build number.
    pub fn from_raw(major: u32, minor: u32, raw_build: u32) -> Self {
        Self {
            major,
            minor,
            build: raw_build & !BUILD_RESERVED_MASK,
        }
    }

    pub fn is_build_eligible(&self) -> bool {
        self.build >= MIN_SUPPORTED_BUILD
    }

    /// True when the platform family and build can carry dark mode at all.
    pub fn is_supported_platform(&self) -> bool {
        self.major == 10 && self.minor == 0 && self.is_build_eligible()
    }

    pub fn generation(&self) -> ApiGeneration {
        if self.build >= PREFERRED_APP_MODE_BUILD {
            ApiGeneration::PreferredAppMode
        } else {
            ApiGeneration::AllowDark
        }
    }

    /// The legacy per-window property path applies below the same build
    /// that introduced `SetPreferredAppMode`.
    pub fn uses_legacy_title_bar_property(&self) -> bool {
        self.build < PREFERRED_APP_MODE_BUILD
    }
}

/*
 * Presence report for the entry points the probe insists on. Mirrors the
 * actual resolution results; `probe_support` reduces it to the single
 * process-wide `supported` decision.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredEntryPoints {
    pub should_apps_use_dark_mode: bool,
    pub allow_dark_mode_for_window: bool,
    pub app_mode_setter: bool,
    pub refresh_immersive_color_policy: bool,
    pub flush_menu_themes: bool,
    pub open_nc_theme_data: bool,
}

impl RequiredEntryPoints {
    pub fn all_present(self) -> bool {
        self.should_apps_use_dark_mode
            && self.allow_dark_mode_for_window
            && self.app_mode_setter
            && self.refresh_immersive_color_policy
            && self.flush_menu_themes
            && self.open_nc_theme_data
    }

    /// Builds the report through a presence predicate, so tests can supply
    /// a table instead of a live module.
    pub fn resolve_with(present: impl Fn(&'static str) -> bool) -> Self {
        Self {
            should_apps_use_dark_mode: present("ShouldAppsUseDarkMode"),
            allow_dark_mode_for_window: present("AllowDarkModeForWindow"),
            app_mode_setter: present("SetPreferredAppMode"),
            refresh_immersive_color_policy: present("RefreshImmersiveColorPolicyState"),
            flush_menu_themes: present("FlushMenuThemes"),
            open_nc_theme_data: present("OpenNcThemeData"),
        }
    }
}

/// The one-shot probe decision: platform family, build floor, and every
/// required entry point. Any miss is terminal for the process.
pub fn probe_support(version: &PlatformVersion, entry_points: RequiredEntryPoints) -> bool {
    version.is_supported_platform() && entry_points.all_present()
}

pub(crate) fn compute_enabled(prefers_dark: bool, high_contrast: bool) -> bool {
    prefers_dark && !high_contrast
}

/// Exact payload the OS broadcasts when the color scheme flips. The compare
/// is ordinal and case-insensitive, matching how the shell sends it.
pub(crate) fn is_color_scheme_change_payload(payload: Option<&str>) -> bool {
    payload.is_some_and(|p| p.eq_ignore_ascii_case("ImmersiveColorSet"))
}

/// Process capability flags. `supported` is fixed at probe time; `enabled`
/// follows the live OS preference and can never be true while unsupported.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityState {
    supported: bool,
    enabled: bool,
}

impl CapabilityState {
    pub fn from_probe(supported: bool) -> Self {
        Self {
            supported,
            enabled: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Recomputes `enabled` from a fresh pair of OS answers and reports
    /// whether the value changed. A no-op on unsupported platforms.
    pub fn reevaluate(&mut self, prefers_dark: bool, high_contrast: bool) -> bool {
        if !self.supported {
            return false;
        }
        let was_enabled = self.enabled;
        self.enabled = compute_enabled(prefers_dark, high_contrast);
        self.enabled != was_enabled
    }
}

/*
 * Setting-change decision. Only the color-scheme payload is acted on; on a
 * match the immersive color policy is refreshed first (the OS caches it)
 * and `enabled` is then recomputed from the fresh queries. The caller uses
 * the returned toggle flag to drive title-bar propagation and repaints.
 */
pub fn apply_setting_change(
    state: &mut CapabilityState,
    payload: Option<&str>,
    refresh_policy: impl FnOnce(),
    prefers_dark: impl FnOnce() -> bool,
    high_contrast: impl FnOnce() -> bool,
) -> bool {
    if !state.is_supported() || !is_color_scheme_change_payload(payload) {
        return false;
    }
    refresh_policy();
    state.reevaluate(prefers_dark(), high_contrast())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligible_version() -> PlatformVersion {
        PlatformVersion::from_raw(10, 0, 19041)
    }

    fn all_entry_points() -> RequiredEntryPoints {
        RequiredEntryPoints::resolve_with(|_| true)
    }

    #[test]
    fn build_masking_strips_reserved_high_nibble() {
        let v = PlatformVersion::from_raw(10, 0, 0x1000_44B0);
        assert_eq!(v.build, 0x44B0);
    }

    #[test]
    fn build_eligibility_boundary() {
        assert!(!PlatformVersion::from_raw(10, 0, 17762).is_build_eligible());
        assert!(PlatformVersion::from_raw(10, 0, 17763).is_build_eligible());
    }

    #[test]
    fn generation_splits_at_preferred_app_mode_build() {
        assert_eq!(
            PlatformVersion::from_raw(10, 0, 18361).generation(),
            ApiGeneration::AllowDark
        );
        assert_eq!(
            PlatformVersion::from_raw(10, 0, 18362).generation(),
            ApiGeneration::PreferredAppMode
        );
        assert!(PlatformVersion::from_raw(10, 0, 18361).uses_legacy_title_bar_property());
        assert!(!PlatformVersion::from_raw(10, 0, 18362).uses_legacy_title_bar_property());
    }

    #[test]
    fn probe_rejects_foreign_platform_family() {
        let v = PlatformVersion::from_raw(6, 3, 19041);
        assert!(!probe_support(&v, all_entry_points()));

        let mut state = CapabilityState::from_probe(probe_support(&v, all_entry_points()));
        // Enabled can never turn on when unsupported, whatever the queries say.
        assert!(!state.reevaluate(true, false));
        assert!(!state.is_enabled());
    }

    #[test]
    fn probe_rejects_any_missing_entry_point() {
        let v = eligible_version();
        let missing_one =
            RequiredEntryPoints::resolve_with(|name| name != "RefreshImmersiveColorPolicyState");
        assert!(!probe_support(&v, missing_one));
        assert!(probe_support(&v, all_entry_points()));
    }

    #[test]
    fn payload_match_is_exact_but_case_insensitive() {
        assert!(is_color_scheme_change_payload(Some("ImmersiveColorSet")));
        assert!(is_color_scheme_change_payload(Some("immersivecolorset")));
        assert!(!is_color_scheme_change_payload(Some("ImmersiveColorSetEx")));
        assert!(!is_color_scheme_change_payload(Some("WindowsThemeElement")));
        assert!(!is_color_scheme_change_payload(None));
    }

    #[test]
    fn non_matching_payload_leaves_state_untouched() {
        let mut state = CapabilityState::from_probe(true);
        state.reevaluate(true, false);
        assert!(state.is_enabled());

        let toggled = apply_setting_change(
            &mut state,
            Some("WindowsThemeElement"),
            || panic!("policy must not be refreshed for a non-matching payload"),
            || false,
            || false,
        );
        assert!(!toggled);
        assert!(state.is_enabled());
    }

    #[test]
    fn end_to_end_probe_then_contrast_toggle() {
        // Eligible platform with every entry point resolvable.
        let version = eligible_version();
        let supported = probe_support(&version, all_entry_points());
        assert!(supported);

        let mut state = CapabilityState::from_probe(supported);

        // OS prefers dark, contrast off: dark mode comes on.
        assert!(state.reevaluate(true, false));
        assert!(state.is_enabled());

        // High contrast flips on and broadcasts the color-scheme payload.
        let mut refreshed = false;
        let toggled = apply_setting_change(
            &mut state,
            Some("ImmersiveColorSet"),
            || refreshed = true,
            || true,
            || true,
        );
        assert!(toggled);
        assert!(refreshed);
        assert!(!state.is_enabled());
    }
}
