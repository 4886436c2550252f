/*
 * Provides the public entry point for the duskui crate, a Win32 dark-mode
 * layer for native editor shells. The host application keeps its own window
 * procedure and window handles; this crate decides at run time whether the
 * installed OS build exposes the (undocumented) dark theming entry points,
 * flips the process into dark rendering when it does, and answers the two
 * message families the host forwards here: system setting-change broadcasts
 * and the owner-draw menu-bar messages.
 *
 * Capability detection, palette math, the owner-draw state classifier, the
 * scroll-bar redirection rule, and the opt-in registry are platform-agnostic
 * and compile on every target so their logic can be tested anywhere. Symbol
 * resolution backends, code patching, and painting are Win32-only.
 */
pub mod capability;
pub mod error;
pub mod menu_state;
pub mod palette;
pub mod redirect;
pub mod registry;
pub mod resolver;

#[cfg(target_os = "windows")]
pub mod brushes;
#[cfg(target_os = "windows")]
pub mod engine;
#[cfg(target_os = "windows")]
pub(crate) mod menu_paint;
#[cfg(target_os = "windows")]
pub(crate) mod os_theme;
#[cfg(target_os = "windows")]
pub(crate) mod scrollbar_patch;

pub use capability::{ApiGeneration, CapabilityState, PlatformVersion};
#[cfg(target_os = "windows")]
pub use engine::DarkModeEngine;
pub use error::{Result as ThemeResult, ThemeError};
pub use menu_state::{MenuBackgroundState, MenuItemVisual, MenuTextState};
pub use palette::{PaletteIntent, invert_lightness, invert_lightness_softer};
