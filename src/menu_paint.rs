/*
 * Painting for the owner-drawn menu bar. Windows sends the undocumented
 * UAH messages to the owning window when the menu bar needs drawing; the
 * structures below mirror the blobs passed through lParam.
 *
 * Item painting prefers the themed popup-item parts so hot tracking and
 * disabled text match the system look; when the "Menu" visual style cannot
 * be opened the item degrades to a flat fill and a plain DrawTextW in the
 * palette text color.
 */
use windows::{
    Win32::{
        Foundation::{HWND, POINT, RECT},
        Graphics::Gdi::{
            DT_CENTER, DT_HIDEPREFIX, DT_SINGLELINE, DT_VCENTER, DrawTextW, FillRect, GetWindowDC,
            HDC, MapWindowPoints, OffsetRect, ReleaseDC, SetBkMode, SetTextColor, TRANSPARENT,
        },
        UI::Controls::{
            CloseThemeData, DRAWITEMSTRUCT, DTT_TEXTCOLOR, DTTOPTS, DrawThemeBackground,
            DrawThemeTextEx, HTHEME, MENU_POPUPITEM, MPI_DISABLED, MPI_HOT, MPI_NORMAL,
            OpenThemeData,
        },
        UI::WindowsAndMessaging::{
            GetClientRect, GetMenuBarInfo, GetMenuItemInfoW, GetWindowRect, HMENU, MENUBARINFO,
            MENUITEMINFOW, MIIM_STRING, OBJECT_IDENTIFIER,
        },
    },
    core::w,
};

use crate::brushes;
use crate::menu_state::{self, MenuBackgroundState, MenuTextState};
use crate::palette::PaletteIntent;

/// Undocumented menu-bar draw messages.
pub(crate) const WM_UAHDRAWMENU: u32 = 0x0091;
pub(crate) const WM_UAHDRAWMENUITEM: u32 = 0x0092;

/// Win32 `OBJID_MENU` (avoids pulling in `Win32_UI_Accessibility`).
const OBJID_MENU_BAR: i32 = -3;

/// Mirrors the undocumented `UAHMENU` structure Windows passes via `lParam`.
#[repr(C)]
pub(crate) struct UahMenu {
    pub hmenu: HMENU,
    pub hdc: HDC,
    _dw_flags: u32,
}

/// Mirrors the undocumented `UAHMENUITEM` that follows the `UAHMENU` inside
/// the `UAHDRAWMENUITEM` blob.
#[repr(C)]
pub(crate) struct UahMenuItem {
    pub i_position: i32,
    _dw_flags: u32,
}

/// Full `lParam` payload for `WM_UAHDRAWMENUITEM`.
#[repr(C)]
pub(crate) struct UahDrawMenuItem {
    pub dis: DRAWITEMSTRUCT,
    pub um: UahMenu,
    pub umi: UahMenuItem,
}

/// Opens the menu visual style; `None` when theming is unavailable, which
/// the item painter tolerates.
pub(crate) fn open_menu_theme(hwnd: HWND) -> Option<HTHEME> {
    let theme = unsafe { OpenThemeData(Some(hwnd), w!("Menu")) };
    if theme.is_invalid() { None } else { Some(theme) }
}

pub(crate) fn close_menu_theme(theme: HTHEME) {
    unsafe {
        let _ = CloseThemeData(theme);
    }
}

/// Fill the entire menu bar background (`WM_UAHDRAWMENU`).
pub(crate) unsafe fn paint_menu_bar(hwnd: HWND, hdc: HDC) {
    unsafe {
        let mut mbi = MENUBARINFO {
            cbSize: size_of::<MENUBARINFO>() as u32,
            ..Default::default()
        };
        if GetMenuBarInfo(hwnd, OBJECT_IDENTIFIER(OBJID_MENU_BAR), 0, &mut mbi).is_err() {
            return;
        }
        let mut rc_window = RECT::default();
        let _ = GetWindowRect(hwnd, &mut rc_window);

        // rcBar is in screen coordinates; shift it into the window and pull
        // the top edge up over the 1-px gap Windows leaves there.
        let mut rc_bar = mbi.rcBar;
        let _ = OffsetRect(&mut rc_bar, -rc_window.left, -rc_window.top);
        rc_bar.top -= 1;

        FillRect(hdc, &rc_bar, brushes::solid(PaletteIntent::Background));
    }
}

/// Draw a single menu bar item (`WM_UAHDRAWMENUITEM`).
pub(crate) unsafe fn paint_menu_bar_item(theme: Option<HTHEME>, udmi: &UahDrawMenuItem) {
    unsafe {
        // Fetch the item text.
        let mut buf = [0u16; 256];
        let mut mii = MENUITEMINFOW {
            cbSize: size_of::<MENUITEMINFOW>() as u32,
            fMask: MIIM_STRING,
            dwTypeData: windows::core::PWSTR(buf.as_mut_ptr()),
            cch: (buf.len() - 1) as u32,
            ..std::mem::zeroed()
        };
        let _ = GetMenuItemInfoW(udmi.um.hmenu, udmi.umi.i_position as u32, true, &mut mii);

        let visual = menu_state::classify_menu_item(udmi.dis.itemState.0);

        let mut dt_flags = DT_CENTER | DT_SINGLELINE | DT_VCENTER;
        if visual.hide_accelerator {
            dt_flags |= DT_HIDEPREFIX;
        }

        let hdc = udmi.um.hdc;
        let background_brush = brushes::solid(PaletteIntent::Background);

        let themed_background = match (theme, visual.background) {
            (Some(theme), MenuBackgroundState::Hot) => {
                DrawThemeBackground(
                    theme,
                    hdc,
                    MENU_POPUPITEM.0,
                    MPI_HOT.0,
                    &udmi.dis.rcItem,
                    None,
                )
                .is_ok()
            }
            _ => false,
        };
        if !themed_background {
            // Normal and disabled items are flat fills; hot falls back here
            // when the theme handle is unavailable.
            FillRect(hdc, &udmi.dis.rcItem, background_brush);
        }

        let mut rc_item = udmi.dis.rcItem;

        if let Some(theme) = theme {
            let state = match visual.text {
                MenuTextState::Normal => MPI_NORMAL,
                MenuTextState::Hot => MPI_HOT,
                MenuTextState::Disabled => MPI_DISABLED,
            };
            let mut options = DTTOPTS {
                dwSize: size_of::<DTTOPTS>() as u32,
                ..Default::default()
            };
            if visual.overrides_text_color() {
                // Disabled text deliberately keeps the theme's own
                // disabled rendering.
                options.dwFlags |= DTT_TEXTCOLOR;
                options.crText = brushes::colorref(PaletteIntent::Text);
            }
            let _ = DrawThemeTextEx(
                theme,
                hdc,
                MENU_POPUPITEM.0,
                state.0,
                &buf[..mii.cch as usize],
                dt_flags,
                &mut rc_item,
                Some(&options),
            );
        } else {
            let color = if visual.overrides_text_color() {
                PaletteIntent::Text
            } else {
                PaletteIntent::DarkerText
            };
            SetBkMode(hdc, TRANSPARENT);
            SetTextColor(hdc, brushes::colorref(color));
            DrawTextW(hdc, &mut buf[..mii.cch as usize], &mut rc_item, dt_flags);
        }
    }
}

/// Paint over the 1-px bright line Windows leaves between the menu bar and
/// the client area; call after the host's own non-client painting.
pub(crate) unsafe fn paint_menu_bar_edge(hwnd: HWND) {
    unsafe {
        let mut mbi = MENUBARINFO {
            cbSize: size_of::<MENUBARINFO>() as u32,
            ..Default::default()
        };
        if GetMenuBarInfo(hwnd, OBJECT_IDENTIFIER(OBJID_MENU_BAR), 0, &mut mbi).is_err() {
            return;
        }
        let mut rc_client = RECT::default();
        let _ = GetClientRect(hwnd, &mut rc_client);
        let points = std::slice::from_raw_parts_mut(&mut rc_client as *mut RECT as *mut POINT, 2);
        MapWindowPoints(Some(hwnd), None, points);
        let mut rc_window = RECT::default();
        let _ = GetWindowRect(hwnd, &mut rc_window);
        let _ = OffsetRect(&mut rc_client, -rc_window.left, -rc_window.top);

        let rc_line = RECT {
            left: rc_client.left,
            top: rc_client.top - 1,
            right: rc_client.right,
            bottom: rc_client.top,
        };
        let hdc = GetWindowDC(Some(hwnd));
        if hdc.is_invalid() {
            return;
        }
        FillRect(hdc, &rc_line, brushes::solid(PaletteIntent::Background));
        ReleaseDC(Some(hwnd), hdc);
    }
}
