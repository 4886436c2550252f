/*
 * Cached GDI brushes for the palette. A brush is created on first request
 * and kept for the process lifetime; paint handlers run at message-pump
 * rate and must never create brushes per paint. Nothing is ever freed, the
 * OS reclaims the handles at process exit.
 */
use std::ffi::c_void;
use std::sync::OnceLock;

use windows::Win32::Foundation::COLORREF;
use windows::Win32::Graphics::Gdi::{CreateSolidBrush, HBRUSH};

use crate::palette::{self, PaletteIntent};

static BRUSHES: [OnceLock<usize>; PaletteIntent::ALL.len()] =
    [const { OnceLock::new() }; PaletteIntent::ALL.len()];

/// Palette color wrapped for GDI calls.
pub fn colorref(intent: PaletteIntent) -> COLORREF {
    COLORREF(palette::color(intent))
}

/// Lazily created solid brush for one palette slot.
pub fn solid(intent: PaletteIntent) -> HBRUSH {
    let raw = BRUSHES[intent.index()]
        .get_or_init(|| unsafe { CreateSolidBrush(colorref(intent)) }.0 as usize);
    HBRUSH(*raw as *mut c_void)
}
