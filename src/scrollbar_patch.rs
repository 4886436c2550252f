/*
 * Redirects the common-controls scroll-bar painter into the dark visual
 * style. comctl32 opens the "ScrollBar" style through a delay-loaded
 * uxtheme import (ordinal 49, OpenNcThemeData), so there is no export to
 * detour; instead the delay-load import-address slot inside comctl32 is
 * located by walking its PE delay-import descriptors and overwritten with
 * a substitute. The substitute consults the opt-in registry and, for dark
 * treated windows, forwards the request with a null window and the
 * "Explorer::ScrollBar" class; everything else passes through untouched.
 *
 * The forward target is the independently resolved OpenNcThemeData entry
 * point, never the previous slot contents: before first use the slot holds
 * the loader's resolution stub, not the real function.
 *
 * Every failure here is a silent downgrade. No comctl32, no delay-import
 * descriptor for uxtheme, no ordinal-49 thunk, or an unwritable slot all
 * leave scroll bars light; a failed protection restore leaves the page
 * writable rather than undoing the patch.
 */
use std::ffi::c_void;
use std::sync::OnceLock;

use windows::{
    Win32::{
        Foundation::{HMODULE, HWND},
        System::LibraryLoader::{LOAD_LIBRARY_SEARCH_SYSTEM32, LoadLibraryExW},
        System::Memory::{PAGE_PROTECTION_FLAGS, PAGE_READWRITE, VirtualProtect},
        UI::Controls::HTHEME,
    },
    core::{PCWSTR, w},
};

use crate::error::{Result, ThemeError};
use crate::os_theme::{self, UXTHEME, UXTHEME_ORD_OPEN_NC_THEME_DATA};
use crate::redirect::{self, RedirectAction};
use crate::registry::DarkScrollBarRegistry;

type OpenNcThemeDataFn = unsafe extern "system" fn(HWND, PCWSTR) -> HTHEME;

static ORIGINAL_OPEN_NC_THEME_DATA: OnceLock<OpenNcThemeDataFn> = OnceLock::new();

/// Process-wide opt-in set, shared between the public registration call and
/// the redirected open running inside comctl32.
pub(crate) fn registry() -> &'static DarkScrollBarRegistry {
    static REGISTRY: OnceLock<DarkScrollBarRegistry> = OnceLock::new();
    REGISTRY.get_or_init(DarkScrollBarRegistry::new)
}

unsafe extern "system" fn open_nc_theme_data_redirect(hwnd: HWND, class_list: PCWSTR) -> HTHEME {
    let Some(original) = ORIGINAL_OPEN_NC_THEME_DATA.get().copied() else {
        // Unreachable once installed; fail closed instead of crashing.
        return HTHEME::default();
    };
    if class_list.is_null() {
        return unsafe { original(hwnd, class_list) };
    }

    let treated = registry().is_dark_treated(hwnd.0 as isize, os_theme::root_window);
    match redirect::decide(unsafe { class_list.as_wide() }, treated) {
        RedirectAction::SubstituteDark => unsafe {
            original(HWND::default(), w!("Explorer::ScrollBar"))
        },
        RedirectAction::Forward => unsafe { original(hwnd, class_list) },
    }
}

/// Installs the redirect once per process. `original` is the resolved
/// address of uxtheme's OpenNcThemeData; zero skips installation. Failure
/// is never surfaced to the host, scroll bars simply stay light.
pub(crate) fn install(original: usize) {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        if original == 0 {
            return;
        }
        match install_redirect(original) {
            Ok(()) => log::debug!("Dark scroll-bar redirect installed."),
            Err(err) => log::debug!("Scroll-bar redirect not applied: {err}"),
        }
    });
}

fn install_redirect(original: usize) -> Result<()> {
    let forward: OpenNcThemeDataFn = unsafe { std::mem::transmute(original) };
    let _ = ORIGINAL_OPEN_NC_THEME_DATA.set(forward);

    let module =
        unsafe { LoadLibraryExW(w!("comctl32.dll"), None, LOAD_LIBRARY_SEARCH_SYSTEM32) }
            .map_err(|err| ThemeError::MissingEntryPoint(format!("comctl32.dll: {err:?}")))?;

    let slot = unsafe {
        find_delay_load_import_slot(module, UXTHEME, UXTHEME_ORD_OPEN_NC_THEME_DATA)
    }
    .ok_or_else(|| {
        ThemeError::PatchSiteUnavailable(format!(
            "no delay-load thunk for {UXTHEME} #{UXTHEME_ORD_OPEN_NC_THEME_DATA} in comctl32.dll"
        ))
    })?;

    unsafe { write_import_slot(slot, open_nc_theme_data_redirect as usize) }
}

/*
 * Overwrites one pointer-sized import slot. The page is made writable for
 * the single store and the previous protection is put back afterwards; a
 * failed restore is logged and tolerated.
 */
unsafe fn write_import_slot(slot: *mut usize, value: usize) -> Result<()> {
    let mut previous = PAGE_PROTECTION_FLAGS::default();
    unsafe { VirtualProtect(slot as *const c_void, size_of::<usize>(), PAGE_READWRITE, &mut previous) }
        .map_err(|err| {
            ThemeError::OperationFailed(format!("VirtualProtect(PAGE_READWRITE) failed: {err:?}"))
        })?;

    unsafe { *slot = value };

    let mut ignored = PAGE_PROTECTION_FLAGS::default();
    if let Err(err) =
        unsafe { VirtualProtect(slot as *const c_void, size_of::<usize>(), previous, &mut ignored) }
    {
        log::warn!("Could not restore import-slot protection; leaving page writable: {err:?}");
    }
    Ok(())
}

// Minimal PE mirrors for the delay-import walk. Only the fields this walk
// touches are typed; everything else is reached by documented offsets.

const IMAGE_DOS_SIGNATURE: u16 = 0x5A4D;
const IMAGE_NT_SIGNATURE: u32 = 0x0000_4550;
const IMAGE_DIRECTORY_ENTRY_DELAY_IMPORT: usize = 13;
/// Name-table entries with the high bit set import by ordinal.
const IMAGE_ORDINAL_FLAG: usize = 1 << (usize::BITS - 1);
/// Descriptor attribute bit: fields are RVAs rather than virtual addresses.
const DLATTR_RVA: u32 = 0x1;

#[repr(C)]
struct ImageDataDirectory {
    virtual_address: u32,
    size: u32,
}

#[repr(C)]
struct ImageDelayloadDescriptor {
    attributes: u32,
    dll_name_rva: u32,
    module_handle_rva: u32,
    import_address_table_rva: u32,
    import_name_table_rva: u32,
    bound_import_address_table_rva: u32,
    unload_information_table_rva: u32,
    time_date_stamp: u32,
}

/*
 * Walks `module`'s delay-load descriptor table looking for the import of
 * `ordinal` from `target_module`, and returns the matching import-address
 * slot. Returns None for anything unexpected in the headers; the walk never
 * writes.
 */
unsafe fn find_delay_load_import_slot(
    module: HMODULE,
    target_module: &str,
    ordinal: u16,
) -> Option<*mut usize> {
    let base = module.0 as *const u8;
    if base.is_null() {
        return None;
    }
    unsafe {
        if *(base as *const u16) != IMAGE_DOS_SIGNATURE {
            return None;
        }
        // e_lfanew lives at offset 60 of the DOS header.
        let e_lfanew = *(base.add(60) as *const i32);
        if e_lfanew <= 0 {
            return None;
        }
        let nt = base.add(e_lfanew as usize);
        if *(nt as *const u32) != IMAGE_NT_SIGNATURE {
            return None;
        }

        // Optional header follows the 4-byte signature and 20-byte file
        // header; the data directory sits at 112 (PE32+) or 96 (PE32).
        let optional = nt.add(24);
        let directory_offset = match *(optional as *const u16) {
            0x20B => 112,
            0x10B => 96,
            _ => return None,
        };
        let directory = &*(optional
            .add(directory_offset + IMAGE_DIRECTORY_ENTRY_DELAY_IMPORT * 8)
            as *const ImageDataDirectory);
        if directory.virtual_address == 0 || directory.size == 0 {
            return None;
        }

        let mut descriptor =
            base.add(directory.virtual_address as usize) as *const ImageDelayloadDescriptor;
        while (*descriptor).dll_name_rva != 0 {
            let d = &*descriptor;
            if d.attributes & DLATTR_RVA != 0
                && delay_module_name_matches(base, d.dll_name_rva, target_module)
            {
                let mut name_thunk = base.add(d.import_name_table_rva as usize) as *const usize;
                let mut addr_thunk = base.add(d.import_address_table_rva as usize) as *mut usize;
                while *name_thunk != 0 {
                    let entry = *name_thunk;
                    if entry & IMAGE_ORDINAL_FLAG != 0 && (entry & 0xFFFF) as u16 == ordinal {
                        return Some(addr_thunk);
                    }
                    name_thunk = name_thunk.add(1);
                    addr_thunk = addr_thunk.add(1);
                }
            }
            descriptor = descriptor.add(1);
        }
    }
    None
}

unsafe fn delay_module_name_matches(base: *const u8, name_rva: u32, target: &str) -> bool {
    let name =
        unsafe { std::ffi::CStr::from_ptr(base.add(name_rva as usize) as *const core::ffi::c_char) };
    name.to_str().is_ok_and(|n| n.eq_ignore_ascii_case(target))
}
