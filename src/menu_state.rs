/*
 * Pure classification of owner-draw menu item state flags into the visual
 * states the painter needs. The item state arrives as a bitfield on the
 * draw message; several bits can be set at once, so the mapping applies a
 * fixed precedence instead of testing bits in arrival order:
 *
 *   grayed or disabled  beats  hot-tracked or selected  beats  normal.
 *
 * Text and background states are tracked separately because the painter
 * treats them differently (disabled text keeps the OS rendering while the
 * disabled background is still flat-filled).
 */

// Owner-draw state bits, as delivered in DRAWITEMSTRUCT::itemState. Local
// constants keep this module portable.
pub(crate) const ODS_SELECTED: u32 = 0x0001;
pub(crate) const ODS_GRAYED: u32 = 0x0002;
pub(crate) const ODS_DISABLED: u32 = 0x0004;
pub(crate) const ODS_HOTLIGHT: u32 = 0x0040;
pub(crate) const ODS_NOACCEL: u32 = 0x0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTextState {
    Normal,
    Hot,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuBackgroundState {
    Normal,
    Hot,
    Disabled,
}

/// Resolved visual treatment for one owner-drawn menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItemVisual {
    pub text: MenuTextState,
    pub background: MenuBackgroundState,
    /// Suppress keyboard-accelerator underlining (DT_HIDEPREFIX).
    pub hide_accelerator: bool,
}

impl MenuItemVisual {
    /// True when the background should be a flat fill rather than the
    /// themed hot-item part.
    pub fn wants_flat_background(&self) -> bool {
        matches!(
            self.background,
            MenuBackgroundState::Normal | MenuBackgroundState::Disabled
        )
    }

    /// True when the text color is forced to the palette text color;
    /// disabled items keep the OS disabled rendering.
    pub fn overrides_text_color(&self) -> bool {
        matches!(self.text, MenuTextState::Normal | MenuTextState::Hot)
    }
}

pub fn classify_menu_item(item_state: u32) -> MenuItemVisual {
    let (text, background) = if item_state & (ODS_GRAYED | ODS_DISABLED) != 0 {
        (MenuTextState::Disabled, MenuBackgroundState::Disabled)
    } else if item_state & (ODS_HOTLIGHT | ODS_SELECTED) != 0 {
        // Selected has no dedicated popup-item state; it renders as hot.
        (MenuTextState::Hot, MenuBackgroundState::Hot)
    } else {
        (MenuTextState::Normal, MenuBackgroundState::Normal)
    };

    MenuItemVisual {
        text,
        background,
        hide_accelerator: item_state & ODS_NOACCEL != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayed_wins_over_hot_tracking() {
        let visual = classify_menu_item(ODS_GRAYED | ODS_HOTLIGHT);
        assert_eq!(visual.text, MenuTextState::Disabled);
        assert_eq!(visual.background, MenuBackgroundState::Disabled);
    }

    #[test]
    fn disabled_wins_over_selection() {
        let visual = classify_menu_item(ODS_DISABLED | ODS_SELECTED);
        assert_eq!(visual.text, MenuTextState::Disabled);
        assert_eq!(visual.background, MenuBackgroundState::Disabled);
    }

    #[test]
    fn hot_tracking_and_selection_both_map_to_hot() {
        for state in [ODS_HOTLIGHT, ODS_SELECTED, ODS_HOTLIGHT | ODS_SELECTED] {
            let visual = classify_menu_item(state);
            assert_eq!(visual.text, MenuTextState::Hot);
            assert_eq!(visual.background, MenuBackgroundState::Hot);
            assert!(!visual.wants_flat_background());
        }
    }

    #[test]
    fn bare_state_is_normal() {
        let visual = classify_menu_item(0);
        assert_eq!(visual.text, MenuTextState::Normal);
        assert_eq!(visual.background, MenuBackgroundState::Normal);
        assert!(visual.wants_flat_background());
        assert!(!visual.hide_accelerator);
    }

    #[test]
    fn noaccel_hides_accelerators_without_changing_states() {
        let visual = classify_menu_item(ODS_NOACCEL);
        assert!(visual.hide_accelerator);
        assert_eq!(visual.text, MenuTextState::Normal);

        let hot = classify_menu_item(ODS_NOACCEL | ODS_HOTLIGHT);
        assert!(hot.hide_accelerator);
        assert_eq!(hot.background, MenuBackgroundState::Hot);
    }

    #[test]
    fn text_override_skips_disabled_items() {
        assert!(classify_menu_item(0).overrides_text_color());
        assert!(classify_menu_item(ODS_HOTLIGHT).overrides_text_color());
        assert!(!classify_menu_item(ODS_GRAYED).overrides_text_color());
    }
}
