/*
 * The scroll-bar redirection rule, separated from the code-patching
 * machinery so the decision itself can be exercised without touching
 * process memory. The production hook in `scrollbar_patch` and the tests
 * below are both clients of the same function.
 */

/// Class list the toolkit's scroll-bar painter asks for.
const SCROLL_BAR_CLASS: &str = "ScrollBar";

/// What the substituted visual-style open should do with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectAction {
    /// Pass the request through with the original window and class.
    Forward,
    /// Drop the window handle and open the dark-capable class instead.
    SubstituteDark,
}

/// UTF-16 comparison against the scroll-bar class name, allocation free so
/// the hook can run it on every themed open.
pub(crate) fn is_scroll_bar_class(class: &[u16]) -> bool {
    class.iter().copied().eq(SCROLL_BAR_CLASS.encode_utf16())
}

/// The substitution rule: only the scroll-bar class is ever redirected, and
/// only for windows that opted in (directly or through their root).
pub fn decide(class: &[u16], window_is_dark_treated: bool) -> RedirectAction {
    if window_is_dark_treated && is_scroll_bar_class(class) {
        RedirectAction::SubstituteDark
    } else {
        RedirectAction::Forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn only_opted_in_scroll_bars_are_substituted() {
        assert_eq!(decide(&wide("ScrollBar"), true), RedirectAction::SubstituteDark);
        assert_eq!(decide(&wide("ScrollBar"), false), RedirectAction::Forward);
        assert_eq!(decide(&wide("Edit"), true), RedirectAction::Forward);
        assert_eq!(decide(&wide("Edit"), false), RedirectAction::Forward);
    }

    #[test]
    fn class_match_is_exact() {
        // Case and prefix variants must pass through untouched.
        assert_eq!(decide(&wide("scrollbar"), true), RedirectAction::Forward);
        assert_eq!(decide(&wide("ScrollBarEx"), true), RedirectAction::Forward);
        assert_eq!(decide(&wide(""), true), RedirectAction::Forward);
    }
}
