#![forbid(unsafe_code)]

//! UI-facing navigation commands.
//!
//! Hosts bind these to whatever surfaces they have (menu items, shortcuts,
//! toolbar buttons, extra mouse buttons). Nothing here touches an input
//! system; the mapping data just lives in one place.

use crate::engine::Direction;
use crate::navigator::HistoryNavigator;

/// Mouse button index of the "back" side button.
pub const MOUSE_BUTTON_BACK: u8 = 3;
/// Mouse button index of the "forward" side button.
pub const MOUSE_BUTTON_FORWARD: u8 = 4;

/// A back or forward navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationCommand {
    Back,
    Forward,
}

impl NavigationCommand {
    /// Map a mouse-up event to a command.
    ///
    /// Only single-click releases of the side buttons navigate. Buttons are
    /// zero-based (`0` = primary).
    #[must_use]
    pub fn from_mouse_button(button: u8, click_count: u32) -> Option<Self> {
        if click_count != 1 {
            return None;
        }
        match button {
            MOUSE_BUTTON_BACK => Some(Self::Back),
            MOUSE_BUTTON_FORWARD => Some(Self::Forward),
            _ => None,
        }
    }

    /// Direction this command moves in.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Back => Direction::Backward,
            Self::Forward => Direction::Forward,
        }
    }

    /// Suggested menu location.
    #[must_use]
    pub const fn menu_path(self) -> &'static str {
        match self {
            Self::Back => "Edit/Selection/Back",
            Self::Forward => "Edit/Selection/Forward",
        }
    }

    /// Suggested keyboard shortcut.
    #[must_use]
    pub const fn default_shortcut(self) -> &'static str {
        match self {
            Self::Back => "Ctrl+[",
            Self::Forward => "Ctrl+]",
        }
    }

    /// Toolbar tooltip text.
    #[must_use]
    pub const fn tooltip(self) -> &'static str {
        match self {
            Self::Back => "Navigate to Previous Selection",
            Self::Forward => "Navigate to Next Selection",
        }
    }

    /// Button glyph.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Back => '\u{2039}',
            Self::Forward => '\u{203A}',
        }
    }

    /// Whether the command would do anything right now.
    pub fn is_enabled<N: HistoryNavigator>(self, navigator: &N) -> bool {
        navigator.can_navigate(self.direction())
    }

    /// Run the command. Returns false when there was nowhere to go.
    pub fn execute<N: HistoryNavigator>(self, navigator: &N) -> bool {
        navigator.navigate(self.direction())
    }
}
