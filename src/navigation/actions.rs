//! User-facing navigation actions
//!
//! Each action corresponds to a menu item or keyboard shortcut. The UI layer
//! looks actions up by their stable string ID, shows their name and
//! description, and hands them to
//! [`NavigationController::perform`](super::NavigationController::perform).

use crate::cursor::ordinal_number;
use crate::error::{NavError, Result};
use crate::types::MAX_CURSORS;

const GOTO_CURSOR_PREFIX: &str = "GotoCursor";

/// A discrete navigation command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    /// Zoom to the original level
    ZoomDefault,
    /// Zoom in one step
    ZoomIn,
    /// Zoom out one step
    ZoomOut,
    /// Fit the whole capture into the viewport
    ZoomAll,
    /// Scroll to the cursor in the given (zero-based) slot
    GotoCursor(usize),
}

/// Action ID of the "go to cursor" action for a slot
pub fn goto_cursor_id(index: usize) -> Result<String> {
    if index >= MAX_CURSORS {
        return Err(NavError::InvalidIndex {
            index,
            max: MAX_CURSORS,
        });
    }
    Ok(format!("{}{}", GOTO_CURSOR_PREFIX, index))
}

impl NavAction {
    /// Create a validated "go to cursor" action
    pub fn goto_cursor(index: usize) -> Result<Self> {
        goto_cursor_id(index)?;
        Ok(NavAction::GotoCursor(index))
    }

    /// Stable identifier used to register and look up the action
    pub fn id(&self) -> Result<String> {
        Ok(match self {
            NavAction::ZoomDefault => "ZoomDefault".to_string(),
            NavAction::ZoomIn => "ZoomIn".to_string(),
            NavAction::ZoomOut => "ZoomOut".to_string(),
            NavAction::ZoomAll => "ZoomAll".to_string(),
            NavAction::GotoCursor(index) => goto_cursor_id(*index)?,
        })
    }

    /// Parse an action ID
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "ZoomDefault" => Some(NavAction::ZoomDefault),
            "ZoomIn" => Some(NavAction::ZoomIn),
            "ZoomOut" => Some(NavAction::ZoomOut),
            "ZoomAll" => Some(NavAction::ZoomAll),
            _ => {
                let index: usize = id.strip_prefix(GOTO_CURSOR_PREFIX)?.parse().ok()?;
                NavAction::goto_cursor(index).ok()
            }
        }
    }

    /// Menu label
    pub fn name(&self) -> String {
        match self {
            NavAction::ZoomDefault => "Zoom original".to_string(),
            NavAction::ZoomIn => "Zoom in".to_string(),
            NavAction::ZoomOut => "Zoom out".to_string(),
            NavAction::ZoomAll => "Zoom all".to_string(),
            NavAction::GotoCursor(index) => format!("Go to cursor {}", index + 1),
        }
    }

    /// Tooltip text
    pub fn description(&self) -> String {
        match self {
            NavAction::ZoomDefault => "Zoom to original level".to_string(),
            NavAction::ZoomIn => "Zoom in the diagram".to_string(),
            NavAction::ZoomOut => "Zoom out the diagram".to_string(),
            NavAction::ZoomAll => "Zoom to fit the whole capture".to_string(),
            NavAction::GotoCursor(index) => format!(
                "Go to the {} cursor in the diagram",
                ordinal_number(*index as u32 + 1)
            ),
        }
    }

    /// Every action, with one "go to cursor" action per slot
    pub fn all() -> Vec<NavAction> {
        let mut actions = vec![
            NavAction::ZoomDefault,
            NavAction::ZoomIn,
            NavAction::ZoomOut,
            NavAction::ZoomAll,
        ];
        actions.extend((0..MAX_CURSORS).map(NavAction::GotoCursor));
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goto_cursor_id() {
        assert_eq!(goto_cursor_id(0).unwrap(), "GotoCursor0");
        assert_eq!(goto_cursor_id(31).unwrap(), "GotoCursor31");
        assert!(matches!(
            goto_cursor_id(MAX_CURSORS),
            Err(NavError::InvalidIndex { index: 32, .. })
        ));
    }

    #[test]
    fn test_invalid_goto_action() {
        assert!(NavAction::goto_cursor(32).is_err());
        assert!(NavAction::GotoCursor(99).id().is_err());
    }

    #[test]
    fn test_id_round_trip() {
        for action in NavAction::all() {
            let id = action.id().unwrap();
            assert_eq!(NavAction::from_id(&id), Some(action));
        }
        assert_eq!(NavAction::from_id("GotoCursor32"), None);
        assert_eq!(NavAction::from_id("GotoCursorX"), None);
        assert_eq!(NavAction::from_id("Unknown"), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(NavAction::ZoomDefault.name(), "Zoom original");
        assert_eq!(NavAction::GotoCursor(0).name(), "Go to cursor 1");
        assert_eq!(
            NavAction::GotoCursor(0).description(),
            "Go to the 1st cursor in the diagram"
        );
        assert_eq!(
            NavAction::GotoCursor(21).description(),
            "Go to the 22nd cursor in the diagram"
        );
    }

    #[test]
    fn test_all_actions() {
        let all = NavAction::all();
        assert_eq!(all.len(), 4 + MAX_CURSORS);
    }
}
