//! Platform-specific configuration

use crossterm::event::KeyModifiers;

/// Platform-appropriate modifier for copy/export shortcuts
/// - macOS: SUPER (Cmd key)
/// - Linux/Windows: CONTROL (Ctrl key)
#[cfg(target_os = "macos")]
pub const COMMAND_MODIFIER: KeyModifiers = KeyModifiers::SUPER;

#[cfg(not(target_os = "macos"))]
pub const COMMAND_MODIFIER: KeyModifiers = KeyModifiers::CONTROL;

/// Export shortcut display
#[cfg(target_os = "macos")]
pub const EXPORT_SHORTCUT: &str = "Cmd+E";

#[cfg(not(target_os = "macos"))]
pub const EXPORT_SHORTCUT: &str = "^E";

/// Copy link shortcut display
#[cfg(target_os = "macos")]
pub const COPY_LINK_SHORTCUT: &str = "Cmd+Y";

#[cfg(not(target_os = "macos"))]
pub const COPY_LINK_SHORTCUT: &str = "^Y";

/// Whether `modifiers` carries the platform command modifier
///
/// Ctrl is accepted everywhere since many macOS terminals never forward Cmd.
pub fn is_command(modifiers: KeyModifiers) -> bool {
    modifiers.contains(COMMAND_MODIFIER) || modifiers.contains(KeyModifiers::CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_is_always_a_command() {
        assert!(is_command(KeyModifiers::CONTROL));
        assert!(is_command(KeyModifiers::CONTROL | KeyModifiers::SHIFT));
        assert!(!is_command(KeyModifiers::SHIFT));
        assert!(!is_command(KeyModifiers::NONE));
    }
}
