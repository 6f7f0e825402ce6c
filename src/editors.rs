//! Terminal editor detection for `nano`/`touch` edit sessions.
//!
//! Resolution order: configured editor, then `$VISUAL`/`$EDITOR`, then the
//! first known terminal editor found on `PATH`.

/// Known terminal editors with their display names and executables.
pub const EDITORS: &[(&str, &str)] = &[
    ("Nano", "nano"),
    ("Neovim", "nvim"),
    ("Vim", "vim"),
    ("Vi", "vi"),
    ("Emacs", "emacs"),
    ("Micro", "micro"),
];

/// Check if a command exists on the system (cross-platform).
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Convert command to editor display name.
#[must_use]
pub fn editor_command_to_name(command: &str) -> Option<&'static str> {
    EDITORS
        .iter()
        .find(|(_, cmd)| *cmd == command)
        .map(|(name, _)| *name)
}

/// Pick the editor command line to launch, if any.
///
/// The result may carry arguments (`code --wait`); split on whitespace before spawning.
#[must_use]
pub fn resolve_editor(configured: Option<&str>) -> Option<String> {
    resolve_editor_with(configured, |var| std::env::var(var).ok(), command_exists)
}

fn resolve_editor_with(
    configured: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    exists: impl Fn(&str) -> bool,
) -> Option<String> {
    let explicit = configured
        .map(str::to_string)
        .or_else(|| env("VISUAL"))
        .or_else(|| env("EDITOR"))
        .filter(|e| !e.trim().is_empty());
    if explicit.is_some() {
        return explicit;
    }
    EDITORS
        .iter()
        .find(|(_, cmd)| exists(cmd))
        .map(|(_, cmd)| cmd.to_string())
}
