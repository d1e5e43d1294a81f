/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`) and
/// the `GlobalHotKeyManager` (hotkey messages are pumped by the event loop),
/// so all tray, hotkey and lifecycle changes flow through this enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Show the 1-based position of the current device (None = no badge).
    SetBadge(Option<usize>),
    /// Replace the registered global hotkey.
    RegisterHotkey(Option<String>),
    /// Shut down the application. The main thread will exit the event loop.
    Shutdown,
}
