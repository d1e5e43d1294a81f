/// Commands sent to the main application loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Switch to the next eligible device (hotkey or tray click).
    CycleDevice,
    /// Registry state changed; refresh anything derived from it.
    StateChanged,
    /// The configured hotkey changed and must be re-registered.
    HotkeyChanged(Option<String>),
    /// Request application shutdown.
    Shutdown,
}
