use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Desk actions bound to single keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Hotkey {
    TogglePlay,
    /// Stop the music and every pad.
    StopAll,
    TriggerPad(usize),
    PreviousTrack,
    NextTrack,
    MusicVolumeUp,
    MusicVolumeDown,
    EffectsVolumeUp,
    EffectsVolumeDown,
    ToggleLock,
    TogglePanicMute,
}

impl Hotkey {
    /// The lock leaves unlock, panic-mute and stop reachable.
    pub fn allowed_while_locked(self) -> bool {
        matches!(
            self,
            Hotkey::ToggleLock | Hotkey::TogglePanicMute | Hotkey::StopAll
        )
    }
}

/// Map a key press to a hotkey. Keypad digits arrive as plain digits.
pub fn hotkey_for(key: &KeyEvent) -> Option<Hotkey> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let hotkey = match key.code {
        KeyCode::Char(' ') => Hotkey::TogglePlay,
        KeyCode::Esc => Hotkey::StopAll,
        KeyCode::Char(c @ '1'..='9') => Hotkey::TriggerPad(usize::from(c as u8 - b'1')),
        KeyCode::Left => Hotkey::PreviousTrack,
        KeyCode::Right => Hotkey::NextTrack,
        KeyCode::Up if shift => Hotkey::EffectsVolumeUp,
        KeyCode::Down if shift => Hotkey::EffectsVolumeDown,
        KeyCode::Up => Hotkey::MusicVolumeUp,
        KeyCode::Down => Hotkey::MusicVolumeDown,
        KeyCode::Char('l') => Hotkey::ToggleLock,
        KeyCode::Char('m') => Hotkey::TogglePanicMute,
        _ => return None,
    };
    Some(hotkey)
}
