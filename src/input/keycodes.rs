//! evdev event type and keycode constants
//!
//! The subset of <linux/input-event-codes.h> evmux needs: event types tested
//! at discovery, the keycodes remap files can name, and a few keys that are
//! commonly held down at boot.

// ============================================================================
// Event Types
// ============================================================================

/// Synchronization marker
pub const EV_SYN: u16 = 0x00;

/// Key and button state changes
pub const EV_KEY: u16 = 0x01;

/// Relative axis motion (mice, trackballs)
pub const EV_REL: u16 = 0x02;

/// Absolute axis motion (touchscreens, tablets)
pub const EV_ABS: u16 = 0x03;

/// Miscellaneous input data
pub const EV_MSC: u16 = 0x04;

/// Binary switches (lid, headphone jack)
pub const EV_SW: u16 = 0x05;

/// Highest event type number
pub const EV_MAX: u16 = 0x1f;

// ============================================================================
// Keys
// ============================================================================

/// Reserved key (remap target `NONE`)
pub const KEY_RESERVED: u16 = 0;

/// Escape key
pub const KEY_ESC: u16 = 1;

/// Tab key
pub const KEY_TAB: u16 = 15;

/// Enter key
pub const KEY_ENTER: u16 = 28;

/// Space bar
pub const KEY_SPACE: u16 = 57;

/// Home key
pub const KEY_HOME: u16 = 102;

/// Up arrow key
pub const KEY_UP: u16 = 103;

/// Page Up key
pub const KEY_PAGEUP: u16 = 104;

/// Left arrow key
pub const KEY_LEFT: u16 = 105;

/// Right arrow key
pub const KEY_RIGHT: u16 = 106;

/// End key
pub const KEY_END: u16 = 107;

/// Down arrow key
pub const KEY_DOWN: u16 = 108;

/// Page Down key
pub const KEY_PAGEDOWN: u16 = 109;

/// Mute key
pub const KEY_MUTE: u16 = 113;

/// Volume down key
pub const KEY_VOLUMEDOWN: u16 = 114;

/// Volume up key
pub const KEY_VOLUMEUP: u16 = 115;

/// Power key
pub const KEY_POWER: u16 = 116;

/// Menu key
pub const KEY_MENU: u16 = 139;

/// Back key
pub const KEY_BACK: u16 = 158;

/// Home screen key
pub const KEY_HOMEPAGE: u16 = 172;

/// Camera shutter key
pub const KEY_CAMERA: u16 = 212;

/// Search key
pub const KEY_SEARCH: u16 = 217;

/// Highest keycode number
pub const KEY_MAX: u16 = 0x2ff;

/// Number of keycodes (bits in a key state bitmap)
pub const KEY_CNT: usize = KEY_MAX as usize + 1;

// ============================================================================
// Mouse Buttons (BTN_* from linux/input-event-codes.h)
// ============================================================================

/// Left mouse button
pub const BTN_LEFT: u16 = 0x110;

/// Right mouse button
pub const BTN_RIGHT: u16 = 0x111;

/// Middle mouse button
pub const BTN_MIDDLE: u16 = 0x112;

/// Touch contact
pub const BTN_TOUCH: u16 = 0x14a;

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolve a symbolic remap target (`UP`, `BACK`, ...) to its keycode
pub fn remap_symbol(name: &str) -> Option<u16> {
    match name {
        "NONE" => Some(KEY_RESERVED),
        "UP" => Some(KEY_UP),
        "DOWN" => Some(KEY_DOWN),
        "LEFT" => Some(KEY_LEFT),
        "RIGHT" => Some(KEY_RIGHT),
        "BACK" => Some(KEY_BACK),
        "ENTER" => Some(KEY_ENTER),
        _ => None,
    }
}

/// Human-readable keycode name for logs and the monitor output
pub fn key_name(code: u16) -> Option<&'static str> {
    let name = match code {
        KEY_RESERVED => "KEY_RESERVED",
        KEY_ESC => "KEY_ESC",
        KEY_TAB => "KEY_TAB",
        KEY_ENTER => "KEY_ENTER",
        KEY_SPACE => "KEY_SPACE",
        KEY_HOME => "KEY_HOME",
        KEY_UP => "KEY_UP",
        KEY_PAGEUP => "KEY_PAGEUP",
        KEY_LEFT => "KEY_LEFT",
        KEY_RIGHT => "KEY_RIGHT",
        KEY_END => "KEY_END",
        KEY_DOWN => "KEY_DOWN",
        KEY_PAGEDOWN => "KEY_PAGEDOWN",
        KEY_MUTE => "KEY_MUTE",
        KEY_VOLUMEDOWN => "KEY_VOLUMEDOWN",
        KEY_VOLUMEUP => "KEY_VOLUMEUP",
        KEY_POWER => "KEY_POWER",
        KEY_MENU => "KEY_MENU",
        KEY_BACK => "KEY_BACK",
        KEY_HOMEPAGE => "KEY_HOMEPAGE",
        KEY_CAMERA => "KEY_CAMERA",
        KEY_SEARCH => "KEY_SEARCH",
        BTN_LEFT => "BTN_LEFT",
        BTN_RIGHT => "BTN_RIGHT",
        BTN_MIDDLE => "BTN_MIDDLE",
        BTN_TOUCH => "BTN_TOUCH",
        _ => return None,
    };
    Some(name)
}

/// Human-readable event type name
pub fn event_type_name(ty: u16) -> Option<&'static str> {
    let name = match ty {
        EV_SYN => "EV_SYN",
        EV_KEY => "EV_KEY",
        EV_REL => "EV_REL",
        EV_ABS => "EV_ABS",
        EV_MSC => "EV_MSC",
        EV_SW => "EV_SW",
        _ => return None,
    };
    Some(name)
}
