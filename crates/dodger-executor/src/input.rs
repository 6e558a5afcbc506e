use std::collections::BTreeSet;

use dodger_core::Key;

/// The host's input-assertion capability.
///
/// Calls are fire-and-forget: the controller never learns whether the host acted
/// on them.
pub trait InputSink {
    fn set_key_state(&mut self, key: Key, pressed: bool);
}

/// A key transition as forwarded to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
}

/// An [`InputSink`] that records every event. Used by the replay tool and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<KeyEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return all recorded events.
    pub fn drain(&mut self) -> Vec<KeyEvent> {
        std::mem::take(&mut self.events)
    }
}

impl InputSink for RecordingSink {
    fn set_key_state(&mut self, key: Key, pressed: bool) {
        self.events.push(KeyEvent { key, pressed });
    }
}

/// Tracks which keys the controller currently holds so that only real
/// transitions reach the host.
#[derive(Debug, Default, Clone)]
pub struct HeldKeys {
    held: BTreeSet<Key>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Assert `pressed` for `key`, forwarding to `sink` only when the state
    /// changes. Returns whether anything was forwarded.
    pub fn set(&mut self, sink: &mut dyn InputSink, key: Key, pressed: bool) -> bool {
        let changed = if pressed {
            self.held.insert(key)
        } else {
            self.held.remove(&key)
        };
        if changed {
            sink.set_key_state(key, pressed);
            if pressed {
                log::debug!("Holding {}", key);
            } else {
                log::debug!("Released {}", key);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transitions_are_forwarded() {
        let mut sink = RecordingSink::new();
        let mut keys = HeldKeys::new();

        assert!(keys.set(&mut sink, Key::Down, true));
        assert!(!keys.set(&mut sink, Key::Down, true));
        assert!(!keys.set(&mut sink, Key::Left, false));
        assert!(keys.is_held(Key::Down));
        assert!(keys.set(&mut sink, Key::Down, false));

        assert_eq!(
            sink.drain(),
            vec![
                KeyEvent {
                    key: Key::Down,
                    pressed: true
                },
                KeyEvent {
                    key: Key::Down,
                    pressed: false
                },
            ]
        );
        assert!(keys.is_empty());
    }
}
