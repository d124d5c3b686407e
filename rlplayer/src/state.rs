//! Playback state machine.
//!
//! Exactly one [`PlaybackState`] value is live per process; it is written
//! only by the playback engine and read everywhere else.

/// High-level playback state of the single live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No connection, nothing scheduled.
    Stopped,
    /// Audio is flowing.
    Playing,
    /// Playback suspended by the user; the connection is released.
    Paused,
    /// Connecting and waiting for the first audio chunk.
    Buffering,
    /// The stream failed; the caller decides whether to retry.
    Error,
}

impl PlaybackState {
    /// Returns a human-readable label for the playback state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "STOPPED",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
            PlaybackState::Buffering => "BUFFERING",
            PlaybackState::Error => "ERROR",
        }
    }

    /// Whether audio is currently active (flowing or about to flow).
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Buffering)
    }

    /// Whether a direct transition to `next` is legal.
    ///
    /// Legal edges:
    /// - `Stopped | Error | Paused → Buffering` (play)
    /// - `Buffering → Playing` (first audio chunk)
    /// - `Buffering → Error` (connect failure / timeout)
    /// - `Playing → Error` (stream dropped mid-play)
    /// - `Playing | Buffering → Paused` (pause)
    /// - `any → Stopped` (stop)
    pub fn can_transition_to(&self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        match (self, next) {
            (_, Stopped) => true,
            (Stopped | Error | Paused, Buffering) => true,
            (Buffering, Playing) => true,
            (Buffering | Playing, Error) => true,
            (Playing | Buffering, Paused) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackState::*;

    #[test]
    fn test_stop_is_legal_from_everywhere() {
        for state in [Stopped, Playing, Paused, Buffering, Error] {
            assert!(state.can_transition_to(Stopped), "{state}");
        }
    }

    #[test]
    fn test_paused_cannot_jump_to_playing() {
        // Resuming a live stream goes back through Buffering.
        assert!(!Paused.can_transition_to(Playing));
        assert!(Paused.can_transition_to(Buffering));
    }

    #[test]
    fn test_stopped_cannot_pause() {
        assert!(!Stopped.can_transition_to(Paused));
        assert!(!Error.can_transition_to(Paused));
    }

    #[test]
    fn test_active_states() {
        assert!(Playing.is_active());
        assert!(Buffering.is_active());
        assert!(!Paused.is_active());
        assert!(!Stopped.is_active());
        assert!(!Error.is_active());
    }
}
