//! Reservation state machine.
//!
//! `reserved` → `active` → `completed`, no transition backwards and
//! `completed` is terminal. There is no cancelled state: an un-occupied
//! reservation simply stays `reserved`.

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// Spot allocated, parking not started
    Reserved,
    /// Vehicle parked, spot occupied
    Active,
    /// Session ended, cost billed (terminal)
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::Reserved,
        }
    }

    /// Whether the status counts against the one-live-reservation-per-user
    /// limit.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Reserved | Self::Active)
    }

    /// Valid transition check; `completed` accepts nothing.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Reserved, Self::Active) | (Self::Active, Self::Completed)
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_and_active_are_live() {
        assert!(ReservationStatus::Reserved.is_live());
        assert!(ReservationStatus::Active.is_live());
        assert!(!ReservationStatus::Completed.is_live());
    }

    #[test]
    fn only_forward_transitions_allowed() {
        use ReservationStatus::*;
        assert!(Reserved.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));

        assert!(!Reserved.can_transition_to(Completed));
        assert!(!Active.can_transition_to(Reserved));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Completed.can_transition_to(Reserved));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            ReservationStatus::Reserved,
            ReservationStatus::Active,
            ReservationStatus::Completed,
        ] {
            assert_eq!(ReservationStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_defaults_to_reserved() {
        assert_eq!(
            ReservationStatus::from_str("garbage"),
            ReservationStatus::Reserved
        );
    }
}
