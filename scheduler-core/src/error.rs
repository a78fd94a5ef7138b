use thiserror::Error;

/// Errors the scheduling engine can raise.
///
/// Every variant is an *input* error: a value supplied by a collaborator
/// (members file, responses file, cancellations, partnerships) violates one
/// of the invariants in [`crate::models`]. The engine never retries and
/// never recovers from these internally; the caller decides what to do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown switch preference: {0}")]
    UnknownSwitchPreference(String),

    #[error("person {0} is missing required field 'id'")]
    MissingPersonId(String),

    #[error("person {id} is missing required field 'role'")]
    MissingPersonRole { id: String },

    #[error("duplicate person id: {0}")]
    DuplicatePersonId(u32),

    #[error("person {person_id} lists availability for unknown event {event_id}")]
    UnknownAvailabilityEvent { person_id: u32, event_id: u32 },

    #[error("cancellation refers to unknown event date: {0}")]
    UnknownCancelledEvent(String),

    #[error("cancellation refers to unknown email: {0}")]
    UnknownCancelledEmail(String),

    #[error("cancellation for {email} removes event {event_id}, which was not in their availability")]
    CancelledAvailabilityNotHeld { email: String, event_id: u32 },

    #[error("partnership request from {from} refers to unknown person {to}")]
    UnknownPartnershipTarget { from: u32, to: u32 },

    #[error("partnership request from {0} refers to themselves")]
    SelfPartnership(u32),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
