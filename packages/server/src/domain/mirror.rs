//! Membership mirror port.
//!
//! Membership changes are mirrored into the external store off the critical
//! path: publishing never waits for the store and never fails the in-memory
//! operation that triggered it.

use super::entity::{Group, Room, User};

/// A change worth mirroring, carrying the records as they should now read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    Connected {
        user: User,
    },
    MembershipChanged {
        user: User,
        room: Room,
        group: Group,
    },
    Disconnected {
        user: User,
        rooms: Vec<Room>,
        groups: Vec<Group>,
    },
}

#[cfg_attr(test, mockall::automock)]
pub trait MembershipMirror: Send + Sync {
    /// Hand the event to the mirror without waiting for it to be applied
    fn publish(&self, event: MirrorEvent);
}
