//! Acquisition request types.

use crate::wait_queue::Placement;

/// Operation types driving the contended acquisition path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Opcode {
    /// Acquires exclusive ownership.
    Exclusive,
    /// Acquires shared ownership.
    Shared,
    /// Converts the caller's shared ownership into exclusive ownership.
    Upgrade,
}

impl Opcode {
    /// Returns `true` if a wait block for this request belongs to the
    /// exclusive class.
    pub(crate) fn queues_exclusive(self) -> bool {
        !matches!(self, Self::Shared)
    }

    /// Where a wait block for this request is inserted into the queue.
    ///
    /// An upgrading owner overtakes every other waiter; this is what
    /// distinguishes conversion from release-and-reacquire.
    pub(crate) fn placement(self) -> Placement {
        match self {
            Self::Exclusive => Placement::ExclusiveTail,
            Self::Shared => Placement::Tail,
            Self::Upgrade => Placement::Front,
        }
    }
}
