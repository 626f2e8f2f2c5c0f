//! Flush cycle state machine
//!
//! One flush walks `Idle → [AwaitingDriver → [AwaitingVsync]] → Done`. The
//! coordinator feeds events; this module only decides where they lead.

/// Flush cycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushState {
    /// No flush in progress
    #[default]
    Idle,
    /// Slot filled, driver call in progress
    AwaitingDriver,
    /// Slot handed over, waiting for the panel to confirm it
    AwaitingVsync,
    /// Flush finished (or dropped); renderer may be acknowledged
    Done,
}

/// Flush cycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushEvent {
    /// Single-buffer region copy and draw finished
    CopiedInPlace,
    /// Copy into the target slot finished, buffer handed to the driver
    BufferHanded,
    /// Driver accepted the buffer
    DriverAccepted { wait_vsync: bool },
    /// Driver refused the buffer
    DriverFailed,
    /// Panel confirmed the buffer
    VsyncConfirmed,
    /// No confirmation within the bound
    VsyncTimedOut,
    /// Nothing presented this time (non-final region, no free slot, copy
    /// failure, forced refresh)
    CycleDropped,
    /// Renderer acknowledged
    Acknowledged,
}

impl FlushState {
    /// Whether the render task is blocked
    pub fn is_waiting(&self) -> bool {
        matches!(self, FlushState::AwaitingVsync)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: FlushEvent) -> Self {
        use FlushEvent::*;
        use FlushState::*;

        match (self, event) {
            // Idle transitions
            (Idle, CopiedInPlace) => Done,
            (Idle, BufferHanded) => AwaitingDriver,
            (Idle, CycleDropped) => Done,

            // AwaitingDriver transitions
            (AwaitingDriver, DriverAccepted { wait_vsync: true }) => AwaitingVsync,
            (AwaitingDriver, DriverAccepted { wait_vsync: false }) => Done,
            (AwaitingDriver, DriverFailed) => Done,

            // AwaitingVsync transitions
            (AwaitingVsync, VsyncConfirmed) => Done,
            (AwaitingVsync, VsyncTimedOut) => Done,

            // Done transitions
            (Done, Acknowledged) => Idle,

            // Invalid transitions - stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_buffer_path() {
        let state = FlushState::Idle.transition(FlushEvent::CopiedInPlace);
        assert_eq!(state, FlushState::Done);
        assert_eq!(state.transition(FlushEvent::Acknowledged), FlushState::Idle);
    }

    #[test]
    fn test_blocking_path() {
        let state = FlushState::Idle
            .transition(FlushEvent::BufferHanded)
            .transition(FlushEvent::DriverAccepted { wait_vsync: true });
        assert_eq!(state, FlushState::AwaitingVsync);
        assert!(state.is_waiting());
        assert_eq!(state.transition(FlushEvent::VsyncConfirmed), FlushState::Done);
        assert_eq!(state.transition(FlushEvent::VsyncTimedOut), FlushState::Done);
    }

    #[test]
    fn test_triple_buffer_does_not_wait() {
        let state = FlushState::Idle
            .transition(FlushEvent::BufferHanded)
            .transition(FlushEvent::DriverAccepted { wait_vsync: false });
        assert_eq!(state, FlushState::Done);
    }

    #[test]
    fn test_driver_failure_ends_flush() {
        let state = FlushState::Idle
            .transition(FlushEvent::BufferHanded)
            .transition(FlushEvent::DriverFailed);
        assert_eq!(state, FlushState::Done);
    }

    #[test]
    fn test_out_of_order_events_ignored() {
        assert_eq!(FlushState::Idle.transition(FlushEvent::VsyncConfirmed), FlushState::Idle);
        assert_eq!(FlushState::Idle.transition(FlushEvent::Acknowledged), FlushState::Idle);
        assert_eq!(
            FlushState::AwaitingVsync.transition(FlushEvent::BufferHanded),
            FlushState::AwaitingVsync
        );
        assert_eq!(FlushState::Done.transition(FlushEvent::VsyncConfirmed), FlushState::Done);
    }
}
