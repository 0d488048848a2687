//! # Application status register.
//!
//! A process-wide, single-slot save/restore register describing what the
//! system is currently doing. Task bodies push a status around observable
//! work and revert it afterwards; diagnostics read it.
//!
//! This is observability only: it carries no correctness obligation and must
//! never stand in for the task lifecycle state.
//!
//! ## Single-level nesting
//! The register keeps exactly one previous slot. Nested `set` calls lose the
//! outer value on revert; this limitation is deliberate and documented on
//! [`StatusRegister::revert`].

use std::sync::atomic::{AtomicU16, Ordering};

/// Coarse activity states reported by task bodies.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    /// Nothing noteworthy in flight.
    Idle = 0,
    /// Device bring-up in progress.
    InitDevice = 1,
    /// Waiting for network registration.
    Registering = 2,
    /// Registered on the network.
    Registered = 3,
    /// Reading radio parameters.
    MeasureSignalQuality = 4,
    /// Publishing a signal-quality report.
    SendSignalQuality = 5,
    /// Operator scan in progress.
    NetworkScan = 6,
    /// Coordinated shutdown under way.
    Shutdown = 7,
    /// A body reported an unrecoverable condition.
    Error = 8,
}

impl AppStatus {
    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AppStatus::Idle => "idle",
            AppStatus::InitDevice => "init_device",
            AppStatus::Registering => "registering",
            AppStatus::Registered => "registered",
            AppStatus::MeasureSignalQuality => "measure_signal_quality",
            AppStatus::SendSignalQuality => "send_signal_quality",
            AppStatus::NetworkScan => "network_scan",
            AppStatus::Shutdown => "shutdown",
            AppStatus::Error => "error",
        }
    }

    fn from_u8(value: u8) -> AppStatus {
        match value {
            1 => AppStatus::InitDevice,
            2 => AppStatus::Registering,
            3 => AppStatus::Registered,
            4 => AppStatus::MeasureSignalQuality,
            5 => AppStatus::SendSignalQuality,
            6 => AppStatus::NetworkScan,
            7 => AppStatus::Shutdown,
            8 => AppStatus::Error,
            _ => AppStatus::Idle,
        }
    }
}

/// Single-slot save/restore register for [`AppStatus`].
///
/// Current and previous are packed into one atomic word so that
/// [`StatusRegister::set`] saves and replaces in a single step even when
/// bodies on different threads race.
pub struct StatusRegister {
    // current in the high byte, previous in the low byte
    slots: AtomicU16,
}

static GLOBAL: StatusRegister = StatusRegister::new();

impl StatusRegister {
    /// Creates a register holding `Idle` in both slots.
    pub const fn new() -> Self {
        Self {
            slots: AtomicU16::new(pack(AppStatus::Idle, AppStatus::Idle)),
        }
    }

    /// The process-wide register.
    pub fn global() -> &'static StatusRegister {
        &GLOBAL
    }

    /// Saves the current status into the previous slot, then stores `status`.
    pub fn set(&self, status: AppStatus) {
        let _ = self
            .slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (current, _) = unpack(word);
                Some(pack(status, current))
            });
    }

    /// Stores `status` without touching the previous slot.
    ///
    /// For transitions inside one unit of work, so the eventual
    /// [`revert`](StatusRegister::revert) still restores the pre-unit status.
    pub fn replace(&self, status: AppStatus) {
        let _ = self
            .slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (_, previous) = unpack(word);
                Some(pack(status, previous))
            });
    }

    /// Restores the status held immediately before the last
    /// [`set`](StatusRegister::set).
    ///
    /// Only one level of nesting is supported: if two `set` calls happen
    /// before a revert, the older saved value is gone and `revert` restores
    /// the newer one.
    pub fn revert(&self) {
        let _ = self
            .slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (_, previous) = unpack(word);
                Some(pack(previous, previous))
            });
    }

    /// Current status.
    pub fn current(&self) -> AppStatus {
        unpack(self.slots.load(Ordering::Acquire)).0
    }

    /// Status saved by the last [`set`](StatusRegister::set).
    pub fn previous(&self) -> AppStatus {
        unpack(self.slots.load(Ordering::Acquire)).1
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

const fn pack(current: AppStatus, previous: AppStatus) -> u16 {
    ((current as u16) << 8) | (previous as u16)
}

fn unpack(word: u16) -> (AppStatus, AppStatus) {
    (
        AppStatus::from_u8((word >> 8) as u8),
        AppStatus::from_u8((word & 0xff) as u8),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_revert_round_trips() {
        let reg = StatusRegister::new();
        reg.set(AppStatus::Registered);
        assert_eq!(reg.current(), AppStatus::Registered);

        reg.set(AppStatus::MeasureSignalQuality);
        assert_eq!(reg.current(), AppStatus::MeasureSignalQuality);
        assert_eq!(reg.previous(), AppStatus::Registered);

        reg.revert();
        assert_eq!(reg.current(), AppStatus::Registered);
    }

    #[test]
    fn replace_leaves_previous_slot_intact() {
        let reg = StatusRegister::new();
        reg.set(AppStatus::Registered);
        reg.set(AppStatus::MeasureSignalQuality);
        reg.replace(AppStatus::SendSignalQuality);
        assert_eq!(reg.current(), AppStatus::SendSignalQuality);

        reg.revert();
        assert_eq!(reg.current(), AppStatus::Registered);
    }

    #[test]
    fn nesting_beyond_one_level_loses_the_outer_status() {
        let reg = StatusRegister::new();
        reg.set(AppStatus::Registered);
        reg.set(AppStatus::NetworkScan);
        reg.set(AppStatus::MeasureSignalQuality);

        reg.revert();
        assert_eq!(reg.current(), AppStatus::NetworkScan);

        // The second revert cannot reach Registered: the single previous
        // slot was overwritten.
        reg.revert();
        assert_eq!(reg.current(), AppStatus::NetworkScan);
    }
}
