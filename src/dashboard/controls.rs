//! Per-control in-flight gating
//!
//! Every user-triggered action disables its control before issuing a
//! request and re-enables it when the response (or failure) has been
//! processed. Different controls never wait on each other.

use parking_lot::Mutex;
use std::collections::HashSet;

/// A user-triggered control of the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Control {
    /// The login/logout button
    Session,
    /// The "Create user" button
    CreateUser,
    /// The remove button next to one user
    RemoveUser(String),
}

/// Tracks which controls have a request in flight
#[derive(Debug, Default)]
pub struct ControlGate {
    in_flight: Mutex<HashSet<Control>>,
}

impl ControlGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable a control for the lifetime of the returned guard
    ///
    /// Returns `None` if the control is already disabled.
    pub fn try_acquire(&self, control: Control) -> Option<ControlGuard<'_>> {
        if !self.in_flight.lock().insert(control.clone()) {
            return None;
        }
        Some(ControlGuard {
            gate: self,
            control,
        })
    }

    pub fn is_disabled(&self, control: &Control) -> bool {
        self.in_flight.lock().contains(control)
    }

    /// Names of users whose remove button is disabled
    pub fn removals_in_flight(&self) -> Vec<String> {
        self.in_flight
            .lock()
            .iter()
            .filter_map(|c| match c {
                Control::RemoveUser(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Re-enables its control when dropped
#[derive(Debug)]
pub struct ControlGuard<'a> {
    gate: &'a ControlGate,
    control: Control,
}

impl ControlGuard<'_> {
    pub fn control(&self) -> &Control {
        &self.control
    }
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.lock().remove(&self.control);
    }
}
