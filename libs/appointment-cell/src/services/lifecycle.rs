use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == AppointmentStatus::Cancelled && new_status == AppointmentStatus::Cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => vec![AppointmentStatus::Cancelled],
            // terminal
            AppointmentStatus::Cancelled => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_active_appointments_can_be_cancelled() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Cancelled)
            .is_ok());
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let lifecycle = AppointmentLifecycleService::new();

        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Cancelled, AppointmentStatus::Cancelled),
            Err(AppointmentError::AlreadyCancelled)
        );
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Cancelled, AppointmentStatus::Confirmed),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
    }
}
