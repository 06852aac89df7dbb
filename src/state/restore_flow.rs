use anyhow::Error;
use tracing::{debug, info, warn};

use crate::errors::RestoreError;
use crate::notifier::Notifier;
use crate::state::conflicts::{ConflictQueue, ResolvedConflict};
use crate::types::{
    BackupVersion, ConflictResolution, Outcome, RestoreOptions, RestoreResult, RestoreState,
    Severity, VersionDetail,
};

pub const RESTORE_SUCCESS_MESSAGE: &str = "Successfully restored backup.";
pub const RESTORE_COMPLETED_BANNER: &str = "Restore completed successfully";

/// Detail fetch issued for a selection. Answers are matched back against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub generation: u64,
    pub backup_id: String,
}

/// The one transport call a confirmed attempt is allowed to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub app_id: String,
    pub backup_id: String,
    pub options: RestoreOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailView {
    #[default]
    Hidden,
    Loading(String),
    Loaded(VersionDetail),
}

/// Restore workflow for a single application.
///
/// `Idle -> Selected -> Confirming -> Submitting -> Completed`. Every method is
/// a synchronous transition; network work is done by the caller with the
/// [`DetailRequest`] / [`SubmitRequest`] values handed out here, and the
/// answers come back through [`RestoreController::on_detail`] and
/// [`RestoreController::on_result`].
pub struct RestoreController<N: Notifier> {
    app_id: String,
    app_name: String,
    state: RestoreState,
    selection: Option<BackupVersion>,
    generation: u64,
    detail: DetailView,
    options: RestoreOptions,
    attempt_options: Option<RestoreOptions>,
    acknowledged: bool,
    banner: Option<&'static str>,
    conflicts: ConflictQueue,
    notifier: N,
}

impl<N: Notifier> RestoreController<N> {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>, notifier: N) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
            state: RestoreState::Idle,
            selection: None,
            generation: 0,
            detail: DetailView::Hidden,
            options: RestoreOptions::default(),
            attempt_options: None,
            acknowledged: false,
            banner: None,
            conflicts: ConflictQueue::new(),
            notifier,
        }
    }

    pub fn select_version(&mut self, version: BackupVersion) -> Result<DetailRequest, RestoreError> {
        if self.state == RestoreState::Submitting {
            return Err(self.reject(RestoreError::AlreadyInProgress));
        }

        debug!(backup_id = %version.id, "version selected");
        self.generation += 1;
        let request = DetailRequest {
            generation: self.generation,
            backup_id: version.id.clone(),
        };

        self.selection = Some(version);
        self.detail = DetailView::Loading(request.backup_id.clone());
        self.acknowledged = false;
        self.attempt_options = None;
        self.banner = None;
        self.conflicts.clear();
        self.state = RestoreState::Selected;

        Ok(request)
    }

    /// Applies a detail answer if it still belongs to the current selection.
    pub fn on_detail(&mut self, request: &DetailRequest, result: Result<VersionDetail, Error>) -> bool {
        let current = self
            .selection
            .as_ref()
            .map(|v| v.id == request.backup_id)
            .unwrap_or(false);
        if request.generation != self.generation || !current {
            debug!(
                backup_id = %request.backup_id,
                generation = request.generation,
                "discarding stale version details"
            );
            return false;
        }

        match result {
            Ok(detail) => {
                self.detail = DetailView::Loaded(detail);
            }
            Err(e) => {
                self.detail = DetailView::Hidden;
                match e.downcast_ref::<RestoreError>() {
                    Some(RestoreError::BackendRejected(message)) => self.notifier.notify(
                        &format!("Failed to load backup details: {}", message),
                        Severity::Warning,
                    ),
                    _ => self.notifier.notify(
                        &format!("Error loading backup details: {}", e),
                        Severity::Danger,
                    ),
                }
            }
        }
        true
    }

    pub fn request_restore(&mut self) -> Result<(), RestoreError> {
        match self.state {
            RestoreState::Submitting => return Err(self.reject(RestoreError::AlreadyInProgress)),
            RestoreState::Completed(Outcome::Succeeded) => {
                return Err(self.reject(RestoreError::AlreadyRestored))
            }
            _ => {}
        }
        if self.selection.is_none() {
            return Err(self.reject(RestoreError::NoSelection));
        }

        self.attempt_options = Some(self.options.clone());
        self.acknowledged = false;
        self.conflicts.clear();
        self.state = RestoreState::Confirming;
        Ok(())
    }

    pub fn acknowledge(&mut self, acknowledged: bool) {
        if self.state == RestoreState::Confirming {
            self.acknowledged = acknowledged;
        }
    }

    pub fn confirm_enabled(&self) -> bool {
        self.state == RestoreState::Confirming && self.acknowledged
    }

    pub fn confirm(&mut self) -> Result<SubmitRequest, RestoreError> {
        match self.state {
            RestoreState::Submitting => return Err(self.reject(RestoreError::AlreadyInProgress)),
            RestoreState::Confirming => {}
            _ => return Err(RestoreError::NotConfirming),
        }
        if !self.acknowledged {
            debug!("confirm ignored until the risk is acknowledged");
            return Err(RestoreError::NotAcknowledged);
        }

        let (Some(version), Some(options)) = (&self.selection, &self.attempt_options) else {
            return Err(RestoreError::NotConfirming);
        };
        let request = SubmitRequest {
            app_id: self.app_id.clone(),
            backup_id: version.id.clone(),
            options: options.clone(),
        };

        info!(app_id = %request.app_id, backup_id = %request.backup_id, "restore confirmed");
        self.acknowledged = false;
        self.state = RestoreState::Submitting;
        Ok(request)
    }

    pub fn cancel_confirmation(&mut self) {
        if self.state == RestoreState::Confirming {
            self.acknowledged = false;
            self.attempt_options = None;
            self.state = RestoreState::Selected;
        }
    }

    pub fn on_result(&mut self, result: Result<RestoreResult, Error>) -> Option<Outcome> {
        if self.state != RestoreState::Submitting {
            warn!("restore result arrived with no restore in flight");
            return None;
        }

        let failure = match result {
            Ok(r) if r.success => {
                self.state = RestoreState::Completed(Outcome::Succeeded);
                self.banner = Some(RESTORE_COMPLETED_BANNER);
                info!(app_id = %self.app_id, "restore succeeded");
                self.notifier.notify(RESTORE_SUCCESS_MESSAGE, Severity::Success);
                self.load_conflicts(r.conflicts);
                return Some(Outcome::Succeeded);
            }
            Ok(r) => {
                self.load_conflicts(r.conflicts);
                RestoreError::rejected(r.error.as_deref())
            }
            Err(e) => RestoreError::TransportFailure(e.to_string()),
        };

        self.state = RestoreState::Completed(Outcome::Failed);
        warn!(app_id = %self.app_id, error = %failure, "restore failed");
        self.notifier.notify(&failure.to_string(), failure.severity());
        Some(Outcome::Failed)
    }

    fn load_conflicts(&mut self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        let settled = self.conflicts.load(paths);
        if !settled.is_empty() {
            self.announce_resolution(&settled, true);
        }
    }

    pub fn resolve_conflict(
        &mut self,
        resolution: ConflictResolution,
        apply_to_all: bool,
    ) -> Vec<ResolvedConflict> {
        let settled = self.conflicts.resolve(resolution, apply_to_all);
        if !settled.is_empty() {
            self.announce_resolution(&settled, apply_to_all);
        }
        settled
    }

    fn announce_resolution(&mut self, settled: &[ResolvedConflict], for_all: bool) {
        let Some(first) = settled.first() else {
            return;
        };
        let mut message = first.resolution.outcome_message().to_string();
        if for_all {
            message.push_str(" for all conflicts");
        }
        self.notifier.notify(&message, Severity::Info);
    }

    fn reject(&mut self, error: RestoreError) -> RestoreError {
        self.notifier.notify(&error.to_string(), error.severity());
        error
    }

    /// Options form. Locked while a restore is in flight.
    pub fn options_mut(&mut self) -> Option<&mut RestoreOptions> {
        if self.state == RestoreState::Submitting {
            None
        } else {
            Some(&mut self.options)
        }
    }

    pub fn options(&self) -> &RestoreOptions {
        &self.options
    }

    pub fn attempt_options(&self) -> Option<&RestoreOptions> {
        self.attempt_options.as_ref()
    }

    pub fn state(&self) -> RestoreState {
        self.state
    }

    pub fn selection(&self) -> Option<&BackupVersion> {
        self.selection.as_ref()
    }

    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    pub fn gate(&self) -> bool {
        self.acknowledged
    }

    pub fn is_busy(&self) -> bool {
        self.state == RestoreState::Submitting
    }

    pub fn can_request_restore(&self) -> bool {
        self.selection.is_some()
            && !matches!(
                self.state,
                RestoreState::Submitting | RestoreState::Completed(Outcome::Succeeded)
            )
    }

    pub fn restore_banner(&self) -> Option<&'static str> {
        self.banner
    }

    pub fn conflicts(&self) -> &ConflictQueue {
        &self.conflicts
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}
