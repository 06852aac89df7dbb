use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::config::{save_theme, Config};
use crate::notifier::{AlertBoard, Notifier};
use crate::state::restore_flow::{DetailRequest, RestoreController, SubmitRequest};
use crate::state::version_list::VersionList;
use crate::transport::RestoreTransport;
use crate::types::{
    BackupVersion, ConflictResolution, RestoreOptions, RestoreResult, RestoreState, Severity,
    Theme, VersionDetail,
};

/// Answers from background transport calls, applied on the UI loop.
#[derive(Debug)]
pub enum TransportEvent {
    VersionsLoaded(Result<Vec<BackupVersion>>),
    DetailLoaded {
        request: DetailRequest,
        result: Result<VersionDetail>,
    },
    RestoreFinished(Result<RestoreResult>),
}

pub struct App {
    pub config: Config,
    pub controller: RestoreController<AlertBoard>,
    pub versions: VersionList,
    pub theme: Theme,
    pub loading: bool,
    pub show_help: bool,
    pub should_quit: bool,
    pub conflict_apply_to_all: bool,
    transport: Arc<dyn RestoreTransport>,
    events_tx: UnboundedSender<TransportEvent>,
    events_rx: UnboundedReceiver<TransportEvent>,
}

impl App {
    pub fn new(config: Config, transport: Arc<dyn RestoreTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let controller = RestoreController::new(
            config.app_id.clone(),
            config.app_name.clone(),
            AlertBoard::new(config.alert_lifetime),
        );

        Self {
            theme: config.theme,
            config,
            controller,
            versions: VersionList::new(),
            loading: false,
            show_help: false,
            should_quit: false,
            conflict_apply_to_all: false,
            transport,
            events_tx,
            events_rx,
        }
    }

    pub async fn initialize(&mut self) {
        info!(app_id = %self.config.app_id, dry_run = self.config.dry_run, "loading restore panel");
        self.load_versions().await;
    }

    pub async fn load_versions(&mut self) {
        self.loading = true;
        let result = self.transport.list_versions(&self.config.app_id).await;
        self.on_versions(result);
    }

    /// Reloads the list in the background; the answer arrives as an event.
    pub fn refresh_versions(&mut self) {
        if self.loading {
            return;
        }
        self.loading = true;
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        let app_id = self.config.app_id.clone();
        tokio::spawn(async move {
            let result = transport.list_versions(&app_id).await;
            let _ = tx.send(TransportEvent::VersionsLoaded(result));
        });
    }

    fn on_versions(&mut self, result: Result<Vec<BackupVersion>>) {
        match result {
            Ok(versions) => {
                debug!(count = versions.len(), "backup versions loaded");
                self.versions.replace(versions);
                if self.versions.is_empty() {
                    self.notify(
                        "No backups found for this application.",
                        Severity::Info,
                    );
                }
            }
            Err(e) => {
                self.notify(
                    &format!("Failed to load backup versions: {}", e),
                    Severity::Danger,
                );
            }
        }
        self.loading = false;
    }

    pub fn move_selection_up(&mut self) {
        self.versions.move_up();
    }

    pub fn move_selection_down(&mut self) {
        self.versions.move_down();
    }

    pub fn select_current_version(&mut self) {
        let Some(version) = self.versions.current().cloned() else {
            return;
        };
        if let Ok(request) = self.controller.select_version(version) {
            self.spawn_detail_fetch(request);
        }
    }

    fn spawn_detail_fetch(&self, request: DetailRequest) {
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = transport.fetch_detail(&request.backup_id).await;
            let _ = tx.send(TransportEvent::DetailLoaded { request, result });
        });
    }

    pub fn request_restore(&mut self) -> bool {
        self.controller.request_restore().is_ok()
    }

    pub fn toggle_acknowledge(&mut self) {
        let gate = self.controller.gate();
        self.controller.acknowledge(!gate);
    }

    pub fn confirm_restore(&mut self) -> bool {
        match self.controller.confirm() {
            Ok(request) => {
                self.spawn_restore(request);
                true
            }
            Err(e) => {
                debug!(error = %e, "confirm refused");
                false
            }
        }
    }

    fn spawn_restore(&self, request: SubmitRequest) {
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = transport
                .submit_restore(&request.app_id, &request.backup_id, &request.options)
                .await;
            let _ = tx.send(TransportEvent::RestoreFinished(result));
        });
    }

    pub fn cancel_confirmation(&mut self) {
        self.controller.cancel_confirmation();
    }

    fn edit_options(&mut self, edit: impl FnOnce(&mut RestoreOptions)) {
        if let Some(options) = self.controller.options_mut() {
            edit(options);
            return;
        }
        self.notify(
            "Restore options are locked while a restore is in progress.",
            Severity::Warning,
        );
    }

    pub fn toggle_backup_first(&mut self) {
        self.edit_options(|o| o.backup_first = !o.backup_first);
    }

    pub fn toggle_restore_dot_files(&mut self) {
        self.edit_options(|o| o.restore_dot_files = !o.restore_dot_files);
    }

    pub fn cycle_conflict_resolution(&mut self) {
        self.edit_options(|o| o.conflict_resolution = o.conflict_resolution.next());
    }

    pub fn toggle_apply_to_all(&mut self) {
        self.edit_options(|o| o.apply_to_all = !o.apply_to_all);
    }

    pub fn has_pending_conflicts(&self) -> bool {
        !self.controller.conflicts().is_empty()
    }

    pub fn toggle_conflict_apply_to_all(&mut self) {
        self.conflict_apply_to_all = !self.conflict_apply_to_all;
    }

    pub fn resolve_conflict(&mut self, resolution: ConflictResolution) {
        let settled = self
            .controller
            .resolve_conflict(resolution, self.conflict_apply_to_all);
        for conflict in &settled {
            info!(path = %conflict.path, resolution = conflict.resolution.as_form_value(), "conflict resolved");
        }
    }

    pub fn apply_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::VersionsLoaded(result) => self.on_versions(result),
            TransportEvent::DetailLoaded { request, result } => {
                self.controller.on_detail(&request, result);
            }
            TransportEvent::RestoreFinished(result) => {
                self.conflict_apply_to_all = self
                    .controller
                    .attempt_options()
                    .map(|o| o.apply_to_all)
                    .unwrap_or(false);
                self.controller.on_result(result);
            }
        }
    }

    pub fn process_pending_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }

    /// Waits for the next background answer and applies it.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply_event(event);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.controller.notifier_mut().prune(now);
    }

    pub fn cycle_sort(&mut self) {
        let order = self.versions.cycle_sort();
        debug!(order = order.label(), "version list re-sorted");
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        let Some(path) = self.config.settings_file.clone() else {
            return;
        };
        if let Err(e) = save_theme(&path, self.theme) {
            self.notify(&e.to_string(), e.severity());
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn dismiss_alert(&mut self) {
        self.controller.notifier_mut().dismiss_latest();
    }

    pub fn state(&self) -> RestoreState {
        self.controller.state()
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        self.controller.notifier_mut().notify(message, severity);
    }
}
