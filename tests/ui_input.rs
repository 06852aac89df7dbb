use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use reqwest::Url;
use restore_panel::app::App;
use restore_panel::config::Config;
use restore_panel::state::version_list::SortOrder;
use restore_panel::transport::MockRestoreTransport;
use restore_panel::types::{BackupVersion, RestoreResult, RestoreState, Size, Theme, VersionDetail};
use restore_panel::ui::handle_normal_input;

fn create_test_app(transport: MockRestoreTransport) -> App {
    let config = Config {
        server_url: Url::parse("http://localhost:5000").unwrap(),
        app_id: "thunderbird".to_string(),
        app_name: "Thunderbird".to_string(),
        alert_lifetime: Duration::from_secs(5),
        request_timeout: Duration::from_secs(30),
        log_dir: PathBuf::from("./logs"),
        theme: Theme::Dark,
        dry_run: false,
        settings_file: None,
    };
    App::new(config, Arc::new(transport))
}

fn versions() -> Vec<BackupVersion> {
    vec![
        BackupVersion {
            id: "thunderbird-20240105-101500".to_string(),
            timestamp: "20240105-101500".to_string(),
            size: Size::Bytes(10),
            notes: None,
            paths: Vec::new(),
        },
        BackupVersion {
            id: "thunderbird-20231201-090000".to_string(),
            timestamp: "20231201-090000".to_string(),
            size: Size::Bytes(500),
            notes: None,
            paths: Vec::new(),
        },
    ]
}

async fn press(app: &mut App, key: KeyCode) {
    handle_normal_input(app, key, KeyModifiers::NONE).await.unwrap();
}

#[tokio::test]
async fn test_keyboard_restore_flow() {
    let mut transport = MockRestoreTransport::new();
    transport.expect_fetch_detail().times(1).returning(|id| {
        Ok(VersionDetail {
            backup_id: id.to_string(),
            timestamp: "December 01, 2023 at 09:00 AM".to_string(),
            size: Size::Bytes(500),
            notes: None,
            paths: vec!["~/.thunderbird".to_string()],
        })
    });
    transport
        .expect_submit_restore()
        .withf(|_, backup_id, options| backup_id == "thunderbird-20231201-090000" && options.restore_dot_files)
        .times(1)
        .returning(|_, _, _| Ok(RestoreResult::succeeded()));

    let mut app = create_test_app(transport);
    app.versions.replace(versions());

    press(&mut app, KeyCode::Down).await;
    press(&mut app, KeyCode::Enter).await;
    app.next_event().await;
    assert_eq!(app.state(), RestoreState::Selected);

    press(&mut app, KeyCode::Char('d')).await;
    press(&mut app, KeyCode::Char('r')).await;
    press(&mut app, KeyCode::Char(' ')).await;
    press(&mut app, KeyCode::Enter).await;
    assert_eq!(app.state(), RestoreState::Submitting);

    app.next_event().await;
    assert!(app.controller.restore_banner().is_some());
}

#[tokio::test]
async fn test_restore_key_without_selection_warns() {
    let mut app = create_test_app(MockRestoreTransport::new());
    press(&mut app, KeyCode::Char('r')).await;

    assert_eq!(app.state(), RestoreState::Idle);
    assert_eq!(app.controller.notifier().active().len(), 1);

    press(&mut app, KeyCode::Esc).await;
    assert!(app.controller.notifier().active().is_empty());
}

#[tokio::test]
async fn test_sort_and_theme_keys() {
    let mut app = create_test_app(MockRestoreTransport::new());
    app.versions.replace(versions());

    press(&mut app, KeyCode::Char('s')).await;
    assert_eq!(app.versions.order(), SortOrder::OldestFirst);
    assert_eq!(app.versions.versions()[0].id, "thunderbird-20231201-090000");

    press(&mut app, KeyCode::Char('t')).await;
    assert_eq!(app.theme, Theme::Light);
    press(&mut app, KeyCode::Char('t')).await;
    assert_eq!(app.theme, Theme::Dark);
}

#[tokio::test]
async fn test_refresh_key_reloads_versions() {
    let mut transport = MockRestoreTransport::new();
    transport
        .expect_list_versions()
        .times(1)
        .returning(|_| Ok(versions()));

    let mut app = create_test_app(transport);
    press(&mut app, KeyCode::Char('R')).await;
    assert!(app.loading);

    // A second press while the list is loading does not start another fetch.
    press(&mut app, KeyCode::Char('R')).await;

    assert!(app.next_event().await);
    assert!(!app.loading);
    assert_eq!(app.versions.versions().len(), 2);
}
