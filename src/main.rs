use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tracing::{error, info};

use restore_panel::app::App;
use restore_panel::config::Config;
use restore_panel::logging::init_logging;
use restore_panel::transport::{DryRunTransport, HttpTransport, RestoreTransport};
use restore_panel::ui::run_app;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let _guard = init_logging(&config.log_dir)?;

    let http = HttpTransport::new(config.server_url.clone(), config.request_timeout)?;
    let transport: Arc<dyn RestoreTransport> = if config.dry_run {
        Arc::new(DryRunTransport::new(http))
    } else {
        Arc::new(http)
    };

    info!(server = %config.server_url, app_id = %config.app_id, "starting restore panel");
    run_tui_app(App::new(config, transport)).await?;

    Ok(())
}

async fn run_tui_app(app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = ?err, "restore panel exited with an error");
        eprintln!("{err:?}");
    }

    Ok(())
}
