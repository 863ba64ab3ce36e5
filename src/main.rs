use anyhow::Result;

mod app;
mod chat;
mod config;
mod dify;
mod handler;
mod selection;
mod tui;
mod ui;

use app::App;
use config::Config;
use dify::DifyClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Config is read once here; the client gets the token injected and no
    // other code touches the environment.
    let config = Config::load().unwrap_or_else(|_| Config::new());
    let Some(api_key) = config.api_key() else {
        eprintln!("gogaku: no API key configured.");
        eprintln!("Set the DIFY_API_KEY environment variable, or put");
        eprintln!("  {{\"dify_api_key\": \"app-...\"}}");
        if let Ok(path) = Config::config_path() {
            eprintln!("in {}", path.display());
        }
        std::process::exit(1);
    };
    let dify = DifyClient::new(&config.api_url(), &api_key);
    let mut app = App::new(dify);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut tui::EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }
    Ok(())
}
