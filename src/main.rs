use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use popmap::app::App;
use popmap::config::{AppConfig, BaseConfig};
use popmap::data;
use popmap::map::BaseLayer;
use popmap::ui;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./popmap.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// City records JSON array
    #[arg(long, value_name = "PATH")]
    cities: Option<PathBuf>,

    /// State polygons GeoJSON
    #[arg(long, value_name = "PATH")]
    states: Option<PathBuf>,

    /// Log file used by the terminal UI
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show both maps in the terminal (default)
    View,
    /// Write the city point collection as GeoJSON
    Export {
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Config file values with command-line overrides applied
    fn config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(cities) = &self.cities {
            config.data.cities = cities.clone();
        }
        if let Some(states) = &self.states {
            config.data.states = states.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.logging.file = log_file.clone();
        }
        match self.verbose {
            0 => {}
            1 => config.logging.level = "debug".to_string(),
            _ => config.logging.level = "trace".to_string(),
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    match cli.command {
        Some(Commands::Export { output }) => {
            init_logging(&config, None)?;
            export(&config, output)
        }
        Some(Commands::View) | None => {
            init_logging(&config, Some(&config.logging.file))?;
            view(&config)
        }
    }
}

/// Logs go to `file` when given (the terminal belongs to the UI), else stderr
fn init_logging(config: &AppConfig, file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    }
    .map_err(|e| anyhow!(e))
}

/// Base layer from the configured outline, or the built-in one
fn base_layer(config: &BaseConfig) -> BaseLayer {
    let lines = match &config.outline {
        Some(path) => data::load_outline(path).unwrap_or_else(|e| {
            warn!(error = %e, "outline unavailable, using built-in outline");
            data::simple_us_outline()
        }),
        None => data::simple_us_outline(),
    };

    BaseLayer {
        attribution: config.attribution.clone(),
        lines,
    }
}

fn export(config: &AppConfig, output: Option<PathBuf>) -> Result<()> {
    let records = data::load_cities(&config.data.cities).wait()?;
    let (collection, errors) = data::to_point_collection(&records);
    for e in &errors {
        warn!(error = %e, "dropping city record");
    }

    let json = serde_json::to_string_pretty(&collection.to_geojson())?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), features = collection.len(), "exported");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn view(config: &AppConfig) -> Result<()> {
    let base = base_layer(&config.base);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, config, base);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming, clicks and hover
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.pointer_moved(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan; press and release in place is a click
        MouseEventKind::Down(MouseButton::Left) => app.begin_press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_press(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &AppConfig, base: BaseLayer) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, base, size.width, size.height);

    // Main loop
    loop {
        app.poll_loads();

        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                            KeyCode::Tab => app.switch_focus(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_views(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("quit");
    Ok(())
}
