//! Entry point for the headless **wsswitch** daemon.
//!
//! Runs the switcher core against an in-memory screen seeded with one
//! window per workspace.  Input events arrive over a Unix socket on a
//! background thread; the main thread dispatches them, lets the simulated
//! window manager catch up, and logs what the overlay would draw.
//!
//! ```text
//! wsswitch [--workspaces N]
//! ```

use log::{error, info};
use std::sync::mpsc;
use wsswitch::config::Config;
use wsswitch::dispatcher::Dispatcher;
use wsswitch::input::InputEvent;
use wsswitch::ipc::listener::UnixSocketListener;
use wsswitch::screen::memory::MemoryScreen;
use wsswitch::traits::{InputSource, OverlayEvent, ScreenModel};

const DEFAULT_WORKSPACES: usize = 4;

/// Default socket path for the input listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/wsswitch.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/wsswitch`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("wsswitch")
}

/// Try to load the config from `$XDG_CONFIG_HOME/wsswitch/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// `--workspaces N`, or the default.
fn workspace_count_arg() -> usize {
    let args: Vec<String> = std::env::args().collect();
    let value = args
        .iter()
        .position(|a| a == "--workspaces")
        .and_then(|i| args.get(i + 1));
    match value.map(|v| v.parse::<usize>()) {
        Some(Ok(n)) if n > 0 => n,
        Some(_) => {
            error!("--workspaces expects a positive number");
            std::process::exit(2);
        }
        None => DEFAULT_WORKSPACES,
    }
}

fn seed_screen(workspaces: usize) -> MemoryScreen {
    let mut screen = MemoryScreen::new(workspaces);
    let mut first = None;
    for i in 0..workspaces {
        let window = screen.open_window(i, &format!("terminal {}", i + 1));
        first.get_or_insert(window);
    }
    if let Some(window) = first {
        if let Err(e) = screen.activate_window(window, 0, false) {
            error!("failed to activate {}: {}", window, e);
        }
    }
    screen.commit_stacking_order();
    screen
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let screen = seed_screen(workspace_count_arg());
    info!("seeded {} workspace(s)", screen.workspace_count());

    let mut dispatcher = Dispatcher::new(screen, &config);
    let (overlay_tx, overlay_rx) = mpsc::channel();
    dispatcher.set_overlay(overlay_tx);

    let (input_tx, input_rx) = mpsc::channel::<InputEvent>();
    spawn_input_sources(input_tx);

    info!("wsswitch running");
    for event in input_rx {
        if let Err(e) = dispatcher.handle_input(&event) {
            error!("dispatch error: {}", e);
        }
        // The simulated window manager confirms requests on the next turn.
        dispatcher.screen_mut().settle();
        if let Err(e) = dispatcher.pump_events() {
            error!("notification error: {}", e);
        }
        log_overlay(&overlay_rx);
    }
    info!("all input sources closed, exiting");

    let screen = dispatcher.close();
    info!("ending with {} workspace(s)", screen.workspace_count());
}

//  Helpers

fn spawn_input_sources(tx: mpsc::Sender<InputEvent>) {
    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}

fn log_overlay(rx: &mpsc::Receiver<OverlayEvent>) {
    let mut redraw = false;
    for event in rx.try_iter() {
        match event {
            OverlayEvent::Redraw => redraw = true,
            OverlayEvent::SearchOpened => info!("search opened"),
            OverlayEvent::SearchChanged { query, summary, .. } => {
                info!("search {:?} {}", query, summary)
            }
        }
    }
    if redraw {
        info!("overlay redraw");
    }
}
