use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use platoon::app::App;
use platoon::channel::Channel;
use platoon::config::{ConfigOverrides, PlatoonConfig};
use platoon::leader::{confirmation, parse_reading};
use platoon::ui::Theme;
use platoon::{events, ui, Error, Estimator, Follower, Leader};

#[derive(Parser, Debug)]
#[command(name = "platoon")]
#[command(about = "Leader/follower platoon coordination over MQTT")]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Broker host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Broker port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Topic to publish on / subscribe to (overrides config)
    #[arg(long, global = true)]
    topic: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate congestion and publish readings.
    ///
    /// With --speed and --distance publishes once; otherwise reads
    /// "speed distance" lines from stdin.
    Leader {
        /// Leader speed in km/h
        #[arg(long, requires = "distance", allow_negative_numbers = true)]
        speed: Option<f64>,

        /// Distance to the vehicle ahead in meters
        #[arg(long, requires = "speed", allow_negative_numbers = true)]
        distance: Option<f64>,
    },

    /// Display the latest values published by the leader.
    Follower {
        /// Write logs to this file (the terminal is used by the display)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = PlatoonConfig::load(args.config.as_deref())?.with_overrides(ConfigOverrides {
        host: args.host,
        port: args.port,
        topic: args.topic,
    })?;

    match args.command {
        Command::Leader { speed, distance } => {
            init_logging();
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_leader(&config, speed.zip(distance)))
        }
        Command::Follower { log_file } => {
            if let Some(path) = log_file {
                init_file_logging(&path)?;
            }
            run_follower(&config)
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

fn init_file_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

/// Open the broker session for `role`.
#[cfg(feature = "mqtt")]
async fn connect(config: &PlatoonConfig, role: &str) -> Result<Arc<dyn Channel>> {
    use platoon::MqttChannel;

    let client_id = config.broker.client_id_for(role);
    let channel = MqttChannel::connect(&config.broker, &client_id).await?;
    Ok(Arc::new(channel))
}

#[cfg(not(feature = "mqtt"))]
async fn connect(_config: &PlatoonConfig, _role: &str) -> Result<Arc<dyn Channel>> {
    anyhow::bail!("platoon was built without the `mqtt` feature; no transport available")
}

/// Run the leader: publish once, or once per stdin line.
async fn run_leader(config: &PlatoonConfig, reading: Option<(f64, f64)>) -> Result<()> {
    let estimator = Estimator::calibrated()?;
    let channel = connect(config, "leader").await?;
    let leader = Leader::new(estimator, channel.clone(), config.topic.clone());

    let result = match reading {
        Some((speed, distance)) => leader
            .send(speed, distance)
            .await
            .map(|record| println!("{}", confirmation(&record)))
            .map_err(anyhow::Error::from),
        None => read_readings(&leader).await,
    };

    channel.shutdown().await;
    result
}

async fn read_readings(leader: &Leader) -> Result<()> {
    eprintln!("Enter speed (km/h) and distance (m), e.g. `30 35`. Ctrl-D to finish.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (speed, distance) = match parse_reading(&line) {
            Ok(reading) => reading,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match leader.send(speed, distance).await {
            Ok(record) => println!("{}", confirmation(&record)),
            Err(e @ (Error::InvalidInput { .. } | Error::Transport(_))) => eprintln!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Run the follower display until the user quits.
fn run_follower(config: &PlatoonConfig) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    println!("Connecting to {}...", config.broker.endpoint());
    let follower = rt.block_on(async {
        let channel = connect(config, "follower").await?;
        let follower = Follower::start(channel, config.topic.clone()).await?;
        Ok::<_, anyhow::Error>(follower)
    })?;

    // Detect the theme before the terminal switches to raw mode
    let app = App::new(
        follower.state().clone(),
        format!("{} {}", follower.channel().description(), follower.topic()),
        Theme::auto_detect(),
    )
    .with_stale_after(config.follower.stale_after());

    // Deliveries keep running on the runtime's worker threads
    let result = run_tui(app, config.follower.refresh_interval());

    rt.block_on(follower.shutdown());
    result
}

fn run_tui(mut app: App, refresh_interval: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();
    let poll_timeout = refresh_interval.min(Duration::from_millis(100));

    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(Event::Key(key)) = events::poll_event(poll_timeout)? {
            events::handle_key_event(app, key);
        }

        if last_refresh.elapsed() >= refresh_interval {
            app.refresh();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}
