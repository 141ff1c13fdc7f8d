use anyhow::{Context, Result};
use clap::Parser;
use rust_chess_session::config::SessionConfig;
use rust_chess_session::engine::Color;
use rust_chess_session::session::{Mode, SessionHandle};
use rust_chess_session::ui::{BoardDisplay, GameInterface, TerminalApp};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Interactive terminal chess with pre-moves and a random bot.
#[derive(Parser, Debug)]
#[command(name = "rust_chess_session", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Game mode: human or bot
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Side played by the bot
    #[arg(long, value_parser = parse_color)]
    bot_color: Option<Color>,

    /// Bot "thinking" delay in milliseconds
    #[arg(long)]
    bot_delay_ms: Option<u64>,

    /// Seed for reproducible bot moves
    #[arg(long)]
    seed: Option<u64>,

    /// Start position as FEN
    #[arg(long)]
    fen: Option<String>,

    /// ASCII board without colors
    #[arg(long)]
    plain: bool,
}

fn parse_color(s: &str) -> Result<Color, String> {
    match s.to_ascii_lowercase().as_str() {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        _ => Err(format!("expected white or black, got {:?}", s)),
    }
}

impl Cli {
    fn into_config(self) -> Result<(SessionConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SessionConfig::default(),
        };
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(color) = self.bot_color {
            config.bot_color = color;
        }
        if let Some(delay) = self.bot_delay_ms {
            config.bot_delay_ms = delay;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.fen.is_some() {
            config.start_fen = self.fen;
        }
        Ok((config, self.plain))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // logs go to stderr so they never interleave with the board on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, plain) = Cli::parse().into_config()?;
    info!(?config, "starting session");

    let controller = config.controller().context("invalid session configuration")?;
    let handle = SessionHandle::spawn(controller, config.bot_delay());
    let display = if plain {
        BoardDisplay::plain()
    } else {
        BoardDisplay::new()
    };

    let mut app = TerminalApp::new(handle, GameInterface::with_display(display));
    app.run().await?;
    Ok(())
}
