// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use moviecat::{Config, MovieApi, Player, ResponseCache};

mod cli;
use cli::{
    CacheCommand, CommandContext, EpisodeCommand, EpisodesCommand, MovieCommand, OutputFormat,
    RawCommand, SearchCommand, SeriesCommand, TrailerCommand,
};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "moviecat")]
#[command(about = "A terminal client for a movie and series catalog, playing through mpv")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (moviecat_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default if no command given)
    Tui,

    /// Search movies and series
    Search {
        /// Search query
        query: String,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show trending titles
    Popular {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a movie with its sources and subtitles
    Movie {
        id: String,
        /// Start playback in mpv
        #[arg(long)]
        play: bool,
        /// Quality label to play, e.g. 720p
        #[arg(short, long)]
        quality: Option<String>,
        /// Subtitle language to attach
        #[arg(short, long)]
        subtitle: Option<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a series with its seasons
    Series {
        id: String,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the episodes of a season
    Episodes {
        series_id: String,
        season: String,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show or play the sources of one episode
    Episode {
        series_id: String,
        season: String,
        episode_id: String,
        /// Start playback in mpv
        #[arg(long)]
        play: bool,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a title's trailer
    Trailer {
        id: String,
        /// Play the trailer in mpv
        #[arg(long)]
        play: bool,
    },

    /// Manage the response cache
    #[command(subcommand)]
    Cache(CacheSubCommand),

    /// Print the raw JSON of an API path, e.g. /info/123
    Api { path: String },

    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigSubCommand),
}

#[derive(Subcommand)]
enum CacheSubCommand {
    /// Clear cache
    Clear,
    /// Show cache location and size
    Info {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ConfigSubCommand {
    /// Write a config file
    Init {
        /// Write the defaults without prompting
        #[arg(long)]
        defaults: bool,
    },
    /// Print the effective configuration
    Show,
}

fn init_logging(cli: &Cli) -> Result<()> {
    if cli.debug_log {
        let file = File::create("moviecat_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("moviecat=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    if let Some(Commands::Config(cmd)) = &cli.command {
        match cmd {
            ConfigSubCommand::Init { defaults } => {
                moviecat::setup::init_config(&config_path, *defaults).await?;
            }
            ConfigSubCommand::Show => {
                let config = Config::load_or_default(&config_path);
                println!("# {}", config_path.display());
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        return Ok(());
    }

    let config = if cli.config.is_some() {
        Config::load(&config_path)?
    } else {
        Config::load_or_default(&config_path)
    };

    let cache = match &config.cache.dir {
        Some(dir) => ResponseCache::with_dir(dir)?,
        None => ResponseCache::new()?,
    };
    let api = MovieApi::new(&config.api, cache)?.with_ttl(config.cache.ttl());
    let player = Player::new(config.player.clone());

    let Some(command) = cli.command else {
        return moviecat::run_tui(config, api, player).await;
    };

    let context = CommandContext::new(config, api, player);

    match command {
        Commands::Tui => {
            let CommandContext {
                config,
                api,
                player,
            } = context;
            moviecat::run_tui(config, api, player).await?;
        }
        Commands::Search { query, format } => {
            let cmd = SearchCommand {
                query: Some(query),
                format,
            };
            cmd.execute(context).await?;
        }
        Commands::Popular { format } => {
            let cmd = SearchCommand {
                query: None,
                format,
            };
            cmd.execute(context).await?;
        }
        Commands::Movie {
            id,
            play,
            quality,
            subtitle,
            format,
        } => {
            let cmd = MovieCommand {
                id,
                play,
                quality,
                subtitle,
                format,
            };
            cmd.execute(context).await?;
        }
        Commands::Series { id, format } => {
            SeriesCommand { id, format }.execute(context).await?;
        }
        Commands::Episodes {
            series_id,
            season,
            format,
        } => {
            let cmd = EpisodesCommand {
                series_id,
                season,
                format,
            };
            cmd.execute(context).await?;
        }
        Commands::Episode {
            series_id,
            season,
            episode_id,
            play,
            format,
        } => {
            let cmd = EpisodeCommand {
                series_id,
                season,
                episode_id,
                play,
                format,
            };
            cmd.execute(context).await?;
        }
        Commands::Trailer { id, play } => {
            TrailerCommand { id, play }.execute(context).await?;
        }
        Commands::Cache(cache_cmd) => {
            let cmd = match cache_cmd {
                CacheSubCommand::Clear => CacheCommand::Clear,
                CacheSubCommand::Info { format } => CacheCommand::Info { format },
            };
            cmd.execute(context).await?;
        }
        Commands::Api { path } => {
            RawCommand { path }.execute(context).await?;
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
