use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sokoban_engine::codec::{self, Alphabet};
use sokoban_engine::config::Config;
use sokoban_engine::levels::LevelCatalog;
use sokoban_engine::{
    Board, Compact, Conclusion, Direction, Directions, GameStatus, LevelError, SessionError,
    SessionStore, TurnReport, Visual,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Encoding {
    Compact,
    Visual,
}

#[derive(Subcommand)]
enum Command {
    /// Play a level in the terminal
    Play {
        /// Catalog level to play (defaults to the first one)
        #[arg(value_name = "NAME")]
        name: Option<String>,

        /// Play this compact level text instead of a catalog level
        #[arg(long, value_name = "TEXT", conflicts_with_all = ["name", "random"])]
        custom: Option<String>,

        /// Pick a random catalog level
        #[arg(long, conflicts_with = "name")]
        random: bool,

        /// Seed for --random
        #[arg(long, requires = "random")]
        seed: Option<u64>,

        /// Seconds of inactivity before the game expires
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Validate a level and print its state
    Check {
        /// Level text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Read TEXT with the visual alphabet
        #[arg(long)]
        visual: bool,
    },

    /// Re-encode a level in the other alphabet
    Convert {
        /// Level text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Target encoding
        #[arg(long, value_enum)]
        to: Encoding,
    },

    /// List catalog levels
    List {
        /// Only show names containing QUERY
        #[arg(value_name = "QUERY")]
        query: Option<String>,
    },
}

#[derive(Parser)]
#[command(name = "sokoban")]
#[command(about = "Play and inspect Sokoban levels", long_about = None)]
struct Args {
    /// Path to the config file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the level catalog (JSON or XSB), overrides the config
    #[arg(short, long, value_name = "FILE")]
    levels: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<LevelCatalog> {
    match path {
        Some(path) => LevelCatalog::from_file(path)
            .with_context(|| format!("failed to load levels from {}", path.display())),
        None => Ok(LevelCatalog::builtin()),
    }
}

fn format_directions(directions: &Directions) -> String {
    if directions.is_empty() {
        return "none".to_string();
    }
    directions
        .iter()
        .map(|direction| direction.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_board(board: &Board) {
    // `.` never appears inside a compact row
    for row in board.to_string().split('.') {
        println!("{}", row);
    }
}

fn check(text: &str, alphabet: &dyn Alphabet) -> anyhow::Result<()> {
    let board = Board::from_text(text, alphabet).context("invalid level")?;
    let status = GameStatus::evaluate(&board, None);

    print_board(&board);
    println!("size: {}x{}", board.width(), board.height());
    println!("status: {:?}", status);
    println!("available: {}", format_directions(&board.available_directions()));
    println!("blocked: {}", format_directions(&board.blocked_directions()));
    Ok(())
}

fn convert(text: &str, to: Encoding, glyphs: &Visual) -> anyhow::Result<()> {
    let (from, to): (&dyn Alphabet, &dyn Alphabet) = match to {
        Encoding::Compact => (glyphs, &Compact),
        Encoding::Visual => (&Compact, glyphs),
    };
    let tokens = codec::decode(text, from).context("invalid level")?;
    println!("{}", codec::encode(&tokens, to));
    Ok(())
}

fn list(catalog: &LevelCatalog, query: Option<&str>) {
    let names: Vec<&str> = match query {
        Some(query) => catalog.search(query),
        None => catalog.names().collect(),
    };
    for name in names {
        println!("{}", name);
    }
}

struct PlayOpts {
    name: Option<String>,
    custom: Option<String>,
    random: bool,
    seed: Option<u64>,
    timeout: Duration,
}

fn choose_level(catalog: &LevelCatalog, opts: &PlayOpts) -> anyhow::Result<String> {
    if let Some(custom) = &opts.custom {
        return Ok(custom.clone());
    }

    let name = if opts.random {
        let mut rng = match opts.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        catalog.random(&mut rng)
    } else {
        opts.name.as_deref().or_else(|| catalog.names().next())
    };

    let Some(name) = name else {
        bail!("the level catalog is empty");
    };
    let text = catalog
        .get(name)
        .ok_or_else(|| LevelError::UnknownLevel(name.to_string()))?;
    info!(name, "level selected");
    println!("Level: {}", name);
    Ok(text.to_string())
}

async fn play(catalog: &LevelCatalog, opts: PlayOpts) -> anyhow::Result<()> {
    let level = choose_level(catalog, &opts)?;

    let (expired_tx, mut expired_rx) = mpsc::unbounded_channel();
    let store = SessionStore::new(opts.timeout, move |id, session| {
        // The receiver is gone once the game loop has exited
        let _ = expired_tx.send((id, session));
    });

    let (mut id, board) = store.start(&level).context("invalid level")?;
    print_board(&board);
    println!(
        "Moves: {} (w/a/s/d or up/down/left/right, q to quit)",
        format_directions(&board.available_directions())
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read input")?,
            Some((expired, session)) = expired_rx.recv() => {
                if expired == id {
                    println!("Time is up after {} moves. The game has ended.", session.moves);
                    return Ok(());
                }
                continue;
            }
        };

        let Some(line) = line else {
            store.forfeit(id);
            return Ok(());
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
            store.forfeit(id);
            println!("Game abandoned.");
            return Ok(());
        }

        let direction: Direction = match input.parse() {
            Ok(direction) => direction,
            Err(err) => {
                warn!(%err, "rejected input");
                println!("{}", err);
                continue;
            }
        };

        match store.submit(id, direction) {
            Ok(TurnReport::Continue {
                board,
                available,
                moves,
            }) => {
                print_board(&board);
                println!("Move {}. Moves: {}", moves, format_directions(&available));
            }
            Ok(TurnReport::Concluded {
                session,
                conclusion,
            }) => {
                print_board(&session.board);
                match conclusion {
                    Conclusion::Won { moves, elapsed } => {
                        println!(
                            "Victory! Solved in {} moves and {:.1} seconds.",
                            moves,
                            elapsed.as_secs_f64()
                        );
                        return Ok(());
                    }
                    Conclusion::Lost { moves } => {
                        println!("Defeat after {} moves: a box is stuck in a corner.", moves);
                        println!("Retry? [y/N]");
                        let answer = lines.next_line().await.context("failed to read input")?;
                        let retry = answer
                            .as_deref()
                            .map(str::trim)
                            .is_some_and(|answer| answer.eq_ignore_ascii_case("y"));
                        if !retry {
                            return Ok(());
                        }

                        let (retry_id, board) =
                            store.start(&session.level).context("invalid level")?;
                        id = retry_id;
                        print_board(&board);
                        println!(
                            "Moves: {}",
                            format_directions(&board.available_directions())
                        );
                    }
                }
            }
            Err(SessionError::Move(err)) => {
                println!("Cannot move {}: {}.", direction, err);
            }
            Err(SessionError::NotFound(_)) => {
                // Expired between the read and the move
                println!("The game has ended.");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    match args.command {
        Command::Play {
            name,
            custom,
            random,
            seed,
            timeout,
        } => {
            let catalog = load_catalog(args.levels.as_ref().or(config.levels.as_ref()))?;
            let opts = PlayOpts {
                name,
                custom,
                random,
                seed,
                timeout: timeout
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.session_timeout()),
            };
            play(&catalog, opts).await
        }
        Command::Check { text, visual } => {
            if visual {
                check(&text, &config.glyphs)
            } else {
                check(&text, &Compact)
            }
        }
        Command::Convert { text, to } => convert(&text, to, &config.glyphs),
        Command::List { query } => {
            let catalog = load_catalog(args.levels.as_ref().or(config.levels.as_ref()))?;
            list(&catalog, query.as_deref());
            Ok(())
        }
    }
}
