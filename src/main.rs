use std::error::Error;
use std::process::ExitCode;

use aula_ctl_core::Error as BoardError;
use aula_f87::engine::{EffectRequest, Outcome, PerKeyRequest};
use aula_f87::layout::{effect_name, EFFECTS, KEY_GROUPS, KEY_NAMES};
use aula_f87::types::{EffectId, Level, Rgb, SleepTimer};
use aula_f87::{AulaF87, Frame, Operation, TransactionEngine};
use bpaf::Bpaf;
use hidapi::HidApi;

use crate::config::Config;
use crate::detection::{scan, UsagePage};

mod config;
mod detection;
mod logging;

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options, version, descr(env!("CARGO_PKG_DESCRIPTION")))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv frame trace)
    #[bpaf(short('v'), long("verbose"), req_flag(()), count)]
    verbose: usize,
    /// Prefer a HID usage page, e.g. 0xFF13
    #[bpaf(long("page"), argument("PAGE"))]
    page: Option<UsagePage>,
    #[bpaf(external(command))]
    command: Command,
}

#[derive(Clone, Debug, Bpaf)]
enum Command {
    /// Scan for connected AULA F87 keyboards
    #[bpaf(command)]
    Scan,
    /// List available lighting effects
    #[bpaf(command)]
    List,
    /// Read the current keyboard configuration
    #[bpaf(command)]
    Read,
    /// Set a lighting effect (1-18)
    #[bpaf(command)]
    Effect {
        /// Custom color as hex #RRGGBB, replacing the older R G B triple
        /// (255 0 0 is now #ff0000)
        #[bpaf(long, argument("COLOR"))]
        color: Option<Rgb>,
        /// Use rainbow / colorful mode
        #[bpaf(long)]
        colorful: bool,
        /// Animation speed (0-4)
        #[bpaf(short, long, argument("SPEED"))]
        speed: Option<u8>,
        /// Brightness level (0-4)
        #[bpaf(short, long, argument("LEVEL"))]
        brightness: Option<u8>,
        /// Skip reads and echoes for near-instant apply
        #[bpaf(long)]
        fast: bool,
        /// Effect number (1-18)
        #[bpaf(positional("EFFECT"))]
        effect: u8,
    },
    /// Set per-key RGB colors
    #[bpaf(command)]
    Perkey {
        /// List key names and groups
        #[bpaf(long("list-keys"))]
        list_keys: bool,
        /// Key or group with a color, e.g. esc:#ff0000 wasd:#00ff00
        #[bpaf(positional("KEY:COLOR"), many)]
        keys: Vec<String>,
    },
    /// Send a raw 20-byte HID fragment
    #[bpaf(command)]
    Raw {
        /// 40 hex chars, spaces and colons are ignored
        #[bpaf(positional("HEX"), some("expected hex bytes"))]
        hex: Vec<String>,
    },
    /// Set the sleep timer (auto-off)
    #[bpaf(command)]
    Sleep {
        /// Minutes of inactivity: 0 (off), 5, 10 or 15
        #[bpaf(positional("MINUTES"))]
        minutes: u8,
    },
    /// Factory reset all lighting settings
    #[bpaf(command)]
    Reset,
}

/// Validate arguments into an operation before touching the device.
/// Commands that never open the device yield `None`.
fn operation(command: Command) -> Result<Option<Operation>, BoardError> {
    Ok(Some(match command {
        Command::Read => Operation::Read,
        Command::Effect {
            color,
            colorful,
            speed,
            brightness,
            fast,
            effect,
        } => Operation::Effect(EffectRequest {
            effect: EffectId::new(effect)?,
            color,
            colorful,
            speed: speed.map(|s| Level::new("speed", s)).transpose()?,
            brightness: brightness.map(|b| Level::new("brightness", b)).transpose()?,
            fast,
        }),
        Command::Perkey { keys, .. } => Operation::PerKey(PerKeyRequest::parse(&keys)?),
        Command::Raw { hex } => Operation::Raw(hex.join("").parse::<Frame>()?),
        Command::Sleep { minutes } => Operation::Sleep(SleepTimer::from_minutes(minutes)?),
        Command::Reset => Operation::Reset,
        Command::Scan | Command::List => return Ok(None),
    }))
}

fn print_scan() -> Result<ExitCode, Box<dyn Error>> {
    println!("Scanning for AULA F87...");
    println!("{}", "=".repeat(60));
    let connections = scan(&HidApi::new()?);
    for connection in &connections {
        println!("{connection}");
    }
    if connections.iter().all(|c| c.collections.is_empty()) {
        println!("  No AULA keyboard found.");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_effects() {
    println!("Available Effects (AULA F87)");
    println!("{}", "=".repeat(60));
    println!("{:<4} {:<22} {:<6} Color", "#", "Name", "Speed");
    println!("{}", "-".repeat(60));
    for (n, effect) in EFFECTS.iter().enumerate() {
        let speed = if effect.speed { "yes" } else { "-" };
        let color = if effect.color {
            "--color / --colorful"
        } else {
            "--colorful only"
        };
        println!("{:<4} {:<22} {speed:<6} {color}", n + 1, effect.name);
    }
    println!("{}", "=".repeat(60));
    println!("\nUsage:");
    println!("  effect 2 --color ff0000        # Respire in red");
    println!("  effect 2 --colorful -s 3       # Respire rainbow, speed 3");
    println!("  effect 3                       # Rainbow (always colorful)");
    println!("  effect 1 --color 00ff00 -b 2   # Fixed green, brightness 2");
}

fn print_keys() {
    println!("Key names:");
    for (name, idx) in KEY_NAMES {
        println!("  {name:<8} LED {idx}");
    }
    println!("\nGroups:");
    for (group, keys) in KEY_GROUPS {
        println!("  {group:<8} {}", keys.join(" "));
    }
}

fn describe(op: &Operation) -> String {
    match op {
        Operation::Read => "Reading keyboard configuration".into(),
        Operation::Effect(req) => {
            let mut desc = format!("Setting {}", req.effect);
            if let Some(color) = req.color {
                desc += &format!("  color={color}");
            }
            if req.colorful {
                desc += "  [colorful]";
            }
            if let Some(b) = req.brightness {
                desc += &format!("  bright={}", b.get());
            }
            if let Some(s) = req.speed {
                desc += &format!("  speed={}", s.get());
            }
            desc
        },
        Operation::PerKey(req) => format!("Setting {} key(s) to custom colors", req.colors.len()),
        Operation::Sleep(timer) => format!("Setting sleep timer: {timer} (0x{:02X})", timer.to_byte()),
        Operation::Reset => "Factory resetting keyboard lighting...".into(),
        Operation::Raw(frame) => format!("TX: {frame}"),
    }
}

fn report(op: &Operation, outcome: &Outcome) {
    if let Operation::Read = op {
        if let Some(config) = &outcome.baseline {
            print_config(config);
        }
        return;
    }
    if let Operation::Raw(_) = op {
        for (i, data) in outcome.responses.iter().enumerate() {
            let hex: String = data.iter().map(|b| format!("{b:02x}")).collect();
            println!("RX[{i}]: {hex}");
        }
        return;
    }

    if let Some(config) = outcome.baseline.as_ref().filter(|c| c.is_complete()) {
        match (op, config.effect_settings()) {
            (Operation::Sleep(_), _) => {
                if let Some(minutes) = config.sleep_minutes() {
                    println!("  Current: {minutes} min");
                }
            },
            (_, Some(settings)) => println!("  Current: {settings}"),
            (_, None) => {
                if let Some(n) = config.effect() {
                    println!("  Current: #{n} ({})", effect_name(n).unwrap_or("?"));
                }
            },
        }
    }
    if outcome.used_defaults && !matches!(op, Operation::Reset) {
        println!("  Using factory defaults for unchanged settings");
    }
    for tally in &outcome.writes {
        println!("  {tally}");
    }
    if let Some(save) = outcome.save {
        println!("  {save}");
    }
    if let Some(verify) = &outcome.verify {
        if let (Operation::Effect(_), Some(settings)) = (op, verify.config.effect_settings()) {
            println!("  Verify: {settings}");
        }
        for mismatch in &verify.mismatches {
            println!("  Verify mismatch: {mismatch}");
        }
    }

    match op {
        Operation::Effect(req) => println!("  -> {} active!", req.effect.info().name),
        Operation::PerKey(req) => println!("  -> {} key(s) colored!", req.colors.len()),
        Operation::Sleep(timer) => println!("  -> Sleep timer set to {timer}!"),
        Operation::Reset => println!("  -> Factory reset complete!"),
        Operation::Read | Operation::Raw(_) => {},
    }
}

fn print_config(config: &aula_f87::engine::ConfigBuffer) {
    for (seq, frame) in config.iter() {
        let Some(frame) = frame else { continue };
        let annotation = match (seq, config.effect()) {
            (0, Some(n)) => match config.effect_settings() {
                Some(settings) => format!("  <- {settings}"),
                None => format!("  <- effect={n}({})", effect_name(n).unwrap_or("?")),
            },
            _ => String::new(),
        };
        println!("  [{seq:2}] {frame}{annotation}");
    }
}

fn run(cli: Cli, config: Config) -> Result<ExitCode, Box<dyn Error>> {
    let op = match cli.command {
        Command::Scan => return print_scan(),
        Command::List => {
            print_effects();
            return Ok(ExitCode::SUCCESS);
        },
        Command::Perkey {
            list_keys: true, ..
        } => {
            print_keys();
            return Ok(ExitCode::SUCCESS);
        },
        command => match operation(command)? {
            Some(op) => op,
            None => return Ok(ExitCode::SUCCESS),
        },
    };

    println!("{}", describe(&op));
    let page = cli.page.map(|p| p.0).or(config.device.page);
    let board = AulaF87::open(page)?;
    println!(
        "  Connected: {} (page=0x{:04X})",
        board.collection.mode, board.collection.usage_page
    );

    let mut engine = TransactionEngine::new(board, config.engine());
    let outcome = engine.run(&op)?;
    report(&op, &outcome);
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = cli().run();
    logging::init_logging(cli.verbose);

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load config: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run(cli, config) {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<BoardError>() {
                Some(BoardError::DeviceNotFound) => eprintln!("Keyboard not found."),
                Some(e) if e.is_validation() => {
                    eprintln!("error: {e}");
                    if let BoardError::UnknownKey(_) | BoardError::NoKeys = e {
                        eprintln!("See 'perkey --list-keys'.");
                    }
                },
                _ => eprintln!("error: {e}"),
            }
            ExitCode::FAILURE
        },
    }
}
