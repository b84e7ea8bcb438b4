use chrono::{Local, NaiveDateTime, NaiveTime, Utc};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use kilnlog::checklist::SAFETY_ITEMS;
use kilnlog::cone_grid::{classify, COLS};
use kilnlog::matcher;
use kilnlog::model::{
    self, Atmosphere, ConeStatus, CrewRole, EntryType, FuelType, Phase, SeverityTier,
    StokeLocation, WoodSize, WoodSpecies,
};
use kilnlog::weather::OpenMeteoClient;
use kilnlog::inventory::MAX_MOISTURE_PCT;
use kilnlog::wood::MAX_PIECES_PER_ENTRY;
use kilnlog::{
    Config, ExportKind, FiringSession, FiringStats, FiringWorkbook, GridPosition, KilnError,
    LogEntryPatch, NewCrewMember, NewStockEntry, SortOrder, StokeTimer, WeatherService, WeatherSnapshot,
    WorkbookStore,
};
use std::io;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "kilnlog")]
#[command(author, version, about = "Wood-firing session log - temperatures, stokes, crew, wood and cones")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a firing (an existing session moves on and keeps its archive)
    Init {
        /// Kiln name (default from config, "Ana")
        #[arg(long)]
        kiln: Option<String>,

        /// Firing id (default: start time as YYYYMMDD-HHMM)
        #[arg(long)]
        firing_id: Option<String>,

        /// Who is logging
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show the current firing at a glance
    Status,

    /// Show or change the firing phase
    Phase {
        /// heating, water_smoking, dehydration, body_reduction,
        /// glaze_maturation, flash, cooling, finished
        phase: Option<Phase>,
    },

    /// Show or change who is logging
    User {
        name: Option<String>,

        /// Forget the active user
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },

    /// Firing observations
    #[command(subcommand)]
    Log(LogCommand),

    /// Wood consumption
    #[command(subcommand)]
    Wood(WoodCommand),

    /// Crew roster
    #[command(subcommand)]
    Crew(CrewCommand),

    /// Cone pack map (positions R1C1 through R6C8)
    #[command(subcommand)]
    Cone(ConeCommand),

    /// Stoke interval timer
    #[command(subcommand)]
    Timer(TimerCommand),

    /// Pre-firing safety checklist
    #[command(subcommand)]
    Checklist(ChecklistCommand),

    /// Fetch current weather at the kiln site
    Weather,

    /// Past firings for comparison
    #[command(subcommand)]
    Archive(ArchiveCommand),

    /// Export records as CSV
    Export {
        /// What to export
        kind: ExportTarget,

        /// Output file (directory for `all`); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Optional readings shared by `log add` and `log edit`
#[derive(Args, Debug, Default)]
struct ReadingArgs {
    /// Middle spy-hole temperature (F, 0 = not read)
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=2600))]
    middle: Option<i32>,

    /// Back spy-hole temperature (F, 0 = not read)
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=2600))]
    back: Option<i32>,

    /// Stack temperature (F, 0 = not read)
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=2600))]
    stack: Option<i32>,

    /// Entry type: observation, stoke, damper_change, door_brick, problem,
    /// milestone, shift_change, incident, mobile_quick
    #[arg(short = 't', long = "type")]
    entry_type: Option<EntryType>,

    /// neutral, light_oxidation, oxidation, light_reduction, reduction, heavy_reduction
    #[arg(short, long)]
    atmosphere: Option<Atmosphere>,

    /// Damper position (0-100%)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    damper: Option<u8>,

    /// Air intake (0-100%)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    air: Option<u8>,

    /// hardwood, softwood, mixed, slab, kindling, scrap
    #[arg(long)]
    fuel: Option<FuelType>,

    /// Cone movement seen, e.g. "9 soft, 10 standing"
    #[arg(long)]
    cones: Option<String>,

    #[arg(long)]
    flame: Option<String>,

    /// Colour through the spy hole
    #[arg(long)]
    spy: Option<String>,

    /// Sound of the draft
    #[arg(long)]
    draft: Option<String>,

    /// What was done
    #[arg(long)]
    action: Option<String>,

    #[arg(short, long)]
    notes: Option<String>,
}

impl ReadingArgs {
    fn into_patch(self) -> LogEntryPatch {
        LogEntryPatch {
            entry_type: self.entry_type,
            temp_middle: self.middle,
            temp_back: self.back,
            temp_stack: self.stack,
            atmosphere: self.atmosphere,
            damper_position: self.damper,
            air_intake: self.air,
            fuel_type: self.fuel,
            cones: self.cones,
            flame_color: self.flame,
            spy_color: self.spy,
            draft_sound: self.draft,
            action_taken: self.action,
            notes: self.notes,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum LogCommand {
    /// Record a reading
    Add {
        /// Front spy-hole temperature (F)
        #[arg(value_parser = clap::value_parser!(i32).range(60..=2600))]
        temp_front: i32,

        #[command(flatten)]
        readings: ReadingArgs,

        /// Reading time, "YYYY-MM-DD HH:MM[:SS]" (default: now)
        #[arg(long, value_parser = parse_at)]
        at: Option<NaiveDateTime>,

        /// Attach current weather to the entry
        #[arg(short, long)]
        weather: bool,
    },

    /// List entries, newest first
    List {
        /// Oldest first instead
        #[arg(long)]
        asc: bool,

        /// Only entries of this type
        #[arg(short = 't', long = "type")]
        entry_type: Option<EntryType>,

        /// Maximum entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Change fields of an entry
    Edit {
        id: u64,

        /// Front spy-hole temperature (F)
        #[arg(long, value_parser = clap::value_parser!(i32).range(60..=2600))]
        front: Option<i32>,

        /// New reading time
        #[arg(long, value_parser = parse_at)]
        at: Option<NaiveDateTime>,

        #[command(flatten)]
        readings: ReadingArgs,
    },

    /// Remove an entry
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
enum WoodCommand {
    /// Record wood going in
    Add {
        /// Number of pieces (1-50)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PIECES_PER_ENTRY)))]
        quantity: u32,

        /// pine, oak, ash, maple, birch, cedar, fir, poplar, mixed, other
        #[arg(short, long, default_value = "pine")]
        species: WoodSpecies,

        /// kindling, small, medium, large, slab
        #[arg(long, default_value = "medium")]
        size: WoodSize,

        /// primary, secondary, side_stoke, all
        #[arg(short, long, default_value = "primary")]
        location: StokeLocation,

        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long, value_parser = parse_at)]
        at: Option<NaiveDateTime>,
    },

    /// List wood entries with the running total
    List,

    /// Remove a wood entry
    Delete { id: u64 },

    /// Wood stock on hand
    #[command(subcommand)]
    Stock(StockCommand),
}

#[derive(Subcommand, Debug)]
enum StockCommand {
    /// Record a stack of wood
    Add {
        /// Species, free text (e.g. pine, red oak)
        species: String,

        #[arg(short, long, default_value_t = 0.5)]
        cords: f64,

        /// Moisture content in percent (0-100)
        #[arg(short, long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_MOISTURE_PCT)))]
        moisture: u8,

        /// Where it is stacked
        #[arg(short, long, default_value = "shed A")]
        location: String,
    },

    /// List stock on hand
    List,

    /// Remove a stock entry
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
enum CrewCommand {
    /// Add someone to the roster
    Add {
        name: String,

        /// lead, stoker, spotter, wood, float
        role: CrewRole,

        /// Shift start, HH:MM (default: now)
        #[arg(long, value_parser = parse_clock_arg)]
        start: Option<NaiveTime>,

        /// Shift end, HH:MM
        #[arg(long, value_parser = parse_clock_arg)]
        end: Option<NaiveTime>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show the roster
    List {
        /// Only people on shift right now
        #[arg(long)]
        now: bool,
    },

    /// Take someone off the roster
    Remove { id: u64 },
}

#[derive(Subcommand, Debug)]
enum ConeCommand {
    /// Set a cone's status at a position
    Set {
        /// Position such as R3C4
        position: String,
        /// Cone number, e.g. 06 or 10
        cone: String,
        /// standing, soft, bending, bent, down, overfired
        status: ConeStatus,
    },

    /// Remove one cone from a position
    Remove { position: String, cone: String },

    /// Empty a position
    Clear { position: String },

    /// Show the kiln map
    Show,
}

#[derive(Subcommand, Debug)]
enum TimerCommand {
    /// Start counting down to the next stoke
    Start {
        /// Interval in minutes (1-60); remembered for next time
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
        minutes: Option<u32>,
    },

    Stop,

    /// Time left until the next stoke
    Show,
}

#[derive(Subcommand, Debug)]
enum ChecklistCommand {
    Show,

    /// Tick an item by number
    Check {
        #[arg(value_parser = clap::value_parser!(u8).range(1..))]
        item: u8,
    },

    /// Untick an item by number
    Uncheck {
        #[arg(value_parser = clap::value_parser!(u8).range(1..))]
        item: u8,
    },
}

#[derive(Subcommand, Debug)]
enum ArchiveCommand {
    /// Archive the current firing's log
    Save,

    /// Import a past firing from a CSV file
    Import {
        path: PathBuf,

        /// Name to file it under when the CSV has no firing_id column
        #[arg(long)]
        name: Option<String>,
    },

    /// List archived firings
    List,

    /// Find archived readings near the current temperature
    Compare {
        /// Firing id or archive id prefix
        firing: String,

        /// Match window in degrees F (default from config, 50)
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=1000))]
        tolerance: Option<i32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportTarget {
    FiringLog,
    Wood,
    /// Wood stock on hand
    Inventory,
    Crew,
    ConeMap,
    Summary,
    /// Every stream into a directory
    All,
}

fn parse_at(s: &str) -> Result<NaiveDateTime, String> {
    model::parse_time(s).ok_or_else(|| format!("'{}' is not a time (use YYYY-MM-DD HH:MM[:SS])", s))
}

fn parse_clock_arg(s: &str) -> Result<NaiveTime, String> {
    model::parse_clock(s).ok_or_else(|| format!("'{}' is not a clock time (use HH:MM)", s))
}

/// Local wall-clock time to the second
fn now() -> NaiveDateTime {
    model::whole_seconds(Local::now().naive_local())
}

fn parse_position(label: &str) -> kilnlog::Result<GridPosition> {
    GridPosition::parse(label)
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("KILNLOG_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kilnlog=warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> kilnlog::Result<()> {
    let config = Config::load();
    let store = WorkbookStore::locate();

    match command {
        Command::Init {
            kiln,
            firing_id,
            user,
        } => init(&store, &config, kiln, firing_id, user),
        Command::Status => {
            let mut book = store.load()?;
            let alerted = print_status(&mut book);
            if alerted {
                store.save(&book)?;
            }
            Ok(())
        }
        Command::Phase { phase } => match phase {
            Some(phase) => mutate(&store, |book| {
                let previous = book.session.set_phase(phase);
                println!("{} {} -> {}", "Phase:".bold(), previous, phase.to_string().green());
                Ok(())
            }),
            None => {
                let book = store.load()?;
                println!("{}", book.session.phase);
                Ok(())
            }
        },
        Command::User { name, clear } => {
            if name.is_none() && !clear {
                let book = store.load()?;
                println!("{}", book.session.current_user());
                return Ok(());
            }
            mutate(&store, |book| {
                book.session.active_user = name.filter(|n| !n.trim().is_empty());
                println!("{} {}", "Logging as".bold(), book.session.current_user().cyan());
                Ok(())
            })
        }
        Command::Log(cmd) => log_command(&store, &config, cmd),
        Command::Wood(cmd) => wood_command(&store, cmd),
        Command::Crew(cmd) => crew_command(&store, cmd),
        Command::Cone(cmd) => cone_command(&store, cmd),
        Command::Timer(cmd) => timer_command(&store, cmd),
        Command::Checklist(cmd) => checklist_command(&store, cmd),
        Command::Weather => {
            print_weather(&current_weather(&config));
            Ok(())
        }
        Command::Archive(cmd) => archive_command(&store, &config, cmd),
        Command::Export { kind, output } => export(&store, kind, output),
        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "kilnlog", &mut io::stdout());
            Ok(())
        }
    }
}

/// Load, change and write back the workbook
fn mutate<F>(store: &WorkbookStore, f: F) -> kilnlog::Result<()>
where
    F: FnOnce(&mut FiringWorkbook) -> kilnlog::Result<()>,
{
    let mut book = store.load()?;
    f(&mut book)?;
    store.save(&book)
}

fn init(
    store: &WorkbookStore,
    config: &Config,
    kiln: Option<String>,
    firing_id: Option<String>,
    user: Option<String>,
) -> kilnlog::Result<()> {
    let started = now();
    let kiln = kiln.unwrap_or_else(|| config.session.default_kiln.clone());
    let firing_id = firing_id.unwrap_or_else(|| FiringSession::default_firing_id(started));
    let mut session = FiringSession::new(&kiln, &firing_id, started);
    session.active_user = user.or_else(|| config.session.default_user.clone());

    let book = if store.exists() {
        let mut book = store.load()?;
        let previous = book.session.firing_id.clone();
        book.start_next_firing(session);
        println!(
            "{} {} (previous firing {}, {} archived)",
            "Started".green(),
            firing_id.bold(),
            previous,
            book.archive.len()
        );
        book
    } else {
        let mut book = FiringWorkbook::new(session);
        book.timer = StokeTimer::new(config.timer.interval_minutes);
        println!("{} {} in {}", "Started".green(), firing_id.bold(), kiln);
        book
    };

    store.save(&book)?;
    println!("   Session: {}", store.path().display());
    Ok(())
}

/// Prints the overview; returns true when a stoke alert fired
fn print_status(book: &mut FiringWorkbook) -> bool {
    let s = &book.session;
    println!("{} {}  {} {}", "Kiln:".bold(), s.kiln_name, "Firing:".bold(), s.firing_id);
    println!("{} {}  {} {}", "Phase:".bold(), s.phase.to_string().yellow(), "Logging as:".bold(), s.current_user());

    match book.log.latest() {
        Some(e) => println!(
            "{} {}F front / {}F middle / {}F back at {} ({} entries)",
            "Latest:".bold(),
            e.temp_front,
            e.temp_middle,
            e.temp_back,
            model::format_time(&e.timestamp),
            book.log.len()
        ),
        None => println!("{} no readings yet", "Latest:".bold()),
    }

    let stats = FiringStats::from_log(&book.log);
    if let Some(peak) = stats.peak_temp() {
        println!("{} {}F over {:.2} h", "Peak:".bold(), peak, stats.duration_hours());
    }

    let wood = book.wood.summary();
    println!("{} {} pieces, {} species", "Wood:".bold(), wood.total_pieces, wood.species_variety);
    println!("{} {} on roster", "Crew:".bold(), book.crew.len());
    let cones = book.cones.summary();
    println!("{} {} cones at {} positions", "Cones:".bold(), cones.total_cones, cones.positions_tracked);
    println!(
        "{} {}/{}",
        "Checklist:".bold(),
        book.checklist.checked_count(),
        SAFETY_ITEMS.len()
    );

    print_timer(&mut book.timer)
}

fn print_timer(timer: &mut StokeTimer) -> bool {
    let now = Utc::now();
    if let Some(alert) = timer.poll(now) {
        println!(
            "{} {} (due {}s ago)",
            "Timer:".bold(),
            "STOKE NOW".red().bold(),
            alert.overdue.num_seconds()
        );
        return true;
    }
    println!(
        "{} {} (every {} min)",
        "Timer:".bold(),
        timer.display(now),
        timer.interval_minutes
    );
    false
}

fn current_weather(config: &Config) -> WeatherSnapshot {
    match OpenMeteoClient::new(&config.weather) {
        Ok(client) => WeatherService::new(client).current(),
        Err(e) => {
            warn!(error = %e, "could not build weather client");
            WeatherSnapshot::fallback(&e.to_string())
        }
    }
}

fn print_weather(w: &WeatherSnapshot) {
    println!(
        "{}F, {}% humidity, {:.2} inHg, wind {} mph {}, {}",
        w.temperature_f, w.humidity_pct, w.pressure_inhg, w.wind_speed_mph, w.wind_direction, w.conditions
    );
    println!("   {}", w.note.dimmed());
}

fn log_command(store: &WorkbookStore, config: &Config, cmd: LogCommand) -> kilnlog::Result<()> {
    match cmd {
        LogCommand::Add {
            temp_front,
            readings,
            at,
            weather,
        } => {
            let snapshot = weather.then(|| current_weather(config));
            mutate(store, |book| {
                let mut entry = book.session.draft_entry(at.unwrap_or_else(now), temp_front);
                let patch = readings.into_patch();
                entry.entry_type = patch.entry_type.unwrap_or(entry.entry_type);
                entry.temp_middle = patch.temp_middle.unwrap_or(0);
                entry.temp_back = patch.temp_back.unwrap_or(0);
                entry.temp_stack = patch.temp_stack.unwrap_or(0);
                entry.atmosphere = patch.atmosphere.unwrap_or(entry.atmosphere);
                entry.damper_position = patch.damper_position.unwrap_or(entry.damper_position);
                entry.air_intake = patch.air_intake.unwrap_or(entry.air_intake);
                entry.fuel_type = patch.fuel_type.unwrap_or(entry.fuel_type);
                entry.cones = patch.cones.unwrap_or_default();
                entry.flame_color = patch.flame_color.unwrap_or_default();
                entry.spy_color = patch.spy_color.unwrap_or_default();
                entry.draft_sound = patch.draft_sound.unwrap_or_default();
                entry.action_taken = patch.action_taken.unwrap_or_default();
                entry.notes = patch.notes.unwrap_or_default();
                entry.weather = snapshot;

                let id = book.log.append(entry);
                println!("{} entry {} ({}F)", "Logged".green(), id, temp_front);
                Ok(())
            })
        }
        LogCommand::List {
            asc,
            entry_type,
            limit,
        } => {
            let book = store.load()?;
            let order = if asc { SortOrder::Ascending } else { SortOrder::Descending };
            let view = book.log.sorted_view(order);
            let entries: Vec<_> = view
                .iter()
                .filter(|e| entry_type.is_none() || entry_type == Some(e.entry_type))
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            if entries.is_empty() {
                println!("No log entries.");
                return Ok(());
            }
            println!(
                "{}",
                format!(
                    "{:>4}  {:<19}  {:<16}  {:<13}  {:>5} {:>5} {:>5}  {:<15}  {:<10}  {}",
                    "ID", "TIME", "PHASE", "TYPE", "FRONT", "MID", "BACK", "ATMOSPHERE", "BY", "NOTES"
                )
                .bold()
            );
            for e in entries {
                let edited = if e.edited_by.is_some() { "*" } else { "" };
                println!(
                    "{:>4}  {:<19}  {:<16}  {:<13}  {:>5} {:>5} {:>5}  {:<15}  {:<10}  {}{}",
                    e.id,
                    model::format_time(&e.timestamp),
                    e.phase,
                    e.entry_type,
                    e.temp_front,
                    e.temp_middle,
                    e.temp_back,
                    e.atmosphere,
                    e.logged_by,
                    e.notes,
                    edited
                );
            }
            Ok(())
        }
        LogCommand::Edit {
            id,
            front,
            at,
            readings,
        } => {
            let patch = LogEntryPatch {
                timestamp: at,
                temp_front: front,
                ..readings.into_patch()
            };
            if patch.is_empty() {
                println!("{}", "Nothing to change.".yellow());
                return Ok(());
            }
            mutate(store, |book| {
                let editor = book.session.current_user().to_string();
                if book.log.edit_by_id(id, &patch, &editor, now()) {
                    println!("{} entry {}", "Updated".green(), id);
                } else {
                    println!("{} no log entry {}", "Notice:".yellow(), id);
                }
                Ok(())
            })
        }
        LogCommand::Delete { id } => mutate(store, |book| {
            match book.log.delete_by_id(id) {
                Some(e) => println!("{} entry {} ({}F at {})", "Deleted".green(), id, e.temp_front, model::format_time(&e.timestamp)),
                None => println!("{} no log entry {}", "Notice:".yellow(), id),
            }
            Ok(())
        }),
    }
}

fn wood_command(store: &WorkbookStore, cmd: WoodCommand) -> kilnlog::Result<()> {
    match cmd {
        WoodCommand::Add {
            quantity,
            species,
            size,
            location,
            notes,
            at,
        } => mutate(store, |book| {
            let mut entry = book.session.draft_wood(at.unwrap_or_else(now), species, size, quantity, location);
            entry.notes = notes.unwrap_or_default();
            let id = book.wood.append(entry);
            println!(
                "{} {} {} {} into {} (entry {}, {} total)",
                "Burned".green(),
                quantity,
                size,
                species,
                location,
                id,
                book.wood.summary().total_pieces
            );
            Ok(())
        }),
        WoodCommand::List => {
            let book = store.load()?;
            if book.wood.is_empty() {
                println!("No wood logged.");
                return Ok(());
            }
            let totals = book.wood.running_total();
            println!(
                "{}",
                format!(
                    "{:>4}  {:<19}  {:>4}  {:<8}  {:<8}  {:<10}  {:>6}  {}",
                    "ID", "TIME", "QTY", "SPECIES", "SIZE", "LOCATION", "TOTAL", "BY"
                )
                .bold()
            );
            for (w, running) in book.wood.by_time().into_iter().zip(totals) {
                println!(
                    "{:>4}  {:<19}  {:>4}  {:<8}  {:<8}  {:<10}  {:>6}  {}",
                    w.id,
                    model::format_time(&w.time),
                    w.quantity,
                    w.species,
                    w.size,
                    w.location,
                    running.total,
                    w.logged_by
                );
            }
            let summary = book.wood.summary();
            println!("\n{} pieces, {} species", summary.total_pieces, summary.species_variety);
            Ok(())
        }
        WoodCommand::Delete { id } => mutate(store, |book| {
            match book.wood.delete_by_id(id) {
                Some(w) => println!("{} wood entry {} ({} pieces)", "Deleted".green(), id, w.quantity),
                None => println!("{} no wood entry {}", "Notice:".yellow(), id),
            }
            Ok(())
        }),
        WoodCommand::Stock(cmd) => stock_command(store, cmd),
    }
}

fn stock_command(store: &WorkbookStore, cmd: StockCommand) -> kilnlog::Result<()> {
    match cmd {
        StockCommand::Add {
            species,
            cords,
            moisture,
            location,
        } => mutate(store, |book| {
            let id = book.inventory.append(NewStockEntry {
                species,
                cords,
                moisture_pct: moisture,
                location,
            })?;
            println!(
                "{} stock entry {} ({:.2} cords on hand)",
                "Added".green(),
                id,
                book.inventory.summary().total_cords
            );
            Ok(())
        }),
        StockCommand::List => {
            let book = store.load()?;
            if book.inventory.is_empty() {
                println!("No wood in stock.");
                return Ok(());
            }
            println!(
                "{}",
                format!("{:>4}  {:<12}  {:>6}  {:>4}  {}", "ID", "SPECIES", "CORDS", "MC%", "LOCATION").bold()
            );
            for e in book.inventory.iter() {
                let mc = format!("{:>4}", e.moisture_pct);
                println!(
                    "{:>4}  {:<12}  {:>6.2}  {}  {}",
                    e.id,
                    e.species,
                    e.cords,
                    if e.is_seasoned() { mc.green() } else { mc.yellow() },
                    e.location
                );
            }
            let summary = book.inventory.summary();
            println!(
                "\n{:.2} cords, {:.2} seasoned, {} species",
                summary.total_cords, summary.seasoned_cords, summary.species_variety
            );
            Ok(())
        }
        StockCommand::Delete { id } => mutate(store, |book| {
            match book.inventory.delete_by_id(id) {
                Some(e) => println!("{} stock entry {} ({} {:.2} cords)", "Deleted".green(), id, e.species, e.cords),
                None => println!("{} no stock entry {}", "Notice:".yellow(), id),
            }
            Ok(())
        }),
    }
}

fn crew_command(store: &WorkbookStore, cmd: CrewCommand) -> kilnlog::Result<()> {
    match cmd {
        CrewCommand::Add {
            name,
            role,
            start,
            end,
            notes,
        } => mutate(store, |book| {
            let now = now();
            let id = book.crew.add(NewCrewMember {
                name: name.clone(),
                role,
                shift_start: start.unwrap_or_else(|| now.time()),
                shift_end: end,
                notes: notes.unwrap_or_default(),
                added_by: book.session.current_user().to_string(),
                date: now.date(),
            });
            println!("{} {} as {} (id {})", "Added".green(), name.bold(), role, id);
            Ok(())
        }),
        CrewCommand::List { now: on_shift } => {
            let book = store.load()?;
            let clock = now().time();
            let members: Vec<_> = if on_shift {
                book.crew.on_shift_at(clock).collect()
            } else {
                book.crew.iter().collect()
            };
            if members.is_empty() {
                println!("No crew.");
                return Ok(());
            }
            println!(
                "{}",
                format!("{:>4}  {:<16}  {:<8}  {:<13}  {}", "ID", "NAME", "ROLE", "SHIFT", "NOTES").bold()
            );
            for m in members {
                let shift = format!(
                    "{}-{}",
                    m.shift_start.format("%H:%M"),
                    m.shift_end.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
                );
                let name = if m.on_shift_at(clock) {
                    m.name.green().to_string()
                } else {
                    m.name.clone()
                };
                println!("{:>4}  {:<16}  {:<8}  {:<13}  {}", m.id, name, m.role, shift, m.notes);
            }
            Ok(())
        }
        CrewCommand::Remove { id } => mutate(store, |book| {
            match book.crew.remove_by_id(id) {
                Some(m) => println!("{} {} from the roster", "Removed".green(), m.name),
                None => println!("{} no crew member {}", "Notice:".yellow(), id),
            }
            Ok(())
        }),
    }
}

fn cone_command(store: &WorkbookStore, cmd: ConeCommand) -> kilnlog::Result<()> {
    match cmd {
        ConeCommand::Set {
            position,
            cone,
            status,
        } => {
            let pos = parse_position(&position)?;
            mutate(store, |book| {
                book.cones.upsert(pos, &cone, status, now());
                println!("{} cone {} at {}: {}", "Set".green(), cone, pos, status);
                Ok(())
            })
        }
        ConeCommand::Remove { position, cone } => {
            let pos = parse_position(&position)?;
            mutate(store, |book| {
                match book.cones.remove_cone(pos, &cone, now()) {
                    Some(_) => println!("{} cone {} from {}", "Removed".green(), cone, pos),
                    None => println!("{} no cone {} at {}", "Notice:".yellow(), cone, pos),
                }
                Ok(())
            })
        }
        ConeCommand::Clear { position } => {
            let pos = parse_position(&position)?;
            mutate(store, |book| {
                book.cones.clear(pos);
                println!("{} {}", "Cleared".green(), pos);
                Ok(())
            })
        }
        ConeCommand::Show => {
            let book = store.load()?;
            print_cone_map(&book);
            Ok(())
        }
    }
}

fn print_cone_map(book: &FiringWorkbook) {
    let overlay = book.cones.severity_overlay();
    print!("     ");
    for col in 0..COLS {
        print!(" C{:<3}", col + 1);
    }
    println!();
    for (row, cells) in overlay.iter().enumerate() {
        print!("R{:<3} ", row + 1);
        for score in cells {
            let cell = match score {
                None => "  . ".dimmed(),
                Some(s) if *s >= 2.5 => format!(" {:.1}", s).red(),
                Some(s) if *s >= 1.5 => format!(" {:.1}", s).yellow(),
                Some(s) => format!(" {:.1}", s).green(),
            };
            print!("{} ", cell);
        }
        println!();
    }

    let summary = book.cones.summary();
    let tiers = book.cones.tier_counts();
    println!(
        "\n{} cones at {} positions ({} low, {} mid, {} high)",
        summary.total_cones, summary.positions_tracked, tiers.low, tiers.mid, tiers.high
    );
    for (pos, cell) in book.cones.occupied() {
        let cones: Vec<String> = cell
            .cones
            .iter()
            .map(|(label, status)| {
                let text = format!("{} {}", label, status);
                match classify(*status) {
                    SeverityTier::Low => text.green().to_string(),
                    SeverityTier::Mid => text.yellow().to_string(),
                    SeverityTier::High => text.red().to_string(),
                }
            })
            .collect();
        println!("  {:<5} {}", pos.to_string(), cones.join(", "));
    }
}

fn timer_command(store: &WorkbookStore, cmd: TimerCommand) -> kilnlog::Result<()> {
    match cmd {
        TimerCommand::Start { minutes } => mutate(store, |book| {
            let deadline = book.timer.start(Utc::now(), minutes);
            println!(
                "{} {} min, stoke at {}",
                "Timer started:".green(),
                book.timer.interval_minutes,
                deadline.with_timezone(&Local).format("%H:%M:%S")
            );
            Ok(())
        }),
        TimerCommand::Stop => mutate(store, |book| {
            book.timer.stop();
            println!("{}", "Timer stopped".green());
            Ok(())
        }),
        TimerCommand::Show => {
            let mut book = store.load()?;
            if print_timer(&mut book.timer) {
                store.save(&book)?;
            }
            Ok(())
        }
    }
}

fn checklist_command(store: &WorkbookStore, cmd: ChecklistCommand) -> kilnlog::Result<()> {
    match cmd {
        ChecklistCommand::Show => {
            let book = store.load()?;
            for (i, item) in book.checklist.items().iter().enumerate() {
                let mark = if item.checked { "[x]".green() } else { "[ ]".normal() };
                let by = match (&item.checked_by, item.checked_at) {
                    (Some(by), Some(at)) => format!(" ({}, {})", by, model::format_time(&at)),
                    _ => String::new(),
                };
                println!("{} {}. {}{}", mark, i + 1, item.label, by.dimmed());
            }
            if book.checklist.completed() {
                println!("{}", "All safety checks complete".green().bold());
            }
            Ok(())
        }
        ChecklistCommand::Check { item } => mutate(store, |book| {
            let by = book.session.current_user().to_string();
            if book.checklist.check(usize::from(item) - 1, &by, now()) {
                println!(
                    "{} {}/{}",
                    "Checked".green(),
                    book.checklist.checked_count(),
                    SAFETY_ITEMS.len()
                );
            } else {
                println!("{} no checklist item {}", "Notice:".yellow(), item);
            }
            Ok(())
        }),
        ChecklistCommand::Uncheck { item } => mutate(store, |book| {
            if book.checklist.uncheck(usize::from(item) - 1) {
                println!("{} item {}", "Unchecked".green(), item);
            } else {
                println!("{} no checklist item {}", "Notice:".yellow(), item);
            }
            Ok(())
        }),
    }
}

fn archive_command(store: &WorkbookStore, config: &Config, cmd: ArchiveCommand) -> kilnlog::Result<()> {
    match cmd {
        ArchiveCommand::Save => mutate(store, |book| {
            let id = book.archive.save_current(&book.session, &book.log, now());
            println!(
                "{} {} ({} entries) as {}",
                "Archived".green(),
                book.session.firing_id,
                book.log.len(),
                id
            );
            Ok(())
        }),
        ArchiveCommand::Import { path, name } => {
            let file = std::fs::File::open(&path)?;
            let source_name = name.unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            });
            mutate(store, |book| {
                let id = book.archive.import_csv(file, &source_name, now())?;
                if let Some(firing) = book.archive.find(&id.to_string()) {
                    let usable = firing.comparable_rows().count();
                    println!(
                        "{} {} ({} rows, {} with a front temperature) as {}",
                        "Imported".green(),
                        firing.firing_id,
                        firing.log_data.len(),
                        usable,
                        firing.short_id()
                    );
                }
                Ok(())
            })
        }
        ArchiveCommand::List => {
            let book = store.load()?;
            if book.archive.is_empty() {
                println!("No archived firings.");
                return Ok(());
            }
            println!(
                "{}",
                format!(
                    "{:<8}  {:<16}  {:<10}  {:<8}  {:>5}  {:>6}  {:>8}  {}",
                    "ID", "FIRING", "KILN", "SOURCE", "ROWS", "PEAK", "HOURS", "ARCHIVED"
                )
                .bold()
            );
            for f in book.archive.iter() {
                let stats = FiringStats::from_records(&f.log_data);
                println!(
                    "{:<8}  {:<16}  {:<10}  {:<8}  {:>5}  {:>6}  {:>8.2}  {}",
                    f.short_id(),
                    f.firing_id,
                    f.kiln.as_deref().unwrap_or("-"),
                    f.source,
                    f.log_data.len(),
                    stats.peak_temp().map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
                    stats.duration_hours(),
                    model::format_time(&f.archived_at)
                );
            }
            Ok(())
        }
        ArchiveCommand::Compare { firing, tolerance } => {
            let book = store.load()?;
            let past = book
                .archive
                .find(&firing)
                .ok_or_else(|| KilnError::ArchiveNotFound(firing.clone()))?;
            let tolerance = tolerance.unwrap_or(config.matching.tolerance_f);
            let comparison = matcher::compare(&book.log, past, tolerance);

            let Some(current) = comparison.current_temp else {
                println!("No readings yet in {}; nothing to compare.", book.session.firing_id);
                return Ok(());
            };
            println!(
                "{} {}F now, within {}F in {}:",
                "Compare:".bold(),
                current,
                tolerance,
                past.firing_id
            );
            if comparison.matches.is_empty() {
                println!("  no similar readings");
                return Ok(());
            }
            let offset = comparison.alignment.as_ref().map(|a| a.offset);
            for row in comparison.matches {
                let time = row.time();
                let aligned = match (time, offset) {
                    (Some(t), Some(off)) => format!(" -> {}", model::format_time(&(t + off))),
                    _ => String::new(),
                };
                println!(
                    "  {:>5}F  {}{}  {}  {}",
                    row.temp_front().unwrap_or_default(),
                    time.map(|t| model::format_time(&t)).unwrap_or_else(|| "-".to_string()),
                    aligned.dimmed(),
                    row.get("atmosphere").unwrap_or(""),
                    row.get("notes").unwrap_or("")
                );
            }
            Ok(())
        }
    }
}

fn export(store: &WorkbookStore, target: ExportTarget, output: Option<PathBuf>) -> kilnlog::Result<()> {
    let book = store.load()?;
    let kind = match target {
        ExportTarget::FiringLog => ExportKind::FiringLog,
        ExportTarget::Wood => ExportKind::Wood,
        ExportTarget::Inventory => ExportKind::Inventory,
        ExportTarget::Crew => ExportKind::Crew,
        ExportTarget::ConeMap => ExportKind::ConeMap,
        ExportTarget::Summary => ExportKind::Summary,
        ExportTarget::All => {
            let dir = output.unwrap_or_else(|| PathBuf::from("."));
            for path in kilnlog::export::write_all(&dir, &book)? {
                println!("{} {}", "Wrote".green(), path.display());
            }
            return Ok(());
        }
    };

    let table = kind.table(&book);
    match output {
        Some(path) => {
            table.save(&path)?;
            println!("{} {} ({} rows)", "Wrote".green(), path.display(), table.len());
        }
        None => table.write_csv(io::stdout().lock())?,
    }
    Ok(())
}
