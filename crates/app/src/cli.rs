//! Command line front end over the local map database

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use stallmap_core::{
    Error, GridSpec, LayoutModel, MapLayout, MatchedLayout, Point, PointerButton, Result,
    StallRecord, StallSize,
};
use tracing::info;

use crate::service::MapService;
use crate::session::{SessionState, ViewSession};
use crate::state::AppState;
use crate::viewmodel::{
    DesignController, DesignEvent, DesignState, Effect, ViewerEvent, ViewerNotice, ViewerState,
};

#[derive(Debug, Parser)]
#[command(
    name = "stallmap",
    about = "Exhibition stall map designer and viewer",
    version
)]
pub struct Cli {
    /// Data directory holding stallmap.db and stallmap.toml
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Save a layout JSON file as the latest map.
    Import { file: PathBuf },

    /// Print the latest saved layout as JSON.
    Export,

    /// Add a grid of stalls to a hall, creating the hall if needed.
    #[command(name = "add-grid")]
    AddGrid {
        hall: String,
        #[arg(long, default_value_t = 3)]
        rows: u32,
        #[arg(long, default_value_t = 8)]
        cols: u32,
        /// Code prefix; defaults to the hall's letter
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long, default_value = "SMALL")]
        size: String,
    },

    /// Load the map and records and print every stall.
    Show {
        /// Click these stalls on the visitor map before printing
        #[arg(long = "select")]
        select: Vec<String>,
    },

    /// Print the authoritative stall records.
    Records,

    /// Mark a stall record reserved.
    Reserve { name: String },

    /// Replace the genre tags of a stall record.
    Genres {
        name: String,
        #[arg(required = true)]
        genres: Vec<String>,
    },

    /// Release every reservation.
    #[command(name = "release-all")]
    ReleaseAll,

    /// Forget every saved layout version. Records are kept.
    Reset,

    /// Print what the database holds.
    Status,
}

pub async fn run(cli: Cli) -> Result<()> {
    let state = match cli.data_dir {
        Some(dir) => AppState::open(dir)?,
        None => AppState::new()?,
    };

    match cli.command {
        Commands::Import { file } => import(&state, file).await,
        Commands::Export => export(&state).await,
        Commands::AddGrid {
            hall,
            rows,
            cols,
            prefix,
            size,
        } => {
            let spec = GridSpec::new(prefix, rows, cols, StallSize::from(size));
            add_grid(&state, hall, spec).await
        }
        Commands::Show { select } => show(&state, &select).await,
        Commands::Records => records(&state).await,
        Commands::Reserve { name } => {
            if state.service().reserve(&name).await? {
                println!("Reserved {}", name);
                Ok(())
            } else {
                Err(unknown_record(&name))
            }
        }
        Commands::Genres { name, genres } => {
            if state.service().set_genres(&name, genres).await? {
                println!("Updated genres of {}", name);
                Ok(())
            } else {
                Err(unknown_record(&name))
            }
        }
        Commands::ReleaseAll => {
            let released = state.service().release_all().await?;
            println!("Released {} reservations", released);
            Ok(())
        }
        Commands::Reset => {
            let removed = state.service().reset_map().await?;
            println!("Removed {} layout versions", removed);
            Ok(())
        }
        Commands::Status => {
            let status = state.service().status().await?;
            println!("Data directory   {}", state.data_dir().display());
            println!("Schema version   {}", status.schema_version);
            println!("Layout versions  {}", status.layout_versions);
            println!("Stall records    {} ({} reserved)", status.records, status.reserved);
            Ok(())
        }
    }
}

fn unknown_record(name: &str) -> Error {
    Error::InvalidOperation(format!("No stall record named '{}'", name))
}

async fn import(state: &AppState, file: PathBuf) -> Result<()> {
    let json = std::fs::read_to_string(&file)?;
    let layout = MapLayout::from_json(&json)?;
    let report = state.service().save_map_layout(&layout).await?;
    info!(file = %file.display(), "Imported layout");
    println!(
        "Saved {} stalls: {} records created, {} updated, {} skipped",
        layout.stall_count(),
        report.created,
        report.updated,
        report.skipped
    );
    Ok(())
}

async fn export(state: &AppState) -> Result<()> {
    match state.service().fetch_map_layout().await? {
        Some(layout) => println!("{}", serde_json::to_string_pretty(&layout)?),
        None => println!("No map has been saved yet"),
    }
    Ok(())
}

async fn add_grid(state: &AppState, hall: String, spec: GridSpec) -> Result<()> {
    let service = state.service();
    let layout = match service.fetch_map_layout().await? {
        Some(layout) => LayoutModel::from_layout(&layout)?,
        None => LayoutModel::new(),
    };

    let controller = DesignController::new(state.config.clone());
    let mut design = controller.initial_state(layout);
    if design.layout.find_hall_by_name(&hall).is_none() {
        design = apply(&controller, &design, DesignEvent::AddHall(hall.clone()))?;
    }
    design = apply(
        &controller,
        &design,
        DesignEvent::AddGrid {
            hall_name: hall,
            spec,
        },
    )?;

    let report = service.save_map_layout(&design.prepare_save()?).await?;
    println!(
        "Map now has {} stalls ({} records created)",
        design.layout.stall_count(),
        report.created
    );
    Ok(())
}

fn apply(
    controller: &DesignController,
    state: &DesignState,
    event: DesignEvent,
) -> Result<DesignState> {
    let transition = controller.handle(state, event);
    for effect in &transition.effects {
        if let Effect::Failed(message) = effect {
            return Err(Error::InvalidOperation(message.clone()));
        }
    }
    Ok(transition.state)
}

async fn show(state: &AppState, select: &[String]) -> Result<()> {
    let mut session = ViewSession::new(Arc::new(state.service()), state.config.matcher());
    if session.load().await == SessionState::NotConfigured {
        println!("Stall map is not configured yet");
        return Ok(());
    }
    let Some(matched) = session.matched() else {
        return Ok(());
    };

    let mut viewer = ViewerState::new(&state.config, 0);
    for name in select {
        match click_record(&mut viewer, matched, session.records(), name) {
            Some(notice) => println!("{}", describe(&notice)),
            None => println!("{} is not on the map", name),
        }
    }
    if !select.is_empty() {
        println!("{} more stalls can be selected", viewer.cart.remaining());
    }

    let scene = session.scene(&viewer);
    for hall in &matched.halls {
        println!("{}", hall.name);
        for stall in &hall.stalls {
            let status = match stall.record() {
                None => "not available",
                Some(record) if record.reserved => "reserved",
                Some(record) if viewer.cart.contains(&record.id) => "selected",
                Some(_) => "free",
            };
            println!(
                "  {:<8} {:<7} ({:>6.1}, {:>6.1})  {}",
                stall.display_id(),
                stall.effective_size().as_str(),
                stall.stall.x,
                stall.stall.y,
                status
            );
        }
    }
    println!(
        "{} stalls drawn, {} matched, {} without a record",
        scene.sprites().len(),
        matched.matched,
        matched.virtual_count
    );
    Ok(())
}

/// Press and release the primary button on the centre of a record's stall.
/// `None` when no record by that name is drawn on the map.
fn click_record(
    viewer: &mut ViewerState,
    matched: &MatchedLayout,
    records: &[StallRecord],
    name: &str,
) -> Option<ViewerNotice> {
    let record = records.iter().find(|r| r.name.eq_ignore_ascii_case(name))?;
    let stall = &matched.find_by_record(&record.id)?.stall;
    let centre = stall.position() + Point::new(stall.width / 2.0, stall.height / 2.0);
    let screen = viewer.viewport.to_screen(centre);

    viewer.handle(
        ViewerEvent::PointerDown {
            screen,
            button: PointerButton::Primary,
            modifier: false,
        },
        Some(matched),
    );
    viewer.handle(ViewerEvent::PointerUp { screen }, Some(matched))
}

fn describe(notice: &ViewerNotice) -> String {
    match notice {
        ViewerNotice::Selected(record) => format!("Selected {}", record.name),
        ViewerNotice::Deselected(record) => format!("Deselected {}", record.name),
        ViewerNotice::NotAvailable(id) => format!("{} is not available", id),
        ViewerNotice::AlreadyReserved(name) => format!("{} is already reserved", name),
        ViewerNotice::LimitReached { limit, existing } => format!(
            "Selection limit of {} reached ({} already reserved)",
            limit, existing
        ),
    }
}

async fn records(state: &AppState) -> Result<()> {
    for record in state.service().fetch_stall_records().await? {
        println!(
            "{:<8} {:<7} {}{}",
            record.name,
            record.size.as_str(),
            if record.reserved { "reserved" } else { "free" },
            match record.genre_list() {
                genres if genres.is_empty() => String::new(),
                genres => format!("  [{}]", genres.join(", ")),
            }
        );
    }
    Ok(())
}
