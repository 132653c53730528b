use std::path::{Path, PathBuf};
use std::sync::Arc;

use caption_studio::config::StudioConfig;
use caption_studio::services::export::{self, ExportFormat};
use caption_studio::services::session::{Session, SessionError};
use caption_studio::storage::{DirAssetStore, DirSnapshotStore, ProjectStorage, StorageError};
use canvas::doc::{TextAlign, TextPatch};
use canvas::engine::{Action, EngineCore};
use canvas::geometry::Point;
use canvas::hit::{ResizeAnchor, element_client_rect};
use canvas::input::PointerTarget;
use canvas::presets::StylePreset;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("export error: {0}")]
    Export(#[from] export::ExportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no text element with id `{0}`")]
    UnknownElement(String),
    #[error("pointer at ({x}, {y}) did not land on `{id}`")]
    MissedTarget { id: String, x: f64, y: f64 },
    #[error("resize of `{0}` was rejected (box would be under the minimum size)")]
    ResizeRejected(String),
    #[error("cannot tell the image type of {0}; pass --mime")]
    UnknownImageType(PathBuf),
}

#[derive(Parser, Debug)]
#[command(name = "caption-studio", about = "Caption-over-image design editor")]
struct Cli {
    #[arg(long, env = "STUDIO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[arg(long, env = "STUDIO_NAMESPACE")]
    namespace: Option<String>,

    #[arg(long, env = "STUDIO_FONT_PATH", help = "TrueType/OpenType font for measuring and export")]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current project snapshot.
    Show,
    /// Start a new blank project.
    New,
    /// Append a text element and print its id.
    AddText {
        #[arg(long)]
        text: Option<String>,
    },
    /// Replace an element's text through the edit prompt.
    EditText { id: String, text: String },
    Delete { id: String },
    Preset { id: String, preset: Preset },
    Align { id: String, align: Align },
    /// Turn fit-to-canvas on or off.
    Fit {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Drag an element by its center, snapping to the canvas center lines.
    Drag {
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        dx: f64,
        #[arg(long, allow_hyphen_values = true)]
        dy: f64,
        #[arg(long, default_value_t = 8)]
        steps: u32,
    },
    /// Drag a corner handle so the box scales by `scale` about the opposite corner.
    Resize {
        id: String,
        #[arg(long, value_enum, default_value_t = Corner::BottomRight)]
        corner: Corner,
        #[arg(long)]
        scale: f64,
    },
    SetBackground {
        path: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },
    ClearBackground,
    /// Remove the background and every text element.
    Reset,
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Png)]
        format: ExportFormat,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Plain,
    Outlined,
    WhiteBadge,
    BlackBadge,
}

impl From<Preset> for StylePreset {
    fn from(p: Preset) -> Self {
        match p {
            Preset::Plain => Self::Plain,
            Preset::Outlined => Self::Outlined,
            Preset::WhiteBadge => Self::WhiteBadge,
            Preset::BlackBadge => Self::BlackBadge,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Align {
    Left,
    Center,
    Right,
}

impl From<Align> for TextAlign {
    fn from(a: Align) -> Self {
        match a {
            Align::Left => Self::Left,
            Align::Center => Self::Center,
            Align::Right => Self::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl From<Corner> for ResizeAnchor {
    fn from(c: Corner) -> Self {
        match c {
            Corner::TopLeft => Self::TopLeft,
            Corner::TopRight => Self::TopRight,
            Corner::BottomLeft => Self::BottomLeft,
            Corner::BottomRight => Self::BottomRight,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = StudioConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    if let Some(font) = cli.font {
        config.font_path = Some(font);
    }

    let mut session = open_session(&config).await?;
    let result = run(&mut session, cli.command).await;
    settle(result, session.teardown())
}

/// The command's error wins; a teardown failure is logged and only
/// surfaces when the command itself succeeded.
fn settle(result: Result<(), CliError>, teardown: Result<(), SessionError>) -> Result<(), CliError> {
    match (result, teardown) {
        (result, Ok(())) => result,
        (Ok(()), Err(e)) => {
            error!(error = %e, "session teardown failed");
            Err(e.into())
        }
        (Err(command), Err(e)) => {
            error!(error = %e, "session teardown failed");
            Err(command)
        }
    }
}

async fn open_session(config: &StudioConfig) -> Result<Session, CliError> {
    let snapshots = Arc::new(DirSnapshotStore::open(config.snapshot_dir())?);
    let assets = Arc::new(DirAssetStore::open(config.asset_dir()).await?);
    let font = match &config.font_path {
        Some(path) => Some(export::load_font(path).await?),
        None => None,
    };
    let storage = ProjectStorage::new(config.namespace.clone(), snapshots);
    let mut session = Session::new(storage, assets, config.autosave_debounce, font);
    session.open().await?;
    info!(data_dir = %config.data_dir.display(), project_id = %session.project().id, "session ready");
    Ok(session)
}

async fn run(session: &mut Session, command: Command) -> Result<(), CliError> {
    match command {
        Command::Show => print_json(session.project()),
        Command::New => {
            let id = session.open_new()?;
            println!("{id}");
            Ok(())
        }
        Command::AddText { text } => {
            let actions = session.edit(EngineCore::add_text);
            let Some(id) = added_id(&actions) else {
                return Ok(());
            };
            if let Some(text) = text {
                session.edit(|core| core.update_text(&id, TextPatch::text(text)));
            }
            println!("{id}");
            Ok(())
        }
        Command::EditText { id, text } => {
            require(session, &id)?;
            session.edit(|core| {
                core.on_double_activate(&id);
                core.commit_edit(Some(text))
            });
            print_element(session, &id)
        }
        Command::Delete { id } => {
            require(session, &id)?;
            session.edit(|core| core.delete_text(&id));
            Ok(())
        }
        Command::Preset { id, preset } => {
            require(session, &id)?;
            session.edit(|core| core.apply_preset(&id, preset.into()));
            print_element(session, &id)
        }
        Command::Align { id, align } => {
            require(session, &id)?;
            session.edit(|core| core.set_align(&id, align.into()));
            print_element(session, &id)
        }
        Command::Fit { id, enabled } => {
            require(session, &id)?;
            session.edit(|core| core.set_fit_to_canvas(&id, enabled));
            print_element(session, &id)
        }
        Command::Drag { id, dx, dy, steps } => {
            drag(session, &id, dx, dy, steps.max(1))?;
            print_element(session, &id)
        }
        Command::Resize { id, corner, scale } => {
            resize(session, &id, corner.into(), scale)?;
            print_element(session, &id)
        }
        Command::SetBackground { path, mime } => {
            let mime = match mime {
                Some(mime) => mime,
                None => guess_mime(&path)?,
            };
            let bytes = tokio::fs::read(&path).await?;
            session.upload_background(bytes, &mime).await?;
            print_json(&session.project().background_image)
        }
        Command::ClearBackground => {
            session.clear_background().await?;
            Ok(())
        }
        Command::Reset => {
            session.reset().await?;
            Ok(())
        }
        Command::Export { format, out_dir } => {
            let out = session.export(format)?;
            let path = out_dir.join(&out.file_name);
            tokio::fs::write(&path, &out.bytes).await?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn added_id(actions: &[Action]) -> Option<String> {
    actions.iter().find_map(|action| match action {
        Action::TextAdded(el) => Some(el.id.clone()),
        _ => None,
    })
}

fn require(session: &Session, id: &str) -> Result<(), CliError> {
    match session.core().text(id) {
        Some(_) => Ok(()),
        None => Err(CliError::UnknownElement(id.to_owned())),
    }
}

/// Press at the element's center and move in `steps` increments.
fn drag(session: &mut Session, id: &str, dx: f64, dy: f64, steps: u32) -> Result<(), CliError> {
    let core = session.core();
    let el = core.text(id).ok_or_else(|| CliError::UnknownElement(id.to_owned()))?;
    let start = element_client_rect(el, core.project().width, core.measure()).center();
    let target = core.pointer_target(start);
    if target != PointerTarget::Element(id.to_owned()) {
        return Err(CliError::MissedTarget { id: id.to_owned(), x: start.x, y: start.y });
    }

    let end = Point::new(start.x + dx, start.y + dy);
    session.edit(|core| {
        let mut actions = core.on_pointer_down(target, start);
        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            actions.extend(core.on_pointer_move(Point::new(start.x + dx * t, start.y + dy * t)));
        }
        actions.extend(core.on_pointer_up(end));
        actions
    });
    Ok(())
}

/// Select the element, then drag `anchor` along the diagonal.
fn resize(session: &mut Session, id: &str, anchor: ResizeAnchor, scale: f64) -> Result<(), CliError> {
    require(session, id)?;
    session.edit(|core| core.select(Some(id.to_owned())));

    let core = session.core();
    let el = core.text(id).ok_or_else(|| CliError::UnknownElement(id.to_owned()))?;
    let rect = element_client_rect(el, core.project().width, core.measure());
    let grab = anchor.corner(&rect);
    let fixed = anchor.opposite().corner(&rect);
    let target = core.pointer_target(grab);
    if target != PointerTarget::Handle(id.to_owned(), anchor) {
        return Err(CliError::MissedTarget { id: id.to_owned(), x: grab.x, y: grab.y });
    }

    let release = Point::new(fixed.x + (grab.x - fixed.x) * scale, fixed.y + (grab.y - fixed.y) * scale);
    let before = el.font_size;
    let actions = session.edit(|core| {
        let mut actions = core.on_pointer_down(target, grab);
        actions.extend(core.on_pointer_move(release));
        actions.extend(core.on_pointer_up(release));
        actions
    });
    let committed = actions.iter().any(|a| matches!(a, Action::TextUpdated { id: updated, .. } if updated == id));
    if !committed {
        return Err(CliError::ResizeRejected(id.to_owned()));
    }
    info!(id, from = before, to = session.core().text(id).map_or(before, |el| el.font_size), "resized");
    Ok(())
}

fn guess_mime(path: &Path) -> Result<String, CliError> {
    match image::ImageFormat::from_path(path) {
        Ok(format) => Ok(format.to_mime_type().to_owned()),
        Err(_) => Err(CliError::UnknownImageType(path.to_path_buf())),
    }
}

fn print_element(session: &Session, id: &str) -> Result<(), CliError> {
    match session.core().text(id) {
        Some(el) => print_json(el),
        None => Err(CliError::UnknownElement(id.to_owned())),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
