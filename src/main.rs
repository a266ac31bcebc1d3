use iced::widget::{button, column, container, row, scrollable, text};
use iced::{event, keyboard, mouse, task, window};
use iced::{Alignment, Element, Event, Length, Point, Subscription, Task, Theme};
use iced::futures::channel::mpsc;
use iced::time::Instant;
use iced_aw::Wrap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod fetch;
mod player;
mod ui;

use config::PhotoWallConfig;
use fetch::{FetchSession, HttpTransport, PhotoFetchPipeline, PipelineState};
use player::{FlatGroundBody, LookAndMoveController};
use ui::hud::InputState;
use ui::tile::{Tile, TileSurface, TileUpdate};

/// Controller tick interval (~60 Hz)
const TICK: Duration = Duration::from_millis(16);

/// Longest step fed to the controller, so a stalled window doesn't teleport
const MAX_STEP: f32 = 0.1;

/// How a fetch cycle ended, once all of its downloads are done
#[derive(Debug, Clone)]
struct CycleSummary {
    state: PipelineState,
    applied: usize,
    failed: usize,
}

/// Main application state
struct PhotoWall {
    config: PhotoWallConfig,
    transport: Arc<HttpTransport>,
    /// Surfaces handed to the pipeline; the wall owns them
    surfaces: Vec<Arc<TileSurface>>,
    tiles: Vec<Tile>,
    /// Status message to display to the user
    status: String,
    /// Running fetch cycle; dropping it aborts the cycle and its downloads
    fetch: Option<task::Handle>,
    controller: LookAndMoveController,
    body: FlatGroundBody,
    input: InputState,
    last_tick: Option<Instant>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Refresh" button
    Refresh,
    /// A download finished and its tile has a new image
    TileUpdated(TileUpdate),
    /// Background fetch cycle finished with results
    CycleFinished(CycleSummary),
    Tick(Instant),
    KeyChanged(keyboard::Key, bool),
    CursorMoved(Point),
}

impl PhotoWall {
    /// Create a new instance of the application and kick off the first fetch
    fn new() -> (Self, Task<Message>) {
        let config = PhotoWallConfig::load().unwrap_or_else(|err| {
            error!("⚠️  {}; falling back to defaults", err);
            PhotoWallConfig::default()
        });

        info!(
            "🎨 Photo Wall initialized with {} tiles for {:?}",
            config.surface_count, config.query
        );

        let (sender, receiver) = mpsc::unbounded();
        let surfaces = (0..config.surface_count)
            .map(|index| Arc::new(TileSurface::new(index, sender.clone())))
            .collect();
        let tiles = vec![Tile::default(); config.surface_count];

        let mut wall = PhotoWall {
            config,
            transport: Arc::new(HttpTransport::new()),
            surfaces,
            tiles,
            status: String::from("Ready."),
            fetch: None,
            controller: LookAndMoveController::default(),
            body: FlatGroundBody::default(),
            input: InputState::default(),
            last_tick: None,
        };

        let fetch = wall.start_fetch();
        (wall, Task::batch([Task::run(receiver, Message::TileUpdated), fetch]))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Refresh => self.start_fetch(),
            Message::TileUpdated(update) => {
                if let Some(tile) = self.tiles.get_mut(update.index) {
                    debug!(
                        "Tile {} replaces {:?} with {}",
                        update.index + 1,
                        tile.photo_id(),
                        update.photo_id
                    );
                    tile.apply(update);
                }
                Task::none()
            }
            Message::CycleFinished(summary) => {
                self.fetch = None;
                self.status = describe_cycle(&summary);
                info!("📊 Fetch cycle summary: {}", self.status);
                Task::none()
            }
            Message::Tick(now) => {
                let dt = self
                    .last_tick
                    .map(|last| now.duration_since(last).as_secs_f32().min(MAX_STEP))
                    .unwrap_or(0.0);
                self.last_tick = Some(now);

                let frame = self.input.take_frame();
                self.controller.tick(&mut self.body, frame, dt);
                Task::none()
            }
            Message::KeyChanged(key, pressed) => {
                self.input.key_changed(&key, pressed);
                Task::none()
            }
            Message::CursorMoved(position) => {
                self.input.cursor_moved(position);
                Task::none()
            }
        }
    }

    /// Start a fetch cycle unless one is already running
    fn start_fetch(&mut self) -> Task<Message> {
        if self.fetch.is_some() {
            warn!("Refresh ignored: a fetch cycle is still running");
            self.status = String::from("A refresh is already in progress.");
            return Task::none();
        }

        let session = FetchSession::new(
            &self.surfaces,
            self.config.query.as_str(),
            self.config.access_key.as_str(),
        )
        .with_provider_url(self.config.provider_url.as_str())
        .with_image_size(self.config.image_size);

        self.status = format!(
            "Fetching {} photos for \"{}\"...",
            self.surfaces.len(),
            self.config.query
        );

        let (task, handle) = Task::perform(
            run_fetch_cycle(Arc::clone(&self.transport), session),
            Message::CycleFinished,
        )
        .abortable();
        self.fetch = Some(handle.abort_on_drop());
        task
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = row![
            text("Photo Wall").size(32),
            button("Refresh")
                .on_press_maybe(self.fetch.is_none().then_some(Message::Refresh))
                .padding(10),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let tiles: Vec<Element<Message>> = self.tiles.iter().map(Tile::view).collect();
        let wall = Wrap::with_elements(tiles).spacing(12.0).line_spacing(12.0);

        let content = column![
            header,
            text(&self.status).size(16),
            scrollable(wall).height(Length::Fill),
            text(ui::hud::describe(&self.controller, &self.body)).size(14),
        ]
        .spacing(20)
        .padding(40);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(TICK).map(Message::Tick),
            event::listen_with(input_event),
        ])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Keyboard and pointer events the controller cares about
fn input_event(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => {
            Some(Message::KeyChanged(key, true))
        }
        Event::Keyboard(keyboard::Event::KeyReleased { key, .. }) => {
            Some(Message::KeyChanged(key, false))
        }
        Event::Mouse(mouse::Event::CursorMoved { position }) => Some(Message::CursorMoved(position)),
        _ => None,
    }
}

fn describe_cycle(summary: &CycleSummary) -> String {
    let at = chrono::Local::now().format("%H:%M:%S");
    match &summary.state {
        PipelineState::Completed { spawned } if summary.failed == 0 => {
            format!("✅ Applied {} of {} photos at {}.", summary.applied, spawned, at)
        }
        PipelineState::Completed { spawned } => format!(
            "⚠️  Applied {} of {} photos at {}; {} failed (see log).",
            summary.applied, spawned, at, summary.failed
        ),
        PipelineState::Aborted(err) => format!("❌ Fetch aborted at {}: {}", at, err),
        other => format!("Fetch stopped in state {:?} at {}", other, at),
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("photo_wall=info")),
        )
        .init();

    iced::application("Photo Wall", PhotoWall::update, PhotoWall::view)
        .subscription(PhotoWall::subscription)
        .theme(PhotoWall::theme)
        .centered()
        .run_with(PhotoWall::new)
}

/// Run one fetch cycle and wait for all of its downloads
/// Runs in the background so the window stays responsive
async fn run_fetch_cycle(transport: Arc<HttpTransport>, session: FetchSession) -> CycleSummary {
    let mut pipeline = PhotoFetchPipeline::new(transport, session);

    pipeline.start().await;
    let outcomes = pipeline.wait_downloads().await;
    let applied = outcomes.iter().filter(|o| o.result.is_ok()).count();

    CycleSummary {
        state: pipeline.state().clone(),
        applied,
        failed: outcomes.len() - applied,
    }
}
