//! Photo tiles: the wall's target surfaces
//!
//! Downloads finish on tokio tasks, but iced state lives on the UI side, so
//! a `TileSurface` forwards each new image over a channel and the app
//! applies it to the matching `Tile` in `update`.

use iced::futures::channel::mpsc::UnboundedSender;
use iced::widget::image::Handle;
use iced::widget::{column, container, image, text};
use iced::{ContentFit, Element, Length};
use tracing::warn;

use crate::fetch::{SurfaceImage, TargetSurface};
use crate::Message;

/// Display size of one tile
const TILE_WIDTH: f32 = 240.0;
const TILE_HEIGHT: f32 = 160.0;

/// A new image for the tile at `index`
#[derive(Debug, Clone)]
pub struct TileUpdate {
    pub index: usize,
    pub photo_id: String,
    pub caption: String,
    pub handle: Handle,
}

/// Surface handle given to the fetch pipeline for one tile
#[derive(Debug)]
pub struct TileSurface {
    index: usize,
    sender: UnboundedSender<TileUpdate>,
}

impl TileSurface {
    pub fn new(index: usize, sender: UnboundedSender<TileUpdate>) -> Self {
        Self { index, sender }
    }
}

impl TargetSurface for TileSurface {
    fn name(&self) -> String {
        format!("tile {}", self.index + 1)
    }

    fn replace_image(&self, image: SurfaceImage) {
        let (width, height) = image.image.dimensions();
        let update = TileUpdate {
            index: self.index,
            photo_id: image.photo_id,
            caption: image.caption,
            handle: Handle::from_rgba(width, height, image.image.into_raw()),
        };

        if self.sender.unbounded_send(update).is_err() {
            warn!("Window closed, dropping image for {}", self.name());
        }
    }
}

#[derive(Debug, Clone)]
struct Photo {
    id: String,
    caption: String,
    handle: Handle,
}

/// What one tile currently shows
#[derive(Debug, Clone, Default)]
pub struct Tile {
    photo: Option<Photo>,
}

impl Tile {
    pub fn apply(&mut self, update: TileUpdate) {
        self.photo = Some(Photo {
            id: update.photo_id,
            caption: update.caption,
            handle: update.handle,
        });
    }

    /// Id of the photo on display, if any
    pub fn photo_id(&self) -> Option<&str> {
        self.photo.as_ref().map(|photo| photo.id.as_str())
    }

    pub fn view(&self) -> Element<'_, Message> {
        let (picture, caption): (Element<'_, Message>, &str) = match &self.photo {
            Some(photo) => (
                image(photo.handle.clone())
                    .width(Length::Fixed(TILE_WIDTH))
                    .height(Length::Fixed(TILE_HEIGHT))
                    .content_fit(ContentFit::Cover)
                    .into(),
                photo.caption.as_str(),
            ),
            None => (
                container(text("Waiting for photo...").size(14))
                    .center_x(Length::Fixed(TILE_WIDTH))
                    .center_y(Length::Fixed(TILE_HEIGHT))
                    .style(container::rounded_box)
                    .into(),
                "",
            ),
        };

        column![picture, text(caption).size(12).width(Length::Fixed(TILE_WIDTH))]
            .spacing(6)
            .into()
    }
}
