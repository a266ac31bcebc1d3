//! Photo metadata as returned by the provider's list endpoint
//!
//! Only the fields the wall actually uses are modeled; everything else
//! in the provider's JSON is ignored by serde.

use serde::Deserialize;

/// One remote photo: metadata plus its size-variant URLs
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    /// Provider-side identifier (e.g., "Dwu85P9SOIk")
    pub id: String,
    /// Free-text description, often null
    #[serde(default)]
    pub description: Option<String>,
    /// Machine-generated description, used when `description` is null
    #[serde(default)]
    pub alt_description: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Average colour as "#RRGGBB"
    #[serde(default)]
    pub color: Option<String>,
    /// URLs for each size variant
    pub urls: PhotoUrls,
    /// Photographer, for the credit caption
    #[serde(default)]
    pub user: Option<Photographer>,
}

/// Size-variant URLs of a photo; any of them may be absent
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PhotoUrls {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
    /// A good balance of size and quality
    #[serde(default)]
    pub regular: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Photographer {
    pub name: String,
    /// Provider handle, shown as "@username" in the credit
    #[serde(default)]
    pub username: Option<String>,
}

impl Photographer {
    fn credit(&self) -> String {
        match self.username.as_deref().filter(|u| !u.is_empty()) {
            Some(username) => format!("{} @{}", self.name, username),
            None => self.name.clone(),
        }
    }
}

/// Which size variant gets downloaded for each surface
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Raw,
    Full,
    #[default]
    Regular,
    Small,
    Thumb,
}

impl PhotoUrls {
    /// URL for the requested size variant, if the provider sent one
    pub fn get(&self, size: ImageSize) -> Option<&str> {
        let url = match size {
            ImageSize::Raw => &self.raw,
            ImageSize::Full => &self.full,
            ImageSize::Regular => &self.regular,
            ImageSize::Small => &self.small,
            ImageSize::Thumb => &self.thumb,
        };
        url.as_deref().filter(|u| !u.is_empty())
    }
}

impl PhotoRecord {
    /// Caption shown under a tile: description, then photographer credit
    pub fn caption(&self) -> String {
        let text = self
            .description
            .as_deref()
            .or(self.alt_description.as_deref())
            .map(str::trim)
            .filter(|d| !d.is_empty());

        match (text, &self.user) {
            (Some(text), Some(user)) => format!("{} (by {})", text, user.credit()),
            (Some(text), None) => text.to_string(),
            (None, Some(user)) => format!("Photo by {}", user.credit()),
            (None, None) => self.id.clone(),
        }
    }
}

/// Parse a list response body into records
///
/// A JSON `null` parses to an empty list; the caller decides what an
/// empty list means.
pub fn parse_photo_list(body: &[u8]) -> Result<Vec<PhotoRecord>, serde_json::Error> {
    let records: Option<Vec<PhotoRecord>> = serde_json::from_slice(body)?;
    Ok(records.unwrap_or_default())
}
