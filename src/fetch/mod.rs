/// Remote photo fetching module
///
/// This module handles:
/// - Asking the photo provider for a batch of random photos (record.rs)
/// - The HTTP transport abstraction and its reqwest implementation (transport.rs)
/// - Surfaces that downloaded photos get painted onto (surface.rs)
/// - The fetch-and-apply pipeline tying it together (pipeline.rs)

pub mod error;
pub mod pipeline;
pub mod record;
pub mod surface;
pub mod transport;

pub use pipeline::{FetchSession, PhotoFetchPipeline, PipelineState};
pub use record::ImageSize;
pub use surface::{SurfaceImage, TargetSurface};
pub use transport::HttpTransport;
