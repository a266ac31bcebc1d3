//! Photo fetch pipeline
//!
//! One cycle = one list request for N photos (N = number of surfaces),
//! then N independent downloads, each bound to the surface at the same
//! index as its record in the response.
//!
//! State machine:
//!
//! ```text
//! Idle -> ListRequested -> ListReceived -> Completed
//!   \           \               \
//!    +-----------+---------------+--> Aborted
//! ```
//!
//! `Completed` means "all downloads spawned". The downloads themselves are
//! fire-and-forget; a host that wants to know when they are done can await
//! `wait_downloads`.

use std::sync::{Arc, Weak};

use image::RgbaImage;
use reqwest::Url;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use super::error::FetchError;
use super::record::{parse_photo_list, ImageSize, PhotoRecord};
use super::surface::{SurfaceImage, TargetSurface};
use super::transport::Transport;

/// Access key value shipped in the default config; never a real key
pub const PLACEHOLDER_ACCESS_KEY: &str = "PASTE_YOUR_UNSPLASH_ACCESS_KEY_HERE";

pub const DEFAULT_PROVIDER_URL: &str = "https://api.unsplash.com";

/// The provider rejects list requests without this header
const ACCEPT_VERSION: (&str, &str) = ("Accept-Version", "v1");

/// Everything one fetch cycle needs, fixed before it starts
pub struct FetchSession {
    /// Non-owning handles, index i receives record i
    surfaces: Vec<Weak<dyn TargetSurface>>,
    query: String,
    access_key: String,
    provider_url: String,
    size: ImageSize,
}

impl FetchSession {
    pub fn new<S: TargetSurface + 'static>(
        surfaces: &[Arc<S>],
        query: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        let surfaces = surfaces
            .iter()
            .map(|surface| {
                let weak: Weak<S> = Arc::downgrade(surface);
                weak as Weak<dyn TargetSurface>
            })
            .collect();

        Self {
            surfaces,
            query: query.into(),
            access_key: access_key.into(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            size: ImageSize::default(),
        }
    }

    pub fn with_provider_url(mut self, url: impl Into<String>) -> Self {
        self.provider_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_image_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// Number of photos asked for; always the number of surfaces
    pub fn requested_count(&self) -> usize {
        self.surfaces.len()
    }

    fn validate(&self) -> Result<(), FetchError> {
        if self.surfaces.is_empty() {
            return Err(FetchError::ConfigInvalid(
                "no target surfaces assigned".to_string(),
            ));
        }

        let key = self.access_key.trim();
        if key.is_empty() || key == PLACEHOLDER_ACCESS_KEY {
            return Err(FetchError::ConfigInvalid(
                "no valid access key provided".to_string(),
            ));
        }

        Ok(())
    }

    /// Endpoint without the query string, safe to log (no credential)
    fn endpoint(&self) -> String {
        format!("{}/photos/random", self.provider_url)
    }

    /// Full list request URL: query, count and credential
    pub fn list_url(&self) -> Result<Url, FetchError> {
        let count = self.requested_count().to_string();
        Url::parse_with_params(
            &self.endpoint(),
            &[
                ("query", self.query.as_str()),
                ("count", count.as_str()),
                ("client_id", self.access_key.as_str()),
            ],
        )
        .map_err(|e| FetchError::ConfigInvalid(format!("bad provider URL: {}", e)))
    }
}

/// Where a pipeline is in its current cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    ListRequested,
    ListReceived { records: usize },
    /// All downloads spawned; they may still be running
    Completed { spawned: usize },
    Aborted(FetchError),
}

/// Result of one per-surface download
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Surface index (== record index)
    pub index: usize,
    pub photo_id: String,
    pub result: Result<(), FetchError>,
}

/// Fetches N photos and paints them onto N surfaces
///
/// Downloads run as tokio tasks owned by the pipeline: `cancel` aborts
/// them, and so does dropping the pipeline.
pub struct PhotoFetchPipeline<T> {
    transport: Arc<T>,
    session: FetchSession,
    state: PipelineState,
    downloads: JoinSet<DownloadOutcome>,
    /// Outcomes reaped by `in_flight` before `wait_downloads` ran
    finished: Vec<DownloadOutcome>,
}

impl<T: Transport> PhotoFetchPipeline<T> {
    pub fn new(transport: Arc<T>, session: FetchSession) -> Self {
        Self {
            transport,
            session,
            state: PipelineState::Idle,
            downloads: JoinSet::new(),
            finished: Vec::new(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Downloads spawned and not yet joined
    pub fn in_flight(&mut self) -> usize {
        while let Some(joined) = self.downloads.try_join_next() {
            self.keep_outcome(joined);
        }
        self.downloads.len()
    }

    /// Run one cycle up to the fan-out and return the state it ended in
    ///
    /// Returns without waiting for the downloads. Starting while the
    /// previous cycle's downloads are still running is rejected and leaves
    /// them untouched.
    pub async fn start(&mut self) -> PipelineState {
        if self.in_flight() > 0 {
            error!(
                "Refusing to start a fetch cycle: {} downloads still in flight",
                self.downloads.len()
            );
            return PipelineState::Aborted(FetchError::CycleInFlight);
        }

        self.state = PipelineState::Idle;

        if let Err(err) = self.session.validate() {
            error!("❌ Please assign surfaces and provide a valid access key: {}", err);
            return self.abort(err);
        }

        let url = match self.session.list_url() {
            Ok(url) => url,
            Err(err) => {
                error!("❌ {}", err);
                return self.abort(err);
            }
        };

        self.state = PipelineState::ListRequested;
        info!(
            "🔍 Requesting {} photos for {:?} from {}",
            self.session.requested_count(),
            self.session.query,
            self.session.endpoint()
        );

        let body = match self.transport.get(url.as_str(), &[ACCEPT_VERSION]).await {
            Ok(body) => body,
            Err(source) => {
                error!("Error fetching photo list: {}", source);
                if let Some(body) = source.body() {
                    error!("Response: {}", body);
                }
                return self.abort(FetchError::Transport {
                    url: self.session.endpoint(),
                    source,
                });
            }
        };

        let records = match parse_photo_list(&body) {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                error!("No photos found for query {:?}", self.session.query);
                return self.abort(FetchError::Parse("empty photo list".to_string()));
            }
            Err(err) => {
                error!("Failed to parse photo list: {}", err);
                error!("Response: {}", String::from_utf8_lossy(&body));
                return self.abort(FetchError::Parse(err.to_string()));
            }
        };

        self.state = PipelineState::ListReceived {
            records: records.len(),
        };
        info!("📷 Successfully fetched {} photos", records.len());

        let surface_count = self.session.surfaces.len();
        if records.len() > surface_count {
            debug!(
                "Ignoring {} photos beyond the {} available surfaces",
                records.len() - surface_count,
                surface_count
            );
        }

        let mut spawned = 0;
        for (index, record) in records.into_iter().take(surface_count).enumerate() {
            let Some(url) = record.urls.get(self.session.size).map(str::to_string) else {
                warn!(
                    "Photo {} has no {:?} URL, leaving surface {} as is",
                    record.id, self.session.size, index
                );
                continue;
            };

            let surface = Weak::clone(&self.session.surfaces[index]);
            let transport = Arc::clone(&self.transport);
            self.downloads
                .spawn(download_and_apply(transport, index, url, record, surface));
            spawned += 1;
        }

        self.state = PipelineState::Completed { spawned };
        self.state.clone()
    }

    /// Wait for every spawned download and collect outcomes, ordered by index
    pub async fn wait_downloads(&mut self) -> Vec<DownloadOutcome> {
        while let Some(joined) = self.downloads.join_next().await {
            self.keep_outcome(joined);
        }

        let mut outcomes = std::mem::take(&mut self.finished);
        outcomes.sort_by_key(|outcome| outcome.index);
        outcomes
    }

    fn keep_outcome(&mut self, joined: Result<DownloadOutcome, JoinError>) {
        match joined {
            Ok(outcome) => self.finished.push(outcome),
            Err(err) if err.is_cancelled() => debug!("Download cancelled"),
            Err(err) => error!("Download task failed: {}", err),
        }
    }

    fn abort(&mut self, err: FetchError) -> PipelineState {
        self.state = PipelineState::Aborted(err);
        self.state.clone()
    }
}

impl<T> PhotoFetchPipeline<T> {
    /// Abort every in-flight download; their surfaces keep what they show
    pub fn cancel(&mut self) {
        if !self.downloads.is_empty() {
            info!("Cancelling {} downloads", self.downloads.len());
        }
        self.downloads.abort_all();
    }
}

impl<T> Drop for PhotoFetchPipeline<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Download one photo and put it on its surface
///
/// Every failure is logged here and leaves the surface untouched.
async fn download_and_apply<T: Transport>(
    transport: Arc<T>,
    index: usize,
    url: String,
    record: PhotoRecord,
    surface: Weak<dyn TargetSurface>,
) -> DownloadOutcome {
    let result = fetch_into_surface(transport.as_ref(), index, &url, &record, &surface).await;

    if let Err(err) = &result {
        match err {
            FetchError::SurfaceGone(_) => warn!("Dropping photo {}: {}", record.id, err),
            _ => error!("Failed to download image for surface {}: {}", index, err),
        }
    }

    DownloadOutcome {
        index,
        photo_id: record.id,
        result,
    }
}

async fn fetch_into_surface<T: Transport>(
    transport: &T,
    index: usize,
    url: &str,
    record: &PhotoRecord,
    surface: &Weak<dyn TargetSurface>,
) -> Result<(), FetchError> {
    // Don't spend bandwidth on a surface that is already gone
    if surface.strong_count() == 0 {
        return Err(FetchError::SurfaceGone(index));
    }

    let bytes = transport
        .get(url, &[])
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let image = decode_image(url.to_string(), bytes).await?;
    debug!(
        "Decoded {} ({}x{}, provider says {:?}x{:?}, colour {})",
        record.id,
        image.width(),
        image.height(),
        record.width,
        record.height,
        record.color.as_deref().unwrap_or("unknown")
    );

    // The host may have torn the surface down while we were downloading
    let surface = surface.upgrade().ok_or(FetchError::SurfaceGone(index))?;
    let name = surface.name();
    surface.replace_image(SurfaceImage {
        photo_id: record.id.clone(),
        caption: record.caption(),
        image,
    });

    info!("✅ Successfully applied photo {} to {}", record.id, name);
    Ok(())
}

/// Decode downloaded bytes off the async workers (decoding is CPU-bound)
async fn decode_image(url: String, bytes: Vec<u8>) -> Result<RgbaImage, FetchError> {
    let decoded = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))
    .and_then(|result| result);

    decoded.map_err(|reason| FetchError::ImageDecode { url, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::error::TransportError;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    type Headers = Vec<(&'static str, &'static str)>;

    /// In-memory transport: one canned list reply plus per-URL image replies
    struct MockTransport {
        list: Result<Vec<u8>, TransportError>,
        images: HashMap<String, Result<Vec<u8>, TransportError>>,
        requests: Mutex<Vec<(String, Headers)>>,
        /// When set, image GETs wait for a permit
        gate: Option<Arc<Semaphore>>,
    }

    impl MockTransport {
        fn new(list: Result<Vec<u8>, TransportError>) -> Self {
            Self {
                list,
                images: HashMap::new(),
                requests: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn with_image(mut self, url: String, reply: Result<Vec<u8>, TransportError>) -> Self {
            self.images.insert(url, reply);
            self
        }

        fn requested_urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }
    }

    impl Transport for MockTransport {
        async fn get(
            &self,
            url: &str,
            headers: &[(&'static str, &'static str)],
        ) -> Result<Vec<u8>, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers.to_vec()));

            if url.contains("/photos/random") {
                return self.list.clone();
            }

            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }

            self.images.get(url).cloned().unwrap_or(Err(TransportError::Status {
                status: 404,
                body: String::new(),
            }))
        }
    }

    /// Surface that remembers which photo it shows
    struct RecordingSurface {
        name: String,
        shown: Mutex<String>,
        writes: AtomicUsize,
    }

    impl RecordingSurface {
        fn new(index: usize) -> Arc<Self> {
            Arc::new(Self {
                name: format!("plane-{}", index),
                shown: Mutex::new("prior".to_string()),
                writes: AtomicUsize::new(0),
            })
        }

        fn shown(&self) -> String {
            self.shown.lock().unwrap().clone()
        }
    }

    impl TargetSurface for RecordingSurface {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn replace_image(&self, image: SurfaceImage) {
            *self.shown.lock().unwrap() = image.photo_id;
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn surfaces(n: usize) -> Vec<Arc<RecordingSurface>> {
        (0..n).map(RecordingSurface::new).collect()
    }

    fn image_url(i: usize) -> String {
        format!("https://images.test/p{}.png", i)
    }

    fn list_body(count: usize) -> Vec<u8> {
        let records: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"id":"p{i}","description":null,"urls":{{"raw":"https://images.test/raw{i}","regular":"{url}","thumb":"https://images.test/t{i}"}}}}"#,
                    i = i,
                    url = image_url(i)
                )
            })
            .collect();
        format!("[{}]", records.join(",")).into_bytes()
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 40, 40, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    /// Transport serving `records` list entries and a valid PNG for each
    fn serving(records: usize) -> MockTransport {
        let mut transport = MockTransport::new(Ok(list_body(records)));
        for i in 0..records {
            transport = transport.with_image(image_url(i), Ok(png_bytes()));
        }
        transport
    }

    fn build(
        transport: MockTransport,
        surfaces: &[Arc<RecordingSurface>],
        key: &str,
    ) -> (Arc<MockTransport>, PhotoFetchPipeline<MockTransport>) {
        let transport = Arc::new(transport);
        let session = FetchSession::new(surfaces, "nature", key)
            .with_provider_url("https://api.test/");
        (Arc::clone(&transport), PhotoFetchPipeline::new(transport, session))
    }

    #[tokio::test]
    async fn test_list_request_asks_for_one_photo_per_surface() {
        let planes = surfaces(4);
        let (transport, mut pipeline) = build(serving(4), &planes, "real-key");

        let state = pipeline.start().await;
        assert_eq!(state, PipelineState::Completed { spawned: 4 });

        let requests = transport.requests.lock().unwrap().clone();
        let (list_url, headers) = &requests[0];
        let url = Url::parse(list_url).unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/photos/random");
        assert_eq!(params["count"], "4");
        assert_eq!(params["query"], "nature");
        assert_eq!(params["client_id"], "real-key");
        assert_eq!(headers, &vec![("Accept-Version", "v1")]);
    }

    #[tokio::test]
    async fn test_placeholder_key_issues_no_request() {
        let planes = surfaces(3);
        let (transport, mut pipeline) = build(serving(3), &planes, PLACEHOLDER_ACCESS_KEY);

        let state = pipeline.start().await;

        assert!(matches!(state, PipelineState::Aborted(FetchError::ConfigInvalid(_))));
        assert!(transport.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_or_surfaces_issue_no_request() {
        let planes = surfaces(3);
        let (transport, mut pipeline) = build(serving(3), &planes, "  ");
        assert!(matches!(
            pipeline.start().await,
            PipelineState::Aborted(FetchError::ConfigInvalid(_))
        ));
        assert!(transport.requested_urls().is_empty());

        let (transport, mut pipeline) = build(serving(3), &[], "real-key");
        assert!(matches!(
            pipeline.start().await,
            PipelineState::Aborted(FetchError::ConfigInvalid(_))
        ));
        assert!(transport.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_fewer_records_than_surfaces() {
        let planes = surfaces(4);
        let (_transport, mut pipeline) = build(serving(2), &planes, "real-key");

        assert_eq!(pipeline.start().await, PipelineState::Completed { spawned: 2 });
        let outcomes = pipeline.wait_downloads().await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(planes[0].shown(), "p0");
        assert_eq!(planes[1].shown(), "p1");
        for plane in &planes[2..] {
            assert_eq!(plane.shown(), "prior");
            assert_eq!(plane.writes.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_extra_records_are_never_requested() {
        let planes = surfaces(3);
        let (transport, mut pipeline) = build(serving(5), &planes, "real-key");

        assert_eq!(pipeline.start().await, PipelineState::Completed { spawned: 3 });
        pipeline.wait_downloads().await;

        let urls = transport.requested_urls();
        assert_eq!(urls.len(), 1 + 3);
        assert!(!urls.contains(&image_url(3)));
        assert!(!urls.contains(&image_url(4)));
        for (i, plane) in planes.iter().enumerate() {
            assert_eq!(plane.shown(), format!("p{}", i));
        }
    }

    #[tokio::test]
    async fn test_failed_download_leaves_surface_alone() {
        let planes = surfaces(3);
        let transport = MockTransport::new(Ok(list_body(3)))
            .with_image(image_url(0), Ok(png_bytes()))
            .with_image(
                image_url(1),
                Err(TransportError::Network("connection reset".to_string())),
            )
            .with_image(image_url(2), Ok(png_bytes()));
        let (_transport, mut pipeline) = build(transport, &planes, "real-key");

        pipeline.start().await;
        let outcomes = pipeline.wait_downloads().await;

        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(FetchError::Transport { .. })
        ));
        assert!(outcomes[2].result.is_ok());
        assert_eq!(planes[0].shown(), "p0");
        assert_eq!(planes[1].shown(), "prior");
        assert_eq!(planes[2].shown(), "p2");
    }

    #[tokio::test]
    async fn test_undecodable_image_leaves_surface_alone() {
        let planes = surfaces(2);
        let transport = MockTransport::new(Ok(list_body(2)))
            .with_image(image_url(0), Ok(b"<html>not an image</html>".to_vec()))
            .with_image(image_url(1), Ok(png_bytes()));
        let (_transport, mut pipeline) = build(transport, &planes, "real-key");

        pipeline.start().await;
        let outcomes = pipeline.wait_downloads().await;

        assert!(matches!(
            outcomes[0].result,
            Err(FetchError::ImageDecode { .. })
        ));
        assert_eq!(planes[0].shown(), "prior");
        assert_eq!(planes[1].shown(), "p1");
    }

    #[tokio::test]
    async fn test_list_failure_aborts_before_any_download() {
        let planes = surfaces(2);
        let transport = MockTransport::new(Err(TransportError::Status {
            status: 401,
            body: r#"{"errors":["OAuth error: The access token is invalid"]}"#.to_string(),
        }));
        let (transport, mut pipeline) = build(transport, &planes, "revoked-key");

        let state = pipeline.start().await;

        match state {
            PipelineState::Aborted(FetchError::Transport { url, source }) => {
                // The logged/stored URL must not carry the credential
                assert!(!url.contains("revoked-key"));
                assert!(source.body().unwrap().contains("OAuth error"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert_eq!(transport.requested_urls().len(), 1);
        assert_eq!(pipeline.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_empty_or_malformed_list_aborts() {
        let planes = surfaces(2);

        let (_t, mut pipeline) = build(MockTransport::new(Ok(b"[]".to_vec())), &planes, "k");
        assert!(matches!(
            pipeline.start().await,
            PipelineState::Aborted(FetchError::Parse(_))
        ));

        let (_t, mut pipeline) = build(MockTransport::new(Ok(b"null".to_vec())), &planes, "k");
        assert!(matches!(
            pipeline.start().await,
            PipelineState::Aborted(FetchError::Parse(_))
        ));

        let (t, mut pipeline) = build(MockTransport::new(Ok(b"{oops".to_vec())), &planes, "k");
        assert!(matches!(
            pipeline.start().await,
            PipelineState::Aborted(FetchError::Parse(_))
        ));
        assert_eq!(t.requested_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_surface_is_not_written() {
        let mut planes = surfaces(2);
        let (_transport, mut pipeline) = build(serving(2), &planes, "real-key");

        pipeline.start().await;
        // Host tears down surface 1 while downloads are pending
        planes.truncate(1);
        let outcomes = pipeline.wait_downloads().await;

        assert!(outcomes[0].result.is_ok());
        assert_eq!(outcomes[1].result, Err(FetchError::SurfaceGone(1)));
        assert_eq!(planes[0].shown(), "p0");
    }

    #[tokio::test]
    async fn test_overlapping_start_is_rejected() {
        let planes = surfaces(2);
        let gate = Arc::new(Semaphore::new(0));
        let mut transport = serving(2);
        transport.gate = Some(Arc::clone(&gate));
        let (transport, mut pipeline) = build(transport, &planes, "real-key");

        assert_eq!(pipeline.start().await, PipelineState::Completed { spawned: 2 });
        assert_eq!(pipeline.in_flight(), 2);

        let second = pipeline.start().await;
        assert_eq!(second, PipelineState::Aborted(FetchError::CycleInFlight));
        assert_eq!(pipeline.state(), &PipelineState::Completed { spawned: 2 });
        let list_requests = transport
            .requested_urls()
            .iter()
            .filter(|url| url.contains("/photos/random"))
            .count();
        assert_eq!(list_requests, 1);

        gate.add_permits(2);
        pipeline.wait_downloads().await;
        assert_eq!(planes[1].shown(), "p1");
        assert_eq!(pipeline.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_outcomes_reaped_by_in_flight_are_still_reported() {
        let planes = surfaces(2);
        let (_transport, mut pipeline) = build(serving(2), &planes, "real-key");

        pipeline.start().await;
        while pipeline.in_flight() > 0 {
            tokio::task::yield_now().await;
        }

        let outcomes = pipeline.wait_downloads().await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].photo_id, "p0");
        assert_eq!(outcomes[1].photo_id, "p1");
        assert!(outcomes.iter().all(|o| o.result.is_ok()));

        // Drained: a second wait reports nothing new
        assert!(pipeline.wait_downloads().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_pending_downloads() {
        let planes = surfaces(2);
        let gate = Arc::new(Semaphore::new(0));
        let mut transport = serving(2);
        transport.gate = Some(Arc::clone(&gate));
        let (_transport, mut pipeline) = build(transport, &planes, "real-key");

        pipeline.start().await;
        pipeline.cancel();
        let outcomes = pipeline.wait_downloads().await;

        assert!(outcomes.is_empty());
        assert_eq!(planes[0].shown(), "prior");
        assert_eq!(planes[1].shown(), "prior");
        assert_eq!(pipeline.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_dropping_pipeline_aborts_downloads() {
        let planes = surfaces(2);
        let gate = Arc::new(Semaphore::new(0));
        let mut transport = serving(2);
        transport.gate = Some(Arc::clone(&gate));
        let (_transport, mut pipeline) = build(transport, &planes, "real-key");

        pipeline.start().await;
        drop(pipeline);
        gate.add_permits(2);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(planes[0].shown(), "prior");
        assert_eq!(planes[1].shown(), "prior");
        assert_eq!(planes[0].writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_selected_size_variant_is_downloaded() {
        let planes = surfaces(1);
        let transport = Arc::new(
            MockTransport::new(Ok(list_body(1)))
                .with_image("https://images.test/t0".to_string(), Ok(png_bytes())),
        );
        let session = FetchSession::new(&planes, "nature", "real-key")
            .with_provider_url("https://api.test")
            .with_image_size(ImageSize::Thumb);
        let mut pipeline = PhotoFetchPipeline::new(Arc::clone(&transport), session);

        pipeline.start().await;
        pipeline.wait_downloads().await;

        assert_eq!(transport.requested_urls()[1], "https://images.test/t0");
        assert_eq!(planes[0].shown(), "p0");
    }

    #[test]
    fn test_list_url_encodes_query() {
        let planes = surfaces(2);
        let session = FetchSession::new(&planes, "city & night", "key");
        let url = session.list_url().unwrap();

        assert!(url.as_str().starts_with("https://api.unsplash.com/photos/random?"));
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["query"], "city & night");
        assert_eq!(params["count"], "2");
    }
}
