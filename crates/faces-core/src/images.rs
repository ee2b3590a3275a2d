//! Product image downloads.
//!
//! Images are fetched concurrently; [`spawn_fan_out`] joins every task and
//! fires one completion callback once all of them have exited, failed or not.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::models::ImageRef;

/// Maximum parallel downloads in [`ImageDownloader::download_all`].
const MAX_CONCURRENT_DOWNLOADS: usize = 8;

/// Spawn every task and call `on_complete` exactly once after all have exited.
///
/// A task that errors out or panics still counts as exited. With no tasks the
/// callback fires right away. Must be called from within a Tokio runtime.
pub fn spawn_fan_out<I, Fut, C>(tasks: I, on_complete: C) -> JoinHandle<()>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = ()> + Send + 'static,
    C: FnOnce() + Send + 'static,
{
    let handles: Vec<JoinHandle<()>> = tasks.into_iter().map(tokio::spawn).collect();
    debug!(tasks = handles.len(), "Fan-out started");

    tokio::spawn(async move {
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Fan-out task did not finish cleanly");
            }
        }
        on_complete();
    })
}

/// Most images kept before the oldest are evicted.
const MAX_CACHED_IMAGES: usize = 64;

#[derive(Default)]
struct CacheEntries {
    bytes: HashMap<ImageRef, Arc<Vec<u8>>>,
    order: VecDeque<ImageRef>,
}

/// Downloaded image bytes keyed by reference, oldest evicted first.
/// Clones share storage.
#[derive(Clone, Default)]
pub struct ImageCache {
    entries: Arc<RwLock<CacheEntries>>,
}

impl ImageCache {
    pub fn get(&self, image: &ImageRef) -> Option<Arc<Vec<u8>>> {
        self.entries.read().bytes.get(image).cloned()
    }

    pub fn insert(&self, image: ImageRef, bytes: Arc<Vec<u8>>) {
        let mut entries = self.entries.write();
        if entries.bytes.insert(image.clone(), bytes).is_some() {
            return;
        }
        entries.order.push_back(image);
        while entries.order.len() > MAX_CACHED_IMAGES {
            if let Some(oldest) = entries.order.pop_front() {
                entries.bytes.remove(&oldest);
            }
        }
    }

    pub fn contains(&self, image: &ImageRef) -> bool {
        self.entries.read().bytes.contains_key(image)
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.bytes.clear();
        entries.order.clear();
    }
}

/// Fetches product images. Requests carry no session header.
#[derive(Clone)]
pub struct ImageDownloader {
    client: Client,
    cache: ImageCache,
}

impl ImageDownloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: ImageCache::default(),
        }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Download one image, serving it from the cache when already fetched
    pub async fn download(&self, image: &ImageRef) -> Result<Arc<Vec<u8>>, ApiError> {
        if let Some(bytes) = self.cache.get(image) {
            return Ok(bytes);
        }

        let response = self.client.get(image.url()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let bytes = Arc::new(response.bytes().await?.to_vec());
        debug!(url = image.url(), size = bytes.len(), "Image downloaded");
        self.cache.insert(image.clone(), Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Download all images, results in input order
    pub async fn download_all(&self, images: &[ImageRef]) -> Vec<Result<Arc<Vec<u8>>, ApiError>> {
        stream::iter(images)
            .map(|image| self.download(image))
            .buffered(MAX_CONCURRENT_DOWNLOADS)
            .collect()
            .await
    }

    /// Fire-and-forget download of every image into the cache.
    ///
    /// `on_complete` fires once after every download has finished.
    pub fn prefetch<C>(&self, images: &[ImageRef], on_complete: C) -> JoinHandle<()>
    where
        C: FnOnce() + Send + 'static,
    {
        let tasks: Vec<_> = images
            .iter()
            .cloned()
            .map(|image| {
                let downloader = self.clone();
                async move {
                    if let Err(e) = downloader.download(&image).await {
                        debug!(url = image.url(), error = %e, "Image prefetch failed");
                    }
                }
            })
            .collect();

        spawn_fan_out(tasks, on_complete)
    }
}
