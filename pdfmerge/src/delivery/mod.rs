//! Delivery of the merged bytes to the host.
//!
//! A [`DeliverySink`] turns an [`Artifact`] into something the user can save
//! with a single action (a prompted download, a file in a downloads folder)
//! and hands back a [`SinkHandle`]. [`Delivery`] offers the artifact exactly
//! once and disposes of the temporary resource after a grace window. There is
//! no confirmation signal from the sink, so disposal is timer-based.

pub mod sink;

pub use sink::{DirectorySink, MemorySink};

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{self, JoinHandle};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{MergeError, Result};
use crate::utils::timestamped_output_name;

/// A completed document ready to be offered to the user.
#[derive(Clone)]
pub struct Artifact {
    /// Serialised document.
    pub bytes: Vec<u8>,

    /// Name suggested to the save dialog.
    pub suggested_name: String,

    /// Media type of `bytes`.
    pub media_type: String,
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("suggested_name", &self.suggested_name)
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// Token identifying an offered artifact within its sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkHandle(pub u64);

/// Host-side receiver of merged artifacts.
pub trait DeliverySink: Send + Sync + 'static {
    /// Make `artifact` retrievable and trigger the save action.
    ///
    /// May block; [`Delivery`] calls it off the async executor.
    fn offer(&self, artifact: Artifact) -> io::Result<SinkHandle>;

    /// Release whatever temporary resource backs `handle`.
    fn dispose(&self, handle: SinkHandle);
}

/// Offers artifacts to a sink and schedules their disposal.
#[derive(Debug)]
pub struct Delivery<S> {
    sink: Arc<S>,
    grace_period: Duration,
    output_prefix: String,
    media_type: String,
}

impl<S> Clone for Delivery<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            grace_period: self.grace_period,
            output_prefix: self.output_prefix.clone(),
            media_type: self.media_type.clone(),
        }
    }
}

impl<S: DeliverySink> Delivery<S> {
    /// Create a delivery stage using the naming and timing of `config`.
    pub fn new(sink: Arc<S>, config: &Config) -> Self {
        Self {
            sink,
            grace_period: config.grace_period(),
            output_prefix: config.output_prefix.clone(),
            media_type: config.output_media_type.clone(),
        }
    }

    /// The sink artifacts are offered to.
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Grace window before disposal.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Offer `bytes` under a fresh timestamped name.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::DeliveryFailed`] if the sink refuses the
    /// artifact. Nothing is retried.
    pub async fn deliver(&self, bytes: Vec<u8>) -> Result<Delivered> {
        let name = timestamped_output_name(&self.output_prefix);
        self.deliver_as(bytes, name).await
    }

    /// Offer `bytes` under `name`.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub async fn deliver_as(&self, bytes: Vec<u8>, name: String) -> Result<Delivered> {
        let byte_size = bytes.len() as u64;
        let artifact = Artifact {
            bytes,
            suggested_name: name.clone(),
            media_type: self.media_type.clone(),
        };

        let sink = Arc::clone(&self.sink);
        let handle = task::spawn_blocking(move || sink.offer(artifact))
            .await
            .map_err(|e| MergeError::delivery_failed(&name, format!("Delivery task failed: {e}")))?
            .map_err(|e| MergeError::delivery_failed(&name, e.to_string()))?;

        info!(name = %name, bytes = byte_size, "Artifact offered");

        let sink = Arc::clone(&self.sink);
        let grace_period = self.grace_period;
        let release = tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            sink.dispose(handle);
            debug!(handle = handle.0, "Artifact disposed");
        });

        Ok(Delivered {
            name,
            byte_size,
            handle,
            release,
        })
    }
}

/// An artifact that has been offered and is awaiting disposal.
#[derive(Debug)]
pub struct Delivered {
    /// Name the artifact was offered under.
    pub name: String,

    /// Size of the offered bytes.
    pub byte_size: u64,

    /// Sink handle of the artifact.
    pub handle: SinkHandle,

    release: JoinHandle<()>,
}

impl Delivered {
    /// Whether the temporary resource has been disposed.
    pub fn is_released(&self) -> bool {
        self.release.is_finished()
    }

    /// Wait until the grace window has passed and the resource is disposed.
    pub async fn released(self) {
        if let Err(e) = self.release.await {
            debug!(error = %e, "Disposal task did not complete");
        }
    }
}
