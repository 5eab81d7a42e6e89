//! Admission filter for raw files.
//!
//! A file is admitted when its declared media type matches OR its extension
//! matches. Hosts frequently report an empty or generic media type, so the
//! extension alone is enough. Rejected files are dropped without an error.

use tracing::debug;

use crate::collection::{Entry, OrderedCollection};
use crate::config::Config;
use crate::input::RawFile;
use crate::utils::has_extension;

/// Filter that turns raw files into collection entries.
#[derive(Debug, Clone)]
pub struct InputFilter {
    media_type: String,
    extension: String,
}

impl InputFilter {
    /// Create a filter for the given media type and extension (no dot).
    pub fn new(media_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            extension: extension.into(),
        }
    }

    /// Create a filter from the session configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.expected_media_type, &config.expected_extension)
    }

    /// Whether `file` passes the media-type-or-extension check.
    pub fn accepts(&self, file: &RawFile) -> bool {
        self.media_type_matches(&file.media_type) || has_extension(&file.name, &self.extension)
    }

    // Parameters such as `; charset=...` are ignored.
    fn media_type_matches(&self, declared: &str) -> bool {
        let essence = declared.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case(&self.media_type)
    }

    /// Keep the accepted files, in batch order, each tagged with a fresh id.
    pub fn filter<I>(&self, batch: I) -> Vec<Entry>
    where
        I: IntoIterator<Item = RawFile>,
    {
        batch
            .into_iter()
            .filter(|file| {
                let accepted = self.accepts(file);
                if !accepted {
                    debug!(name = %file.name, media_type = %file.media_type, "input rejected");
                }
                accepted
            })
            .map(Entry::new)
            .collect()
    }

    /// Filter a batch and append the accepted entries to `collection`.
    ///
    /// Returns the number of entries appended.
    pub fn admit<I>(&self, batch: I, collection: &mut OrderedCollection) -> usize
    where
        I: IntoIterator<Item = RawFile>,
    {
        collection.append(self.filter(batch))
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
