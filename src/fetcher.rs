//! Retrieval of metadata documents over HTTP or from local files.

use std::fs;
use std::path::Path;

use crate::common::{MetadataError, MetadataResult};
use crate::metadata_tree::MetadataNode;

const FILE_SCHEME: &str = "file://";

/// Retrieves metadata documents from a URL or a local file.
#[derive(Debug)]
pub struct Fetcher {
    source: String,
}

impl Fetcher {
    pub fn new(source: &str) -> Self {
        let path = Path::new(source);
        let source = if path.exists() && path.is_file() {
            format!("{}{}", FILE_SCHEME, source)
        } else {
            source.into()
        };
        Self { source }
    }

    /// Returns the raw metadata document.
    ///
    /// `file://` sources are read from disk, anything else goes through a
    /// blocking HTTP GET. Non-success HTTP statuses are errors.
    pub fn retrieve_metadata(&self) -> MetadataResult<String> {
        log::info!("Retrieving metadata from {}", self.source);
        match self.source.strip_prefix(FILE_SCHEME) {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => Self::download_content(&self.source),
        }
    }

    /// Retrieves the metadata document and parses it into a tree.
    pub fn retrieve_tree(&self) -> MetadataResult<MetadataNode> {
        let document = self.retrieve_metadata()?;
        if document.trim().is_empty() {
            return Err(MetadataError::Parse(format!(
                "empty metadata document at {}",
                self.source
            )));
        }
        MetadataNode::parse(&document)
    }

    fn download_content(url: &str) -> MetadataResult<String> {
        let response = reqwest::blocking::get(url)?.error_for_status()?;
        log::debug!("Metadata response status: {}", response.status());
        Ok(response.text()?)
    }
}
