//! Maven Central implementation of [`Registry`].
//!
//! Latest versions come from the Solr search API; archives are fetched from
//! the repository by their standard `-javadoc.jar` coordinate path.

use super::{FetchError, Registry};
use crate::artifact::Artifact;
use log::debug;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

/// Default search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://search.maven.org/solrsearch/select";

/// Default repository root for archive downloads.
pub const DEFAULT_REPOSITORY_URL: &str = "https://repo1.maven.org/maven2";

/// Default number of search results requested per group.
pub const DEFAULT_SEARCH_ROWS: u32 = 20;

/// Default timeout for a whole request, including the body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Endpoints and limits for [`MavenCentral`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Solr search endpoint.
    pub search_url: String,
    /// Repository root that archives are downloaded from.
    pub repository_url: String,
    /// Number of search results requested per group.
    pub search_rows: u32,
    /// Timeout for a whole request.
    pub timeout: Duration,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_owned(),
            repository_url: DEFAULT_REPOSITORY_URL.to_owned(),
            search_rows: DEFAULT_SEARCH_ROWS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for Maven Central using `ureq`.
pub struct MavenCentral {
    agent: ureq::Agent,
    settings: RegistrySettings,
}

impl MavenCentral {
    /// Creates a client for the given endpoints.
    #[must_use]
    pub fn new(settings: RegistrySettings) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(settings.timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            settings,
        }
    }

    /// The search query selecting every module of `group_id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use javadoc_publisher::registry::MavenCentral;
    ///
    /// assert_eq!(MavenCentral::group_query("com.squareup"), "g:\"com.squareup\"");
    /// ```
    #[must_use]
    pub fn group_query(group_id: &str) -> String {
        format!("g:\"{group_id}\"")
    }

    /// The repository URL of the Javadoc archive for `artifact`.
    ///
    /// # Examples
    ///
    /// ```
    /// use javadoc_publisher::artifact::Artifact;
    /// use javadoc_publisher::registry::{MavenCentral, RegistrySettings};
    ///
    /// let registry = MavenCentral::new(RegistrySettings::default());
    /// let url = registry.javadoc_url(&Artifact::new("com.squareup.okio", "okio", "3.9.0"));
    /// assert_eq!(
    ///     url,
    ///     "https://repo1.maven.org/maven2/com/squareup/okio/okio/3.9.0/okio-3.9.0-javadoc.jar"
    /// );
    /// ```
    #[must_use]
    pub fn javadoc_url(&self, artifact: &Artifact) -> String {
        format!(
            "{}/{}/{artifact_id}/{version}/{artifact_id}-{version}-javadoc.jar",
            self.settings.repository_url.trim_end_matches('/'),
            artifact.group_id().replace('.', "/"),
            artifact_id = artifact.artifact_id(),
            version = artifact.version(),
        )
    }
}

impl Registry for MavenCentral {
    fn latest_artifacts(&self, group_id: &str) -> Result<Vec<Artifact>, FetchError> {
        let url = &self.settings.search_url;
        debug!("searching {url} for group {group_id}");
        let response = self
            .agent
            .get(url)
            .query("q", Self::group_query(group_id))
            .query("rows", self.settings.search_rows.to_string())
            .query("wt", "json")
            .call()
            .map_err(|e| transport_error(url, &e))?;
        let response = ensure_success(url, response)?;

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| transport_error(url, &e))?;
        parse_search_response(&body).map_err(|e| FetchError::Decode {
            url: url.clone(),
            reason: e.to_string(),
        })
    }

    fn download_doc_archive(&self, artifact: &Artifact) -> Result<Box<dyn Read>, FetchError> {
        let url = self.javadoc_url(artifact);
        debug!("downloading {url}");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| transport_error(&url, &e))?;
        let response = ensure_success(&url, response)?;
        Ok(Box::new(response.into_body().into_reader()))
    }
}

/// Turn a non-success response into [`FetchError::Status`], keeping the
/// body for diagnosis.
fn ensure_success(
    url: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<ureq::http::Response<ureq::Body>, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .into_body()
        .read_to_string()
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    Err(FetchError::Status {
        url: url.to_owned(),
        status: status.as_u16(),
        body,
    })
}

/// Map a ureq transport error to a [`FetchError`].
fn transport_error(url: &str, err: &ureq::Error) -> FetchError {
    FetchError::Http {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(rename = "g")]
    group_id: String,
    #[serde(rename = "a")]
    artifact_id: String,
    #[serde(rename = "latestVersion")]
    latest_version: String,
    #[serde(rename = "ec", default)]
    extensions: Vec<String>,
}

/// Decode a Solr search response into artifacts, preserving order.
///
/// # Errors
///
/// Returns the JSON error if the body does not match the search schema.
pub fn parse_search_response(body: &str) -> Result<Vec<Artifact>, serde_json::Error> {
    let search: SearchResponse = serde_json::from_str(body)?;
    Ok(search
        .response
        .docs
        .into_iter()
        .map(|doc| {
            Artifact::from_listing(
                doc.group_id,
                doc.artifact_id,
                doc.latest_version,
                &doc.extensions,
            )
        })
        .collect())
}
