//! Main client implementation

use crate::{
    audit::Audit, files::Files, groups::Groups, links::Links, permissions::Permissions,
    project_folders::ProjectFolders, tasks::Tasks, transport::Transport, users::Users,
    ClientError, Config, Result,
};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Egnyte public API client.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct EgnyteClient {
    config: Config,
    base_url: Url,
    transport: Transport,
}

impl EgnyteClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let base_url = Url::parse(config.base_url())?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "endpoint is not a base URL: {}",
                config.endpoint
            )));
        }
        let transport = Transport::new(&config)?;

        Ok(Self {
            config,
            base_url,
            transport,
        })
    }

    /// Create a client for `https://{domain}.egnyte.com` with an access token
    pub fn for_domain(domain: &str, access_token: &str) -> Result<Self> {
        Self::new(Config::for_domain(domain).with_token(access_token))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A copy of this client whose requests abort when `token` is cancelled
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            transport: self.transport.with_cancellation(token),
        }
    }

    // ==================== Resource Areas ====================

    /// File system operations, uploads and downloads
    pub fn files(&self) -> Files<'_> {
        Files::new(self)
    }

    /// User management
    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// Group management
    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    /// Shared links
    pub fn links(&self) -> Links<'_> {
        Links::new(self)
    }

    /// Folder permissions
    pub fn permissions(&self) -> Permissions<'_> {
        Permissions::new(self)
    }

    /// Tasks attached to files
    pub fn tasks(&self) -> Tasks<'_> {
        Tasks::new(self)
    }

    /// Audit reports and the audit event stream
    pub fn audit(&self) -> Audit<'_> {
        Audit::new(self)
    }

    /// Project folders
    pub fn project_folders(&self) -> ProjectFolders<'_> {
        ProjectFolders::new(self)
    }

    // ==================== Helper Methods ====================

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Build `{base}{prefix}`, e.g. `/pubapi/v2/users`
    pub(crate) fn endpoint(&self, prefix: &str) -> Result<Url> {
        Ok(self.base_url.join(prefix)?)
    }

    /// Build `{base}{prefix}/{segments of path}` with every segment percent-encoded
    pub(crate) fn path_endpoint(&self, prefix: &str, path: &str) -> Result<Url> {
        let mut url = self.endpoint(prefix)?;
        append_path(&mut url, path)?;
        Ok(url)
    }

    /// Build `{base}{prefix}/{id}`
    pub(crate) fn id_endpoint(&self, prefix: &str, id: &str) -> Result<Url> {
        let mut url = self.endpoint(prefix)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("cannot append to {}", prefix)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

/// Append a slash separated file system path as individually encoded segments.
///
/// Empty segments are dropped, so `/Shared//Docs/` and `Shared/Docs` map to
/// the same URL.
pub(crate) fn append_path(url: &mut Url, path: &str) -> Result<()> {
    let mut segments = url
        .path_segments_mut()
        .map_err(|_| ClientError::Config("endpoint cannot carry a path".to_string()))?;
    segments.pop_if_empty();
    segments.extend(path.split('/').filter(|s| !s.is_empty()));
    Ok(())
}

/// Append `name=value` to the query string
pub(crate) fn push_query(url: &mut Url, name: &str, value: impl ToString) {
    url.query_pairs_mut().append_pair(name, &value.to_string());
}

/// Append `name=value` when a value is given
pub(crate) fn push_query_opt<T: ToString>(url: &mut Url, name: &str, value: Option<T>) {
    if let Some(value) = value {
        push_query(url, name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::sanitize_url;

    fn client() -> EgnyteClient {
        EgnyteClient::for_domain("acme", "token").unwrap()
    }

    #[test]
    fn test_path_endpoint_encodes_segments() {
        let mut url = client()
            .path_endpoint("/pubapi/v1/fs", "/Shared/[T]{F} ąśćęół")
            .unwrap();
        sanitize_url(&mut url);
        assert_eq!(
            url.as_str(),
            "https://acme.egnyte.com/pubapi/v1/fs/Shared/%5BT%5D%7BF%7D%20%C4%85%C5%9B%C4%87%C4%99%C3%B3%C5%82"
        );
    }

    #[test]
    fn test_path_endpoint_reserved_characters() {
        let url = client()
            .path_endpoint("/pubapi/v1/fs", "Shared/what?#100%")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://acme.egnyte.com/pubapi/v1/fs/Shared/what%3F%23100%25"
        );
    }

    #[test]
    fn test_path_endpoint_drops_empty_segments() {
        let url = client().path_endpoint("/pubapi/v1/fs", "//Shared//Docs/").unwrap();
        assert_eq!(url.as_str(), "https://acme.egnyte.com/pubapi/v1/fs/Shared/Docs");
    }

    #[test]
    fn test_id_endpoint_encodes_id() {
        let url = client().id_endpoint("/pubapi/v1/links", "a/b").unwrap();
        assert_eq!(url.as_str(), "https://acme.egnyte.com/pubapi/v1/links/a%2Fb");
    }

    #[test]
    fn test_query_pairs() {
        let mut url = client().endpoint("/pubapi/v2/users").unwrap();
        push_query(&mut url, "startIndex", 1);
        push_query_opt(&mut url, "count", Some(50));
        push_query_opt::<u32>(&mut url, "filter", None);
        assert_eq!(
            url.as_str(),
            "https://acme.egnyte.com/pubapi/v2/users?startIndex=1&count=50"
        );
    }

    #[test]
    fn test_rejects_non_base_endpoint() {
        let err = EgnyteClient::new(Config::new("mailto:ops@example.com")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
