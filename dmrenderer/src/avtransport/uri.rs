use url::Url;

use crate::errors::RendererError;

/// Scheme families accepted by `SetAVTransportURI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriKind {
    /// Must be probed for reachability before loading.
    Http,
    File,
}

/// Parses `CurrentURI` and classifies its scheme.
pub fn parse_current_uri(current_uri: &str) -> Result<(Url, UriKind), RendererError> {
    let trimmed = current_uri.trim();
    if trimmed.is_empty() {
        return Err(RendererError::InvalidUri(current_uri.to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| RendererError::InvalidUri(format!("{}: {}", current_uri, e)))?;

    let kind = match url.scheme() {
        "http" => UriKind::Http,
        "file" => UriKind::File,
        other => return Err(RendererError::UnsupportedScheme(other.to_string())),
    };

    Ok((url, kind))
}
