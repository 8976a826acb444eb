//! URL resolution helpers.

use crate::error::{HttpError, HttpResult};
use url::Url;

/// Appends an endpoint path to a base URL.
///
/// The base path is treated as a directory (a trailing `/` is implied) and
/// a leading `/` on the endpoint is ignored, so `http://host/api` plus
/// `/auth/login` resolves to `http://host/api/auth/login`.
///
/// Fails when the base cannot carry a path (`mailto:` and friends), when the
/// base already has a query or fragment, or when the joined string does not
/// parse.
pub fn append_to_base_url(base: &Url, endpoint: &str) -> HttpResult<Url> {
    let unresolvable = || HttpError::Unresolvable {
        base: base.to_string(),
        endpoint: endpoint.to_string(),
    };

    if base.cannot_be_a_base() || base.query().is_some() || base.fragment().is_some() {
        return Err(unresolvable());
    }

    let mut joined = base.as_str().to_string();
    if !joined.ends_with('/') {
        joined.push('/');
    }
    joined.push_str(endpoint.trim_start_matches('/'));

    Url::parse(&joined).map_err(|_| unresolvable())
}

/// Returns `url` with one percent-encoded path segment appended.
pub fn append_path_segment(url: &Url, segment: &str) -> HttpResult<Url> {
    let mut out = url.clone();
    out.path_segments_mut()
        .map_err(|()| HttpError::Unresolvable {
            base: url.to_string(),
            endpoint: segment.to_string(),
        })?
        .pop_if_empty()
        .push(segment);
    Ok(out)
}
