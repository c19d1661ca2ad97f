//! Request execution with traffic logging.

use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, trace};

use crate::error::Result;

/// Send a request and read the whole response body.
///
/// Callers inspect the status themselves; transport failures are the only
/// errors returned here.
pub(crate) async fn execute(
    client: &Client,
    builder: RequestBuilder,
) -> Result<(StatusCode, Vec<u8>)> {
    let request = builder.build()?;
    debug!("-> {} {}", request.method(), request.url());
    if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
        if body.first().is_some_and(|b| *b == b'[' || *b == b'{') {
            trace!("{}", String::from_utf8_lossy(body));
        }
    }

    let response = client.execute(request).await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    debug!("<- Status {} {} bytes", status.as_u16(), body.len());
    if body.first().is_some_and(|b| *b == b'[' || *b == b'{') {
        trace!("{}", String::from_utf8_lossy(&body));
    }

    Ok((status, body))
}

/// Body text for error messages.
pub(crate) fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).trim().to_string()
}
