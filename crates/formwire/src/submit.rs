//! The transport boundary.
//!
//! formwire performs no I/O itself. A caller supplies a [`Transport`] that can
//! POST a body somewhere; [`submit`] encodes the form, posts it once and
//! interprets the status. Retrying is the caller's business.

use bytes::Bytes;
use formwire_schema::{FormSchema, SchemaError};
use tracing::{info, warn};

/// Content type of every encoded form body.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// The only status that counts as accepted.
pub const STATUS_OK: u16 = 200;

/// An outgoing form submission.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    /// Where to post, as the transport understands it (usually a URL path).
    pub target: &'a str,
    pub content_type: &'static str,
    pub body: Bytes,
}

/// What came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Where the UI should go next, passed through untouched.
    pub redirect: Option<String>,
}

/// Errors raised by a transport before any status is available.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Other(String),
}

/// Something that can POST a body and report the status.
pub trait Transport {
    fn post(&self, request: Request<'_>) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, request: Request<'_>) -> Result<Response, TransportError> {
        (**self).post(request)
    }
}

/// A submission the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub bytes_sent: usize,
    pub redirect: Option<String>,
}

/// Errors that can occur while submitting a form.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The form did not encode; nothing was sent.
    #[error(transparent)]
    Encode(#[from] SchemaError),

    /// The server answered with something other than 200.
    #[error("submission rejected (HTTP {status})")]
    TransportFailure { status: u16 },

    /// The transport gave up before a status was available.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Encode `values` through `schema` and post the result to `target`.
pub fn submit<T, I, K, V>(
    transport: &T,
    schema: &FormSchema,
    target: &str,
    values: I,
) -> Result<SubmitOutcome, SubmitError>
where
    T: Transport + ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let body = schema.encode(values)?;
    let bytes_sent = body.len();

    let response = transport.post(Request {
        target,
        content_type: CONTENT_TYPE,
        body,
    })?;

    if response.status != STATUS_OK {
        warn!(to = target, status = response.status, "form submission rejected");
        return Err(SubmitError::TransportFailure {
            status: response.status,
        });
    }

    info!(to = target, bytes = bytes_sent, "form submitted");
    Ok(SubmitOutcome {
        bytes_sent,
        redirect: response.redirect,
    })
}
