//! Cloud API HTTP layer: request executor, retry policy and result types.

mod client;
mod result;
mod retry;
mod transport;

pub use client::HttpClient;
pub use result::{ApiResult, ErrorKind, Payload};
pub use retry::{
    MAX_RETRIES, RETRY_DELAY_MS, TIMEOUT_SECS, TransportError, classify_error, classify_response,
    classify_text_response,
};
pub use transport::{ApiRequest, RawResponse, ReqwestTransport, RequestBody, Transport};

#[cfg(test)]
pub use transport::MockTransport;
