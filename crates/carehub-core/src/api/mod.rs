//! REST transport for the CareHub API.
//!
//! This module provides the `ApiClient` every domain service calls, plus
//! the two hooks wrapped around each exchange:
//!
//! - `interceptor`: attaches the bearer token and picks JSON or multipart encoding
//! - `classifier`: maps failures onto `ErrorKind` and tears the session down on 401
//!
//! Failures surface as `ApiError`; callers display `friendly_message()`.

pub mod classifier;
pub mod client;
pub mod error;
pub mod headers;
pub mod interceptor;
pub mod observer;

pub use classifier::{Failure, ResponseClassifier};
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, ErrorKind, ErrorPayload};
pub use headers::DefaultHeaders;
pub use interceptor::{FilePart, MultipartPayload, RequestBody, RequestContext};
pub use observer::{NoopObserver, SessionInvalidated, SessionObserver};
