//! Outgoing request decoration.
//!
//! Runs before every exchange: attaches `Authorization: Bearer <token>` when
//! a session exists and settles the content-type. Never fails and performs
//! no I/O; a missing token just means the request goes out unauthenticated.

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, warn};

use super::headers::bearer_value;
use crate::session::Session;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartPayload),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    /// File-bearing payloads need a transport-computed boundary.
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

/// Text fields and file parts of a multipart upload.
///
/// Kept as plain data until send time so the interceptor can inspect it and
/// the request can be logged; converted into a `reqwest` form when sent.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            bytes,
        });
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let mut part = Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(ref mime) = file.mime {
                part = part.mime_str(mime)?;
            }
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// One outgoing call. Lives until the response settles.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub url: String,
    pub method: Method,
    pub headers: reqwest::header::HeaderMap,
    pub body: RequestBody,
}

impl RequestContext {
    pub fn new(method: Method, url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            url: url.into(),
            method,
            headers: reqwest::header::HeaderMap::new(),
            body,
        }
    }

    pub fn is_multipart(&self) -> bool {
        self.body.is_multipart()
    }
}

fn pinned_to_multipart(ctx: &RequestContext) -> bool {
    ctx.headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/"))
        .unwrap_or(false)
}

/// Attach credentials and the content-type for the body's encoding.
pub fn decorate(mut ctx: RequestContext, session: Option<&Session>) -> RequestContext {
    if let Some(session) = session {
        match bearer_value(&session.token) {
            Ok(value) => {
                ctx.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!(url = %ctx.url, "Stored token is not a valid header value, sending unauthenticated"),
        }
    }

    if ctx.is_multipart() {
        // The transport writes its own boundary-bearing content-type.
        ctx.headers.remove(CONTENT_TYPE);
    } else if !pinned_to_multipart(&ctx) {
        ctx.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }

    debug!(
        method = %ctx.method,
        url = %ctx.url,
        authenticated = ctx.headers.contains_key(AUTHORIZATION),
        multipart = ctx.is_multipart(),
        "Request decorated"
    );
    ctx
}
