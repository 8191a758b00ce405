//! Response classification.
//!
//! Turns the outcome of an exchange into either the untouched success body
//! or an `ApiError`. A 401 additionally tears the session down and tells the
//! host application, once, where to send the user.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::warn;

use super::error::{ApiError, ErrorKind};
use super::observer::{login_redirect, SessionInvalidated, SessionObserver};
use crate::session::{SessionScope, SessionStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How an exchange failed.
#[derive(Debug)]
pub enum Failure {
    /// Connection-level failure; no response object exists.
    NoResponse(BoxError),
    /// Aborted after the configured timeout.
    TimedOut(BoxError),
    /// The server answered with a non-success status.
    Status { status: StatusCode, body: String },
}

impl Failure {
    /// A timed-out exchange has no response either, so the timeout check
    /// comes first: an abort is `TimedOut`, never `NoResponse`.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Failure::TimedOut(err.into());
        }
        match err.status() {
            Some(status) => Failure::Status {
                status,
                body: String::new(),
            },
            None => Failure::NoResponse(err.into()),
        }
    }

    /// The status line arrived but the body could not be read. A failing
    /// status is still classified by status, with an empty body.
    pub fn from_body_read(status: StatusCode, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Failure::TimedOut(err.into());
        }
        if status.is_success() {
            Failure::NoResponse(err.into())
        } else {
            Failure::Status {
                status,
                body: String::new(),
            }
        }
    }
}

pub struct ResponseClassifier {
    session: Arc<SessionStore>,
    observer: Arc<dyn SessionObserver>,
    login_path: String,
    superuser_prefix: String,
}

impl ResponseClassifier {
    pub fn new(
        session: Arc<SessionStore>,
        observer: Arc<dyn SessionObserver>,
        login_path: impl Into<String>,
        superuser_prefix: impl Into<String>,
    ) -> Self {
        Self {
            session,
            observer,
            login_path: login_path.into(),
            superuser_prefix: superuser_prefix.into(),
        }
    }

    /// Pass a success body through unchanged; classify anything else.
    pub fn check(
        &self,
        status: StatusCode,
        body: String,
        scope: SessionScope,
    ) -> Result<String, ApiError> {
        if status.is_success() {
            Ok(body)
        } else {
            Err(self.classify(Failure::Status { status, body }, scope))
        }
    }

    /// `scope` is the session the failed exchange authenticated with.
    pub fn classify(&self, failure: Failure, scope: SessionScope) -> ApiError {
        let err = match failure {
            Failure::NoResponse(cause) => ApiError::new(ErrorKind::NetworkError).with_cause(cause),
            Failure::TimedOut(cause) => ApiError::new(ErrorKind::Timeout).with_cause(cause),
            Failure::Status { status, body } => ApiError::from_status(status, &body),
        };

        warn!(
            ?scope,
            kind = %err.kind(),
            status = err.status().map(|s| s.as_u16()),
            friendly = err.friendly_message(),
            "Request failed"
        );

        if err.kind() == ErrorKind::Unauthorized {
            self.invalidate_session(scope);
        }
        err
    }

    fn invalidate_session(&self, scope: SessionScope) {
        self.session.clear();
        let current = self.observer.current_path();
        let event = SessionInvalidated {
            scope,
            redirect_to: login_redirect(&current, &self.login_path, &self.superuser_prefix),
        };
        self.observer.session_invalidated(&event);
    }
}
