use carehub_core::{SessionInvalidated, SessionObserver};
use parking_lot::Mutex;

/// Path the console reports while a login command is running.
pub const LOGIN_PATH: &str = "/login";

/// Path for every other command.
pub const CONSOLE_PATH: &str = "/console";

/// Tracks which "page" the console is on and reports forced logouts.
pub struct ConsoleObserver {
    path: Mutex<String>,
    redirect: Mutex<Option<String>>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self {
            path: Mutex::new(CONSOLE_PATH.to_string()),
            redirect: Mutex::new(None),
        }
    }

    pub fn enter(&self, path: &str) {
        *self.path.lock() = path.to_string();
    }

    /// Redirect requested by the last invalidation, if any.
    pub fn take_redirect(&self) -> Option<String> {
        self.redirect.lock().take()
    }
}

impl SessionObserver for ConsoleObserver {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn session_invalidated(&self, event: &SessionInvalidated) {
        *self.redirect.lock() = event.redirect_to.clone();
    }
}
