//! Shared fakes and loopback stubs for unit tests.

use std::sync::Mutex;

use axum::Router;

use crate::session::Navigator;

/// Navigator fake that records every forced navigation.
pub struct RecordingNavigator {
    location: Mutex<String>,
    replacements: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(location: &str) -> Self {
        Self {
            location: Mutex::new(location.to_string()),
            replacements: Mutex::new(Vec::new()),
        }
    }

    pub fn replacements(&self) -> Vec<String> {
        self.replacements.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn location(&self) -> String {
        self.location.lock().unwrap().clone()
    }

    fn replace(&self, path: &str) {
        *self.location.lock().unwrap() = path.to_string();
        self.replacements.lock().unwrap().push(path.to_string());
    }
}

/// Serve a stub router on a loopback port, returning its origin.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}
