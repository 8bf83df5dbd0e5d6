//! Blocking-friendly wrapper around a wiremock server for unit tests.

use wiremock::{Mock, MockServer, Request};

/// A mock HTTP API usable from plain `#[test]` functions.
///
/// The channels under test make blocking requests, which must not run on a
/// tokio worker, so the server lives behind its own runtime.
pub(crate) struct MockApi {
    // Field order matters: the server is dropped (and verified) before the
    // runtime that created it.
    server: MockServer,
    runtime: tokio::runtime::Runtime,
}

impl MockApi {
    pub(crate) fn start() -> Self {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub(crate) fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub(crate) fn uri(&self) -> String {
        self.server.uri()
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}
