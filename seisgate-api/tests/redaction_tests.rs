//! Credentials never reach log lines or error bodies.

mod support;

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::http::StatusCode;
use seisgate_core::{
    Connection, ConnectionDescriptor, ConnectionMaker, CoreResult, DatasetHandle, GatewayError,
};
use seisgate_test_utils::fixtures::*;
use seisgate_test_utils::{DATASET, READER_TOKEN};
use support::{get_request, post_request, send, TestApp};

/// Engine whose failures quote the connection string, credential included.
struct EchoingEngine {
    fail_connect: bool,
}

struct EchoingConnection {
    connection_string: String,
}

impl ConnectionMaker for EchoingEngine {
    fn connect(&self, descriptor: &ConnectionDescriptor) -> CoreResult<Arc<dyn Connection>> {
        let connection_string = format!(
            "{}?{}",
            descriptor.dataset(),
            descriptor.credential().expose()
        );
        if self.fail_connect {
            return Err(GatewayError::internal(format!(
                "Malformed connection string {}",
                connection_string
            )));
        }
        Ok(Arc::new(EchoingConnection { connection_string }))
    }
}

#[async_trait]
impl Connection for EchoingConnection {
    async fn is_authorized_to_read(&self) -> bool {
        false
    }

    fn open(&self) -> CoreResult<Box<dyn DatasetHandle>> {
        Err(GatewayError::internal(format!(
            "Could not open VDS: {} refused the request",
            self.connection_string
        )))
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let buffer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn test_engine_errors_are_scrubbed() -> Result<(), String> {
    let (logs, _guard) = capture();

    for fail_connect in [false, true] {
        let router = TestApp::with_engine(Arc::new(EchoingEngine { fail_connect }));
        let request = post_request("/slice", &slice_request(DATASET, "i", 0, READER_TOKEN))?;
        let response = send(&router, request).await?;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let error = response.error()?;
        assert!(error.contains("<redacted>"), "{}", error);
        assert!(!error.contains(READER_TOKEN));
    }

    let logs = logs.contents();
    assert!(logs.contains("Request failed"));
    assert!(!logs.contains(READER_TOKEN));
    Ok(())
}

#[tokio::test]
async fn test_successful_requests_do_not_log_credentials() -> Result<(), String> {
    let (logs, _guard) = capture();
    let app = TestApp::new();

    let request = get_request("/slice", &slice_request(DATASET, "i", 0, READER_TOKEN))?;
    assert_eq!(send(&app.router, request).await?.status, StatusCode::OK);
    let request = post_request("/metadata", &metadata_request(DATASET, READER_TOKEN))?;
    assert_eq!(send(&app.router, request).await?.status, StatusCode::OK);

    let logs = logs.contents();
    assert!(logs.contains("Request completed"));
    assert!(logs.contains("fingerprint"));
    assert!(!logs.contains(READER_TOKEN));
    Ok(())
}
