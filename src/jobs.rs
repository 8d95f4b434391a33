//! Job submission.
//!
//! Encodes a QObject message and hands it to one of the emulator's job
//! queues. Submission is single-shot: no retry, no buffering. Whatever the
//! backend reports (unknown queue, busy) is returned as-is.

use std::fmt;

use crate::backend::BackendHandle;
use crate::qobject::QObject;
use crate::types::{JobEncoding, QueueName, Result};

#[derive(Clone)]
pub struct JobClient {
    backend: BackendHandle,
    encoding: JobEncoding,
}

impl fmt::Debug for JobClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobClient")
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl JobClient {
    pub fn new(backend: BackendHandle) -> Self {
        Self::with_encoding(backend, JobEncoding::default())
    }

    pub fn with_encoding(backend: BackendHandle, encoding: JobEncoding) -> Self {
        Self { backend, encoding }
    }

    pub fn encoding(&self) -> JobEncoding {
        self.encoding
    }

    /// Encode `message` and submit it to `queue`.
    pub fn add_job(&self, queue: &QueueName, message: &QObject) -> Result<()> {
        let payload = match self.encoding {
            JobEncoding::Compact => message.to_json_bytes()?,
            JobEncoding::Pretty => message.to_json_pretty_bytes()?,
        };
        self.add_raw_job(queue, &payload)
    }

    /// Submit an already-encoded message.
    pub fn add_raw_job(&self, queue: &QueueName, payload: &[u8]) -> Result<()> {
        tracing::debug!("add_job queue={} bytes={}", queue, payload.len());
        self.backend.add_job(queue.as_str(), payload).map_err(|err| {
            tracing::warn!("add_job to {} failed: {}", queue, err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, SimBackend};
    use crate::qobject::QDict;
    use crate::types::Error;
    use std::sync::Arc;

    fn message() -> QObject {
        let mut d = QDict::new();
        d.put_int("count", 5);
        d.put_str("name", "tracer");
        QObject::Dict(d)
    }

    #[test]
    fn test_add_job_forwards_encoded_message() {
        let mut backend = MockBackend::new();
        backend
            .expect_add_job()
            .withf(|queue, payload| {
                queue == "ra.jobs" && payload == &br#"{"count":5,"name":"tracer"}"#[..]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let client = JobClient::new(Arc::new(backend));
        let queue = QueueName::from_string("ra.jobs").unwrap();
        client.add_job(&queue, &message()).unwrap();
    }

    #[test]
    fn test_pretty_encoding() {
        let sim = Arc::new(SimBackend::new().with_queue("q"));
        let client = JobClient::with_encoding(sim.clone(), JobEncoding::Pretty);
        let queue = QueueName::from_string("q").unwrap();
        client.add_job(&queue, &message()).unwrap();

        let jobs = sim.jobs("q").unwrap();
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].contains(&b'\n'));
        assert_eq!(QObject::from_json_slice(&jobs[0]).unwrap(), message());
    }

    #[test]
    fn test_backend_error_is_not_retried() {
        let mut backend = MockBackend::new();
        backend
            .expect_add_job()
            .times(1)
            .returning(|queue, _| Err(Error::backend(format!("queue not found: {}", queue))));

        let client = JobClient::new(Arc::new(backend));
        let queue = QueueName::from_string("missing").unwrap();
        let err = client.add_job(&queue, &QObject::Null).unwrap_err();
        assert!(err.to_string().contains("queue not found: missing"));
    }

    #[test]
    fn test_raw_job() {
        let sim = Arc::new(SimBackend::new().with_queue("raw"));
        let client = JobClient::new(sim.clone());
        let queue = QueueName::from_string("raw").unwrap();
        client.add_raw_job(&queue, &[0xca, 0xfe]).unwrap();
        assert_eq!(&sim.jobs("raw").unwrap()[0][..], &[0xca, 0xfe]);
    }
}
