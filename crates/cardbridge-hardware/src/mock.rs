//! Mock hardware for testing and development.
//!
//! The mocks follow the `(device, handle)` split: the device side is moved
//! into the session while the handle stays with the test, which uses it to
//! present reports, inject failures and inspect what the session did.

use cardbridge_core::{BridgeError, Result};
use cardbridge_protocol::{CardReport, ReaderCommand};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::devices::AnyHidReader;
use crate::traits::{HidBackend, HidReader, TagSink};

/// Mock HID reader fed from a report channel.
///
/// # Examples
///
/// ```
/// use cardbridge_hardware::mock::MockHidReader;
/// use cardbridge_hardware::traits::HidReader;
/// use cardbridge_protocol::ReaderCommand;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cardbridge_core::Result<()> {
/// let (mut reader, handle) = MockHidReader::new();
///
/// reader.send_command(ReaderCommand::ReadTag).await?;
/// assert_eq!(handle.sent_commands(), vec![ReaderCommand::ReadTag]);
///
/// handle.push_report(vec![0u8; 24]).await;
/// let report = reader.read_report().await?;
/// assert_eq!(report.len(), 24);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockHidReader {
    report_rx: mpsc::Receiver<Result<CardReport>>,
    journal: Arc<Mutex<Vec<ReaderCommand>>>,
    fail_writes: Arc<AtomicBool>,
    path: String,
}

impl MockHidReader {
    /// Create a mock reader with the default device path.
    pub fn new() -> (Self, MockHidReaderHandle) {
        Self::with_path("hid#vid_0416&pid_b029#mock".to_string())
    }

    /// Create a mock reader with a custom device path.
    pub fn with_path(path: String) -> (Self, MockHidReaderHandle) {
        let (report_tx, report_rx) = mpsc::channel(32);
        let journal = Arc::new(Mutex::new(Vec::new()));
        let fail_writes = Arc::new(AtomicBool::new(false));

        let reader = Self {
            report_rx,
            journal: Arc::clone(&journal),
            fail_writes: Arc::clone(&fail_writes),
            path,
        };

        let handle = MockHidReaderHandle {
            report_tx,
            journal,
            fail_writes,
        };

        (reader, handle)
    }
}

impl HidReader for MockHidReader {
    async fn send_command(&mut self, command: ReaderCommand) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::device_io("simulated write failure"));
        }
        self.journal
            .lock()
            .expect("command journal poisoned")
            .push(command);
        Ok(())
    }

    async fn read_report(&mut self) -> Result<CardReport> {
        self.report_rx
            .recv()
            .await
            .ok_or_else(|| BridgeError::device_io("report channel closed"))?
    }

    fn path(&self) -> &str {
        &self.path
    }
}

/// Control handle for a [`MockHidReader`].
#[derive(Debug, Clone)]
pub struct MockHidReaderHandle {
    report_tx: mpsc::Sender<Result<CardReport>>,
    journal: Arc<Mutex<Vec<ReaderCommand>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockHidReaderHandle {
    /// Deliver a raw report to the reader.
    pub async fn push_report(&self, data: Vec<u8>) {
        let _ = self.report_tx.send(Ok(CardReport::new(data))).await;
    }

    /// Make the next pending read fail.
    pub async fn push_read_failure(&self) {
        let _ = self
            .report_tx
            .send(Err(BridgeError::device_io("simulated read failure")))
            .await;
    }

    /// Toggle failure of all subsequent command writes.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Commands the session has written so far.
    pub fn sent_commands(&self) -> Vec<ReaderCommand> {
        self.journal
            .lock()
            .expect("command journal poisoned")
            .clone()
    }

    /// Number of commands written so far.
    pub fn sent_count(&self) -> usize {
        self.journal.lock().expect("command journal poisoned").len()
    }
}

/// Mock HID backend handing out queued readers.
///
/// `open_matching` pops the next queued reader; with an empty queue it
/// reports [`BridgeError::DeviceNotFound`], which exercises the session's
/// not-found path. The queue is shared with the handle, so a test can plug
/// a device in after the backend moved into the session.
#[derive(Debug)]
pub struct MockHidBackend {
    readers: Arc<Mutex<VecDeque<MockHidReader>>>,
}

impl MockHidBackend {
    /// Create a backend with no devices attached.
    pub fn new() -> (Self, MockHidBackendHandle) {
        let readers = Arc::new(Mutex::new(VecDeque::new()));
        (
            Self {
                readers: Arc::clone(&readers),
            },
            MockHidBackendHandle { readers },
        )
    }
}

impl HidBackend for MockHidBackend {
    async fn open_matching(&mut self, identity: &str) -> Result<AnyHidReader> {
        let reader = self
            .readers
            .lock()
            .expect("reader queue poisoned")
            .pop_front();
        match reader {
            Some(reader) => Ok(AnyHidReader::Mock(reader)),
            None => Err(BridgeError::device_not_found(identity)),
        }
    }
}

/// Control handle for a [`MockHidBackend`].
#[derive(Debug, Clone)]
pub struct MockHidBackendHandle {
    readers: Arc<Mutex<VecDeque<MockHidReader>>>,
}

impl MockHidBackendHandle {
    /// Queue a reader for the next `open_matching` call. May be called
    /// before or after the backend moved into the session, simulating a
    /// hot-plug.
    pub fn push_reader(&self, reader: MockHidReader) {
        self.readers
            .lock()
            .expect("reader queue poisoned")
            .push_back(reader);
    }

    /// Number of queued readers.
    pub fn queued(&self) -> usize {
        self.readers.lock().expect("reader queue poisoned").len()
    }
}

/// Mock tag sink journaling every forwarded tag.
#[derive(Debug)]
pub struct MockTagSink {
    forwarded: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl MockTagSink {
    /// Create a mock sink and its control handle.
    pub fn new() -> (Self, MockTagSinkHandle) {
        let forwarded = Arc::new(Mutex::new(Vec::new()));
        let fail = Arc::new(AtomicBool::new(false));

        let sink = Self {
            forwarded: Arc::clone(&forwarded),
            fail: Arc::clone(&fail),
        };

        (sink, MockTagSinkHandle { forwarded, fail })
    }
}

impl TagSink for MockTagSink {
    async fn probe(&mut self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::serial_open("mock", "simulated port unavailable"));
        }
        Ok(())
    }

    async fn forward(&mut self, tag: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::serial_write("simulated port unavailable"));
        }
        self.forwarded
            .lock()
            .expect("forward journal poisoned")
            .push(tag.to_string());
        Ok(())
    }
}

/// Control handle for a [`MockTagSink`].
#[derive(Debug, Clone)]
pub struct MockTagSinkHandle {
    forwarded: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl MockTagSinkHandle {
    /// Toggle failure of subsequent probe/forward calls.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Tags forwarded so far.
    pub fn forwarded(&self) -> Vec<String> {
        self.forwarded
            .lock()
            .expect("forward journal poisoned")
            .clone()
    }

    /// Number of forwarded tags.
    pub fn forward_count(&self) -> usize {
        self.forwarded.lock().expect("forward journal poisoned").len()
    }
}
