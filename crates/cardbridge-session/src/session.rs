//! The device lifecycle state machine.
//!
//! A [`DeviceSession`] owns one physical reader for the life of the process
//! and mediates every command and report. Two activity sources exist: the
//! poll timer and the reader I/O task. Both funnel into a single-consumer
//! event loop, so all session state (`last_seen_tag`, attach flags) has
//! exactly one writer and needs no locking.
//!
//! ```text
//! Poll timer ──tick──┐
//!                    ├──► DeviceSession event loop ──► TagSink ──► serial
//! Reader I/O ─report─┘          │
//! SessionHandle ─insert/remove──┘
//! ```
//!
//! The reader I/O task receives commands over a size-1 queue, writes the
//! frame and performs exactly one report read per command. Together with
//! the scheduler's skip-if-busy rule this guarantees at most one read
//! command in flight.
//!
//! While no device is attached the same timer drives a quiet reattach
//! probe, so a reader that is absent at startup or unplugged mid-run is
//! picked up again without outside help. Repeated poll failures are
//! treated as an unplug; see [`MAX_POLL_FAILURES`].

use cardbridge_core::{BridgeError, LogRouter, Result, SessionConfig};
use cardbridge_hardware::devices::{AnyHidBackend, AnyHidReader, AnyTagSink};
use cardbridge_hardware::traits::{HidBackend, HidReader, TagSink};
use cardbridge_protocol::{CardReport, ReaderCommand, decode};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::scheduler::PollScheduler;

/// Consecutive poll failures after which the reader is treated as
/// detached. The poll timer then probes for it again each interval.
pub const MAX_POLL_FAILURES: u32 = 3;

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No device attached.
    Disconnected,

    /// Device attached, no poll outstanding.
    AttachedIdle,

    /// Device attached, one read command in flight.
    AttachedPolling,
}

impl SessionState {
    /// Whether a device is currently attached.
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::AttachedIdle | Self::AttachedPolling)
    }
}

/// Event consumed by the session's serialized loop.
#[derive(Debug)]
pub enum SessionEvent {
    /// A card report arrived from the reader I/O task.
    Report(CardReport),

    /// The reader I/O task failed to complete a poll.
    PollFailed(BridgeError),

    /// The device (re)appeared; hot-plug notification from the host shell.
    Inserted,

    /// The device was detached.
    Removed,

    /// Tear down and exit the event loop.
    Shutdown,
}

/// Cloneable handle the host shell uses to drive the session from outside.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Notify the session that the device reappeared.
    pub async fn device_inserted(&self) -> Result<()> {
        self.send(SessionEvent::Inserted).await
    }

    /// Notify the session that the device was detached.
    pub async fn device_removed(&self) -> Result<()> {
        self.send(SessionEvent::Removed).await
    }

    /// Force a clean teardown before process exit. Identical to
    /// [`device_removed`](Self::device_removed); exposed under the name the
    /// host shell calls it by.
    pub async fn remove_device(&self) -> Result<()> {
        self.send(SessionEvent::Removed).await
    }

    /// Stop the session's event loop.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionEvent::Shutdown).await
    }

    async fn send(&self, event: SessionEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| BridgeError::device_io("session event loop terminated"))
    }
}

/// The running reader I/O side: command queue plus task handle.
#[derive(Debug)]
struct ReaderIo {
    poll_tx: mpsc::Sender<ReaderCommand>,
    task: JoinHandle<()>,
}

/// Owns the HID reader, tracks attach/detach and last-seen-tag state and
/// drives the serial forwarder.
///
/// Constructed with [`DeviceSession::new`], wired up with
/// [`connect`](DeviceSession::connect) and then driven by
/// [`run`](DeviceSession::run).
#[derive(Debug)]
pub struct DeviceSession {
    config: SessionConfig,
    backend: AnyHidBackend,
    sink: AnyTagSink,
    log: LogRouter,
    scheduler: PollScheduler,
    state: SessionState,
    last_seen_tag: String,
    removed: bool,
    poll_failures: u32,
    io: Option<ReaderIo>,
    event_tx: mpsc::Sender<SessionEvent>,
    event_rx: Option<mpsc::Receiver<SessionEvent>>,
}

impl DeviceSession {
    /// Create a session from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MissingConfiguration`] if a mandatory value is
    /// absent; this is the only failure that prevents a session from
    /// existing at all.
    pub fn new(
        config: SessionConfig,
        backend: AnyHidBackend,
        sink: AnyTagSink,
        log: LogRouter,
    ) -> Result<(Self, SessionHandle)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(32);
        let scheduler = PollScheduler::new(config.poll_interval());
        let handle = SessionHandle {
            event_tx: event_tx.clone(),
        };

        let session = Self {
            config,
            backend,
            sink,
            log,
            scheduler,
            state: SessionState::Disconnected,
            last_seen_tag: String::new(),
            removed: false,
            poll_failures: 0,
            io: None,
            event_tx,
            event_rx: Some(event_rx),
        };

        Ok((session, handle))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Hex form of the most recently accepted tag; empty after detach or a
    /// no-card report.
    pub fn last_seen_tag(&self) -> &str {
        &self.last_seen_tag
    }

    /// Enumerate, select and open the reader, then validate the serial port.
    ///
    /// On success the session is attached and idle. A device that cannot be
    /// found leaves the session disconnected; once [`run`](Self::run) is
    /// driving the loop, the poll timer keeps probing for it and attaches
    /// it when it appears. The serial port is opened and immediately closed
    /// so an unavailable port surfaces at startup; that failure is logged
    /// but does not fail the connect.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DeviceNotFound`] or
    /// [`BridgeError::DeviceIo`]; both are logged before returning.
    pub async fn connect(&mut self) -> Result<()> {
        let identity = self.config.device_identity.clone();
        match self.backend.open_matching(&identity).await {
            Ok(reader) => {
                self.log
                    .debug_only(format!("rfid reader '{}' found", reader.path()));
                self.attach(reader);
                self.log.success("rfid reader connected");

                self.log.info("opening serial port ...");
                match self.sink.probe().await {
                    Ok(()) => self.log.info("serial port ready"),
                    Err(e) => self.log.error(format!("serial port check failed: {e}")),
                }
                Ok(())
            }
            Err(e) => {
                match &e {
                    BridgeError::DeviceNotFound { .. } => {
                        self.log.error("rfid reader not found");
                    }
                    other => self.log.error(format!("device connect failed: {other}")),
                }
                Err(e)
            }
        }
    }

    /// Spawn the reader I/O task and transition to attached-idle.
    fn attach(&mut self, reader: AnyHidReader) {
        // Size-1 queue: at most one read command can ever be pending.
        let (poll_tx, poll_rx) = mpsc::channel(1);
        let task = tokio::spawn(reader_io(reader, poll_rx, self.event_tx.clone()));
        self.io = Some(ReaderIo { poll_tx, task });
        self.scheduler.finish();
        self.poll_failures = 0;
        self.state = SessionState::AttachedIdle;
    }

    /// Try to reopen the reader and attach it. Quiet on failure; while the
    /// device is absent this runs once per poll interval.
    async fn try_reattach(&mut self) -> Result<()> {
        let identity = self.config.device_identity.clone();
        let reader = self.backend.open_matching(&identity).await?;
        if self.removed {
            self.removed = false;
            self.log.success("rfid reader reconnected");
        }
        self.log.info("waiting for card ...");
        self.attach(reader);
        Ok(())
    }

    /// Timer tick: issue a read command unless one is already outstanding.
    /// While disconnected the tick probes for the reader instead.
    async fn handle_tick(&mut self) {
        if !self.state.is_attached() {
            if let Err(e) = self.try_reattach().await {
                self.log.debug_only(format!("reader still absent: {e}"));
            }
            return;
        }
        if !self.scheduler.try_begin() {
            self.log.debug_only("poll still in flight, skipping tick");
            return;
        }
        self.log.debug_only("checking for card ...");

        let Some(io) = self.io.as_ref() else {
            self.scheduler.finish();
            return;
        };
        match io.poll_tx.try_send(ReaderCommand::ReadTag) {
            Ok(()) => self.state = SessionState::AttachedPolling,
            Err(_) => {
                // Not retried inline; the next tick polls again.
                self.scheduler.finish();
                self.log.error("failed to issue read command");
            }
        }
    }

    /// A card report arrived.
    async fn handle_report(&mut self, report: CardReport) {
        if !self.state.is_attached() {
            // Stale result from a severed reader; discard.
            return;
        }
        self.scheduler.finish();
        self.poll_failures = 0;
        self.state = SessionState::AttachedIdle;

        let tag = match decode(&report) {
            Ok(tag) => tag,
            Err(e) => {
                self.log.warning(format!("discarding card report: {e}"));
                return;
            }
        };

        if !tag.is_valid {
            // No card on the reader. Clearing the last tag means the same
            // card presented again later counts as new.
            self.last_seen_tag.clear();
            self.log.debug_only("no card found");
            return;
        }

        if tag.hex == self.last_seen_tag {
            self.log.debug_only("card already read");
            return;
        }

        self.last_seen_tag = tag.hex.clone();
        self.log
            .success(format!("card read with tag id '{}'", tag.decimal10));
        if let Err(e) = self.sink.forward(&tag.decimal10).await {
            // The write is dropped, not queued; polling continues.
            self.log.error(format!("serial forward failed: {e}"));
        }
    }

    /// The reader I/O task could not complete a poll. Enough of these in a
    /// row without a single report means the device is gone.
    fn handle_poll_failed(&mut self, error: BridgeError) {
        if !self.state.is_attached() {
            return;
        }
        self.scheduler.finish();
        self.state = SessionState::AttachedIdle;
        self.poll_failures += 1;
        self.log.error(format!("card poll failed: {error}"));
        if self.poll_failures >= MAX_POLL_FAILURES {
            self.handle_removed();
        }
    }

    /// Device detached: idempotent teardown.
    fn handle_removed(&mut self) {
        self.removed = true;
        if let Some(io) = self.io.take() {
            // Aborting the task drops the reader, closing the device handle.
            io.task.abort();
        }
        self.scheduler.finish();
        self.last_seen_tag.clear();
        if self.state != SessionState::Disconnected {
            self.log.warning("card reader disconnected");
        }
        self.state = SessionState::Disconnected;
    }

    /// Explicit insert notification from the host shell: reopen the device
    /// right away instead of waiting for the next timer probe.
    async fn handle_inserted(&mut self) {
        if self.state.is_attached() {
            self.log.debug_only("insert event while already attached");
            return;
        }
        if let Err(e) = self.try_reattach().await {
            self.log.error(format!("device reattach failed: {e}"));
        }
    }

    /// Run the serialized event loop until shutdown.
    ///
    /// Selects over the poll interval and the session event channel. The
    /// loop exits after a [`SessionEvent::Shutdown`] (or when every handle
    /// is gone), performing removal teardown on the way out.
    pub async fn run(mut self) {
        let mut events = self.event_rx.take().expect("session already running");

        let mut ticker = tokio::time::interval(self.scheduler.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first poll happens one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.handle_tick().await,
                event = events.recv() => match event {
                    Some(SessionEvent::Report(report)) => self.handle_report(report).await,
                    Some(SessionEvent::PollFailed(error)) => self.handle_poll_failed(error),
                    Some(SessionEvent::Inserted) => self.handle_inserted().await,
                    Some(SessionEvent::Removed) => self.handle_removed(),
                    Some(SessionEvent::Shutdown) | None => {
                        self.handle_removed();
                        break;
                    }
                }
            }
        }
    }
}

/// Reader I/O task: one write and exactly one report read per command.
///
/// Results for a session that detached in the meantime are discarded by the
/// state guard in the report handler.
async fn reader_io(
    mut reader: AnyHidReader,
    mut poll_rx: mpsc::Receiver<ReaderCommand>,
    events: mpsc::Sender<SessionEvent>,
) {
    while let Some(command) = poll_rx.recv().await {
        if let Err(e) = reader.send_command(command).await {
            if events.send(SessionEvent::PollFailed(e)).await.is_err() {
                break;
            }
            continue;
        }
        let event = match reader.read_report().await {
            Ok(report) => SessionEvent::Report(report),
            Err(e) => SessionEvent::PollFailed(e),
        };
        if events.send(event).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbridge_core::{LogEvent, LogLevel};
    use cardbridge_hardware::mock::{
        MockHidBackend, MockHidReader, MockHidReaderHandle, MockTagSink, MockTagSinkHandle,
    };
    use cardbridge_protocol::{TAG_LEN, TAG_OFFSET};
    use std::time::Duration;

    fn report_with_tag(tag: [u8; 5]) -> CardReport {
        let mut data = vec![0u8; 24];
        data[TAG_OFFSET..TAG_OFFSET + TAG_LEN].copy_from_slice(&tag);
        CardReport::new(data)
    }

    fn drain(rx: &mut mpsc::Receiver<LogEvent>) -> Vec<LogEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            poll_interval_ms: 50,
            debug: true,
            log_dir: std::env::temp_dir(),
            ..SessionConfig::default()
        }
    }

    struct Fixture {
        session: DeviceSession,
        handle: SessionHandle,
        reader: MockHidReaderHandle,
        sink: MockTagSinkHandle,
        log_rx: mpsc::Receiver<LogEvent>,
    }

    /// Session with one queued mock reader, not yet connected.
    fn fixture_with_readers(extra_readers: usize) -> Fixture {
        let (backend, backend_handle) = MockHidBackend::new();
        let (reader, reader_handle) = MockHidReader::new();
        backend_handle.push_reader(reader);
        for _ in 0..extra_readers {
            let (spare, _) = MockHidReader::new();
            backend_handle.push_reader(spare);
        }

        let (sink, sink_handle) = MockTagSink::new();
        let (log, log_rx) = LogRouter::new(true, std::env::temp_dir());
        let (session, handle) = DeviceSession::new(
            test_config(),
            AnyHidBackend::Mock(backend),
            AnyTagSink::Mock(sink),
            log,
        )
        .unwrap();

        Fixture {
            session,
            handle,
            reader: reader_handle,
            sink: sink_handle,
            log_rx,
        }
    }

    async fn attached_fixture() -> Fixture {
        let mut fixture = fixture_with_readers(0);
        fixture.session.connect().await.unwrap();
        fixture
    }

    #[test]
    fn test_missing_configuration_is_fatal_to_construction() {
        let config = SessionConfig {
            device_identity: String::new(),
            ..test_config()
        };
        let (log, _log_rx) = LogRouter::new(false, std::env::temp_dir());
        let (sink, _) = MockTagSink::new();
        let (backend, _backend_handle) = MockHidBackend::new();
        let result = DeviceSession::new(
            config,
            AnyHidBackend::Mock(backend),
            AnyTagSink::Mock(sink),
            log,
        );
        assert!(matches!(
            result.unwrap_err(),
            BridgeError::MissingConfiguration { .. }
        ));
    }

    #[tokio::test]
    async fn test_connect_device_not_found_stays_disconnected() {
        let (sink, _) = MockTagSink::new();
        let (log, mut log_rx) = LogRouter::new(false, std::env::temp_dir());
        let (backend, _backend_handle) = MockHidBackend::new();
        let (mut session, _handle) = DeviceSession::new(
            test_config(),
            AnyHidBackend::Mock(backend),
            AnyTagSink::Mock(sink),
            log,
        )
        .unwrap();

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, BridgeError::DeviceNotFound { .. }));
        assert_eq!(session.state(), SessionState::Disconnected);

        let events = drain(&mut log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Error && e.message.contains("not found"))
        );
    }

    #[tokio::test]
    async fn test_connect_attaches_and_probes_serial() {
        let mut fixture = attached_fixture().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);

        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Success && e.message.contains("connected"))
        );
        assert!(events.iter().any(|e| e.message.contains("serial port ready")));
    }

    #[tokio::test]
    async fn test_connect_survives_serial_probe_failure() {
        let mut fixture = fixture_with_readers(0);
        fixture.sink.set_fail(true);

        fixture.session.connect().await.unwrap();
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);

        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Error && e.message.contains("serial port check"))
        );
    }

    #[tokio::test]
    async fn test_duplicate_suppression_with_invalid_reset() {
        let mut fixture = attached_fixture().await;
        let tag = [0xAB, 0xCD, 0xEF, 0x01, 0x02];

        fixture.session.handle_report(report_with_tag(tag)).await;
        assert_eq!(fixture.sink.forwarded(), vec!["0015663362".to_string()]);
        assert_eq!(fixture.session.last_seen_tag(), "ABCDEF0102");

        // Same card still on the reader: suppressed.
        fixture.session.handle_report(report_with_tag(tag)).await;
        fixture.session.handle_report(report_with_tag(tag)).await;
        assert_eq!(fixture.sink.forward_count(), 1);

        // Card lifted: the no-card report clears the last tag.
        fixture
            .session
            .handle_report(report_with_tag([0, 0, 0, 0, 0]))
            .await;
        assert_eq!(fixture.session.last_seen_tag(), "");

        // Same card presented again counts as a new read.
        fixture.session.handle_report(report_with_tag(tag)).await;
        assert_eq!(fixture.sink.forward_count(), 2);
    }

    #[tokio::test]
    async fn test_poll_backpressure_skips_tick() {
        let mut fixture = attached_fixture().await;

        fixture.session.handle_tick().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedPolling);

        // Second and third ticks land while the poll is outstanding.
        fixture.session.handle_tick().await;
        fixture.session.handle_tick().await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fixture.reader.sent_count(), 1);
        assert_eq!(
            fixture.reader.sent_commands(),
            vec![ReaderCommand::ReadTag]
        );

        // The report completes the poll; the next tick issues again.
        fixture
            .session
            .handle_report(report_with_tag([0, 0, 0, 0, 0]))
            .await;
        fixture.session.handle_tick().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fixture.reader.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_poll_failure_frees_the_slot() {
        let mut fixture = attached_fixture().await;

        fixture.session.handle_tick().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedPolling);

        fixture
            .session
            .handle_poll_failed(BridgeError::device_io("simulated"));
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);

        fixture.session.handle_tick().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedPolling);
    }

    #[tokio::test]
    async fn test_truncated_report_logged_and_discarded() {
        let mut fixture = attached_fixture().await;

        fixture
            .session
            .handle_report(CardReport::new(vec![0x01, 0x02]))
            .await;
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);
        assert_eq!(fixture.sink.forward_count(), 0);

        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Warning && e.message.contains("discarding"))
        );
    }

    #[tokio::test]
    async fn test_removed_then_stray_report_forwards_nothing() {
        let mut fixture = attached_fixture().await;

        fixture.session.handle_removed();
        assert_eq!(fixture.session.state(), SessionState::Disconnected);
        assert_eq!(fixture.session.last_seen_tag(), "");

        // A callback that raced the removal must be discarded silently.
        fixture
            .session
            .handle_report(report_with_tag([0xAB, 0xCD, 0xEF, 0x01, 0x02]))
            .await;
        assert_eq!(fixture.sink.forward_count(), 0);
        assert_eq!(fixture.session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_removed_is_idempotent() {
        let mut fixture = attached_fixture().await;

        fixture.session.handle_removed();
        fixture.session.handle_removed();
        assert_eq!(fixture.session.state(), SessionState::Disconnected);

        // Only the first removal logs the disconnect.
        let warnings = drain(&mut fixture.log_rx)
            .into_iter()
            .filter(|e| e.level == LogLevel::Warning)
            .count();
        assert_eq!(warnings, 1);
    }

    #[tokio::test]
    async fn test_inserted_after_removed_restores_polling() {
        let mut fixture = fixture_with_readers(1);
        fixture.session.connect().await.unwrap();

        fixture.session.handle_removed();
        assert_eq!(fixture.session.state(), SessionState::Disconnected);

        fixture.session.handle_inserted().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);

        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Success && e.message.contains("reconnected"))
        );

        // Polling resumes.
        fixture.session.handle_tick().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedPolling);
    }

    #[tokio::test]
    async fn test_spurious_insert_while_attached_is_noop() {
        let mut fixture = fixture_with_readers(1);
        fixture.session.connect().await.unwrap();

        fixture.session.handle_inserted().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);
        // The spare reader was not consumed.
        let events = drain(&mut fixture.log_rx);
        assert!(!events.iter().any(|e| e.message.contains("reconnected")));
    }

    #[tokio::test]
    async fn test_insert_without_device_logs_error() {
        let mut fixture = attached_fixture().await;
        fixture.session.handle_removed();

        // Backend queue is empty now.
        fixture.session.handle_inserted().await;
        assert_eq!(fixture.session.state(), SessionState::Disconnected);

        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Error && e.message.contains("reattach failed"))
        );
    }

    #[tokio::test]
    async fn test_forward_failure_does_not_stop_session() {
        let mut fixture = attached_fixture().await;
        fixture.sink.set_fail(true);

        fixture
            .session
            .handle_report(report_with_tag([0x5D, 0x00, 0x92, 0x65, 0x70]))
            .await;
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);

        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Error && e.message.contains("serial forward failed"))
        );

        // Polling keeps going after the dropped write.
        fixture.session.handle_tick().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedPolling);
    }

    #[tokio::test]
    async fn test_tick_while_disconnected_probes_for_reader() {
        let (backend, backend_handle) = MockHidBackend::new();
        let (sink, _) = MockTagSink::new();
        let (log, _log_rx) = LogRouter::new(true, std::env::temp_dir());
        let (mut session, _handle) = DeviceSession::new(
            test_config(),
            AnyHidBackend::Mock(backend),
            AnyTagSink::Mock(sink),
            log,
        )
        .unwrap();
        assert!(session.connect().await.is_err());

        // No device yet: the probe finds nothing and stays disconnected.
        session.handle_tick().await;
        assert_eq!(session.state(), SessionState::Disconnected);

        // Reader plugged in later: the next tick attaches it without an
        // insert notification.
        let (reader, reader_handle) = MockHidReader::new();
        backend_handle.push_reader(reader);
        session.handle_tick().await;
        assert_eq!(session.state(), SessionState::AttachedIdle);

        // The tick that attached did not poll; the one after does.
        assert_eq!(reader_handle.sent_count(), 0);
        session.handle_tick().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(reader_handle.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_poll_failures_treated_as_detach() {
        let mut fixture = fixture_with_readers(1);
        fixture.session.connect().await.unwrap();

        for _ in 0..MAX_POLL_FAILURES {
            fixture
                .session
                .handle_poll_failed(BridgeError::device_io("simulated"));
        }
        assert_eq!(fixture.session.state(), SessionState::Disconnected);
        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Warning && e.message.contains("disconnected"))
        );

        // The next timer probe opens the spare reader again.
        fixture.session.handle_tick().await;
        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);
        let events = drain(&mut fixture.log_rx);
        assert!(
            events
                .iter()
                .any(|e| e.level == LogLevel::Success && e.message.contains("reconnected"))
        );
    }

    #[tokio::test]
    async fn test_report_resets_poll_failure_count() {
        let mut fixture = attached_fixture().await;

        fixture
            .session
            .handle_poll_failed(BridgeError::device_io("simulated"));
        fixture
            .session
            .handle_poll_failed(BridgeError::device_io("simulated"));
        // A completed poll clears the streak.
        fixture
            .session
            .handle_report(report_with_tag([0, 0, 0, 0, 0]))
            .await;
        fixture
            .session
            .handle_poll_failed(BridgeError::device_io("simulated"));
        fixture
            .session
            .handle_poll_failed(BridgeError::device_io("simulated"));

        assert_eq!(fixture.session.state(), SessionState::AttachedIdle);
    }

    #[tokio::test]
    async fn test_handle_drives_removal_through_run_loop() {
        let Fixture {
            session,
            handle,
            mut log_rx,
            ..
        } = attached_fixture().await;
        drain(&mut log_rx);

        let run = tokio::spawn(session.run());

        handle.remove_device().await.unwrap();
        handle.shutdown().await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("run loop did not exit")
            .unwrap();

        let events = drain(&mut log_rx);
        assert!(events.iter().any(|e| e.message.contains("disconnected")));
    }
}
