//! hidapi-backed HID reader.
//!
//! Device selection matches a case-insensitive identity substring against
//! the platform device path, the same way the vendor tooling addresses the
//! reader. Writes and reads complete in low tens of milliseconds; both are
//! performed inline with a bounded read timeout.

use cardbridge_core::{BridgeError, Result};
use cardbridge_protocol::{CardReport, ReaderCommand};
use hidapi::{HidApi, HidDevice};

use crate::devices::AnyHidReader;
use crate::traits::{HidBackend, HidReader};

/// Input report buffer size. Vendor reports are well under this.
const REPORT_BUF_LEN: usize = 64;

/// Upper bound on waiting for the reader's answer to a command.
const READ_TIMEOUT_MS: i32 = 1000;

/// HID backend over a shared [`HidApi`] context.
pub struct HidApiBackend {
    api: HidApi,
}

impl HidApiBackend {
    /// Initialize the hidapi context.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DeviceIo`] if the platform HID subsystem
    /// cannot be initialized.
    pub fn new() -> Result<Self> {
        let api = HidApi::new().map_err(|e| BridgeError::device_io(e.to_string()))?;
        Ok(Self { api })
    }
}

impl std::fmt::Debug for HidApiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidApiBackend").finish_non_exhaustive()
    }
}

impl HidBackend for HidApiBackend {
    async fn open_matching(&mut self, identity: &str) -> Result<AnyHidReader> {
        self.api
            .refresh_devices()
            .map_err(|e| BridgeError::device_io(e.to_string()))?;

        let needle = identity.to_lowercase();
        for info in self.api.device_list() {
            let path = info.path().to_string_lossy().into_owned();
            if !path.to_lowercase().contains(&needle) {
                continue;
            }

            tracing::debug!("HID device '{path}' matches '{identity}'");
            let device = info
                .open_device(&self.api)
                .map_err(|e| BridgeError::device_io(e.to_string()))?;
            return Ok(AnyHidReader::HidApi(HidApiReader::new(device, path)));
        }

        Err(BridgeError::device_not_found(identity))
    }
}

/// One open hidapi device.
pub struct HidApiReader {
    device: HidDevice,
    path: String,
}

impl HidApiReader {
    fn new(device: HidDevice, path: String) -> Self {
        Self { device, path }
    }
}

impl std::fmt::Debug for HidApiReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidApiReader")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl HidReader for HidApiReader {
    async fn send_command(&mut self, command: ReaderCommand) -> Result<()> {
        self.device
            .write(command.frame())
            .map_err(|e| BridgeError::device_io(format!("{command} write failed: {e}")))?;
        Ok(())
    }

    async fn read_report(&mut self) -> Result<CardReport> {
        let mut buf = [0u8; REPORT_BUF_LEN];
        let n = self
            .device
            .read_timeout(&mut buf, READ_TIMEOUT_MS)
            .map_err(|e| BridgeError::device_io(format!("report read failed: {e}")))?;
        if n == 0 {
            return Err(BridgeError::device_io(format!(
                "no report within {READ_TIMEOUT_MS}ms"
            )));
        }
        Ok(CardReport::new(buf[..n].to_vec()))
    }

    fn path(&self) -> &str {
        &self.path
    }
}
