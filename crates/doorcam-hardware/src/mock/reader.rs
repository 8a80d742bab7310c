//! Mock credential reader for testing and development.
//!
//! The reader is driven through a [`MockReaderHandle`]: presenting a token
//! queues it, and the next presence poll picks it up.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::CredentialReader,
    types::DeviceInfo,
};

/// Mock proximity reader.
///
/// # Examples
///
/// ```
/// use doorcam_hardware::mock::MockReader;
/// use doorcam_hardware::traits::CredentialReader;
///
/// #[tokio::main]
/// async fn main() -> doorcam_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///
///     assert!(!reader.is_token_present().await?);
///
///     handle.present_token(vec![0x0A, 0xFF]).await?;
///     assert!(reader.is_token_present().await?);
///     assert_eq!(reader.read_uid().await?, vec![0x0A, 0xFF]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for token events
    event_rx: mpsc::Receiver<TokenEvent>,

    /// Event picked up by the last presence poll, not yet read
    pending: Option<TokenEvent>,

    /// Device name
    name: String,

    counters: Arc<ReaderCounters>,
}

#[derive(Debug, Default)]
struct ReaderCounters {
    reads: AtomicUsize,
    halts: AtomicUsize,
}

impl MockReader {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock RFID Reader".to_string())
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let counters = Arc::new(ReaderCounters::default());

        let reader = Self {
            event_rx,
            pending: None,
            name,
            counters: Arc::clone(&counters),
        };

        let handle = MockReaderHandle { event_tx, counters };

        (reader, handle)
    }
}

impl Default for MockReader {
    fn default() -> Self {
        Self::new().0
    }
}

impl CredentialReader for MockReader {
    async fn is_token_present(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            match self.event_rx.try_recv() {
                Ok(event) => self.pending = Some(event),
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(HardwareError::disconnected("reader event channel closed"));
                }
            }
        }
        Ok(self.pending.is_some())
    }

    async fn read_uid(&mut self) -> Result<Vec<u8>> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);

        match self.pending.take() {
            Some(TokenEvent::Presented(uid)) => Ok(uid),
            Some(TokenEvent::ReadFailure) => Err(HardwareError::token_read("anticollision failed")),
            None => Err(HardwareError::token_read("no token in field")),
        }
    }

    async fn halt(&mut self) -> Result<()> {
        self.counters.halts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock")
            .with_firmware_version(env!("CARGO_PKG_VERSION")))
    }
}

/// Internal event type for the mock reader.
#[derive(Debug, Clone)]
enum TokenEvent {
    Presented(Vec<u8>),
    ReadFailure,
}

/// Handle for controlling a mock reader.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    event_tx: mpsc::Sender<TokenEvent>,
    counters: Arc<ReaderCounters>,
}

impl MockReaderHandle {
    /// Bring a token with the given UID into the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present_token(&self, uid: Vec<u8>) -> Result<()> {
        self.send(TokenEvent::Presented(uid)).await
    }

    /// Make the next detected token fail to read.
    pub async fn fail_next_read(&self) -> Result<()> {
        self.send(TokenEvent::ReadFailure).await
    }

    async fn send(&self, event: TokenEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("reader event channel closed"))
    }

    /// Number of UID reads attempted.
    pub fn read_count(&self) -> usize {
        self.counters.reads.load(Ordering::Relaxed)
    }

    /// Number of halt commands issued.
    pub fn halt_count(&self) -> usize {
        self.counters.halts.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_token_present_initially() {
        let (mut reader, _handle) = MockReader::new();
        assert!(!reader.is_token_present().await.unwrap());
    }

    #[tokio::test]
    async fn test_present_and_read() {
        let (mut reader, handle) = MockReader::new();

        handle.present_token(vec![0x04, 0xAB, 0xCD, 0xEF]).await.unwrap();

        assert!(reader.is_token_present().await.unwrap());
        // Polling again does not consume the pending token
        assert!(reader.is_token_present().await.unwrap());
        assert_eq!(reader.read_uid().await.unwrap(), vec![0x04, 0xAB, 0xCD, 0xEF]);
        assert!(!reader.is_token_present().await.unwrap());
        assert_eq!(handle.read_count(), 1);
    }

    #[tokio::test]
    async fn test_tokens_read_in_order() {
        let (mut reader, handle) = MockReader::new();

        handle.present_token(vec![0x01]).await.unwrap();
        handle.present_token(vec![0x02]).await.unwrap();

        assert!(reader.is_token_present().await.unwrap());
        assert_eq!(reader.read_uid().await.unwrap(), vec![0x01]);
        assert!(reader.is_token_present().await.unwrap());
        assert_eq!(reader.read_uid().await.unwrap(), vec![0x02]);
    }

    #[tokio::test]
    async fn test_read_failure() {
        let (mut reader, handle) = MockReader::new();

        handle.fail_next_read().await.unwrap();

        assert!(reader.is_token_present().await.unwrap());
        let result = reader.read_uid().await;
        assert!(matches!(result, Err(HardwareError::TokenReadError { .. })));
    }

    #[tokio::test]
    async fn test_read_without_token() {
        let (mut reader, _handle) = MockReader::new();
        assert!(reader.read_uid().await.is_err());
    }

    #[tokio::test]
    async fn test_halt_counted() {
        let (mut reader, handle) = MockReader::new();
        reader.halt().await.unwrap();
        reader.halt().await.unwrap();
        assert_eq!(handle.halt_count(), 2);
    }

    #[tokio::test]
    async fn test_disconnected_handle() {
        let (mut reader, handle) = MockReader::new();
        drop(handle);

        let result = reader.is_token_present().await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_get_info() {
        let (reader, _handle) = MockReader::with_name("Door Reader".to_string());
        let info = reader.get_info().await.unwrap();
        assert_eq!(info.name, "Door Reader");
        assert_eq!(info.model, "Mock");
        assert_eq!(info.firmware_version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
    }
}
