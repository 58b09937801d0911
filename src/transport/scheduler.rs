//! # Chunk Scheduler
//!
//! Writes a [`CommandBuffer`] to the printer in fixed-size chunks with an
//! open-loop pause between them. The printers have no flow control, so the
//! pause is what keeps their receive buffer from overflowing.
//!
//! ```text
//! buffer (L bytes) ─► [20][20][20]...[L mod 20]
//!                      │ 50ms │ 50ms │ ... no pause after the last
//! ```
//!
//! The first failed write aborts the job; nothing after it is sent.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::connector::PrinterHandle;
use super::gatt::GattDevice;
use crate::buffer::CommandBuffer;
use crate::error::PrinterError;
use crate::printer::PrinterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    chunk_size: usize,
    chunk_delay: Duration,
}

impl Scheduler {
    pub fn new(config: &PrinterConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_delay: config.chunk_delay,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_delay(&self) -> Duration {
        self.chunk_delay
    }

    /// Send every byte of `buffer`, in order, one chunk per write.
    pub async fn transmit<D: GattDevice>(
        &self,
        handle: &PrinterHandle<D>,
        buffer: &CommandBuffer,
    ) -> Result<(), PrinterError> {
        let total = buffer.chunk_count(self.chunk_size);
        info!(
            bytes = buffer.len(),
            chunks = total,
            chunk_size = self.chunk_size,
            "Transmitting"
        );

        for (i, chunk) in buffer.chunks(self.chunk_size).enumerate() {
            if i > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }

            if let Err(e) = handle.write(chunk).await {
                warn!(chunk = i + 1, total, error = %e, "Write failed, aborting job");
                return Err(PrinterError::WriteFailed {
                    chunk: i + 1,
                    total,
                    reason: e.0,
                });
            }
            debug!(chunk = i + 1, total, len = chunk.len(), "Chunk written");
        }

        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(&PrinterConfig::MM58)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::PrinterProfile;
    use crate::printer::config::{STANDARD_SERVICE, STANDARD_WRITE_CHARACTERISTIC};
    use crate::transport::connector::DeviceConnector;
    use crate::transport::gatt::CharacteristicProperties;
    use crate::transport::memory::{MemoryCentral, MemoryPrinter};
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    fn printer() -> MemoryPrinter {
        MemoryPrinter::new("RPP02N")
            .advertising(STANDARD_SERVICE)
            .with_characteristic(
                STANDARD_SERVICE,
                STANDARD_WRITE_CHARACTERISTIC,
                CharacteristicProperties::writable(),
            )
    }

    async fn connected(printer: &MemoryPrinter) -> DeviceConnector<MemoryCentral> {
        let mut connector = DeviceConnector::new(
            MemoryCentral::new().with_printer(printer.clone()),
            PrinterProfile::default(),
        );
        connector.connect().await.unwrap();
        connector
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_and_pacing() {
        let printer = printer();
        let connector = connected(&printer).await;
        let payload: Vec<u8> = (0..45).collect();

        let start = Instant::now();
        Scheduler::default()
            .transmit(connector.handle().unwrap(), &CommandBuffer::from(payload.clone()))
            .await
            .unwrap();

        // Three chunks, two pauses
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        let sizes: Vec<usize> = printer.writes().iter().map(|w| w.data.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(printer.written_bytes(), payload);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_chunk_has_no_delay() {
        let printer = printer();
        let connector = connected(&printer).await;

        let start = Instant::now();
        Scheduler::default()
            .transmit(connector.handle().unwrap(), &CommandBuffer::from(vec![0x1B, 0x40]))
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(printer.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_buffer_writes_nothing() {
        let printer = printer();
        let connector = connected(&printer).await;
        Scheduler::default()
            .transmit(connector.handle().unwrap(), &CommandBuffer::new())
            .await
            .unwrap();
        assert!(printer.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_failure_aborts() {
        let printer = printer().failing_write_at(2);
        let connector = connected(&printer).await;

        let err = Scheduler::default()
            .transmit(connector.handle().unwrap(), &CommandBuffer::from(vec![0u8; 100]))
            .await
            .unwrap_err();

        match err {
            PrinterError::WriteFailed { chunk, total, .. } => {
                assert_eq!(chunk, 3);
                assert_eq!(total, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Chunks 1 and 2 went out; 4 and 5 were never attempted
        assert_eq!(printer.writes().len(), 2);
        assert_eq!(printer.written_bytes().len(), 40);
    }

    #[test]
    fn test_zero_chunk_size_clamped() {
        let config = PrinterConfig {
            chunk_size: 0,
            ..PrinterConfig::MM58
        };
        assert_eq!(Scheduler::new(&config).chunk_size(), 1);
    }
}
