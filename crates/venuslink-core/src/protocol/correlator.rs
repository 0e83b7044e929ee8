//! Transaction correlation
//!
//! Matches inbound frames to the command that caused them. The device may
//! push a data frame before acknowledging the command, and frames for other
//! command ids may be interleaved, so data frames are buffered by command id
//! and only released to the caller once the ACK commits the transaction.

use std::collections::HashMap;
use std::time::Duration;

use super::frame::{parse_frame, DataFrame, Frame, Side};
use super::stream::FrameChannel;
use super::{ProtocolError, DEFAULT_MAX_PENDING};

/// Live record for one command id
#[derive(Debug, Clone)]
struct PendingTransaction {
    /// Side the caller expects the answer from; `None` for unsolicited data
    expected_side: Option<Side>,
    /// Data frame seen before the commit signal
    buffered: Option<(Side, Vec<u8>)>,
    /// Insertion order, used to pick eviction victims
    seq: u64,
}

/// Tracks in-flight commands and buffers early or interleaved data frames
#[derive(Debug)]
pub struct Correlator {
    pending: HashMap<u8, PendingTransaction>,
    max_pending: usize,
    next_seq: u64,
    rx_bytes: u64,
    rx_frames: u64,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

impl Correlator {
    /// Create a correlator holding at most `max_pending` entries
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: HashMap::new(),
            // There are only 256 command ids
            max_pending: max_pending.clamp(1, 256),
            next_seq: 0,
            rx_bytes: 0,
            rx_frames: 0,
        }
    }

    /// Register a command that has just been (or is about to be) sent.
    ///
    /// Fails with [`ProtocolError::TransactionPending`] while an earlier
    /// transaction for the same id is unresolved. Unsolicited data already
    /// buffered for the id is kept and adopted by the new transaction.
    pub fn begin(&mut self, command_id: u8, side: Side) -> Result<(), ProtocolError> {
        if let Some(entry) = self.pending.get_mut(&command_id) {
            if entry.expected_side.is_some() {
                return Err(ProtocolError::TransactionPending(command_id));
            }
            tracing::debug!(
                "correlator: command {:#04x} adopts buffered unsolicited data",
                command_id
            );
            entry.expected_side = Some(side);
            return Ok(());
        }

        self.make_room()?;
        let seq = self.bump_seq();
        self.pending.insert(
            command_id,
            PendingTransaction {
                expected_side: Some(side),
                buffered: None,
                seq,
            },
        );
        Ok(())
    }

    /// Read frames from `channel` until the transaction for `command_id`
    /// resolves.
    ///
    /// Returns the buffered payload once the ACK arrives, or `None` for an
    /// ACK with nothing buffered when `ack_only` is set. The transaction is
    /// evicted on every exit path except when waiting is still required.
    pub fn await_response<C: FrameChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        timeout: Duration,
        command_id: u8,
        expected_side: Side,
        ack_only: bool,
    ) -> Result<Option<Vec<u8>>, ProtocolError> {
        let result = self.await_inner(channel, timeout, command_id, expected_side, ack_only);
        if let Err(ref e) = result {
            tracing::debug!("correlator: command {:#04x} failed: {}", command_id, e);
            self.evict(command_id);
        }
        result
    }

    fn await_inner<C: FrameChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        timeout: Duration,
        command_id: u8,
        expected_side: Side,
        ack_only: bool,
    ) -> Result<Option<Vec<u8>>, ProtocolError> {
        loop {
            let line = channel.read_frame(timeout)?;
            self.rx_bytes = self.rx_bytes.saturating_add(line.len() as u64 + 1);
            self.rx_frames = self.rx_frames.saturating_add(1);

            match parse_frame(&line)? {
                Frame::Nack => {
                    // NACK carries no id; it aborts the single awaited command
                    tracing::warn!("correlator: NACK while awaiting {:#04x}", command_id);
                    return Err(ProtocolError::CommandRejected);
                }
                Frame::Ack => {
                    if let Some(payload) = self.take_buffered(command_id, expected_side)? {
                        tracing::trace!(
                            "correlator: ACK releases {} bytes for {:#04x}",
                            payload.len(),
                            command_id
                        );
                        return Ok(Some(payload));
                    }
                    if ack_only {
                        self.evict(command_id);
                        return Ok(None);
                    }
                    tracing::debug!(
                        "correlator: ACK without data for {:#04x}, still waiting",
                        command_id
                    );
                }
                Frame::Data(data) => self.buffer(data),
            }
        }
    }

    /// Release a buffered payload without waiting for an ACK.
    ///
    /// Returns `Ok(None)` when nothing is buffered for `command_id`; fails with
    /// [`ProtocolError::ChannelMismatch`] (dropping the payload) when it came
    /// from another side.
    pub fn take_buffered(
        &mut self,
        command_id: u8,
        expected_side: Side,
    ) -> Result<Option<Vec<u8>>, ProtocolError> {
        let has_data = self
            .pending
            .get(&command_id)
            .is_some_and(|entry| entry.buffered.is_some());
        if !has_data {
            return Ok(None);
        }

        let Some((side, payload)) = self
            .pending
            .remove(&command_id)
            .and_then(|entry| entry.buffered)
        else {
            return Ok(None);
        };

        if side != expected_side {
            return Err(ProtocolError::ChannelMismatch {
                expected: expected_side,
                actual: side,
            });
        }
        Ok(Some(payload))
    }

    /// Forget everything about `command_id`
    pub fn evict(&mut self, command_id: u8) -> bool {
        self.pending.remove(&command_id).is_some()
    }

    /// Drop all pending transactions and buffered data
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Whether a caller is still waiting on `command_id`
    pub fn is_pending(&self, command_id: u8) -> bool {
        self.pending
            .get(&command_id)
            .is_some_and(|entry| entry.expected_side.is_some())
    }

    /// Whether a data frame is buffered for `command_id`
    pub fn has_buffered(&self, command_id: u8) -> bool {
        self.pending
            .get(&command_id)
            .is_some_and(|entry| entry.buffered.is_some())
    }

    /// Number of map entries (awaited or holding unsolicited data)
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of transactions a caller is still waiting on
    pub fn awaiting_count(&self) -> usize {
        self.pending
            .values()
            .filter(|entry| entry.expected_side.is_some())
            .count()
    }

    /// Configured capacity
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Cumulative bytes and frames read through this correlator
    pub fn rx_counters(&self) -> (u64, u64) {
        (self.rx_bytes, self.rx_frames)
    }

    fn buffer(&mut self, data: DataFrame) {
        let DataFrame {
            command_id,
            side,
            payload,
        } = data;
        tracing::trace!(
            "correlator: buffering {} bytes for {:#04x} from {}",
            payload.len(),
            command_id,
            side
        );

        if let Some(entry) = self.pending.get_mut(&command_id) {
            if entry.buffered.is_some() {
                tracing::debug!(
                    "correlator: replacing buffered data for {:#04x}",
                    command_id
                );
            }
            entry.buffered = Some((side, payload));
            return;
        }

        if self.make_room().is_err() {
            tracing::warn!(
                "correlator: no room to buffer unsolicited data for {:#04x}, dropping",
                command_id
            );
            return;
        }
        let seq = self.bump_seq();
        self.pending.insert(
            command_id,
            PendingTransaction {
                expected_side: None,
                buffered: Some((side, payload)),
                seq,
            },
        );
    }

    /// Evict the oldest unsolicited entry if the map is full.
    ///
    /// Entries a caller is waiting on are never evicted.
    fn make_room(&mut self) -> Result<(), ProtocolError> {
        if self.pending.len() < self.max_pending {
            return Ok(());
        }
        let victim = self
            .pending
            .iter()
            .filter(|(_, entry)| entry.expected_side.is_none())
            .min_by_key(|(_, entry)| entry.seq)
            .map(|(&id, _)| id);

        match victim {
            Some(id) => {
                tracing::debug!("correlator: evicting unsolicited data for {:#04x}", id);
                self.pending.remove(&id);
                Ok(())
            }
            None => Err(ProtocolError::BufferOverflow),
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }
}
