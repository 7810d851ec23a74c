// src/comms.rs - Instruction queue and acknowledgement channel seams
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::instruction::{Instruction, JCodeParser};

/// Result of a non-blocking pull from an instruction source
#[derive(Debug, Clone, PartialEq)]
pub enum Pull {
    Instruction(Instruction),
    /// Nothing buffered right now; try again next tick.
    Empty,
    /// The producer is gone and the queue is drained.
    Closed,
}

/// Messages sent back to the instruction producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Telemetry {
    /// One instruction has been fully consumed.
    Consumed,
    Log { message: String },
}

#[derive(Debug, Error)]
pub enum CommsError {
    #[error("Acknowledgement channel closed")]
    SinkClosed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Telemetry encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ordered instruction queue read by the control loop. Must never block.
pub trait InstructionSource {
    fn try_pull(&mut self) -> Pull;
}

/// Where acknowledgements and log messages go.
pub trait AckSink {
    fn emit(&mut self, telemetry: Telemetry) -> Result<(), CommsError>;

    fn acknowledge(&mut self) -> Result<(), CommsError> {
        self.emit(Telemetry::Consumed)
    }

    fn log(&mut self, message: impl Into<String>) -> Result<(), CommsError>
    where
        Self: Sized,
    {
        self.emit(Telemetry::Log { message: message.into() })
    }
}

impl InstructionSource for mpsc::Receiver<Instruction> {
    fn try_pull(&mut self) -> Pull {
        match self.try_recv() {
            Ok(ins) => Pull::Instruction(ins),
            Err(TryRecvError::Empty) => Pull::Empty,
            Err(TryRecvError::Disconnected) => Pull::Closed,
        }
    }
}

impl InstructionSource for mpsc::UnboundedReceiver<Instruction> {
    fn try_pull(&mut self) -> Pull {
        match self.try_recv() {
            Ok(ins) => Pull::Instruction(ins),
            Err(TryRecvError::Empty) => Pull::Empty,
            Err(TryRecvError::Disconnected) => Pull::Closed,
        }
    }
}

/// An in-memory queue that is never closed; an empty queue just means "wait".
impl InstructionSource for VecDeque<Instruction> {
    fn try_pull(&mut self) -> Pull {
        match self.pop_front() {
            Some(ins) => Pull::Instruction(ins),
            None => Pull::Empty,
        }
    }
}

/// Applies backpressure when the channel is full.
///
/// Uses `blocking_send`, so it must not be called from inside an async task;
/// run the control loop on a blocking thread instead.
impl AckSink for mpsc::Sender<Telemetry> {
    fn emit(&mut self, telemetry: Telemetry) -> Result<(), CommsError> {
        self.blocking_send(telemetry).map_err(|_| CommsError::SinkClosed)
    }
}

impl AckSink for mpsc::UnboundedSender<Telemetry> {
    fn emit(&mut self, telemetry: Telemetry) -> Result<(), CommsError> {
        mpsc::UnboundedSender::send(self, telemetry).map_err(|_| CommsError::SinkClosed)
    }
}

impl AckSink for Vec<Telemetry> {
    fn emit(&mut self, telemetry: Telemetry) -> Result<(), CommsError> {
        self.push(telemetry);
        Ok(())
    }
}

/// Producer side of the instruction queue: parse jcode lines from `input`
/// and push them into `tx`, waiting whenever the queue is full.
///
/// Bad statements are skipped. Returns when the input ends or the control
/// loop drops its receiver; dropping `tx` then closes the queue.
pub async fn read_instructions<R>(input: R, tx: mpsc::Sender<Instruction>) -> Result<(), CommsError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        for parsed in JCodeParser::new(&line) {
            match parsed {
                Ok(ins) => {
                    if tx.send(ins).await.is_err() {
                        tracing::debug!("Control loop stopped reading instructions");
                        return Ok(());
                    }
                }
                Err(e) => tracing::warn!("Skipping statement on line {}: {}", line_no, e),
            }
        }
    }
    tracing::info!("Instruction input closed after {} lines", line_no);
    Ok(())
}

/// Consumer side of the telemetry channel: one JSON object per line.
pub async fn write_telemetry<W>(mut output: W, mut rx: mpsc::Receiver<Telemetry>) -> Result<(), CommsError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(telemetry) = rx.recv().await {
        let mut line = serde_json::to_vec(&telemetry)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        output.flush().await?;
    }
    Ok(())
}
