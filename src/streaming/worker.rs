//! Background packet worker.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use super::{PacketEncoder, PacketStatus};
use crate::{Error, Result};

/// Input chunks the worker queue holds before [`PacketWorker::send`] blocks.
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

#[derive(Debug)]
enum Command {
    Data(Vec<u8>),
    Finish,
}

/// Notification from the worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The worker coded everything it was sent.
    NeedMoreInput,
    /// A packet is complete.
    Packet(Vec<u8>),
    /// DONE was coded and the last packet sent; the worker has exited.
    Finished,
}

/// Runs a [`PacketEncoder`] on its own thread.
///
/// Input goes in through a bounded command channel, packets and status come
/// back on an event channel. The encoder is touched by the worker thread
/// only.
///
/// # Example
///
/// ```rust
/// use ppmrc::streaming::{PacketEncoder, PacketWorker};
/// use ppmrc::write::SplitOptions;
/// use ppmrc::{CoderOptions, Compressor};
///
/// # fn main() -> ppmrc::Result<()> {
/// let encoder = PacketEncoder::new(Compressor::new(CoderOptions::default())?, SplitOptions::new(64))?;
/// let worker = PacketWorker::spawn(encoder)?;
/// worker.send(b"streamed through a worker thread".to_vec())?;
/// let packets = worker.finish()?;
/// assert!(!packets.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PacketWorker {
    commands: Sender<Command>,
    events: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl PacketWorker {
    /// Starts the worker with a queue of [`DEFAULT_QUEUE_DEPTH`] chunks.
    pub fn spawn(encoder: PacketEncoder) -> Result<Self> {
        Self::spawn_with_depth(encoder, DEFAULT_QUEUE_DEPTH)
    }

    /// Starts the worker with a queue of `depth` chunks.
    pub fn spawn_with_depth(encoder: PacketEncoder, depth: usize) -> Result<Self> {
        let (commands, command_rx) = bounded(depth.max(1));
        let (event_tx, events) = unbounded();
        let handle = thread::Builder::new()
            .name("ppmrc-packets".into())
            .spawn(move || run(encoder, command_rx, event_tx))?;
        Ok(Self {
            commands,
            events,
            handle: Some(handle),
        })
    }

    /// Hands a chunk of input to the worker, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has exited.
    pub fn send(&self, data: Vec<u8>) -> Result<()> {
        self.commands
            .send(Command::Data(data))
            .map_err(|_| Error::WorkerStopped)
    }

    /// Waits for the next event.
    pub fn recv(&self) -> Result<WorkerEvent> {
        self.events.recv().map_err(|_| Error::WorkerStopped)
    }

    /// Returns the next event if one is ready.
    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Returns the event channel, for use with `crossbeam_channel::select!`.
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Asks the worker to code DONE and waits for it to exit.
    ///
    /// Returns every packet not yet taken from the event channel, in order.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the worker, or
    /// [`Error::WorkerStopped`] if it panicked.
    pub fn finish(mut self) -> Result<Vec<Vec<u8>>> {
        // A send failure means the worker already stopped; join reports why
        let _ = self.commands.send(Command::Finish);

        let mut packets = Vec::new();
        let mut finished = false;
        for event in self.events.iter() {
            match event {
                WorkerEvent::Packet(packet) => packets.push(packet),
                WorkerEvent::NeedMoreInput => {}
                WorkerEvent::Finished => {
                    finished = true;
                    break;
                }
            }
        }

        self.join()?;
        if finished {
            Ok(packets)
        } else {
            Err(Error::WorkerStopped)
        }
    }

    fn join(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| Error::WorkerStopped)?,
            None => Ok(()),
        }
    }
}

fn run(
    mut encoder: PacketEncoder,
    commands: Receiver<Command>,
    events: Sender<WorkerEvent>,
) -> Result<()> {
    let emit = |event: WorkerEvent| events.send(event).map_err(|_| Error::WorkerStopped);

    while let Ok(command) = commands.recv() {
        match command {
            Command::Data(bytes) => {
                encoder.push(&bytes);
                loop {
                    match encoder.poll()? {
                        PacketStatus::PacketComplete(packet) => emit(WorkerEvent::Packet(packet))?,
                        PacketStatus::NeedMoreInput => {
                            emit(WorkerEvent::NeedMoreInput)?;
                            break;
                        }
                    }
                }
            }
            Command::Finish => {
                for packet in encoder.finish()? {
                    emit(WorkerEvent::Packet(packet))?;
                }
                emit(WorkerEvent::Finished)?;
                return Ok(());
            }
        }
    }
    log::debug!("packet worker input closed without finish");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::MemoryParts;
    use crate::write::SplitOptions;
    use crate::{CoderOptions, Compressor, Expander};

    fn worker(part_max: u64) -> PacketWorker {
        let compressor = Compressor::new(CoderOptions::default()).unwrap();
        PacketWorker::spawn(PacketEncoder::new(compressor, SplitOptions::new(part_max)).unwrap())
            .unwrap()
    }

    #[test]
    fn test_worker_round_trip() {
        let text = b"bytes handed to a background worker in small chunks. ".repeat(5);
        let worker = worker(48);
        let mut packets = Vec::new();
        for chunk in text.chunks(10) {
            worker.send(chunk.to_vec()).unwrap();
            loop {
                match worker.recv().unwrap() {
                    WorkerEvent::Packet(packet) => packets.push(packet),
                    WorkerEvent::NeedMoreInput => break,
                    WorkerEvent::Finished => unreachable!(),
                }
            }
        }
        packets.extend(worker.finish().unwrap());
        assert!(packets.len() > 1);

        let restored = Expander::new(CoderOptions::default())
            .unwrap()
            .expand_parts_to_vec(MemoryParts::from_parts(packets))
            .unwrap();
        assert_eq!(restored, text);
    }

    #[test]
    fn test_worker_error_surfaces_on_finish() {
        let options = CoderOptions::new().compatibility_mode(true);
        let compressor = Compressor::new(options).unwrap();
        let worker =
            PacketWorker::spawn(PacketEncoder::new(compressor, SplitOptions::new(4)).unwrap())
                .unwrap();
        worker.send(b"abc".to_vec()).unwrap();
        let err = worker.finish().unwrap_err();
        assert!(matches!(err, Error::PartTooSmall { .. }));
    }
}
