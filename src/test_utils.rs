use crate::dispatch::{AttemptError, Collector, Payload, SubmitFuture};
use crate::identity::DeviceIdentity;
use crate::mac_address::MacAddress;
use crate::reader::{ReaderError, TagReader};
use crate::tag::{EPC_LEN, Epc, TagEvent};
use std::collections::VecDeque;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing_subscriber::fmt::MakeWriter;

/// A stable identity for unit tests.
pub fn test_identity() -> DeviceIdentity {
    DeviceIdentity::new(
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 42)),
        MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
    )
}

/// EPC made of the marker followed by `fill` repeated.
pub fn test_epc(fill: u8) -> Epc {
    let mut bytes = [fill; EPC_LEN];
    bytes[0] = 0xE2;
    bytes[1] = 0x80;
    Epc(bytes)
}

pub fn test_event(fill: u8, rssi: Option<i8>) -> TagEvent {
    TagEvent {
        epc: test_epc(fill),
        rssi,
    }
}

/// Raw reader bytes for one tag report.
pub fn raw_record(fill: u8, rssi: i8) -> Vec<u8> {
    let mut bytes = test_epc(fill).0.to_vec();
    bytes.push(rssi as u8);
    bytes
}

/// How the fake collector answers one submission.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok,
    Status(u16, &'static str),
    Transport(&'static str),
    /// Never answers
    Hang,
}

/// Collector that answers from a script and records every call.
///
/// Once the script is used up the last reply repeats.
#[derive(Debug)]
pub struct RecordingCollector {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<(Instant, Payload)>>,
}

impl RecordingCollector {
    pub fn new(replies: Vec<Reply>) -> Self {
        let fallback = replies.last().copied().unwrap_or(Reply::Ok);
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: Reply) -> Self {
        Self::new(vec![reply])
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn payloads(&self) -> Vec<Payload> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl Collector for RecordingCollector {
    fn submit<'a>(&'a self, payload: &'a Payload) -> SubmitFuture<'a> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), payload.clone()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        Box::pin(async move {
            match reply {
                Reply::Ok => Ok(()),
                Reply::Status(status, body) => Err(AttemptError::Status {
                    status,
                    body: body.to_string(),
                }),
                Reply::Transport(msg) => Err(AttemptError::Transport(msg.to_string())),
                Reply::Hang => std::future::pending().await,
            }
        })
    }
}

/// Reader that hands out one scripted chunk per read.
///
/// An empty chunk simulates a poll with nothing buffered. When the script is
/// exhausted the reader either stays idle or fails, depending on `fail_when_drained`.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    chunks: VecDeque<Vec<u8>>,
    fail_when_drained: bool,
    pub reads: usize,
    pub closed: bool,
}

impl ScriptedReader {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            ..Default::default()
        }
    }

    pub fn failing_after(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            fail_when_drained: true,
            ..Self::new(chunks)
        }
    }

    fn check_drained(&self) -> Result<(), ReaderError> {
        if self.closed {
            return Err(ReaderError::Closed);
        }
        if self.chunks.is_empty() && self.fail_when_drained {
            return Err(ReaderError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            )));
        }
        Ok(())
    }
}

impl TagReader for ScriptedReader {
    fn bytes_available(&mut self) -> Result<usize, ReaderError> {
        self.check_drained()?;
        // An idle poll is used up by the check itself
        if self.chunks.front().is_some_and(Vec::is_empty) {
            self.chunks.pop_front();
            return Ok(0);
        }
        Ok(self.chunks.front().map_or(0, Vec::len))
    }

    fn read_available(&mut self) -> Result<Vec<u8>, ReaderError> {
        self.check_drained()?;
        self.reads += 1;
        Ok(self.chunks.pop_front().unwrap_or_default())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// In-memory log sink for asserting on emitted diagnostics.
///
/// Installed as the thread's default subscriber, so it sees the events of a
/// current-thread tokio test.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Capture `WARN` and above until the guard is dropped.
    pub fn install_warn(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
