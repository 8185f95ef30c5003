use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime};

use fleet_proto::{FeedRequest, FeedResponse, FeedStream, FEED_PROTOCOL_VERSION};

use crate::error::DatasetError;

use super::dataset::FleetDataset;
use super::FleetFeedResponse;

pub const DEFAULT_FEED_ADDR: &str = "127.0.0.1:5210";
pub const FEED_SERVER_NAME: &str = "fleet_feed_server";

#[derive(Debug, Clone)]
pub struct FeedServerConfig {
    pub bind_addr: String,
    /// Dataset file to serve and watch. `None` serves the built-in demo.
    pub dataset_path: Option<PathBuf>,
    pub poll_interval: Duration,
}

impl Default for FeedServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_FEED_ADDR.to_string(),
            dataset_path: None,
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl FeedServerConfig {
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = Some(path.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[derive(Debug)]
pub enum FeedServerError {
    Io(String),
    Serde(String),
    Dataset(DatasetError),
}

impl fmt::Display for FeedServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedServerError::Io(message) => write!(f, "feed server io error: {message}"),
            FeedServerError::Serde(message) => write!(f, "feed server encode error: {message}"),
            FeedServerError::Dataset(err) => write!(f, "feed server dataset error: {err}"),
        }
    }
}

impl std::error::Error for FeedServerError {}

impl From<io::Error> for FeedServerError {
    fn from(err: io::Error) -> Self {
        FeedServerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FeedServerError {
    fn from(err: serde_json::Error) -> Self {
        FeedServerError::Serde(err.to_string())
    }
}

impl From<DatasetError> for FeedServerError {
    fn from(err: DatasetError) -> Self {
        FeedServerError::Dataset(err)
    }
}

/// Serves a [`FleetDataset`] as a canonical feed over line-delimited JSON.
/// When backed by a file, every change to the file is re-broadcast as a
/// full unit snapshot.
pub struct FeedServer {
    config: FeedServerConfig,
    dataset: FleetDataset,
    /// Modification time of the dataset file when `dataset` was read.
    loaded_modified: Option<SystemTime>,
}

impl FeedServer {
    pub fn load(config: FeedServerConfig) -> Result<Self, FeedServerError> {
        let (dataset, loaded_modified) = match &config.dataset_path {
            Some(path) => {
                let modified = modified_at(path);
                (FleetDataset::load_json(path)?, modified)
            }
            None => (FleetDataset::demo(), None),
        };
        Ok(Self {
            config,
            dataset,
            loaded_modified,
        })
    }

    /// Serves `dataset` as given. A configured dataset file replaces it as
    /// soon as the file is readable.
    pub fn with_dataset(config: FeedServerConfig, dataset: FleetDataset) -> Self {
        Self {
            config,
            dataset,
            loaded_modified: None,
        }
    }

    pub fn dataset(&self) -> &FleetDataset {
        &self.dataset
    }

    pub fn run(&self) -> Result<(), FeedServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr)?;
        tracing::info!(addr = %self.config.bind_addr, fleet_id = %self.dataset.fleet_id, "fleet feed listening");
        self.serve_listener(listener, None)
    }

    /// Accepts connections from `listener`, each served on its own thread.
    /// Stops after `max_connections` when given.
    pub fn serve_listener(
        &self,
        listener: TcpListener,
        max_connections: Option<usize>,
    ) -> Result<(), FeedServerError> {
        let mut accepted = 0usize;
        let mut workers = Vec::new();
        for incoming in listener.incoming() {
            let stream = incoming?;
            workers.retain(|worker: &thread::JoinHandle<()>| !worker.is_finished());
            let mut watch = self
                .config
                .dataset_path
                .clone()
                .map(|path| DatasetWatch::since(path, self.loaded_modified));
            let dataset = self.current_dataset(watch.as_mut());
            let poll_interval = self.config.poll_interval;
            workers.push(thread::spawn(move || {
                if let Err(err) = serve_stream(stream, dataset, watch, poll_interval) {
                    tracing::warn!(error = %err, "fleet feed connection failed");
                }
            }));
            accepted += 1;
            if max_connections.is_some_and(|max| accepted >= max) {
                break;
            }
        }
        for worker in workers {
            let _ = worker.join();
        }
        Ok(())
    }

    /// The dataset a new connection starts from: the file's contents if it
    /// changed since the watch's baseline, otherwise the loaded dataset.
    fn current_dataset(&self, watch: Option<&mut DatasetWatch>) -> FleetDataset {
        match watch.and_then(DatasetWatch::poll) {
            Some(Ok(next)) => next,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "serving last good fleet dataset");
                self.dataset.clone()
            }
            None => self.dataset.clone(),
        }
    }
}

struct DatasetWatch {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl DatasetWatch {
    fn since(path: PathBuf, last_modified: Option<SystemTime>) -> Self {
        Self {
            path,
            last_modified,
        }
    }

    /// Reloads the dataset when the file's modification time moved.
    fn poll(&mut self) -> Option<Result<FleetDataset, DatasetError>> {
        let modified = modified_at(&self.path);
        if modified.is_none() || modified == self.last_modified {
            return None;
        }
        self.last_modified = modified;
        Some(FleetDataset::load_json(&self.path))
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
}

fn serve_stream(
    stream: TcpStream,
    mut dataset: FleetDataset,
    mut watch: Option<DatasetWatch>,
    poll_interval: Duration,
) -> Result<(), FeedServerError> {
    stream.set_nodelay(true)?;
    let reader_stream = stream.try_clone()?;
    let mut writer = BufWriter::new(stream);
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || read_requests(reader_stream, tx));

    let mut session = FeedSession::default();
    loop {
        match rx.recv_timeout(poll_interval) {
            Ok(request) => {
                if !session.handle_request(request, &mut writer, &dataset)? {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let Some(reloaded) = watch.as_mut().and_then(DatasetWatch::poll) else {
            continue;
        };
        match reloaded {
            Ok(next) => {
                tracing::info!(units = next.units.len(), "fleet dataset changed");
                dataset = next;
                if session.wants(FeedStream::Units) {
                    send_units(&mut writer, &dataset)?;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable fleet dataset");
            }
        }
    }
    Ok(())
}

#[derive(Default)]
struct FeedSession {
    subscribed: HashSet<FeedStream>,
}

impl FeedSession {
    fn wants(&self, stream: FeedStream) -> bool {
        self.subscribed.is_empty() || self.subscribed.contains(&stream)
    }

    fn handle_request(
        &mut self,
        request: FeedRequest,
        writer: &mut BufWriter<TcpStream>,
        dataset: &FleetDataset,
    ) -> Result<bool, FeedServerError> {
        match request {
            FeedRequest::Hello { client, version } => {
                send_response(
                    writer,
                    &FeedResponse::HelloAck {
                        server: FEED_SERVER_NAME.to_string(),
                        version: FEED_PROTOCOL_VERSION,
                        fleet_id: dataset.fleet_id.clone(),
                    },
                )?;
                if version != FEED_PROTOCOL_VERSION {
                    send_response(
                        writer,
                        &FeedResponse::Error {
                            message: format!(
                                "unsupported protocol version {version}, server speaks {FEED_PROTOCOL_VERSION}"
                            ),
                        },
                    )?;
                    return Ok(false);
                }
                tracing::debug!(client = %client, "fleet feed client said hello");
            }
            FeedRequest::Subscribe { streams } => {
                self.subscribed = streams.into_iter().collect();
                self.send_snapshot(writer, dataset)?;
            }
            FeedRequest::RequestSnapshot => {
                self.send_snapshot(writer, dataset)?;
            }
        }
        Ok(true)
    }

    fn send_snapshot(
        &self,
        writer: &mut BufWriter<TcpStream>,
        dataset: &FleetDataset,
    ) -> Result<(), FeedServerError> {
        for stream in FeedStream::ALL {
            if !self.wants(stream) {
                continue;
            }
            match stream {
                FeedStream::Routes => send_response(
                    writer,
                    &FeedResponse::Routes {
                        routes: dataset.routes.clone(),
                    },
                )?,
                FeedStream::Hubs => send_response(
                    writer,
                    &FeedResponse::Hubs {
                        hubs: dataset.hubs.clone(),
                    },
                )?,
                FeedStream::Units => send_units(writer, dataset)?,
            }
        }
        Ok(())
    }
}

fn send_units(
    writer: &mut BufWriter<TcpStream>,
    dataset: &FleetDataset,
) -> Result<(), FeedServerError> {
    send_response(
        writer,
        &FeedResponse::Units {
            units: dataset.units.clone(),
        },
    )
}

fn read_requests(stream: TcpStream, tx: mpsc::Sender<FeedRequest>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<FeedRequest>(trimmed) {
                    Ok(request) => {
                        if tx.send(request).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "dropping malformed feed request");
                    }
                }
            }
            Err(_) => break,
        }
    }
}

fn send_response(
    writer: &mut BufWriter<TcpStream>,
    response: &FleetFeedResponse,
) -> Result<(), FeedServerError> {
    serde_json::to_writer(&mut *writer, response)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
