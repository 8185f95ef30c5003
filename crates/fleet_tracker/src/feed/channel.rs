use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use fleet_proto::{FeedRequest, FeedResponse, FeedStream, FEED_PROTOCOL_VERSION};

use crate::error::FeedError;
use crate::models::{Hub, MobileUnit, Route};

use super::subscription::{SubscriberList, Subscription, UnitsCallback};
use super::{CanonicalFeed, FleetFeedResponse, RouteSource};

pub const FEED_CLIENT_NAME: &str = "fleet_tracker";

/// One item pushed by the client thread.
pub type FeedMessage = Result<FleetFeedResponse, FeedError>;

/// What a single [`ChannelFeed::poll`] observed.
#[derive(Debug, Default, PartialEq)]
pub struct FeedPoll {
    pub units_delivered: bool,
    /// Unit snapshots superseded by a newer one within the same poll.
    pub units_dropped: usize,
    pub routes_changed: bool,
    pub hubs_changed: bool,
    pub errors: Vec<FeedError>,
}

/// Feed backed by a channel that a background connection fills. Polled from
/// the frame thread; only the newest queued unit snapshot is delivered.
pub struct ChannelFeed {
    rx: Receiver<FeedMessage>,
    tx: Option<Sender<FeedRequest>>,
    subscribers: SubscriberList,
    latest_units: Option<Vec<MobileUnit>>,
    routes: Option<Vec<Route>>,
    hubs: Option<Vec<Hub>>,
    fleet_id: Option<String>,
    disconnected: bool,
}

impl ChannelFeed {
    pub fn new(rx: Receiver<FeedMessage>, tx: Option<Sender<FeedRequest>>) -> Self {
        Self {
            rx,
            tx,
            subscribers: SubscriberList::default(),
            latest_units: None,
            routes: None,
            hubs: None,
            fleet_id: None,
            disconnected: false,
        }
    }

    /// Connects to a feed server on a background thread.
    pub fn connect(addr: impl Into<String>) -> Self {
        let (tx, rx) = spawn_feed_client(addr.into());
        Self::new(rx, Some(tx))
    }

    pub fn poll(&mut self) -> FeedPoll {
        let mut poll = FeedPoll::default();
        let mut newest_units: Option<Vec<MobileUnit>> = None;

        loop {
            match self.rx.try_recv() {
                Ok(Ok(response)) => self.absorb(response, &mut newest_units, &mut poll),
                Ok(Err(err)) => poll.errors.push(err),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        self.disconnected = true;
                        poll.errors.push(FeedError::Disconnected);
                    }
                    break;
                }
            }
        }

        if let Some(units) = newest_units {
            self.subscribers.deliver(&units);
            self.latest_units = Some(units);
            poll.units_delivered = true;
        }
        for err in &poll.errors {
            tracing::warn!(error = %err, "fleet feed error");
        }
        poll
    }

    fn absorb(
        &mut self,
        response: FleetFeedResponse,
        newest_units: &mut Option<Vec<MobileUnit>>,
        poll: &mut FeedPoll,
    ) {
        match response {
            FeedResponse::HelloAck {
                version, fleet_id, ..
            } => {
                if version != FEED_PROTOCOL_VERSION {
                    poll.errors.push(FeedError::VersionMismatch {
                        expected: FEED_PROTOCOL_VERSION,
                        actual: version,
                    });
                }
                tracing::info!(fleet_id = %fleet_id, version, "fleet feed connected");
                self.fleet_id = Some(fleet_id);
            }
            FeedResponse::Routes { routes } => {
                self.routes = Some(routes);
                poll.routes_changed = true;
            }
            FeedResponse::Hubs { hubs } => {
                self.hubs = Some(hubs);
                poll.hubs_changed = true;
            }
            FeedResponse::Units { units } => {
                if newest_units.replace(units).is_some() {
                    poll.units_dropped += 1;
                }
            }
            FeedResponse::Error { message } => {
                poll.errors.push(FeedError::Rejected { message });
            }
        }
    }

    /// Asks the server for a fresh full snapshot. Returns false once the
    /// connection is gone.
    pub fn request_snapshot(&self) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.send(FeedRequest::RequestSnapshot).is_ok())
    }

    pub fn routes(&self) -> Option<&[Route]> {
        self.routes.as_deref()
    }

    pub fn hubs(&self) -> Option<&[Hub]> {
        self.hubs.as_deref()
    }

    pub fn latest_units(&self) -> Option<&[MobileUnit]> {
        self.latest_units.as_deref()
    }

    pub fn fleet_id(&self) -> Option<&str> {
        self.fleet_id.as_deref()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl CanonicalFeed for ChannelFeed {
    fn subscribe(&mut self, mut on_change: UnitsCallback) -> Result<Subscription, FeedError> {
        if let Some(units) = &self.latest_units {
            on_change(units);
        }
        Ok(self.subscribers.add(on_change))
    }
}

impl RouteSource for ChannelFeed {
    fn fetch_routes(&self) -> Result<Vec<Route>, FeedError> {
        match &self.routes {
            Some(routes) => Ok(routes.clone()),
            None if self.disconnected => Err(FeedError::Disconnected),
            None => Err(FeedError::Unavailable("routes")),
        }
    }
}

pub fn spawn_feed_client(addr: String) -> (Sender<FeedRequest>, Receiver<FeedMessage>) {
    let (tx_out, rx_out) = mpsc::channel::<FeedRequest>();
    let (tx_in, rx_in) = mpsc::channel::<FeedMessage>();

    thread::spawn(move || match TcpStream::connect(&addr) {
        Ok(stream) => {
            if let Err(err) = run_connection(stream, rx_out, tx_in.clone()) {
                let _ = tx_in.send(Err(err));
            }
        }
        Err(err) => {
            let _ = tx_in.send(Err(err.into()));
        }
    });

    (tx_out, rx_in)
}

fn run_connection(
    stream: TcpStream,
    rx_out: Receiver<FeedRequest>,
    tx_in: Sender<FeedMessage>,
) -> Result<(), FeedError> {
    stream.set_nodelay(true)?;
    let reader_stream = stream.try_clone()?;
    let mut writer = BufWriter::new(stream);

    send_request(
        &mut writer,
        &FeedRequest::Hello {
            client: FEED_CLIENT_NAME.to_string(),
            version: FEED_PROTOCOL_VERSION,
        },
    )?;
    send_request(
        &mut writer,
        &FeedRequest::Subscribe {
            streams: FeedStream::ALL.to_vec(),
        },
    )?;
    send_request(&mut writer, &FeedRequest::RequestSnapshot)?;

    thread::spawn(move || read_responses(reader_stream, tx_in));

    for request in rx_out {
        send_request(&mut writer, &request)?;
    }
    Ok(())
}

fn read_responses(stream: TcpStream, tx_in: Sender<FeedMessage>) {
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
                let message = serde_json::from_str::<FleetFeedResponse>(trimmed)
                    .map_err(FeedError::from);
                if tx_in.send(message).is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = tx_in.send(Err(err.into()));
                break;
            }
        }
    }
}

fn send_request(writer: &mut BufWriter<TcpStream>, request: &FeedRequest) -> Result<(), FeedError> {
    serde_json::to_writer(&mut *writer, request)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
