//! The MJPEG streaming servlet.
//!
//! Serves DESCRIBE, SETUP, PLAY, and TEARDOWN for a single video track
//! (`track1`) and owns the worker thread that pushes RTP packets to the
//! negotiated client endpoint. One client, one session at a time.
//!
//! Handler threads and the worker communicate through one mutex-guarded
//! state block and a condition variable: PLAY enqueues the request and
//! signals, TEARDOWN raises a flag and signals, servlet drop raises the
//! stop flag and joins the worker.

use std::collections::{HashSet, VecDeque};
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Condvar, Mutex};
use rand::Rng;

use crate::capture::{CaptureConfig, FrameGrabber, JpegEncoder};
use crate::error::Result;
use crate::media::mjpeg::{JpegPacketizer, JPEG_PAYLOAD_TYPE};
use crate::media::rtp;
use crate::protocol::request::{Method, RtspRequest};
use crate::protocol::response::RtspResponse;
use crate::protocol::sdp::{
    Attribute, MediaDescription, Origin, SessionDescription, TimeDescription,
};
use crate::protocol::servlet::Servlet;
use crate::server::ServerConfig;
use crate::session::{Session, SessionState, TransportHeader};
use crate::transport::udp::RtpSender;

/// Name of the single video track, referenced by the SDP `a=control`
/// attribute and required as the SETUP target path.
pub const VIDEO_TRACK: &str = "track1";

const SUPPORTED_METHODS: [Method; 4] = [
    Method::Describe,
    Method::Setup,
    Method::Play,
    Method::Teardown,
];

/// State shared between RTSP handler threads and the stream worker.
/// Every field is guarded by the one mutex in [`WorkerShared`].
struct WorkerState {
    session: Session,
    /// Pending PLAY requests, serviced in arrival order.
    queue: VecDeque<RtspRequest>,
    /// Raised by TEARDOWN; the worker clears it when it ends the stream.
    teardown: bool,
    /// Raised once, at servlet drop.
    stop: bool,
    /// Every session id handed out over the process lifetime; ids are
    /// never reused.
    issued_ids: HashSet<u32>,
}

struct WorkerShared {
    state: Mutex<WorkerState>,
    notify: Condvar,
}

/// Servlet publishing one live MJPEG track over RTP/UDP.
///
/// Construction takes ownership of the camera and encoder collaborators,
/// validates the capture parameters, and spawns the stream worker; the
/// worker is joined when the servlet is dropped.
pub struct JpegServlet {
    shared: Arc<WorkerShared>,
    capture: CaptureConfig,
    config: Arc<ServerConfig>,
    worker: Option<JoinHandle<()>>,
}

impl JpegServlet {
    pub fn new(
        grabber: Box<dyn FrameGrabber>,
        encoder: Box<dyn JpegEncoder>,
        capture: CaptureConfig,
        config: Arc<ServerConfig>,
    ) -> Result<Self> {
        capture.validate()?;

        let shared = Arc::new(WorkerShared {
            state: Mutex::new(WorkerState {
                session: Session::new(),
                queue: VecDeque::new(),
                teardown: false,
                stop: false,
                issued_ids: HashSet::new(),
            }),
            notify: Condvar::new(),
        });

        let worker = StreamWorker {
            shared: shared.clone(),
            grabber,
            encoder,
            capture: capture.clone(),
            server_rtp_port: config.server_rtp_port,
        };
        let handle = thread::Builder::new()
            .name("mjpeg-stream".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            shared,
            capture,
            config,
            worker: Some(handle),
        })
    }

    /// Build the DESCRIBE body for this track.
    fn session_description(&self) -> SessionDescription {
        let address = self
            .config
            .public_host
            .clone()
            .unwrap_or_else(local_ipv4_addr);
        let started = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let username = std::env::var("USER").unwrap_or_else(|_| "-".to_string());

        SessionDescription {
            version: 0,
            origin: Origin {
                username,
                session_id: started,
                session_version: 1,
                address: address.clone(),
            },
            session_name: "Session streamed by Pi RTSP Server".to_string(),
            info: Some("jpeg".to_string()),
            time_descriptions: vec![TimeDescription::unbounded()],
            media_descriptions: vec![MediaDescription {
                name: format!("video 0 RTP/AVP {}", JPEG_PAYLOAD_TYPE),
                connection: Some(format!("IN IP4 {}", address)),
                attributes: vec![
                    Attribute::new("control", VIDEO_TRACK),
                    Attribute::new(
                        "cliprect",
                        &format!("0,0,{},{}", self.capture.height, self.capture.width),
                    ),
                    Attribute::new("framerate", &self.capture.fps.to_string()),
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn allocate_session_id(issued: &mut HashSet<u32>) -> u32 {
        loop {
            let id = rand::rng().random::<u32>();
            if id != 0 && issued.insert(id) {
                return id;
            }
        }
    }
}

impl Drop for JpegServlet {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.stop = true;
        }
        self.shared.notify.notify_one();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Servlet for JpegServlet {
    fn methods(&self) -> &[Method] {
        &SUPPORTED_METHODS
    }

    fn serve_describe(&self, request: &RtspRequest) -> Result<RtspResponse> {
        tracing::debug!(uri = %request.uri, "DESCRIBE");
        let body = self.session_description().serialize();
        Ok(RtspResponse::ok()
            .add_header("Content-Type", "application/sdp")
            .with_body(body))
    }

    fn serve_setup(&self, request: &RtspRequest) -> Result<RtspResponse> {
        if request.uri != format!("/{}", VIDEO_TRACK) {
            tracing::warn!(uri = %request.uri, "SETUP for unknown track");
            return Ok(RtspResponse::not_found());
        }

        let transport = match request.headers.get("Transport") {
            Some(value) => value,
            None => {
                tracing::warn!("SETUP missing Transport header");
                return Ok(RtspResponse::bad_request());
            }
        };
        let transport = match TransportHeader::parse(transport) {
            Some(parsed) => parsed,
            None => {
                tracing::warn!(transport, "SETUP with unusable Transport header");
                return Ok(RtspResponse::bad_request());
            }
        };

        let mut state = self.shared.state.lock();

        if let Some(id) = request.session_id() {
            if state.session.matches(id) {
                tracing::warn!(session_id = id, "SETUP on the established session");
                return Ok(RtspResponse::aggregate_not_allowed());
            }
        }

        if state.session.is_connected() {
            tracing::warn!("SETUP while another client is streaming");
            return Ok(RtspResponse::locked());
        }

        let session_id = Self::allocate_session_id(&mut state.issued_ids);
        state.session.establish(
            session_id,
            transport.client_rtp_port,
            transport.client_rtcp_port,
        );

        let server_rtp_port = self.config.server_rtp_port;
        tracing::info!(
            session_id,
            client_rtp_port = transport.client_rtp_port,
            server_rtp_port,
            "session created via SETUP"
        );

        Ok(RtspResponse::ok()
            .add_header("Session", &session_id.to_string())
            .add_header(
                "Transport",
                &transport.response_value(server_rtp_port, server_rtp_port + 1),
            ))
    }

    fn serve_play(&self, request: &RtspRequest) -> Result<RtspResponse> {
        let mut state = self.shared.state.lock();

        if !session_matches(request, &state.session) {
            tracing::warn!(session = ?request.session(), "PLAY for unknown session");
            return Ok(RtspResponse::session_not_found());
        }

        state.session.start_playing();
        state.queue.push_back(request.clone());
        drop(state);
        self.shared.notify.notify_one();

        tracing::info!("session started playing");
        Ok(RtspResponse::ok().add_header("Range", "0.000-"))
    }

    fn serve_teardown(&self, request: &RtspRequest) -> Result<RtspResponse> {
        let mut state = self.shared.state.lock();

        if !session_matches(request, &state.session) {
            tracing::warn!(session = ?request.session(), "TEARDOWN for unknown session");
            return Ok(RtspResponse::session_not_found());
        }

        // Only a playing session has a stream to interrupt.
        if state.session.state() == SessionState::Playing {
            state.teardown = true;
        }
        state.session.tear_down();
        drop(state);
        self.shared.notify.notify_one();

        tracing::info!("session terminated via TEARDOWN");
        Ok(RtspResponse::ok())
    }
}

fn session_matches(request: &RtspRequest, session: &Session) -> bool {
    request.session_id().is_some_and(|id| session.matches(id))
}

/// Best-effort IPv4 of this machine, for the SDP origin and connection
/// lines. Routes a dummy UDP socket to learn the preferred source address;
/// nothing is sent. Falls back to `0.0.0.0`.
fn local_ipv4_addr() -> String {
    let discovered = UdpSocket::bind("0.0.0.0:0").and_then(|socket| {
        socket.connect("8.8.8.8:80")?;
        socket.local_addr()
    });
    match discovered {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => "0.0.0.0".to_string(),
    }
}

/// The per-servlet streaming thread.
///
/// Classic producer/consumer: RTSP handlers enqueue PLAY requests, the
/// worker transmits until teardown, stop, or a socket error, then waits for
/// the next job.
struct StreamWorker {
    shared: Arc<WorkerShared>,
    grabber: Box<dyn FrameGrabber>,
    encoder: Box<dyn JpegEncoder>,
    capture: CaptureConfig,
    server_rtp_port: u16,
}

impl StreamWorker {
    fn run(mut self) {
        loop {
            let (request, client_rtp_port) = {
                let mut state = self.shared.state.lock();
                loop {
                    if state.stop {
                        tracing::debug!("stream worker stopping");
                        return;
                    }
                    if let Some(request) = state.queue.pop_front() {
                        if !state.session.is_connected() {
                            tracing::debug!("dropping play request for torn-down session");
                            continue;
                        }
                        // A job for a live session supersedes any teardown
                        // left over from an earlier stream.
                        state.teardown = false;
                        break (request, state.session.client_rtp_port());
                    }
                    self.shared.notify.wait(&mut state);
                }
            };

            self.stream(&request, client_rtp_port);
        }
    }

    /// Transmit loop for one PLAY request. Runs until teardown or a socket
    /// error, then returns to waiting.
    fn stream(&mut self, request: &RtspRequest, client_rtp_port: u16) {
        let Some(client_ip) = request.client_ip else {
            tracing::warn!("play request without a client address");
            return;
        };
        let peer = SocketAddr::new(client_ip, client_rtp_port);

        let sender = match RtpSender::connect(self.server_rtp_port, peer) {
            Ok(sender) => sender,
            Err(e) => {
                tracing::warn!(%peer, error = %e, "cannot reach RTP client");
                return;
            }
        };

        let mut packetizer =
            JpegPacketizer::with_random_ssrc(self.capture.quality, self.capture.width, self.capture.height);
        let timestamp_step = rtp::timestamp_step(self.capture.fps);

        tracing::info!(
            %peer,
            ssrc = format_args!("{:#010X}", packetizer.ssrc()),
            "RTP stream started"
        );

        loop {
            {
                let mut state = self.shared.state.lock();
                if state.stop {
                    break;
                }
                if state.teardown {
                    state.teardown = false;
                    break;
                }
            }

            let frame = match self.grabber.grab() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "frame capture failed");
                    break;
                }
            };
            let jpeg = match self.encoder.encode(&frame, self.capture.quality) {
                Ok(jpeg) => jpeg,
                Err(e) => {
                    tracing::warn!(error = %e, "frame encoding failed");
                    break;
                }
            };

            let packets = packetizer.packetize(&jpeg, timestamp_step);
            let mut send_failed = false;
            for packet in &packets {
                if let Err(e) = sender.send(packet) {
                    tracing::warn!(%peer, error = %e, "RTP send failed");
                    send_failed = true;
                    break;
                }
            }
            if send_failed {
                break;
            }
        }

        tracing::info!(%peer, "RTP stream stopped");
    }
}
