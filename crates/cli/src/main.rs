use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use pirtsp::capture::{BaselineJpegEncoder, CaptureConfig, TestPattern};
use pirtsp::{JpegServlet, RequestDispatcher, Server, ServerConfig};

#[derive(Parser)]
#[command(
    name = "pirtsp-server",
    about = "RTSP server streaming MJPEG video over RTP"
)]
struct Args {
    /// Bind address (host:port)
    #[arg(long, short, default_value = "0.0.0.0:5544")]
    bind: String,

    /// Frame width in pixels (multiple of 8)
    #[arg(long, default_value_t = 640)]
    width: u16,

    /// Frame height in pixels (multiple of 8)
    #[arg(long, default_value_t = 480)]
    height: u16,

    /// Frames per second
    #[arg(long, default_value_t = 10)]
    fps: u32,

    /// JPEG quality (1-99)
    #[arg(long, default_value_t = 50)]
    quality: u8,

    /// Host advertised in the SDP body (defaults to a best-effort
    /// discovery of this machine's address)
    #[arg(long)]
    public_host: Option<String>,

    /// Server RTP port advertised in SETUP responses and bound for media
    #[arg(long, default_value_t = 5000)]
    rtp_port: u16,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> pirtsp::Result<()> {
    let capture = CaptureConfig {
        width: args.width,
        height: args.height,
        fps: args.fps,
        quality: args.quality,
    };
    let config = Arc::new(ServerConfig {
        public_host: args.public_host,
        server_rtp_port: args.rtp_port,
        ..Default::default()
    });

    let servlet = JpegServlet::new(
        Box::new(TestPattern::new(capture.clone())),
        Box::new(BaselineJpegEncoder),
        capture,
        config.clone(),
    )?;

    let mut dispatcher = RequestDispatcher::new();
    dispatcher.register_servlet("/", Arc::new(servlet));

    let mut server = Server::new(&args.bind, config, dispatcher);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .map_err(std::io::Error::other)?;
    }

    server.start()?;
    tracing::info!(bind = %args.bind, "streaming at rtsp://<host>:<port>/ — Ctrl-C to stop");

    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    tracing::info!("shutting down");
    server.stop();
    Ok(())
}
