use crate::error::{Result, RtspError};
use crate::protocol::request::{Method, RtspRequest};
use crate::protocol::response::RtspResponse;

/// A unit of request handling mounted under a URL prefix.
///
/// One `serve_*` handler exists per client-to-server RTSP method; every
/// default implementation fails with [`RtspError::MethodNotAllowed`], which
/// the dispatcher turns into 405. Concrete servlets override the subset
/// they implement and report it from [`methods`](Self::methods) — that set
/// feeds the OPTIONS `Public:` header and the dispatcher's 501 check.
///
/// Servlets are shared across connection-handler threads, so handlers take
/// `&self`; mutable session state lives behind the servlet's own lock.
///
/// OPTIONS is not routed here — the dispatcher answers it globally.
pub trait Servlet: Send + Sync {
    /// The RTSP methods this servlet serves.
    fn methods(&self) -> &[Method];

    fn serve_describe(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_announce(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_get_parameter(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_pause(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_play(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_record(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_setup(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_set_parameter(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    fn serve_teardown(&self, _request: &RtspRequest) -> Result<RtspResponse> {
        Err(RtspError::MethodNotAllowed)
    }

    /// Route a request to the handler for its method.
    fn serve(&self, request: &RtspRequest) -> Result<RtspResponse> {
        match request.method {
            Method::Describe => self.serve_describe(request),
            Method::Announce => self.serve_announce(request),
            Method::GetParameter => self.serve_get_parameter(request),
            Method::Pause => self.serve_pause(request),
            Method::Play => self.serve_play(request),
            Method::Record => self.serve_record(request),
            Method::Setup => self.serve_setup(request),
            Method::SetParameter => self.serve_set_parameter(request),
            Method::Teardown => self.serve_teardown(request),
            // Answered by the dispatcher before servlet selection.
            Method::Options => Err(RtspError::MethodNotAllowed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Servlet for Bare {
        fn methods(&self) -> &[Method] {
            &[]
        }
    }

    #[test]
    fn defaults_reject_every_method() {
        let servlet = Bare;
        let raw = "PLAY rtsp://host/ RTSP/1.0\r\nCSeq: 1\r\n\r\n";
        let request = RtspRequest::parse(raw).unwrap();
        match servlet.serve(&request) {
            Err(RtspError::MethodNotAllowed) => {}
            other => panic!("expected MethodNotAllowed, got {:?}", other),
        }
    }
}
