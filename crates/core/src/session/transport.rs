/// Parsed client transport parameters from the RTSP `Transport` request
/// header (RFC 2326 §12.39).
///
/// Only `RTP/AVP;unicast` with a `client_port=RTP-RTCP` pair is supported —
/// interleaved TCP and multicast are out of scope.
///
/// ## Wire format
///
/// ```text
/// Client → Server:
///   Transport: RTP/AVP;unicast;client_port=8000-8001
///
/// Server → Client:
///   Transport: RTP/AVP;unicast;client_port=8000-8001;server_port=5000-5001
/// ```
#[derive(Debug, Clone)]
pub struct TransportHeader {
    /// Port the client receives RTP on.
    pub client_rtp_port: u16,
    /// Port the client receives RTCP on (typically RTP + 1).
    pub client_rtcp_port: u16,
}

impl TransportHeader {
    /// Parse a `Transport` header value, looking for `client_port=A-B`
    /// among the semicolon-separated parameters.
    ///
    /// ```
    /// use pirtsp::session::TransportHeader;
    ///
    /// let th = TransportHeader::parse("RTP/AVP;unicast;client_port=8000-8001").unwrap();
    /// assert_eq!(th.client_rtp_port, 8000);
    /// assert_eq!(th.client_rtcp_port, 8001);
    ///
    /// assert!(TransportHeader::parse("RTP/AVP;unicast").is_none());
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        for part in header.split(';') {
            if let Some(ports) = part.trim().strip_prefix("client_port=") {
                let (rtp, rtcp) = ports.split_once('-')?;
                return Some(TransportHeader {
                    client_rtp_port: rtp.trim().parse().ok()?,
                    client_rtcp_port: rtcp.trim().parse().ok()?,
                });
            }
        }
        None
    }

    /// The `Transport` response header value: the client's parameters
    /// echoed back with the server's port pair appended.
    pub fn response_value(&self, server_rtp_port: u16, server_rtcp_port: u16) -> String {
        format!(
            "RTP/AVP;unicast;client_port={}-{};server_port={}-{}",
            self.client_rtp_port, self.client_rtcp_port, server_rtp_port, server_rtcp_port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_transport() {
        let th = TransportHeader::parse("RTP/AVP;unicast;client_port=5000-5001").unwrap();
        assert_eq!(th.client_rtp_port, 5000);
        assert_eq!(th.client_rtcp_port, 5001);
    }

    #[test]
    fn parse_tolerates_whitespace() {
        let th = TransportHeader::parse("RTP/AVP; unicast; client_port=9000-9001").unwrap();
        assert_eq!(th.client_rtp_port, 9000);
    }

    #[test]
    fn parse_no_client_port() {
        assert!(TransportHeader::parse("RTP/AVP;unicast").is_none());
    }

    #[test]
    fn parse_malformed_ports() {
        assert!(TransportHeader::parse("RTP/AVP;client_port=abc-def").is_none());
        assert!(TransportHeader::parse("RTP/AVP;client_port=8000").is_none());
    }

    #[test]
    fn response_value_appends_server_ports() {
        let th = TransportHeader::parse("RTP/AVP;unicast;client_port=8000-8001").unwrap();
        assert_eq!(
            th.response_value(5000, 5001),
            "RTP/AVP;unicast;client_port=8000-8001;server_port=5000-5001"
        );
    }
}
