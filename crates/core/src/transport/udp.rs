use std::net::{SocketAddr, UdpSocket};

use crate::error::Result;

/// Outbound RTP socket for one streaming session.
///
/// Bound to the server RTP port advertised in the SETUP `Transport`
/// response and connected to the client's RTP endpoint, so every packet
/// goes out as one datagram via [`send`](Self::send). If the advertised
/// port is unavailable (still in TIME_WAIT, or taken by another process)
/// an ephemeral port is used instead — receivers match streams by SSRC,
/// not source port.
pub struct RtpSender {
    socket: UdpSocket,
}

impl RtpSender {
    pub fn connect(local_rtp_port: u16, peer: SocketAddr) -> Result<Self> {
        let socket = match UdpSocket::bind(("0.0.0.0", local_rtp_port)) {
            Ok(socket) => socket,
            Err(e) => {
                tracing::warn!(
                    local_rtp_port,
                    error = %e,
                    "advertised RTP port unavailable, using ephemeral port"
                );
                UdpSocket::bind("0.0.0.0:0")?
            }
        };
        socket.connect(peer)?;
        Ok(Self { socket })
    }

    /// Send one RTP packet as one datagram.
    pub fn send(&self, packet: &[u8]) -> Result<usize> {
        Ok(self.socket.send(packet)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_datagrams_to_peer() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let peer = receiver.local_addr().unwrap();

        let sender = RtpSender::connect(0, peer).unwrap();
        sender.send(b"packet").unwrap();

        let mut buf = [0u8; 16];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"packet");
    }
}
