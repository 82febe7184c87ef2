//! `std::net` transport for the MQTT client.

use libiot_pnp::network::error::Error;
use libiot_pnp::network::{Close, Connect, Connection, Read, Write};
use std::io::{ErrorKind, Read as StdRead, Write as StdWrite};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

pub struct NetConnection {
    stream: TcpStream,
}

impl Read for NetConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.stream.read(buf) {
            Ok(0) if !buf.is_empty() => Err(Error::ConnectionClosed),
            Ok(n) => Ok(n),
            // The read timeout expired with nothing to read.
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(_) => Err(Error::ReadError),
        }
    }
}

impl Write for NetConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| Error::WriteError)
    }
}

impl Close for NetConnection {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        self.stream
            .shutdown(Shutdown::Both)
            .map_err(|_| Error::NotOpen)
    }
}

impl Connection for NetConnection {}

/// Opens TCP connections whose reads give up after `read_timeout`.
pub struct TcpConnector {
    pub read_timeout: Duration,
}

impl Connect for TcpConnector {
    type Connection = NetConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let addr = remote
            .to_socket_addrs()
            .map_err(|_| Error::InvalidAddress)?
            .next()
            .ok_or(Error::InvalidAddress)?;
        let stream = TcpStream::connect(addr).map_err(|e| match e.kind() {
            ErrorKind::TimedOut => Error::Timeout,
            _ => Error::NotOpen,
        })?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(|_| Error::NotOpen)?;
        stream.set_nodelay(true).map_err(|_| Error::NotOpen)?;
        tracing::info!("connected to {}", addr);
        Ok(NetConnection { stream })
    }
}
