//! An MQTT client implementation based on the MQTT 3.1.1 specification.
//!
//! Packets are assembled in fixed-size `heapless` buffers. Anything that
//! does not fit is rejected with [`Error::PacketTooLarge`] instead of being
//! truncated.

use crate::network::error::Error;
use crate::network::{Connection, Read, Write};
use heapless::{String, Vec};

// MQTT Control Packet types - these are the fixed header packet type values
/// MQTT CONNECT packet type identifier.
const CONNECT: u8 = 0x10;
/// MQTT CONNACK packet type identifier.
const CONNACK: u8 = 0x20;
/// MQTT PUBLISH packet type identifier.
const PUBLISH: u8 = 0x30;
/// MQTT PUBACK packet type identifier.
const PUBACK: u8 = 0x40;
/// MQTT SUBSCRIBE packet type identifier.
const SUBSCRIBE: u8 = 0x82;
/// MQTT SUBACK packet type identifier.
const SUBACK: u8 = 0x90;
/// MQTT PINGREQ packet type identifier.
const PINGREQ: u8 = 0xC0;
/// MQTT DISCONNECT packet type identifier.
const DISCONNECT: u8 = 0xE0;

/// Longest topic name the client sends or receives.
pub const TOPIC_CAPACITY: usize = 256;
/// Largest publish payload the client sends or receives.
pub const PAYLOAD_CAPACITY: usize = 2048;

// Topic length prefix, topic, packet identifier, payload.
const PACKET_CAPACITY: usize = 2 + TOPIC_CAPACITY + 2 + PAYLOAD_CAPACITY;
// Client id, user name and SAS password, each with a length prefix.
const CONNECT_PAYLOAD_CAPACITY: usize = 1024;

// Protocol constants defined by MQTT 3.1.1 specification
/// MQTT protocol name as defined in the specification.
const PROTOCOL_NAME: &[u8] = b"MQTT";
/// MQTT protocol level for version 3.1.1.
const PROTOCOL_LEVEL: u8 = 4; // MQTT 3.1.1

/// Consecutive empty reads tolerated in the middle of a packet.
const READ_RETRIES: usize = 16;

/// An incoming MQTT publish message.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublishPacket {
    /// The topic on which the message was published.
    pub topic: String<TOPIC_CAPACITY>,
    /// The message payload data.
    pub payload: Vec<u8, PAYLOAD_CAPACITY>,
    /// Delivery guarantee the broker used.
    pub qos: QoS,
    /// Packet identifier, present for QoS 1.
    pub packet_id: Option<u16>,
}

/// Quality of Service levels for MQTT messages.
///
/// ```rust
/// use libiot_pnp::network::application::mqtt::QoS;
///
/// assert_eq!(QoS::AtMostOnce as u8, 0);
/// assert_eq!(QoS::AtLeastOnce as u8, 1);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// **QoS 0**: At most once delivery.
    AtMostOnce = 0,
    /// **QoS 1**: At least once delivery. The client acknowledges incoming
    /// QoS 1 messages from [`Client::poll`].
    AtLeastOnce = 1,
    /// **QoS 2**: Exactly once delivery. IoT Hub does not support it and
    /// this client rejects it.
    ExactlyOnce = 2,
}

/// Configuration options for MQTT client connection.
///
/// ```rust
/// use libiot_pnp::network::application::mqtt::Options;
///
/// let options = Options {
///     client_id: "my_iot_device",
///     keep_alive_seconds: 60,
///     clean_session: true,
///     username: None,
///     password: None,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// The client identifier, must be unique within the broker.
    pub client_id: &'a str,

    /// The keep-alive time interval in seconds. A value of 0 disables
    /// keep-alive.
    pub keep_alive_seconds: u16,

    /// Whether to start a clean session.
    pub clean_session: bool,

    /// Login user name. IoT Hub expects the value from
    /// [`crate::hub::HubClient::user_name`].
    pub username: Option<&'a str>,

    /// Login password, such as a SAS token from
    /// [`crate::hub::HubClient::sas_password`].
    pub password: Option<&'a [u8]>,
}

/// An MQTT 3.1.1 client for publish-subscribe messaging.
///
/// # Type Parameters
///
/// * `C` - The connection type implementing [`Connection`]
#[derive(Debug)]
pub struct Client<C: Connection> {
    connection: C,
    next_packet_id: u16,
    // A PUBLISH that arrived while waiting for a SUBACK.
    pending: Option<PublishPacket>,
}

impl<C: Connection> Client<C> {
    /// Establish an MQTT connection with the broker.
    ///
    /// Sends CONNECT and waits for CONNACK.
    ///
    /// # Errors
    ///
    /// * [`Error::WriteError`] - Failed to send CONNECT packet
    /// * [`Error::ReadError`] - Failed to read CONNACK response
    /// * [`Error::ConnectionClosed`] - Connection closed during handshake
    /// * [`Error::ConnectionRefused`] - Broker refused the connection
    /// * [`Error::ProtocolError`] - Invalid CONNACK packet received
    /// * [`Error::PacketTooLarge`] - Credentials too long for the CONNECT buffer
    pub fn connect(mut connection: C, options: Options<'_>) -> Result<Self, Error> {
        // --- Variable Header ---
        let mut vh: Vec<u8, 10> = Vec::new();
        push_field(&mut vh, PROTOCOL_NAME)?;
        push(&mut vh, &[PROTOCOL_LEVEL])?;

        let mut connect_flags = 0;
        if options.clean_session {
            connect_flags |= 0x02;
        }
        if options.username.is_some() {
            connect_flags |= 0x80;
        }
        if options.password.is_some() {
            connect_flags |= 0x40;
        }
        push(&mut vh, &[connect_flags])?;
        push(&mut vh, &options.keep_alive_seconds.to_be_bytes())?;

        // --- Payload ---
        let mut payload: Vec<u8, CONNECT_PAYLOAD_CAPACITY> = Vec::new();
        push_field(&mut payload, options.client_id.as_bytes())?;
        if let Some(username) = options.username {
            push_field(&mut payload, username.as_bytes())?;
        }
        if let Some(password) = options.password {
            push_field(&mut payload, password)?;
        }

        // --- Fixed Header ---
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        push(&mut fixed_header, &[CONNECT])?;
        encode_remaining_length(&mut fixed_header, vh.len() + payload.len())?;

        debug!("mqtt connect as {}", options.client_id);
        write_all(&mut connection, &fixed_header)?;
        write_all(&mut connection, &vh)?;
        write_all(&mut connection, &payload)?;
        connection.flush().map_err(|_| Error::WriteError)?;

        // Wait for and parse CONNACK
        let mut connack = [0u8; 4];
        read_exact(&mut connection, &mut connack)?;
        if connack[0] != CONNACK || connack[1] != 2 {
            return Err(Error::ProtocolError);
        }

        match connack[3] {
            0 => Ok(Self {
                connection,
                next_packet_id: 0,
                pending: None,
            }),
            code @ 1..=5 => {
                warn!("mqtt connection refused with code {}", code);
                Err(Error::ConnectionRefused(code))
            }
            _ => Err(Error::ProtocolError),
        }
    }

    /// Publish a message to a specific topic.
    ///
    /// QoS 1 publishes carry a packet identifier. The broker's PUBACK is
    /// consumed by [`Self::poll`]; this call does not wait for it.
    ///
    /// # Errors
    ///
    /// * [`Error::WriteError`] - Failed to send the publish packet
    /// * [`Error::PacketTooLarge`] - Topic or payload exceed the buffers
    /// * [`Error::ProtocolError`] - QoS 2 was requested
    pub fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), Error> {
        if qos == QoS::ExactlyOnce {
            return Err(Error::ProtocolError);
        }
        if topic.len() > TOPIC_CAPACITY || payload.len() > PAYLOAD_CAPACITY {
            return Err(Error::PacketTooLarge);
        }
        let mut packet: Vec<u8, PACKET_CAPACITY> = Vec::new();

        // --- Variable Header ---
        push_field(&mut packet, topic.as_bytes())?;
        if qos == QoS::AtLeastOnce {
            let packet_id = self.next_packet_id();
            push(&mut packet, &packet_id.to_be_bytes())?;
        }

        // --- Payload ---
        push(&mut packet, payload)?;

        // --- Fixed Header ---
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        push(&mut fixed_header, &[PUBLISH | ((qos as u8) << 1)])?;
        encode_remaining_length(&mut fixed_header, packet.len())?;

        trace!("mqtt publish {} ({} bytes)", topic, payload.len());
        write_all(&mut self.connection, &fixed_header)?;
        write_all(&mut self.connection, &packet)?;
        self.connection.flush().map_err(|_| Error::WriteError)
    }

    /// Subscribe to a topic filter and wait for the SUBACK.
    ///
    /// A PUBLISH that arrives before the SUBACK is acknowledged if needed and
    /// handed out by the next [`Self::poll`]. Other packets are skipped.
    ///
    /// # Errors
    ///
    /// * [`Error::WriteError`] - Failed to send the subscribe packet
    /// * [`Error::ReadError`] - Failed to read SUBACK response
    /// * [`Error::ConnectionClosed`] - Connection closed during operation
    /// * [`Error::ProtocolError`] - Invalid SUBACK, or the broker rejected the filter
    pub fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), Error> {
        if topic.len() > TOPIC_CAPACITY {
            return Err(Error::PacketTooLarge);
        }
        let mut packet: Vec<u8, { TOPIC_CAPACITY + 5 }> = Vec::new();

        // --- Variable Header (Packet Identifier) ---
        let packet_id = self.next_packet_id();
        push(&mut packet, &packet_id.to_be_bytes())?;

        // --- Payload ---
        push_field(&mut packet, topic.as_bytes())?;
        push(&mut packet, &[qos as u8])?;

        // --- Fixed Header ---
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        push(&mut fixed_header, &[SUBSCRIBE])?;
        encode_remaining_length(&mut fixed_header, packet.len())?;

        debug!("mqtt subscribe {}", topic);
        write_all(&mut self.connection, &fixed_header)?;
        write_all(&mut self.connection, &packet)?;
        self.connection.flush().map_err(|_| Error::WriteError)?;

        // Wait for SUBACK
        loop {
            let mut header = [0u8; 1];
            read_exact(&mut self.connection, &mut header)?;
            let Some(body) = self.read_body()? else {
                continue;
            };
            match header[0] {
                SUBACK => {
                    let &[id_hi, id_lo, code] = body.as_slice() else {
                        return Err(Error::ProtocolError);
                    };
                    if u16::from_be_bytes([id_hi, id_lo]) != packet_id {
                        return Err(Error::ProtocolError);
                    }
                    // 0x80 is the failure return code.
                    if code == 0x80 {
                        warn!("mqtt subscription to {} rejected", topic);
                        return Err(Error::ProtocolError);
                    }
                    return Ok(());
                }
                flags if flags & 0xF0 == PUBLISH => {
                    let packet = self.receive_publish(flags, &body)?;
                    if self.pending.replace(packet).is_some() {
                        warn!("mqtt dropped a message received while subscribing");
                    }
                }
                kind => trace!("mqtt skipped packet type {}", kind),
            }
        }
    }

    /// Send a PINGREQ to keep the session alive. The PINGRESP is consumed by
    /// [`Self::poll`].
    pub fn ping(&mut self) -> Result<(), Error> {
        write_all(&mut self.connection, &[PINGREQ, 0x00])?;
        self.connection.flush().map_err(|_| Error::WriteError)
    }

    /// Read one packet from the connection, if any is waiting.
    ///
    /// Returns `Ok(Some(_))` for PUBLISH packets and `Ok(None)` when nothing
    /// was available or the packet was an acknowledgement. Incoming QoS 1
    /// messages are acknowledged before they are returned.
    ///
    /// # Errors
    ///
    /// * [`Error::ReadError`] - Failed to read from the connection
    /// * [`Error::ProtocolError`] - Received malformed MQTT packet
    /// * [`Error::PacketTooLarge`] - The packet was drained and dropped
    pub fn poll(&mut self) -> Result<Option<PublishPacket>, Error> {
        if let Some(packet) = self.pending.take() {
            return Ok(Some(packet));
        }

        let mut header = [0u8; 1];
        match self.connection.read(&mut header) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(_) => return Err(Error::ReadError),
        }

        let body = self.read_body()?.ok_or(Error::PacketTooLarge)?;
        match header[0] & 0xF0 {
            PUBLISH => self.receive_publish(header[0], &body).map(Some),
            kind => {
                trace!("mqtt skipped packet type {}", kind);
                Ok(None)
            }
        }
    }

    /// Send DISCONNECT and close the connection.
    pub fn disconnect(mut self) -> Result<(), Error> {
        write_all(&mut self.connection, &[DISCONNECT, 0x00])?;
        self.connection.flush().map_err(|_| Error::WriteError)?;
        self.connection.close().map_err(|_| Error::NotOpen)
    }

    /// Read the rest of a packet after its first header byte. An oversized
    /// packet is drained from the connection and `None` is returned.
    fn read_body(&mut self) -> Result<Option<Vec<u8, PACKET_CAPACITY>>, Error> {
        let remaining_len = self.read_remaining_length()?;
        if remaining_len > PACKET_CAPACITY {
            self.discard(remaining_len)?;
            warn!("mqtt dropped {} byte packet", remaining_len);
            return Ok(None);
        }

        let mut body: Vec<u8, PACKET_CAPACITY> = Vec::new();
        body.resize(remaining_len, 0)
            .map_err(|_| Error::PacketTooLarge)?;
        read_exact(&mut self.connection, &mut body)?;
        Ok(Some(body))
    }

    fn receive_publish(&mut self, flags: u8, body: &[u8]) -> Result<PublishPacket, Error> {
        let qos = match (flags >> 1) & 0x03 {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            _ => return Err(Error::ProtocolError),
        };

        let len_bytes = body.get(..2).ok_or(Error::ProtocolError)?;
        let topic_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let topic_bytes = body.get(2..2 + topic_len).ok_or(Error::ProtocolError)?;
        let topic = core::str::from_utf8(topic_bytes).map_err(|_| Error::ProtocolError)?;
        let topic = String::try_from(topic).map_err(|_| Error::PacketTooLarge)?;

        let mut offset = 2 + topic_len;
        let packet_id = if qos == QoS::AtLeastOnce {
            let id = body.get(offset..offset + 2).ok_or(Error::ProtocolError)?;
            offset += 2;
            Some(u16::from_be_bytes([id[0], id[1]]))
        } else {
            None
        };
        let payload = Vec::from_slice(&body[offset..]).map_err(|_| Error::PacketTooLarge)?;

        if let Some(id) = packet_id {
            let [hi, lo] = id.to_be_bytes();
            write_all(&mut self.connection, &[PUBACK, 0x02, hi, lo])?;
            self.connection.flush().map_err(|_| Error::WriteError)?;
        }

        Ok(PublishPacket {
            topic,
            payload,
            qos,
            packet_id,
        })
    }

    fn read_remaining_length(&mut self) -> Result<usize, Error> {
        let mut value = 0usize;
        let mut multiplier = 1usize;
        for _ in 0..4 {
            let mut byte = [0u8; 1];
            read_exact(&mut self.connection, &mut byte)?;
            value += (byte[0] & 0x7F) as usize * multiplier;
            if byte[0] & 0x80 == 0 {
                return Ok(value);
            }
            multiplier *= 128;
        }
        Err(Error::ProtocolError)
    }

    fn discard(&mut self, mut len: usize) -> Result<(), Error> {
        let mut scratch = [0u8; 64];
        while len > 0 {
            let n = len.min(scratch.len());
            read_exact(&mut self.connection, &mut scratch[..n])?;
            len -= n;
        }
        Ok(())
    }

    fn next_packet_id(&mut self) -> u16 {
        // Zero is not a valid packet identifier.
        self.next_packet_id = self.next_packet_id.checked_add(1).unwrap_or(1);
        self.next_packet_id
    }
}

fn push<const N: usize>(buf: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    buf.extend_from_slice(bytes)
        .map_err(|_| Error::PacketTooLarge)
}

/// Append a length-prefixed field.
fn push_field<const N: usize>(buf: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    let len = u16::try_from(bytes.len()).map_err(|_| Error::PacketTooLarge)?;
    push(buf, &len.to_be_bytes())?;
    push(buf, bytes)
}

fn write_all<W: Write>(connection: &mut W, mut buf: &[u8]) -> Result<(), Error> {
    while !buf.is_empty() {
        match connection.write(buf) {
            Ok(0) | Err(_) => return Err(Error::WriteError),
            Ok(n) => buf = &buf[n..],
        }
    }
    Ok(())
}

fn read_exact<R: Read>(connection: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    let mut filled = 0;
    let mut idle = 0;
    while filled < buf.len() {
        match connection.read(&mut buf[filled..]) {
            Ok(0) => {
                idle += 1;
                if idle > READ_RETRIES {
                    return Err(Error::ConnectionClosed);
                }
            }
            Ok(n) => {
                filled += n;
                idle = 0;
            }
            Err(_) => return Err(Error::ReadError),
        }
    }
    Ok(())
}

/// Encode the remaining length field for an MQTT packet.
///
/// The encoding uses up to 4 bytes where each byte encodes 7 bits of the length
/// value. The most significant bit indicates if another byte follows.
fn encode_remaining_length(buf: &mut Vec<u8, 5>, mut len: usize) -> Result<(), Error> {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| Error::PacketTooLarge)?;
        if len == 0 {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_length_encoding() {
        let mut buf: Vec<u8, 5> = Vec::new();
        encode_remaining_length(&mut buf, 0).unwrap();
        assert_eq!(buf.as_slice(), &[0x00]);

        let mut buf: Vec<u8, 5> = Vec::new();
        encode_remaining_length(&mut buf, 321).unwrap();
        assert_eq!(buf.as_slice(), &[0xC1, 0x02]);

        let mut buf: Vec<u8, 5> = Vec::new();
        encode_remaining_length(&mut buf, 268_435_455).unwrap();
        assert_eq!(buf.as_slice(), &[0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_push_field_prefixes_length() {
        let mut buf: Vec<u8, 8> = Vec::new();
        push_field(&mut buf, b"abc").unwrap();
        assert_eq!(buf.as_slice(), &[0, 3, b'a', b'b', b'c']);
        assert_eq!(push_field(&mut buf, b"toolong"), Err(Error::PacketTooLarge));
    }
}
