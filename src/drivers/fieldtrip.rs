//! Minimal blocking client for the FieldTrip realtime buffer.
//!
//! Only the two read requests the viewer needs are implemented: `GET_HDR` to
//! learn how many samples the buffer holds, and `GET_DAT` to pull an inclusive
//! sample range. Every message is an 8-byte `messagedef` (version, command,
//! payload size) followed by the payload, all little-endian.
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use crate::drivers::ViewerError;
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 1972;
const VERSION: u16 = 1;
const MESSAGE_DEF_LEN: usize = 8;
const HEADER_DEF_LEN: usize = 24;
const DATA_DEF_LEN: usize = 16;
/// Largest reply payload accepted; bigger announcements are treated as corrupt.
pub const MAX_PAYLOAD: usize = 64 * 1024 * 1024;
pub const GET_HDR: u16 = 0x0201;
pub const GET_DAT: u16 = 0x0202;
pub const GET_OK: u16 = 0x0204;
pub const GET_ERR: u16 = 0x0205;
/// Sample encodings a buffer may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Char,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}
impl DataType {
    pub fn from_code(code: u32) -> Result<Self, ViewerError> {
        Ok(match code {
            0 => DataType::Char,
            1 => DataType::UInt8,
            2 => DataType::UInt16,
            3 => DataType::UInt32,
            4 => DataType::UInt64,
            5 => DataType::Int8,
            6 => DataType::Int16,
            7 => DataType::Int32,
            8 => DataType::Int64,
            9 => DataType::Float32,
            10 => DataType::Float64,
            other => return Err(ViewerError::UnsupportedDataType(other)),
        })
    }
    pub fn code(self) -> u32 {
        match self {
            DataType::Char => 0,
            DataType::UInt8 => 1,
            DataType::UInt16 => 2,
            DataType::UInt32 => 3,
            DataType::UInt64 => 4,
            DataType::Int8 => 5,
            DataType::Int16 => 6,
            DataType::Int32 => 7,
            DataType::Int64 => 8,
            DataType::Float32 => 9,
            DataType::Float64 => 10,
        }
    }
    pub fn size(self) -> usize {
        match self {
            DataType::Char | DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => 8,
        }
    }
    // `raw` is exactly `self.size()` bytes; the caller slices with chunks_exact.
    fn decode(self, raw: &[u8]) -> f64 {
        let mut b8 = [0u8; 8];
        b8[..raw.len()].copy_from_slice(raw);
        let b4 = [b8[0], b8[1], b8[2], b8[3]];
        let b2 = [b8[0], b8[1]];
        match self {
            DataType::Char | DataType::UInt8 => b8[0] as f64,
            DataType::Int8 => b8[0] as i8 as f64,
            DataType::UInt16 => u16::from_le_bytes(b2) as f64,
            DataType::Int16 => i16::from_le_bytes(b2) as f64,
            DataType::UInt32 => u32::from_le_bytes(b4) as f64,
            DataType::Int32 => i32::from_le_bytes(b4) as f64,
            DataType::Float32 => f32::from_le_bytes(b4) as f64,
            DataType::UInt64 => u64::from_le_bytes(b8) as f64,
            DataType::Int64 => i64::from_le_bytes(b8) as f64,
            DataType::Float64 => f64::from_le_bytes(b8),
        }
    }
}
/// The fixed prefix of every request and response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageDef {
    pub version: u16,
    pub command: u16,
    pub bufsize: u32,
}
impl MessageDef {
    pub fn new(command: u16, bufsize: u32) -> Self {
        Self {
            version: VERSION,
            command,
            bufsize,
        }
    }
    pub fn encode(&self) -> [u8; MESSAGE_DEF_LEN] {
        let mut out = [0u8; MESSAGE_DEF_LEN];
        out[0..2].copy_from_slice(&self.version.to_le_bytes());
        out[2..4].copy_from_slice(&self.command.to_le_bytes());
        out[4..8].copy_from_slice(&self.bufsize.to_le_bytes());
        out
    }
    pub fn decode(raw: &[u8; MESSAGE_DEF_LEN]) -> Result<Self, ViewerError> {
        let version = u16::from_le_bytes([raw[0], raw[1]]);
        if version != VERSION {
            return Err(ViewerError::Protocol(format!(
                "unexpected protocol version {version}"
            )));
        }
        Ok(Self {
            version,
            command: u16::from_le_bytes([raw[2], raw[3]]),
            bufsize: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        })
    }
}
/// Buffer header as returned by `GET_HDR`. Chunks are skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub nchans: u32,
    pub nsamples: u32,
    pub fsample: f32,
    pub data_type: DataType,
}
/// Samples returned by `GET_DAT`, row-major (samples x channels).
#[derive(Clone, Debug, PartialEq)]
pub struct DataBlock {
    pub nchans: usize,
    pub nsamples: usize,
    pub data_type: DataType,
    pub samples: Vec<f64>,
}
impl DataBlock {
    /// One column of the block.
    pub fn channel(&self, channel: usize) -> Result<Vec<f64>, ViewerError> {
        if channel >= self.nchans {
            return Err(ViewerError::ChannelOutOfRange {
                channel,
                available: self.nchans,
            });
        }
        Ok(self
            .samples
            .iter()
            .skip(channel)
            .step_by(self.nchans)
            .copied()
            .collect())
    }
}
pub fn encode_get_header() -> Vec<u8> {
    MessageDef::new(GET_HDR, 0).encode().to_vec()
}
/// `begin` and `end` are both inclusive.
pub fn encode_get_data(begin: u32, end: u32) -> Vec<u8> {
    let mut out = MessageDef::new(GET_DAT, 8).encode().to_vec();
    out.extend_from_slice(&begin.to_le_bytes());
    out.extend_from_slice(&end.to_le_bytes());
    out
}
fn le_u32(payload: &[u8], offset: usize) -> Result<u32, ViewerError> {
    payload
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| ViewerError::Protocol(format!("payload truncated at byte {offset}")))
}
pub fn decode_header(payload: &[u8]) -> Result<Header, ViewerError> {
    if payload.len() < HEADER_DEF_LEN {
        return Err(ViewerError::Protocol(format!(
            "header payload is {} bytes, need at least {HEADER_DEF_LEN}",
            payload.len()
        )));
    }
    let chunk_bytes = le_u32(payload, 20)? as usize;
    if payload.len() < HEADER_DEF_LEN + chunk_bytes {
        return Err(ViewerError::Protocol(format!(
            "header announces {chunk_bytes} chunk bytes, got {}",
            payload.len() - HEADER_DEF_LEN
        )));
    }
    Ok(Header {
        nchans: le_u32(payload, 0)?,
        nsamples: le_u32(payload, 4)?,
        fsample: f32::from_bits(le_u32(payload, 12)?),
        data_type: DataType::from_code(le_u32(payload, 16)?)?,
    })
}
pub fn decode_data(payload: &[u8]) -> Result<DataBlock, ViewerError> {
    if payload.len() < DATA_DEF_LEN {
        return Err(ViewerError::Protocol(format!(
            "data payload is {} bytes, need at least {DATA_DEF_LEN}",
            payload.len()
        )));
    }
    let nchans = le_u32(payload, 0)? as usize;
    let nsamples = le_u32(payload, 4)? as usize;
    let data_type = DataType::from_code(le_u32(payload, 8)?)?;
    let bufsize = le_u32(payload, 12)? as usize;
    if data_type == DataType::Char {
        return Err(ViewerError::UnsupportedDataType(data_type.code()));
    }
    let expected = nchans
        .checked_mul(nsamples)
        .and_then(|n| n.checked_mul(data_type.size()))
        .ok_or_else(|| ViewerError::Protocol(format!("data block {nsamples}x{nchans} overflows")))?;
    let body = &payload[DATA_DEF_LEN..];
    if bufsize != expected || body.len() < expected {
        return Err(ViewerError::Protocol(format!(
            "data block of {nsamples}x{nchans} {data_type:?} needs {expected} bytes, \
             announced {bufsize}, received {}",
            body.len()
        )));
    }
    let samples = body[..expected]
        .chunks_exact(data_type.size())
        .map(|raw| data_type.decode(raw))
        .collect();
    Ok(DataBlock {
        nchans,
        nsamples,
        data_type,
        samples,
    })
}
/// Connection to one buffer server. The socket is closed on drop.
pub struct FieldTripClient {
    stream: TcpStream,
    peer: String,
}
impl FieldTripClient {
    pub fn connect(host: &str, port: u16) -> Result<Self, ViewerError> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        let peer = format!("{host}:{port}");
        log::info!("connected to FieldTrip buffer at {peer}");
        Ok(Self { stream, peer })
    }
    pub fn peer(&self) -> &str {
        &self.peer
    }
    /// `Ok(None)` when the server has no header yet.
    pub fn get_header(&mut self) -> Result<Option<Header>, ViewerError> {
        let (reply, payload) = self.request(&encode_get_header())?;
        match reply.command {
            GET_OK => decode_header(&payload).map(Some),
            GET_ERR => Ok(None),
            other => Err(unexpected_reply(GET_HDR, other)),
        }
    }
    /// Inclusive sample range `[begin, end]`.
    pub fn get_data(&mut self, begin: u32, end: u32) -> Result<DataBlock, ViewerError> {
        let (reply, payload) = self.request(&encode_get_data(begin, end))?;
        match reply.command {
            GET_OK => decode_data(&payload),
            GET_ERR => Err(ViewerError::DataUnavailable { begin, end }),
            other => Err(unexpected_reply(GET_DAT, other)),
        }
    }
    fn request(&mut self, message: &[u8]) -> Result<(MessageDef, Vec<u8>), ViewerError> {
        self.stream.write_all(message)?;
        let mut raw = [0u8; MESSAGE_DEF_LEN];
        self.stream.read_exact(&mut raw)?;
        let reply = MessageDef::decode(&raw)?;
        if reply.bufsize as usize > MAX_PAYLOAD {
            return Err(ViewerError::Protocol(format!(
                "reply announces {} payload bytes, limit is {MAX_PAYLOAD}",
                reply.bufsize
            )));
        }
        let mut payload = vec![0u8; reply.bufsize as usize];
        self.stream.read_exact(&mut payload)?;
        Ok((reply, payload))
    }
}
impl Drop for FieldTripClient {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        log::debug!("closed connection to {}", self.peer);
    }
}
fn unexpected_reply(request: u16, reply: u16) -> ViewerError {
    ViewerError::Protocol(format!(
        "unexpected reply 0x{reply:04x} to request 0x{request:04x}"
    ))
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn requests_encode_to_wire_layout() {
        assert_eq!(encode_get_header(), vec![1, 0, 0x01, 0x02, 0, 0, 0, 0]);
        assert_eq!(
            encode_get_data(1500, 1999),
            vec![1, 0, 0x02, 0x02, 8, 0, 0, 0, 0xdc, 0x05, 0, 0, 0xcf, 0x07, 0, 0]
        );
    }
    #[test]
    fn header_decodes_and_skips_chunks() {
        let mut payload = mock::header_payload(8, 2000, 250.0, DataType::Float32);
        payload[20..24].copy_from_slice(&4u32.to_le_bytes());
        payload.extend_from_slice(&[9, 9, 9, 9]);
        let header = decode_header(&payload).unwrap();
        assert_eq!(header.nchans, 8);
        assert_eq!(header.nsamples, 2000);
        assert_eq!(header.fsample, 250.0);
        assert_eq!(header.data_type, DataType::Float32);
    }
    #[test]
    fn header_with_missing_chunks_is_rejected() {
        let mut payload = mock::header_payload(1, 10, 100.0, DataType::Float64);
        payload[20..24].copy_from_slice(&16u32.to_le_bytes());
        assert!(matches!(decode_header(&payload), Err(ViewerError::Protocol(_))));
        assert!(matches!(decode_header(&payload[..10]), Err(ViewerError::Protocol(_))));
    }
    #[test]
    fn data_decodes_float_and_integer_types() {
        let block = decode_data(&mock::data_payload_f32(
            2,
            &[vec![1.0, -1.0], vec![2.5, -2.5], vec![4.0, -4.0]],
        ))
        .unwrap();
        assert_eq!(block.nsamples, 3);
        assert_eq!(block.channel(0).unwrap(), vec![1.0, 2.5, 4.0]);
        assert_eq!(block.channel(1).unwrap(), vec![-1.0, -2.5, -4.0]);

        let mut payload = Vec::new();
        for v in [1u32, 2, DataType::Int16.code(), 4] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        payload.extend_from_slice(&(-300i16).to_le_bytes());
        payload.extend_from_slice(&(42i16).to_le_bytes());
        let block = decode_data(&payload).unwrap();
        assert_eq!(block.samples, vec![-300.0, 42.0]);

        let mut payload = Vec::new();
        for v in [1u32, 1, DataType::Float64.code(), 8] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        payload.extend_from_slice(&0.125f64.to_le_bytes());
        assert_eq!(decode_data(&payload).unwrap().samples, vec![0.125]);
    }
    #[test]
    fn malformed_data_is_rejected() {
        let mut payload = mock::data_payload_f32(1, &[vec![1.0], vec![2.0]]);
        payload.truncate(payload.len() - 2);
        assert!(matches!(decode_data(&payload), Err(ViewerError::Protocol(_))));

        let mut chars = Vec::new();
        for v in [1u32, 1, DataType::Char.code(), 1] {
            chars.extend_from_slice(&v.to_le_bytes());
        }
        chars.push(b'a');
        assert!(matches!(
            decode_data(&chars),
            Err(ViewerError::UnsupportedDataType(0))
        ));
        assert!(matches!(
            DataType::from_code(11),
            Err(ViewerError::UnsupportedDataType(11))
        ));
    }
    #[test]
    fn wrong_version_is_a_protocol_error() {
        let raw = [2, 0, 0x04, 0x02, 0, 0, 0, 0];
        assert!(matches!(MessageDef::decode(&raw), Err(ViewerError::Protocol(_))));
    }
    #[test]
    fn channel_out_of_range() {
        let block = decode_data(&mock::data_payload_f32(1, &[vec![1.0]])).unwrap();
        assert!(matches!(
            block.channel(3),
            Err(ViewerError::ChannelOutOfRange {
                channel: 3,
                available: 1
            })
        ));
    }
    #[test]
    fn client_round_trips_against_mock_server() {
        let (port, server) = mock::spawn(2, |command, _| match command {
            GET_HDR => mock::reply(GET_OK, &mock::header_payload(2, 10, 500.0, DataType::Float32)),
            _ => mock::reply(GET_OK, &mock::data_payload_f32(2, &[vec![3.0, 4.0]])),
        });
        let mut client = FieldTripClient::connect("127.0.0.1", port).unwrap();
        let header = client.get_header().unwrap().unwrap();
        assert_eq!(header.nsamples, 10);
        let block = client.get_data(9, 9).unwrap();
        assert_eq!(block.channel(1).unwrap(), vec![4.0]);
        drop(client);
        let seen = server.join().unwrap();
        assert_eq!(seen[1].0, GET_DAT);
        assert_eq!(seen[1].1, [9u32.to_le_bytes(), 9u32.to_le_bytes()].concat());
    }
    #[test]
    fn oversized_reply_is_refused_before_reading() {
        let (port, server) = mock::spawn(1, |_, _| {
            MessageDef::new(GET_OK, u32::MAX).encode().to_vec()
        });
        let mut client = FieldTripClient::connect("127.0.0.1", port).unwrap();
        assert!(matches!(client.get_header(), Err(ViewerError::Protocol(msg)) if msg.contains("limit")));
        drop(client);
        server.join().unwrap();
    }
    #[test]
    fn get_err_maps_to_missing_header_and_data() {
        let (port, server) = mock::spawn(2, |_, _| mock::reply(GET_ERR, &[]));
        let mut client = FieldTripClient::connect("127.0.0.1", port).unwrap();
        assert!(client.get_header().unwrap().is_none());
        assert!(matches!(
            client.get_data(0, 4),
            Err(ViewerError::DataUnavailable { begin: 0, end: 4 })
        ));
        drop(client);
        server.join().unwrap();
    }
}
