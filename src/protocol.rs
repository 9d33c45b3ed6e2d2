//! Wire framing for the chunked RGB565 stream.
//!
//! Each chunk becomes one packet: a 12-byte big-endian header followed by
//! its RGB565 payload, written to the socket in a single `write_all` so a
//! partial packet is never observable on the wire.

use std::io::{self, Write};

use imaging::Chunk;

pub const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
    pub data_len: u32,
}

impl PacketHeader {
    pub fn for_chunk(chunk: &Chunk) -> Self {
        Self {
            x: chunk.x as u16,
            y: chunk.y as u16,
            w: chunk.w as u16,
            h: chunk.h as u16,
            data_len: chunk.data_len() as u32,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.x.to_be_bytes());
        buf[2..4].copy_from_slice(&self.y.to_be_bytes());
        buf[4..6].copy_from_slice(&self.w.to_be_bytes());
        buf[6..8].copy_from_slice(&self.h.to_be_bytes());
        buf[8..12].copy_from_slice(&self.data_len.to_be_bytes());
        buf
    }
}

/// Write one complete packet (header + payload) as a single atomic
/// `write_all` call.
pub fn write_packet<W: Write>(writer: &mut W, chunk: &Chunk, payload: &[u8]) -> io::Result<()> {
    debug_assert_eq!(payload.len(), chunk.data_len());
    let header = PacketHeader::for_chunk(chunk);
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    writer.write_all(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_header_encodes_coordinates_and_data_len() {
        let chunk = Chunk { x: 0, y: 0, w: 4, h: 2 };
        let header = PacketHeader::for_chunk(&chunk);
        assert_eq!(
            header.encode(),
            [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x02, 0x00, 0x00, 0x00, 0x10]
        );
    }

    #[test]
    fn write_packet_emits_header_then_payload_in_one_call() {
        let chunk = Chunk { x: 1, y: 2, w: 2, h: 1 };
        let payload = vec![0xF8, 0x00, 0xF8, 0x00];
        let mut sink = Vec::new();
        write_packet(&mut sink, &chunk, &payload).unwrap();
        assert_eq!(sink.len(), HEADER_LEN + payload.len());
        assert_eq!(&sink[HEADER_LEN..], payload.as_slice());
    }
}
