//! Schema-registry wire envelope.
//!
//! Format: `[magic_byte(1)][schema_id(4, big-endian)][payload(N)]`

use bytes::{Buf, BufMut, BytesMut};

/// Magic byte opening every framed payload.
pub const MAGIC_BYTE: u8 = 0x00;

/// Magic byte plus the 4-byte schema id.
pub const ENVELOPE_HEADER_LEN: usize = 5;

/// Frame `payload` with the magic byte and `schema_id`.
pub fn write_envelope(schema_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(ENVELOPE_HEADER_LEN + payload.len());
    buf.put_u8(MAGIC_BYTE);
    buf.put_u32(schema_id);
    buf.put_slice(payload);
    buf.to_vec()
}

/// Split an envelope-shaped buffer into its schema id and payload.
///
/// Returns `None` when the buffer is too short or does not start with the
/// magic byte. The schema id is not checked against any registry.
pub fn peek_envelope(data: &[u8]) -> Option<(u32, &[u8])> {
    if data.len() < ENVELOPE_HEADER_LEN || data[0] != MAGIC_BYTE {
        return None;
    }
    let mut id_bytes = &data[1..ENVELOPE_HEADER_LEN];
    Some((id_bytes.get_u32(), &data[ENVELOPE_HEADER_LEN..]))
}
