//! Binary writer for the node's wire format.

/// Appends little-endian fields and length prefixes to a byte buffer.
#[derive(Clone, Debug, Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_var_int(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&var_int(value));
        self
    }

    /// Length-prefixed byte string.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_var_int(bytes.len() as u64).write_bytes(bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Variable length integer: one byte below `0xfd`, otherwise a marker followed by a u16, u32 or
/// u64.
pub fn var_int(value: u64) -> Vec<u8> {
    match value {
        0..0xfd => vec![value as u8],
        0xfd..=0xffff => {
            let mut out = vec![0xfd];
            out.extend_from_slice(&(value as u16).to_le_bytes());
            out
        }
        0x1_0000..=0xffff_ffff => {
            let mut out = vec![0xfe];
            out.extend_from_slice(&(value as u32).to_le_bytes());
            out
        }
        _ => {
            let mut out = vec![0xff];
            out.extend_from_slice(&value.to_le_bytes());
            out
        }
    }
}
