use crate::error::DecodeError;

/// Largest single label in a name.
pub const MAX_LABEL_LEN: usize = 63;
/// Largest encoded name, length bytes and terminator included.
pub const MAX_NAME_LEN: usize = 255;

type Result<T> = std::result::Result<T, DecodeError>;

/// Big-endian cursor over a DNS message.
///
/// Reads are bounds-checked against the bytes actually received, so a
/// truncated packet surfaces as [`DecodeError::EndOfBuffer`] instead of
/// reading stale buffer contents. Writes always append.
#[derive(Debug, Default)]
pub struct BytePacketBuffer {
    pub buffer: Vec<u8>,
    pub position: usize,
}

impl BytePacketBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            position: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buffer: bytes.to_vec(),
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn read(&mut self) -> Result<u8> {
        let result = *self
            .buffer
            .get(self.position)
            .ok_or(DecodeError::EndOfBuffer(self.position))?;
        self.position += 1;

        Ok(result)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let result = (self.read()? as u16) << 8 | (self.read()? as u16);

        Ok(result)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let result = (self.read()? as u32) << 24
            | (self.read()? as u32) << 16
            | (self.read()? as u32) << 8
            | (self.read()? as u32);

        Ok(result)
    }

    pub fn read_range(&mut self, len: usize) -> Result<&[u8]> {
        if len > self.remaining() {
            return Err(DecodeError::EndOfBuffer(self.position));
        }

        let start = self.position;
        self.position += len;

        Ok(&self.buffer[start..start + len])
    }

    /// Reads length-prefixed labels up to and including the zero-length
    /// terminator. Compression pointers are rejected as oversized labels.
    pub fn read_labels(&mut self) -> Result<Vec<Vec<u8>>> {
        let start = self.position;
        let mut labels = Vec::new();

        loop {
            let len = self.read()?;

            if len == 0 {
                break;
            }

            if len as usize > MAX_LABEL_LEN {
                return Err(DecodeError::LabelTooLong(len));
            }

            labels.push(self.read_range(len as usize)?.to_vec());

            // room must remain for the terminator
            if self.position - start + 1 > MAX_NAME_LEN {
                return Err(DecodeError::NameTooLong);
            }
        }

        Ok(labels)
    }

    pub fn write_u8(&mut self, byte: u8) {
        self.buffer.push(byte);
        self.position = self.buffer.len();
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        self.position = self.buffer.len();
    }

    /// Writes labels exactly as given, followed by the terminator.
    pub fn write_labels(&mut self, labels: &[Vec<u8>]) {
        for label in labels {
            self.write_u8(label.len() as u8);
            self.write_bytes(label);
        }

        self.write_u8(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_integers() {
        let mut buffer = BytePacketBuffer::from_bytes(&[0x12, 0x34, 0xde, 0xad, 0xbe, 0xef]);

        assert_eq!(buffer.read_u16().unwrap(), 0x1234);
        assert_eq!(buffer.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn read_past_end_fails() {
        let mut buffer = BytePacketBuffer::from_bytes(&[0x01]);

        assert_eq!(buffer.read_u16(), Err(DecodeError::EndOfBuffer(1)));
    }

    #[test]
    fn short_range_reports_cursor_position() {
        let mut buffer = BytePacketBuffer::from_bytes(&[0, 0, 0, 1, 2]);
        buffer.read_u16().unwrap();

        assert_eq!(buffer.read_range(4), Err(DecodeError::EndOfBuffer(2)));
        assert_eq!(buffer.position, 2);
    }

    #[test]
    fn reads_labels_until_terminator() {
        let bytes = b"\x07example\x03com\x00\x00\x01";
        let mut buffer = BytePacketBuffer::from_bytes(bytes);

        let labels = buffer.read_labels().unwrap();

        assert_eq!(labels, vec![b"example".to_vec(), b"com".to_vec()]);
        assert_eq!(buffer.position, 13);
    }

    #[test]
    fn unterminated_name_fails() {
        let mut buffer = BytePacketBuffer::from_bytes(b"\x07example\x03com");

        assert!(matches!(
            buffer.read_labels(),
            Err(DecodeError::EndOfBuffer(_))
        ));
    }

    #[test]
    fn label_longer_than_buffer_fails() {
        let mut buffer = BytePacketBuffer::from_bytes(b"\x20abc");

        // reported at the first byte of the missing label
        assert_eq!(buffer.read_labels(), Err(DecodeError::EndOfBuffer(1)));
    }

    #[test]
    fn compression_pointer_in_name_is_rejected() {
        let mut buffer = BytePacketBuffer::from_bytes(&[0xc0, 0x0c]);

        assert_eq!(buffer.read_labels(), Err(DecodeError::LabelTooLong(0xc0)));
    }

    #[test]
    fn oversized_name_is_rejected() {
        let mut bytes = Vec::new();
        for _ in 0..5 {
            bytes.push(63);
            bytes.extend_from_slice(&[b'a'; 63]);
        }
        bytes.push(0);

        let mut buffer = BytePacketBuffer::from_bytes(&bytes);

        assert_eq!(buffer.read_labels(), Err(DecodeError::NameTooLong));
    }

    #[test]
    fn writes_labels_with_terminator() {
        let mut buffer = BytePacketBuffer::new();
        buffer.write_labels(&[b"example".to_vec(), b"com".to_vec()]);
        buffer.write_u16(1);

        assert_eq!(buffer.into_bytes(), b"\x07example\x03com\x00\x00\x01".to_vec());
    }
}
