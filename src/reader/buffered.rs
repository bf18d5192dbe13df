//! Forward-only sources
//!
//! A stream can only be read once, so it is drained into memory before a
//! document is built from it.

use std::io::{BufReader, Read};

/// Buffer size for reading chunks
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Read an entire XML document from a Read source
pub fn read_all<R: Read>(reader: R) -> std::io::Result<Vec<u8>> {
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, reader);
    let mut buffer = Vec::with_capacity(DEFAULT_BUFFER_SIZE);
    reader.read_to_end(&mut buffer)?;
    tracing::trace!(bytes = buffer.len(), "drained forward-only source");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_all() {
        let data = b"<root>content</root>";
        let result = read_all(Cursor::new(data.to_vec())).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_read_all_larger_than_buffer() {
        let data = vec![b'x'; DEFAULT_BUFFER_SIZE * 3 + 17];
        let result = read_all(Cursor::new(data.clone())).unwrap();
        assert_eq!(result.len(), data.len());
    }
}
