use std::io::{self, ErrorKind, Read};

/// Decodes UTF-8 characters from a byte reader, one character per pull.
///
/// Bytes are read one at a time so that nothing past the last decoded
/// character is taken from the reader. Malformed sequences decode to
/// [`char::REPLACEMENT_CHARACTER`]. An I/O error ends the stream and is
/// logged.
pub struct Utf8Chars<R> {
    reader: R,
    done: bool,
}

impl<R: Read> Utf8Chars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn decode(&mut self) -> io::Result<Option<char>> {
        let Some(first) = self.read_byte()? else {
            return Ok(None);
        };
        let width = sequence_width(first);
        match width {
            0 => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            1 => return Ok(Some(char::from(first))),
            _ => {}
        }

        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            match self.read_byte()? {
                Some(b) if b & 0xC0 == 0x80 => *slot = b,
                _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            }
        }

        Ok(Some(
            std::str::from_utf8(&bytes[..width])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
        ))
    }
}

fn sequence_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

impl<R: Read> Iterator for Utf8Chars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if self.done {
            return None;
        }
        match self.decode() {
            Ok(Some(c)) => Some(c),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                tracing::error!(
                    target: "lazyparse::stream",
                    error = %e,
                    "Reading character source failed, ending stream"
                );
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_decodes_multibyte_characters() {
        let chars: String = Utf8Chars::new(Cursor::new("añ€😀".as_bytes().to_vec())).collect();
        assert_eq!(chars, "añ€😀");
    }

    #[test]
    fn test_reads_only_one_character() {
        let mut cursor = Cursor::new("é!".as_bytes().to_vec());
        let first = Utf8Chars::new(&mut cursor).next();
        assert_eq!(first, Some('é'));
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_malformed_bytes_become_replacement() {
        let bytes = vec![b'a', 0xFF, 0xC3, b'b'];
        let chars: Vec<char> = Utf8Chars::new(Cursor::new(bytes)).collect();
        assert_eq!(
            chars,
            vec!['a', char::REPLACEMENT_CHARACTER, char::REPLACEMENT_CHARACTER]
        );
    }

    #[test]
    fn test_io_error_ends_stream() {
        let mut chars = Utf8Chars::new(Failing);
        assert_eq!(chars.next(), None);
        assert_eq!(chars.next(), None);
    }
}
