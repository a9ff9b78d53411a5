use crate::error::LexError;
use crate::token::Pos;
use std::io::{BufReader, Read, Seek, SeekFrom};

const BUF_SIZE: usize = 4096;

/// Buffered byte reader with one byte of lookahead and location tracking.
/// Columns reset on `\n`; `reinit` rewinds to byte zero for the second
/// parsing pass.
pub struct Source<R: Read + Seek> {
    reader: BufReader<R>,
    peeked: Option<u8>,
    pos: Pos,
}

impl<R: Read + Seek> Source<R> {
    pub fn new(inner: R) -> Self {
        Source {
            reader: BufReader::with_capacity(BUF_SIZE, inner),
            peeked: None,
            pos: Pos::start(),
        }
    }

    /// Location of the next unread byte.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Next byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>, LexError> {
        if self.peeked.is_none() {
            self.peeked = self.fetch()?;
        }
        Ok(self.peeked)
    }

    /// Consume and return the next byte, advancing the location.
    pub fn read_byte(&mut self) -> Result<Option<u8>, LexError> {
        let byte = match self.peeked.take() {
            Some(b) => Some(b),
            None => self.fetch()?,
        };
        if let Some(b) = byte {
            self.pos.offset += 1;
            if b == b'\n' {
                self.pos.line += 1;
                self.pos.col = 1;
            } else {
                self.pos.col += 1;
            }
        }
        Ok(byte)
    }

    fn fetch(&mut self) -> Result<Option<u8>, LexError> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(LexError::ReaderError {
                        pos: self.pos,
                        source: e,
                    })
                }
            }
        }
    }

    /// Rewind to byte zero and forget lookahead and location.
    pub fn reinit(&mut self) -> Result<(), LexError> {
        self.reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| LexError::ReaderError {
                pos: self.pos,
                source: e,
            })?;
        self.peeked = None;
        self.pos = Pos::start();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn locations() {
        let mut src = Source::new(Cursor::new("ab\nc"));
        assert_eq!(src.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(src.pos().col, 1);
        assert_eq!(src.read_byte().unwrap(), Some(b'a'));
        assert_eq!(src.read_byte().unwrap(), Some(b'b'));
        assert_eq!(src.pos().col, 3);
        assert_eq!(src.read_byte().unwrap(), Some(b'\n'));
        assert_eq!((src.pos().line, src.pos().col), (2, 1));
        assert_eq!(src.read_byte().unwrap(), Some(b'c'));
        assert_eq!(src.read_byte().unwrap(), None);
        assert_eq!(src.read_byte().unwrap(), None);
    }

    #[test]
    fn reinit_restores_start() {
        let mut src = Source::new(Cursor::new("xy"));
        src.read_byte().unwrap();
        src.peek_byte().unwrap();
        src.reinit().unwrap();
        assert_eq!(src.pos(), Pos::start());
        assert_eq!(src.read_byte().unwrap(), Some(b'x'));
    }
}
