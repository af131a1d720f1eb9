//! In-memory stream replaying canned server replies and recording what the
//! client wrote

use std::{
    io::{self, Cursor, Read, Write},
    sync::{Arc, Mutex},
};

#[derive(Clone, Debug, Default)]
pub(crate) struct MockStream {
    reader: Arc<Mutex<Cursor<Vec<u8>>>>,
    writer: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    /// A stream that will answer with `replies`, in order
    pub(crate) fn with_replies(replies: &[&str]) -> MockStream {
        MockStream {
            reader: Arc::new(Mutex::new(Cursor::new(replies.concat().into_bytes()))),
            writer: Arc::default(),
        }
    }

    /// Everything written so far
    pub(crate) fn written(&self) -> String {
        String::from_utf8_lossy(&self.writer.lock().unwrap()).into_owned()
    }
}

impl Write for MockStream {
    fn write(&mut self, msg: &[u8]) -> io::Result<usize> {
        self.writer.lock().unwrap().write(msg)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.lock().unwrap().read(buf)
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};

    use super::MockStream;

    #[test]
    fn test_clone_shares_buffers() {
        let mock = MockStream::with_replies(&["220 ready\r\n", "250 ok\r\n"]);
        let mut writer = mock.clone();
        writer.write_all(b"NOOP\r\n").unwrap();
        assert_eq!(mock.written(), "NOOP\r\n");

        let mut reader = mock.clone();
        let mut read = String::new();
        reader.read_to_string(&mut read).unwrap();
        assert_eq!(read, "220 ready\r\n250 ok\r\n");
    }
}
