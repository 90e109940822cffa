//! Line oriented access to the serial link.

use crate::util::warn;
use arrayvec::{ArrayString, ArrayVec};
use core::fmt;
use core::future::Future;
use embassy_futures::yield_now;
use embassy_time::{Duration, with_timeout};
use embedded_io_async::{Read, Write};

/// Maximum length of a line, without its terminator.
pub const LINE_CAPACITY: usize = 64;

pub type Line = ArrayString<LINE_CAPACITY>;

/// A bidirectional link that carries text lines.
pub trait Transport {
    type Error;

    /// Waits at most `timeout` for a complete line and returns it without its `\n` terminator.
    ///
    /// Returns `Ok(None)` if no complete line arrived in time. Bytes of an incomplete line are kept
    /// for the next call.
    fn read_line(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Line>, Self::Error>>;

    /// Writes `line` followed by `\r\n`.
    fn write_line(&mut self, line: &str) -> impl Future<Output = Result<(), Self::Error>>;
}

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    Read(E),
    Write(E),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(error) => write!(f, "failed to read from serial: {error:?}"),
            Error::Write(error) => write!(f, "failed to write to serial: {error:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

/// A [`Transport`] over a pair of [`embedded_io_async`] byte streams, e.g. the halves of a UART.
///
/// Lines longer than [`LINE_CAPACITY`] and lines that are not valid UTF-8 are dropped.
pub struct SerialTransport<R, W> {
    rx: R,
    tx: W,
    pending: ArrayVec<u8, LINE_CAPACITY>,
    overflowed: bool,
}

impl<R: Read, W: Write<Error = R::Error>> SerialTransport<R, W> {
    pub fn new(rx: R, tx: W) -> Self {
        Self {
            rx,
            tx,
            pending: ArrayVec::new(),
            overflowed: false,
        }
    }

    /// Reads until a complete line has been received.
    ///
    /// All state lives in `self`, so the future can be dropped between bytes without losing data.
    async fn receive_line(&mut self) -> Result<Line, Error<R::Error>> {
        loop {
            let mut byte = [0];
            if self.rx.read(&mut byte).await.map_err(Error::Read)? == 0 {
                // End of stream: give the timeout a chance to fire before trying again
                yield_now().await;
                continue;
            }
            match byte[0] {
                b'\n' => {
                    if let Some(line) = self.take_line() {
                        return Ok(line);
                    }
                }
                byte => {
                    if self.overflowed {
                        continue;
                    }
                    if self.pending.try_push(byte).is_err() {
                        warn!("Line longer than {} bytes, discarding it", LINE_CAPACITY);
                        self.pending.clear();
                        self.overflowed = true;
                    }
                }
            }
        }
    }

    fn take_line(&mut self) -> Option<Line> {
        if core::mem::take(&mut self.overflowed) {
            return None;
        }
        let line = match core::str::from_utf8(&self.pending) {
            Ok(text) => Line::from(text).ok(),
            Err(_) => {
                warn!("Line is not valid UTF-8, discarding it");
                None
            }
        };
        self.pending.clear();
        line
    }
}

impl<R: Read, W: Write<Error = R::Error>> Transport for SerialTransport<R, W> {
    type Error = Error<R::Error>;

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<Line>, Self::Error> {
        match with_timeout(timeout, self.receive_line()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.tx
            .write_all(line.as_bytes())
            .await
            .map_err(Error::Write)?;
        self.tx.write_all(b"\r\n").await.map_err(Error::Write)?;
        self.tx.flush().await.map_err(Error::Write)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embedded_io_async::ErrorType;
    use std::collections::VecDeque;
    use std::vec::Vec;

    const TIMEOUT: Duration = Duration::from_millis(10);

    /// Hands out the queued bytes and then never completes, like an idle UART.
    #[derive(Default)]
    struct MockRx {
        data: VecDeque<u8>,
    }

    impl MockRx {
        fn push(&mut self, bytes: &[u8]) {
            self.data.extend(bytes);
        }
    }

    impl ErrorType for MockRx {
        type Error = Infallible;
    }

    impl Read for MockRx {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            match self.data.pop_front() {
                Some(byte) => {
                    buf[0] = byte;
                    Ok(1)
                }
                None => core::future::pending().await,
            }
        }
    }

    /// Reports the end of the stream on every read.
    struct EmptyRx;

    impl ErrorType for EmptyRx {
        type Error = Infallible;
    }

    impl Read for EmptyRx {
        async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct MockTx {
        data: Vec<u8>,
    }

    impl ErrorType for MockTx {
        type Error = Infallible;
    }

    impl Write for MockTx {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    fn transport(input: &[u8]) -> SerialTransport<MockRx, MockTx> {
        let mut rx = MockRx::default();
        rx.push(input);
        SerialTransport::new(rx, MockTx::default())
    }

    fn read(transport: &mut SerialTransport<MockRx, MockTx>) -> Option<Line> {
        block_on(transport.read_line(TIMEOUT)).unwrap()
    }

    #[test]
    fn test_reads_lines() {
        let mut transport = transport(b"FA20000\nDA50\r\n");
        assert_eq!(read(&mut transport).unwrap().as_str(), "FA20000");
        assert_eq!(read(&mut transport).unwrap().as_str(), "DA50\r");
        assert_eq!(read(&mut transport), None);
    }

    #[test]
    fn test_empty_line() {
        let mut transport = transport(b"\n");
        assert_eq!(read(&mut transport).unwrap().as_str(), "");
    }

    #[test]
    fn test_incomplete_line_is_kept() {
        let mut transport = transport(b"FB4");
        assert_eq!(read(&mut transport), None);
        transport.rx.push(b"40\n");
        assert_eq!(read(&mut transport).unwrap().as_str(), "FB440");
    }

    #[test]
    fn test_overlong_line_is_discarded() {
        let mut input = Vec::new();
        input.extend(core::iter::repeat_n(b'1', LINE_CAPACITY + 10));
        input.extend_from_slice(b"\nDC5\n");
        let mut transport = transport(&input);
        assert_eq!(read(&mut transport).unwrap().as_str(), "DC5");
    }

    #[test]
    fn test_line_at_capacity() {
        let mut input = Vec::new();
        input.extend(core::iter::repeat_n(b'7', LINE_CAPACITY));
        input.push(b'\n');
        let mut transport = transport(&input);
        assert_eq!(read(&mut transport).unwrap().len(), LINE_CAPACITY);
    }

    #[test]
    fn test_invalid_utf8_is_discarded() {
        let mut transport = transport(b"FA\xff\xfe\nFA1\n");
        assert_eq!(read(&mut transport).unwrap().as_str(), "FA1");
    }

    #[test]
    fn test_end_of_stream_times_out() {
        let mut transport = SerialTransport::new(EmptyRx, MockTx::default());
        assert_eq!(block_on(transport.read_line(TIMEOUT)), Ok(None));
    }

    #[test]
    fn test_write_line() {
        let mut transport = transport(b"");
        block_on(transport.write_line("Unrecognized command.")).unwrap();
        assert_eq!(transport.tx.data, b"Unrecognized command.\r\n");
    }
}
