//! Backend transport abstraction layer.
//! Messages are JSON documents, one per line, sent over a single TCP stream.

use crate::debugger::Error;
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

/// Read half of the backend connection.
pub trait MessageReader: Send {
    /// Read a single message, `None` if connection is closed by backend.
    fn read_message(&mut self) -> Result<Option<Value>, Error>;
}

/// Write half of the backend connection.
pub trait MessageWriter: Send {
    /// Write a single message.
    fn write_message(&mut self, message: &Value) -> Result<(), Error>;

    /// Close connection, pending reads must be interrupted.
    fn close(&mut self) {}
}

/// Line-delimited JSON reader.
pub struct JsonLineReader<R: BufRead + Send> {
    reader: R,
}

impl<R: BufRead + Send> JsonLineReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send> MessageReader for JsonLineReader<R> {
    fn read_message(&mut self) -> Result<Option<Value>, Error> {
        loop {
            let mut line = String::new();
            let read_n = self.reader.read_line(&mut line)?;
            if read_n == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_str(line)?));
        }
    }
}

/// Line-delimited JSON writer over a TCP stream.
pub struct TcpWriter {
    stream: TcpStream,
}

impl MessageWriter for TcpWriter {
    fn write_message(&mut self, message: &Value) -> Result<(), Error> {
        let mut payload = serde_json::to_vec(message)?;
        payload.push(b'\n');
        self.stream.write_all(&payload)?;
        self.stream.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// Open a TCP connection to the backend and split it into read and write halves.
pub fn tcp(addr: impl ToSocketAddrs) -> Result<(JsonLineReader<BufReader<TcpStream>>, TcpWriter), Error> {
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    let reader = JsonLineReader::new(BufReader::new(stream.try_clone()?));
    Ok((reader, TcpWriter { stream }))
}
