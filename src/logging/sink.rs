//! Destinations for formatted log lines
//!
//! The set of sinks is closed: a [`Sink`] is either the console or a
//! background [`FileSink`]. Both accept lines through [`LogSink`].

use std::io::{self, Write};

use super::file_sink::FileSink;

/// Something that accepts pre-formatted log lines
///
/// `submit` never fails and never reports back. A sink that can't deliver a
/// line deals with it itself.
pub trait LogSink {
    fn submit(&self, line: &str);
}

/// Which standard stream a [`ConsoleSink`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStream {
    #[default]
    Stdout,
    Stderr,
}

/// Synchronous sink that writes each line straight to the console
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    stream: ConsoleStream,
}

impl ConsoleSink {
    pub fn new(stream: ConsoleStream) -> Self {
        Self { stream }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl LogSink for ConsoleSink {
    fn submit(&self, line: &str) {
        // A closed pipe shouldn't take the host down with it
        let _ = match self.stream {
            ConsoleStream::Stdout => writeln!(io::stdout().lock(), "{}", line),
            ConsoleStream::Stderr => writeln!(io::stderr().lock(), "{}", line),
        };
    }
}

/// A registered sink
#[derive(Debug)]
pub enum Sink {
    Console(ConsoleSink),
    File(FileSink),
}

impl Sink {
    /// Flush the console, or stop and join the file worker
    pub fn shutdown(&self) {
        match self {
            Sink::Console(console) => {
                let _ = match console.stream() {
                    ConsoleStream::Stdout => io::stdout().flush(),
                    ConsoleStream::Stderr => io::stderr().flush(),
                };
            }
            Sink::File(file) => file.shutdown(),
        }
    }

    /// The file sink, if this is one
    pub fn as_file(&self) -> Option<&FileSink> {
        match self {
            Sink::File(file) => Some(file),
            Sink::Console(_) => None,
        }
    }
}

impl LogSink for Sink {
    fn submit(&self, line: &str) {
        match self {
            Sink::Console(console) => console.submit(line),
            Sink::File(file) => file.submit_line(line),
        }
    }
}

impl From<ConsoleSink> for Sink {
    fn from(sink: ConsoleSink) -> Self {
        Sink::Console(sink)
    }
}

impl From<FileSink> for Sink {
    fn from(sink: FileSink) -> Self {
        Sink::File(sink)
    }
}
