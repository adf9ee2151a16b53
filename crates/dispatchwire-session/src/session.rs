use std::fmt;
use std::io::ErrorKind;
use std::thread;

use bytes::Bytes;
use dispatchwire_frame::{
    make_packet, make_preamble, AckReader, CommandCounter, FrameError, FrameWriter,
    PREAMBLE_SIZE,
};
use dispatchwire_transport::{connect_timeout, DispatcherStream};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

/// Connection state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

struct Connection {
    writer: FrameWriter<DispatcherStream>,
    reader: AckReader<DispatcherStream>,
}

impl Connection {
    fn open(config: &SessionConfig) -> Result<Self> {
        let stream = connect_timeout(&config.address, config.connect_timeout)?;
        let reader_stream = stream.try_clone()?;

        let frame_config = config.frame_config();
        let reader = AckReader::with_config_stream(reader_stream, frame_config.clone())?;
        let writer = FrameWriter::with_config_stream(stream, frame_config)?;
        Ok(Self { writer, reader })
    }

    fn close(self) {
        self.writer.get_ref().shutdown();
    }
}

/// One conversation with the dispatcher: the command counter plus at most
/// one open connection.
///
/// The counter survives disconnects, so frames sent after a resubscription
/// keep numbering where the last ones stopped. Any failed exchange drops the
/// connection; there is no automatic reconnect.
pub struct Session {
    config: SessionConfig,
    counter: CommandCounter,
    connection: Option<Connection>,
}

impl Session {
    /// A disconnected session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            counter: CommandCounter::new(),
            connection: None,
        }
    }

    /// Configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a connection to the configured dispatcher, replacing any
    /// existing one.
    ///
    /// On failure the session stays disconnected; call again to retry.
    pub fn subscribe(&mut self) -> Result<()> {
        self.close_connection();
        match Connection::open(&self.config) {
            Ok(connection) => {
                info!(addr = %self.config.address, "subscribed to dispatcher");
                self.connection = Some(connection);
                Ok(())
            }
            Err(err) => {
                warn!(addr = %self.config.address, error = %err, "subscription failed");
                Err(err)
            }
        }
    }

    /// Close the connection. The counter is kept.
    pub fn unsubscribe(&mut self) {
        if self.connection.is_some() {
            info!(addr = %self.config.address, "unsubscribed from dispatcher");
        }
        self.close_connection();
    }

    /// Whether a connection is currently open.
    pub fn state(&self) -> SessionState {
        if self.connection.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Shorthand for `state() == SessionState::Connected`.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Counter value carried by the most recent frame (0 before the first).
    pub fn counter(&self) -> u16 {
        self.counter.current()
    }

    /// Preamble for a command of `command_length` bytes. Advances the counter.
    pub fn make_preamble(&mut self, command_length: usize) -> Result<[u8; PREAMBLE_SIZE]> {
        Ok(make_preamble(&mut self.counter, command_length)?)
    }

    /// Complete frame for identity `id` and `body`. Advances the counter.
    pub fn make_packet(&mut self, id: u8, body: &[u8]) -> Result<Bytes> {
        Ok(make_packet(&mut self.counter, id, body)?)
    }

    /// Write `frame`, wait the settle delay, then take whatever the
    /// dispatcher sent back in one read.
    ///
    /// Nothing ties the acknowledgement to this frame's counter. Any failure
    /// drops the connection.
    pub fn send(&mut self, frame: &[u8]) -> Result<Bytes> {
        let settle = self.config.settle_delay;
        let Some(connection) = self.connection.as_mut() else {
            return Err(SessionError::NotConnected);
        };

        let outcome = match connection.writer.send(frame) {
            Ok(()) => {
                thread::sleep(settle);
                connection.reader.read_ack()
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(ack) => {
                debug!(len = frame.len(), ack_len = ack.len(), "acknowledgement received");
                Ok(ack)
            }
            Err(err) => {
                let err = self.classify(err);
                warn!(addr = %self.config.address, error = %err, "dropping dispatcher connection");
                self.close_connection();
                Err(err)
            }
        }
    }

    /// Frame `body` under identity `id` and send it.
    ///
    /// The counter is only advanced when a connection is open.
    pub fn exchange(&mut self, id: u8, body: &[u8]) -> Result<Bytes> {
        if self.connection.is_none() {
            return Err(SessionError::NotConnected);
        }
        let frame = self.make_packet(id, body)?;
        debug!(
            counter = self.counter.current(),
            identity = id,
            len = frame.len(),
            "sending command"
        );
        self.send(&frame)
    }

    /// Map an exchange failure to the error handed to the caller. Every I/O
    /// failure leaves the session disconnected and says so.
    fn classify(&self, err: FrameError) -> SessionError {
        match err {
            FrameError::Io(io)
                if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                SessionError::NoAcknowledgement {
                    timeout: self.config.receive_timeout,
                }
            }
            FrameError::Io(io) => SessionError::Disconnected(io.to_string()),
            FrameError::ConnectionClosed => {
                SessionError::Disconnected("connection closed by dispatcher".to_string())
            }
            other => SessionError::Frame(other),
        }
    }

    fn close_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close_connection();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.config.address)
            .field("counter", &self.counter.current())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dispatchwire_frame::{parse_buffer, CUSTOM_TC};

    use super::*;
    use crate::testing::{refused_addr, FakeDispatcher, Reply};

    #[test]
    fn starts_disconnected() {
        let session = Session::new(SessionConfig::default());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.counter(), 0);
    }

    #[test]
    fn send_without_connection() {
        let mut session = Session::new(SessionConfig::default());
        assert!(matches!(
            session.send(&[0x55]),
            Err(SessionError::NotConnected)
        ));
        assert!(matches!(
            session.exchange(CUSTOM_TC, &[0, 1]),
            Err(SessionError::NotConnected)
        ));
        assert_eq!(session.counter(), 0);
    }

    #[test]
    fn failed_subscription_stays_disconnected() {
        let mut session = Session::new(SessionConfig::with_address(refused_addr()));
        let err = session.subscribe().unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert!(err.is_disconnect());
        assert!(!session.is_connected());
    }

    #[test]
    fn exchange_returns_acknowledgement() {
        let fake = FakeDispatcher::echo();
        let mut session = Session::new(fake.config());
        session.subscribe().unwrap();

        let ack = session.exchange(CUSTOM_TC, &[0x00, 0x07, 0xAB]).unwrap();
        let parsed = parse_buffer(ack);
        assert!(parsed.is_clean());
        assert_eq!(parsed.packets[0].counter, 1);
        assert_eq!(parsed.packets[0].sub_id, Some(0x0007));
        assert_eq!(session.counter(), 1);

        let ack = session.exchange(CUSTOM_TC, &[0x00, 0x08]).unwrap();
        assert_eq!(parse_buffer(ack).packets[0].counter, 2);

        drop(session);
        let received = fake.join();
        assert_eq!(received.len(), 2);
    }

    #[test]
    fn receive_timeout_disconnects() {
        let fake = FakeDispatcher::spawn(|_| Reply::Silent);
        let mut config = fake.config();
        config.receive_timeout = Duration::from_millis(50);
        let mut session = Session::new(config);
        session.subscribe().unwrap();

        let err = session.exchange(CUSTOM_TC, &[0x00, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            SessionError::NoAcknowledgement { timeout } if timeout == Duration::from_millis(50)
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.counter(), 1);
        assert!(matches!(
            session.exchange(CUSTOM_TC, &[0x00, 0x01]),
            Err(SessionError::NotConnected)
        ));
        fake.join();
    }

    #[test]
    fn hangup_disconnects() {
        let fake = FakeDispatcher::spawn(|_| Reply::Hangup);
        let mut session = Session::new(fake.config());
        session.subscribe().unwrap();

        let err = session.exchange(CUSTOM_TC, &[0x00, 0x01]).unwrap_err();
        assert!(matches!(err, SessionError::Disconnected(_)), "{err:?}");
        assert!(!session.is_connected());
        fake.join();
    }

    #[test]
    fn io_failures_classify_as_disconnects() {
        let session = Session::new(SessionConfig::default());
        for kind in [
            ErrorKind::NotConnected,
            ErrorKind::HostUnreachable,
            ErrorKind::NetworkUnreachable,
            ErrorKind::ConnectionReset,
            ErrorKind::BrokenPipe,
            ErrorKind::Other,
        ] {
            let err = session.classify(FrameError::Io(std::io::Error::from(kind)));
            assert!(matches!(err, SessionError::Disconnected(_)), "{kind:?}: {err:?}");
            assert!(err.is_disconnect(), "{kind:?}");
        }

        let closed = session.classify(FrameError::ConnectionClosed);
        assert!(closed.is_disconnect());

        for kind in [ErrorKind::WouldBlock, ErrorKind::TimedOut] {
            let err = session.classify(FrameError::Io(std::io::Error::from(kind)));
            assert!(matches!(err, SessionError::NoAcknowledgement { .. }));
            assert!(err.is_disconnect());
        }
    }

    #[test]
    fn counter_survives_resubscription() {
        let fake = FakeDispatcher::serve(2, |frame| Reply::Send(frame.to_vec()));
        let mut session = Session::new(fake.config());

        session.subscribe().unwrap();
        session.exchange(CUSTOM_TC, &[0x00, 0x01]).unwrap();
        session.unsubscribe();
        assert!(!session.is_connected());

        session.subscribe().unwrap();
        let ack = session.exchange(CUSTOM_TC, &[0x00, 0x01]).unwrap();
        assert_eq!(parse_buffer(ack).packets[0].counter, 2);

        drop(session);
        assert_eq!(fake.join().len(), 2);
    }

    #[test]
    fn preamble_advances_counter() {
        let mut session = Session::new(SessionConfig::default());
        let preamble = session.make_preamble(5).unwrap();
        assert_eq!(&preamble[1..3], &[0x00, 0x01]);
        let frame = session.make_packet(CUSTOM_TC, &[0, 1]).unwrap();
        assert_eq!(&frame[1..3], &[0x00, 0x02]);
    }

    #[test]
    fn debug_shows_state() {
        let session = Session::new(SessionConfig::default());
        let text = format!("{session:?}");
        assert!(text.contains("Disconnected"));
        assert!(text.contains("127.0.0.1:3002"));
    }
}
