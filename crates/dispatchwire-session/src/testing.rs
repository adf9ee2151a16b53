//! Loopback stand-in for the dispatcher, for unit tests.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::SessionConfig;

/// What the fake does with one received command.
pub(crate) enum Reply {
    Send(Vec<u8>),
    Silent,
    Hangup,
}

pub(crate) struct FakeDispatcher {
    addr: String,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeDispatcher {
    /// Serve one connection.
    pub(crate) fn spawn<F>(respond: F) -> Self
    where
        F: FnMut(&[u8]) -> Reply + Send + 'static,
    {
        Self::serve(1, respond)
    }

    /// Serve `connections` connections one after another.
    pub(crate) fn serve<F>(connections: usize, mut respond: F) -> Self
    where
        F: FnMut(&[u8]) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("fake dispatcher should bind");
        let addr = listener.local_addr().expect("local addr").to_string();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        let handle = thread::spawn(move || {
            for _ in 0..connections {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut buf = vec![0u8; 64 * 1024];
                loop {
                    let n = match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    log.lock().expect("log lock").push(buf[..n].to_vec());
                    match respond(&buf[..n]) {
                        Reply::Send(bytes) => {
                            if stream.write_all(&bytes).is_err() {
                                break;
                            }
                        }
                        Reply::Silent => {}
                        Reply::Hangup => break,
                    }
                }
            }
        });

        Self {
            addr,
            received,
            handle: Some(handle),
        }
    }

    /// Echo every command back as its own acknowledgement.
    pub(crate) fn echo() -> Self {
        Self::spawn(|frame| Reply::Send(frame.to_vec()))
    }

    pub(crate) fn addr(&self) -> &str {
        &self.addr
    }

    /// Session settings pointed at this fake with short delays.
    pub(crate) fn config(&self) -> SessionConfig {
        SessionConfig {
            receive_timeout: Duration::from_millis(200),
            settle_delay: Duration::from_millis(1),
            ..SessionConfig::with_address(self.addr())
        }
    }

    /// Every read the fake has seen so far.
    pub(crate) fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().expect("log lock").clone()
    }

    /// Wait for the serving thread to finish.
    pub(crate) fn join(mut self) -> Vec<Vec<u8>> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("fake dispatcher thread should finish");
        }
        self.received()
    }
}

/// An address nothing listens on.
pub(crate) fn refused_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    drop(listener);
    addr
}
