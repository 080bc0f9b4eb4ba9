//! Listener for the API socket.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

use rustls::ServerConfig;
use tracing::{debug, info, warn};

use wgapi_config::ListenEndpoint;

use super::{ConnectionHandler, ConnectionStream, ListenerError, TRANSPORT_TARGET, tls};

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
/// Per-connection read timeout; slow clients are dropped.
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Listener bound to the configured endpoint.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: ListenEndpoint,
    listener: ListenerKind,
    tls: Option<Arc<ServerConfig>>,
}

#[derive(Debug)]
enum ListenerKind {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

/// A freshly accepted connection, before any TLS handshake.
enum Accepted {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &ListenEndpoint) -> Result<Self, ListenerError> {
        match endpoint {
            ListenEndpoint::Tcp { host, port } => {
                let listener = bind_tcp(host, *port)?;
                Ok(Self {
                    endpoint: endpoint.clone(),
                    listener: ListenerKind::Tcp(listener),
                    tls: None,
                })
            }
            ListenEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    let listener = bind_unix(path.as_std_path())?;
                    Ok(Self {
                        endpoint: endpoint.clone(),
                        listener: ListenerKind::Unix(listener),
                        tls: None,
                    })
                }

                #[cfg(not(unix))]
                {
                    let _ = path;
                    Err(ListenerError::UnsupportedUnix {
                        endpoint: endpoint.to_string(),
                    })
                }
            }
        }
    }

    /// Terminates TLS on accepted connections. Only TCP listeners qualify.
    pub(crate) fn with_tls(mut self, config: Arc<ServerConfig>) -> Result<Self, ListenerError> {
        match self.listener {
            ListenerKind::Tcp(_) => {
                self.tls = Some(config);
                Ok(self)
            }
            #[cfg(unix)]
            ListenerKind::Unix(_) => {
                let endpoint = self.endpoint.to_string();
                cleanup_unix_socket(&self.endpoint);
                Err(ListenerError::TlsOverUnix { endpoint })
            }
        }
    }

    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            ListenerKind::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            ListenerKind::Unix(_) => None,
        }
    }

    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        if let Err(error) = match &self.listener {
            ListenerKind::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.set_nonblocking(true),
        } {
            #[cfg(unix)]
            cleanup_unix_socket(&self.endpoint);
            return Err(ListenerError::NonBlocking { source: error });
        }
        let shutdown_flag = Arc::clone(&shutdown);
        let active = Arc::new(AtomicUsize::new(0));
        let active_count = Arc::clone(&active);
        let handle = thread::spawn(move || {
            run_accept_loop(&self, &shutdown_flag, &active_count, &handler);
        });
        Ok(ListenerHandle {
            shutdown,
            active,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits up to `timeout` for in-flight connections to finish and returns
    /// how many were still running.
    pub(crate) fn drain(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            let active = self.active.load(Ordering::SeqCst);
            if active == 0 || Instant::now() >= deadline {
                return active;
            }
            thread::sleep(ACCEPT_BACKOFF);
        }
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    active: &Arc<AtomicUsize>,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(
        target: TRANSPORT_TARGET,
        endpoint = %listener.endpoint,
        tls = listener.tls.is_some(),
        "api listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_connection(listener) {
            Ok(Some(accepted)) => {
                last_error = None;
                let handler = Arc::clone(handler);
                let tls = listener.tls.clone();
                let guard = ActiveConnection::enter(active);
                thread::spawn(move || {
                    serve(accepted, tls, handler.as_ref());
                    drop(guard);
                });
            }
            Ok(None) => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: TRANSPORT_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    #[cfg(unix)]
    cleanup_unix_socket(&listener.endpoint);
    info!(target: TRANSPORT_TARGET, "api listener stopped");
}

/// Counts a connection as in flight until dropped.
struct ActiveConnection(Arc<AtomicUsize>);

impl ActiveConnection {
    fn enter(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs on the connection thread so a slow handshake never blocks accepts.
fn serve(accepted: Accepted, tls: Option<Arc<ServerConfig>>, handler: &dyn ConnectionHandler) {
    let stream = match (accepted, tls) {
        (Accepted::Tcp(socket), Some(config)) => {
            let peer = socket
                .peer_addr()
                .map_or_else(|_| String::from("unknown"), |addr| addr.to_string());
            match tls::accept(config, socket) {
                Ok(stream) => stream,
                Err(error) => {
                    debug!(
                        target: TRANSPORT_TARGET,
                        error = %error,
                        remote_addr = %peer,
                        "TLS handshake failed"
                    );
                    return;
                }
            }
        }
        (Accepted::Tcp(socket), None) => ConnectionStream::Tcp(socket),
        #[cfg(unix)]
        (Accepted::Unix(socket), _) => ConnectionStream::Unix(socket),
    };
    handler.handle(stream);
}

fn accept_connection(listener: &SocketListener) -> Result<Option<Accepted>, io::Error> {
    match &listener.listener {
        ListenerKind::Tcp(tcp) => match tcp.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                stream.set_read_timeout(Some(READ_TIMEOUT))?;
                Ok(Some(Accepted::Tcp(stream)))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
        #[cfg(unix)]
        ListenerKind::Unix(unix) => match unix.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                stream.set_read_timeout(Some(READ_TIMEOUT))?;
                Ok(Some(Accepted::Unix(stream)))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        let metadata =
            fs::symlink_metadata(path).map_err(|source| ListenerError::UnixMetadata {
                path: path.display().to_string(),
                source,
            })?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::UnixNotSocket {
                path: path.display().to_string(),
            });
        }
        match UnixStream::connect(path) {
            Ok(_stream) => {
                return Err(ListenerError::UnixInUse {
                    path: path.display().to_string(),
                });
            }
            Err(error)
                if error.kind() == io::ErrorKind::ConnectionRefused
                    || error.kind() == io::ErrorKind::NotFound =>
            {
                fs::remove_file(path).map_err(|source| ListenerError::UnixCleanup {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            Err(error) => {
                return Err(ListenerError::UnixConnect {
                    path: path.display().to_string(),
                    source: error,
                });
            }
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(unix)]
fn cleanup_unix_socket(endpoint: &ListenEndpoint) {
    let ListenEndpoint::Unix { path } = endpoint else {
        return;
    };
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: TRANSPORT_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
