use std::io;

use comms::{
    msg::{Request, Response},
    OnoReceiver, OnoSender,
};
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
};

use crate::Service;

/// Accepts tutor clients and serves them all from a single `Service`.
pub struct Server {
    service: Service,
}

impl Server {
    /// Creates a new `Server` instance.
    ///
    /// # Arguments
    /// * `service` - The service every connection will be handled by.
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    /// Accepts connections on `listener` forever, spawning a task for each of them.
    ///
    /// # Errors
    /// Returns `io::Error` if accepting a connection fails.
    pub async fn run(&self, listener: TcpListener) -> io::Result<()> {
        loop {
            let (stream, addr) = listener.accept().await?;
            info!("client connected from {addr}");

            let service = self.service.clone();
            tokio::spawn(async move {
                let (rx, tx) = stream.into_split();
                let (rx, tx) = comms::channel(rx, tx);

                match serve(&service, rx, tx).await {
                    Ok(()) => info!("client {addr} disconnected"),
                    Err(e) => warn!("client {addr} dropped: {e}"),
                }
            });
        }
    }
}

/// Answers every request received on `rx` through `tx` until the client sends
/// `Disconnect` or closes the stream.
///
/// Frames that can't be decoded into a `Request` are answered with a `bad_request`
/// error and the connection is kept open.
///
/// # Arguments
/// * `service` - The service handling the requests.
/// * `rx` - The receiving end of the connection.
/// * `tx` - The sending end of the connection.
///
/// # Errors
/// Returns `io::Error` if the connection breaks mid-frame or a response can't be sent.
pub async fn serve<R, W>(
    service: &Service,
    mut rx: OnoReceiver<R>,
    mut tx: OnoSender<W>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let req = match rx.recv::<Request>().await {
            Ok(req) => req,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("stream closed by the client");
                return Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("undecodable request: {e}");
                tx.send(&Response::bad_request(e)).await?;
                continue;
            }
            Err(e) => return Err(e),
        };

        if req == Request::Disconnect {
            tx.send(&Response::Disconnected).await?;
            return Ok(());
        }

        let resp = service.handle(req);
        tx.send(&resp).await?;
    }
}
