use crate::config::Config;
use crate::dns::{Request, Response};
use crate::error::{Error, Result};
use crate::resolver::{resolve_all, Resolve};
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Receive buffer per listener; longer datagrams are truncated by the kernel.
const MAX_DATAGRAM_SIZE: usize = 4096;

/// UDP front end: one listener per bound socket, one task per datagram.
pub struct Server<R> {
    sockets: Vec<Arc<UdpSocket>>,
    resolver: Arc<R>,
    ttl: u32,
    in_flight: Option<Arc<Semaphore>>,
}

impl<R> Server<R>
where
    R: Resolve + 'static,
{
    pub async fn bind(config: &Config, resolver: R) -> Result<Self> {
        let mut sockets = Vec::new();

        for addr in config.listen_addrs()? {
            let socket = UdpSocket::bind(addr).await?;
            info!("listening on udp://{}", socket.local_addr()?);
            sockets.push(Arc::new(socket));
        }

        let in_flight = match config.server.max_in_flight {
            0 => None,
            limit => Some(Arc::new(Semaphore::new(limit.min(Semaphore::MAX_PERMITS)))),
        };

        Ok(Self {
            sockets,
            resolver: Arc::new(resolver),
            ttl: config.dns.ttl,
            in_flight,
        })
    }

    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.sockets
            .iter()
            .filter_map(|socket| socket.local_addr().ok())
            .collect()
    }

    /// Serves until every socket has failed.
    pub async fn run(self) {
        let mut listeners = JoinSet::new();

        for socket in self.sockets {
            listeners.spawn(listen(
                socket,
                self.resolver.clone(),
                self.ttl,
                self.in_flight.clone(),
            ));
        }

        while let Some(result) = listeners.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("listener closed: {}", e),
                Err(e) => error!("listener task aborted: {}", e),
            }

            if !listeners.is_empty() {
                info!("{} listener(s) still running", listeners.len());
            }
        }

        info!("no listeners left, server stopped");
    }
}

async fn listen<R>(
    socket: Arc<UdpSocket>,
    resolver: Arc<R>,
    ttl: u32,
    in_flight: Option<Arc<Semaphore>>,
) -> Result<()>
where
    R: Resolve + 'static,
{
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        socket.readable().await?;

        loop {
            let permit = match &in_flight {
                Some(limit) => limit.clone().acquire_owned().await.ok(),
                None => None,
            };

            match socket.try_recv_from(&mut buf) {
                Ok((0, client)) => {
                    debug!("ignoring empty datagram from {}", client);
                }
                Ok((len, client)) => {
                    let datagram = buf[..len].to_vec();
                    let socket = socket.clone();
                    let resolver = resolver.clone();

                    tokio::spawn(async move {
                        let _permit = permit;

                        if let Err(e) = respond(&socket, &datagram, client, resolver.as_ref(), ttl).await {
                            warn!("dropping query from {}: {}", client, e);
                        }
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::ConnectionReset
                    ) =>
                {
                    continue
                }
                Err(e) => return Err(Error::Channel(e)),
            }
        }
    }
}

async fn respond<R>(
    socket: &UdpSocket,
    datagram: &[u8],
    client: SocketAddr,
    resolver: &R,
    ttl: u32,
) -> Result<()>
where
    R: Resolve + ?Sized,
{
    let response = handle_datagram(datagram, resolver, ttl).await?;
    socket.send_to(&response, client).await?;

    Ok(())
}

/// Decodes a query, resolves its names and returns the encoded response.
pub async fn handle_datagram<R>(datagram: &[u8], resolver: &R, ttl: u32) -> Result<Vec<u8>>
where
    R: Resolve + ?Sized,
{
    let request = Request::decode(datagram)?;
    debug!("request: {:?}", request);

    let resolutions = resolve_all(resolver, &request.questions).await;
    let response = Response::build(&request, &resolutions, ttl)?;
    debug!("response: {:?}", response);

    Ok(response.encode()?)
}
