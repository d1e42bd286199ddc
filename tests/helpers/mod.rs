#![allow(dead_code)]

use httpdns_server::{Config, Header, QueryType, Question, Request, Resolve, Response, Server};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn query(id: u16, names: &[&str]) -> Vec<u8> {
    Request {
        header: Header::new(id, 0x0100),
        questions: names
            .iter()
            .map(|name| Question::new(name, QueryType::A))
            .collect(),
    }
    .encode()
    .unwrap()
}

/// Default config bound to an ephemeral loopback port.
pub fn loopback_config() -> Config {
    let mut config = Config::default();
    config.server.bind_addresses = vec!["127.0.0.1".to_string()];
    config.server.port = 0;

    config
}

pub async fn start_server<R: Resolve + 'static>(resolver: R) -> SocketAddr {
    start_server_with(loopback_config(), resolver).await
}

/// Binds a server with `config` and runs it in the background.
pub async fn start_server_with<R: Resolve + 'static>(config: Config, resolver: R) -> SocketAddr {
    let server = Server::bind(&config, resolver).await.unwrap();
    let addr = server.local_addrs()[0];
    tokio::spawn(server.run());

    addr
}

pub async fn client() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

pub async fn exchange(socket: &UdpSocket, server: SocketAddr, packet: &[u8]) -> Response {
    socket.send_to(packet, server).await.unwrap();
    receive(socket).await
}

pub async fn receive(socket: &UdpSocket) -> Response {
    let mut buf = [0u8; 4096];
    let (len, _) = tokio::time::timeout(REPLY_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("no reply from server")
        .unwrap();

    Response::decode(&buf[..len]).unwrap()
}

/// Serves fixed bodies keyed by request path over plain HTTP/1.1.
pub async fn start_lookup_endpoint(bodies: HashMap<String, (u16, String)>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            let bodies = bodies.clone();

            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];

                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (status, body) = bodies
                    .get(&path)
                    .cloned()
                    .unwrap_or((404, String::new()));
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );

                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}
