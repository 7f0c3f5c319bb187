mod assets;
mod codec;
mod context;
mod controller;
mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use hyper::rt::{Read, Write};
use hyper::server::conn::http1 as http;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use rustls_pemfile::{certs, private_key};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;

use viel_index::ArcIndexProvider;

use crate::config::WebConfig;
use crate::http::assets::Assets;
use crate::http::controller::Controller;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// What every request handler shares
pub(crate) struct State {
    pub(crate) index: ArcIndexProvider,
    pub(crate) assets: Assets,
}

pub struct Server {
    bind_addr: SocketAddr,
    state: Arc<State>,
    tls: Option<TlsAcceptor>,
}

pub fn new(config: WebConfig, index: ArcIndexProvider) -> Result<Server> {
    let tls = match (config.certs.as_ref(), config.key.as_ref()) {
        (Some(certs_path), Some(key_path)) => Some(tls_acceptor(certs_path, key_path)?),
        (None, None) => None,
        _ => anyhow::bail!("TLS needs both a certificate chain and a private key"),
    };

    Ok(Server {
        bind_addr: config.bind_addr,
        state: Arc::new(State {
            index,
            assets: Assets::new(config.static_dir),
        }),
        tls,
    })
}

fn tls_acceptor(certs_path: &std::path::Path, key_path: &std::path::Path) -> Result<TlsAcceptor> {
    let loaded_certs = certs(&mut std::io::BufReader::new(
        std::fs::File::open(certs_path)
            .with_context(|| format!("unable to open {}", certs_path.display()))?,
    ))
    .collect::<Result<Vec<_>, _>>()?;
    let loaded_key = private_key(&mut std::io::BufReader::new(
        std::fs::File::open(key_path)
            .with_context(|| format!("unable to open {}", key_path.display()))?,
    ))?
    .with_context(|| format!("no private key in {}", key_path.display()))?;

    let tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(loaded_certs, loaded_key)?;
    Ok(TlsAcceptor::from(Arc::new(tls_config)))
}

trait Stream: Read + Write + Send + Unpin {}
impl<T: Unpin + AsyncRead + AsyncWrite + Send> Stream for TokioIo<T> {}

impl Server {
    pub async fn run(self: Self, mut must_exit: watch::Receiver<bool>) -> Result<()> {
        let tcp = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("unable to bind {}", self.bind_addr))?;
        tracing::info!(
            tls = self.tls.is_some(),
            "HTTP server listening on {:#}",
            self.bind_addr
        );

        let mut connections = FuturesUnordered::new();
        while !*must_exit.borrow() {
            let wait_conn_finished = async {
                if connections.is_empty() {
                    futures::future::pending().await
                } else {
                    connections.next().await
                }
            };
            let (socket, remote_addr) = tokio::select! {
                a = tcp.accept() => a?,
                _ = wait_conn_finished => continue,
                _ = must_exit.changed() => continue,
            };
            tracing::debug!("Accepted connection from {}", remote_addr);

            let state = self.state.clone();
            let tls = self.tls.clone();
            let conn = tokio::spawn(async move {
                // the handshake runs in the connection task, a slow client
                // must not hold the accept loop
                let stream = match build_stream(tls, socket).await {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(err=?e, %remote_addr, "TLS acceptor failed");
                        return;
                    }
                };
                match http::Builder::new()
                    .serve_connection(
                        stream,
                        service_fn(|req: Request<hyper::body::Incoming>| {
                            let state = state.clone();
                            tracing::info!(method = %req.method(), uri = %req.uri(), "request");
                            async move {
                                match middleware::secure(req, |req| {
                                    let state = state.clone();
                                    async move {
                                        Controller::route(&state, req.method(), req.uri()).await
                                    }
                                    .boxed()
                                })
                                .await
                                {
                                    Ok(v) => Ok(v),
                                    Err(e) => {
                                        tracing::error!(err=?e, "internal error");
                                        Response::builder()
                                            .status(500)
                                            .body(codec::text_body("Internal error"))
                                            .map(middleware::with_headers)
                                    }
                                }
                            }
                        }),
                    )
                    .await
                {
                    Err(e) => tracing::warn!(err=?e, "connection failed"),
                    Ok(()) => tracing::trace!("connection terminated with success"),
                }
            });
            connections.push(conn);
        }
        drop(tcp);

        tracing::info!("Server shutting down, draining remaining connections...");
        while connections.next().await.is_some() {}

        Ok(())
    }
}

async fn build_stream(tls: Option<TlsAcceptor>, socket: TcpStream) -> Result<Box<dyn Stream>> {
    match tls {
        Some(acceptor) => {
            let stream = tokio::time::timeout(HANDSHAKE_TIMEOUT, acceptor.accept(socket))
                .await
                .context("TLS handshake timed out")??;
            Ok(Box::new(TokioIo::new(stream)))
        }
        None => Ok(Box::new(TokioIo::new(socket))),
    }
}
