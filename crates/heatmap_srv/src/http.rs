use crate::*;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::*;
use futures::{SinkExt, StreamExt};

/// How many events may queue for the pin worker before
/// connections start waiting on it.
const EVENT_QUEUE_DEPTH: usize = 1024;

pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    pub fn error(status: u16, err: impl std::fmt::Display) -> Self {
        Self::json(
            status,
            serde_json::json!({ "error": err.to_string() })
                .to_string()
                .into_bytes(),
        )
    }

    fn respond(self) -> response::Response {
        response::Response::builder()
            .status(self.status)
            .header("Content-Type", self.content_type)
            .body(body::Body::from(self.body))
            .unwrap_or_else(|_| {
                response::IntoResponse::into_response(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                )
            })
    }
}

pub type HttpRespondCb = Box<dyn FnOnce(HttpResponse) + 'static + Send>;

pub enum HttpRequest {
    HealthGet,
    ResetPost { body: bytes::Bytes },
    ExportGet { format: ExportFormat },
}

/// Everything the pin worker reacts to, in arrival order.
pub enum Event {
    Connect { conn: Id, outbound: Outbound },
    Disconnect { conn: Id },
    Client { conn: Id, msg: ClientMsg },
    Http(HttpRequest, HttpRespondCb),
}

type ESend = async_channel::Sender<Event>;
type ERecv = async_channel::Receiver<Event>;

pub struct EventReceiver(ERecv);

impl EventReceiver {
    pub fn recv(&self) -> Option<Event> {
        match self.0.recv_blocking() {
            Ok(r) => Some(r),
            Err(_) => None,
        }
    }
}

pub struct ServerConfig {
    pub addrs: Vec<std::net::SocketAddr>,
    pub static_dir: Option<std::path::PathBuf>,
    pub request_timeout: std::time::Duration,
}

impl From<&Config> for ServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            addrs: config.listen_address_list.clone(),
            static_dir: config.static_dir.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

pub struct Server {
    t_join: Option<std::thread::JoinHandle<()>>,
    addrs: Vec<std::net::SocketAddr>,
    receiver: Option<EventReceiver>,
    e_send: ESend,
    shutdown: Option<axum_server::Handle>,
}

impl Drop for Server {
    fn drop(&mut self) {
        self.e_send.close();
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.shutdown();
        }
        if let Some(t_join) = self.t_join.take() {
            let _ = t_join.join();
        }
    }
}

impl Server {
    pub fn new(server_config: ServerConfig) -> std::io::Result<Self> {
        let (s_ready, r_ready) = tokio::sync::oneshot::channel();
        let t_join =
            std::thread::spawn(move || tokio_thread(server_config, s_ready));
        match r_ready.blocking_recv() {
            Ok(Ok(Ready {
                e_send,
                addrs,
                receiver,
                shutdown,
            })) => Ok(Self {
                t_join: Some(t_join),
                addrs,
                receiver: Some(receiver),
                e_send,
                shutdown: Some(shutdown),
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(std::io::Error::other("failed to bind server")),
        }
    }

    pub fn server_addrs(&self) -> &[std::net::SocketAddr] {
        self.addrs.as_slice()
    }

    /// There is exactly one event consumer, so this can only be
    /// taken once.
    pub fn take_receiver(&mut self) -> Option<EventReceiver> {
        self.receiver.take()
    }
}

struct Ready {
    e_send: ESend,
    addrs: Vec<std::net::SocketAddr>,
    receiver: EventReceiver,
    shutdown: axum_server::Handle,
}

#[derive(Clone)]
pub struct AppState {
    pub e_send: ESend,
    pub request_timeout: std::time::Duration,
}

type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

fn tokio_thread(
    server_config: ServerConfig,
    ready: tokio::sync::oneshot::Sender<std::io::Result<Ready>>,
) {
    tracing::trace!(addrs = ?server_config.addrs, "Starting tokio thread");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    rt.block_on(async move {
        let (e_send, e_recv) = async_channel::bounded(EVENT_QUEUE_DEPTH);

        let app = Router::<AppState>::new()
            .route("/health", routing::get(handle_health_get))
            .route("/ws", routing::get(handle_ws))
            .route("/reset", routing::post(handle_reset_post))
            .route("/pins.geojson", export_route(ExportFormat::GeoJson))
            .route("/pins.csv", export_route(ExportFormat::Csv))
            .route("/pins.kml", export_route(ExportFormat::Kml))
            .route("/pins.gpx", export_route(ExportFormat::Gpx));

        let app = match &server_config.static_dir {
            None => app,
            Some(dir) => {
                tracing::info!(?dir, "Serving static files");
                app.fallback_service(tower_http::services::ServeDir::new(dir))
            }
        };

        let app: Router = app
            .layer(extract::DefaultBodyLimit::max(1024))
            .with_state(AppState {
                e_send: e_send.clone(),
                request_timeout: server_config.request_timeout,
            });

        let receiver = EventReceiver(e_recv);

        let mut addrs = Vec::with_capacity(server_config.addrs.len());
        let mut servers: Vec<BoxFut<'static, std::io::Result<()>>> =
            Vec::with_capacity(server_config.addrs.len());

        let shutdown_handle = axum_server::Handle::new();

        for addr in server_config.addrs {
            tracing::info!("Binding to: {}", addr);

            let listener = match tokio::task::spawn_blocking(move || {
                let listener = std::net::TcpListener::bind(addr)?;
                listener.set_nonblocking(true)?;
                Ok::<_, std::io::Error>(listener)
            })
            .await
            .map_err(std::io::Error::other)
            .and_then(|r| r)
            {
                Ok(listener) => listener,
                Err(err) => {
                    let _ = ready.send(Err(err));
                    return;
                }
            };

            match listener.local_addr() {
                Ok(addr) => {
                    tracing::info!("Bound with local address: {}", addr);
                    addrs.push(addr)
                }
                Err(err) => {
                    let _ = ready.send(Err(err));
                    return;
                }
            }

            let s = std::future::IntoFuture::into_future(
                axum_server::Server::from_tcp(listener)
                    .handle(shutdown_handle.clone())
                    .serve(app.clone().into_make_service()),
            );
            servers.push(Box::pin(s));
        }

        tracing::info!("Sending ready signal");

        if ready
            .send(Ok(Ready {
                e_send,
                addrs,
                receiver,
                shutdown: shutdown_handle,
            }))
            .is_err()
        {
            return;
        }

        let _ = futures::future::join_all(servers).await;
    });
}

async fn handle_dispatch(
    state: &AppState,
    req: HttpRequest,
) -> response::Response {
    let (s, r) = tokio::sync::oneshot::channel();
    let s = Box::new(move |res| {
        let _ = s.send(res);
    });
    let e_send = state.e_send.clone();
    tokio::time::timeout(state.request_timeout, async move {
        let _ = e_send.send(Event::Http(req, s)).await;
        match r.await {
            Ok(r) => r.respond(),
            Err(_) => HttpResponse::error(500, "request dropped").respond(),
        }
    })
    .await
    .unwrap_or_else(|_| HttpResponse::error(500, "internal timeout").respond())
}

async fn handle_health_get(
    extract::State(state): extract::State<AppState>,
) -> response::Response {
    handle_dispatch(&state, HttpRequest::HealthGet).await
}

async fn handle_reset_post(
    extract::State(state): extract::State<AppState>,
    body: bytes::Bytes,
) -> response::Response {
    handle_dispatch(&state, HttpRequest::ResetPost { body }).await
}

fn export_route(format: ExportFormat) -> routing::MethodRouter<AppState> {
    routing::get(
        move |extract::State(state): extract::State<AppState>| async move {
            handle_dispatch(&state, HttpRequest::ExportGet { format }).await
        },
    )
}

async fn handle_ws(
    ws: WebSocketUpgrade,
    extract::State(state): extract::State<AppState>,
) -> response::Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

struct DropAbortHandle(tokio::task::AbortHandle);

impl Drop for DropAbortHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run one websocket connection.
///
/// Inbound frames are decoded here and forwarded to the pin worker
/// as events. Outbound frames arrive on this connection's queue,
/// already in the worker's processing order.
async fn handle_socket(state: AppState, socket: WebSocket) {
    let conn = Id::generate();
    let (out_send, mut out_recv) = outbound_queue();

    if state
        .e_send
        .send(Event::Connect {
            conn: conn.clone(),
            outbound: out_send,
        })
        .await
        .is_err()
    {
        return;
    }

    let (mut write, mut read) = socket.split();

    let _writer = DropAbortHandle(
        tokio::task::spawn(async move {
            while let Some(text) = out_recv.recv().await {
                if write.send(Message::Text(text.to_string())).await.is_err()
                {
                    break;
                }
            }
            let _ = write.close().await;
        })
        .abort_handle(),
    );

    while let Some(r) = read.next().await {
        let msg = match r {
            Ok(msg) => msg,
            Err(err) => {
                tracing::debug!(%conn, ?err, "websocket read error");
                break;
            }
        };

        match msg {
            Message::Text(text) => match ClientMsg::parse(&text) {
                Ok(msg) => {
                    let event = Event::Client {
                        conn: conn.clone(),
                        msg,
                    };
                    if state.e_send.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::debug!(%conn, %err, "dropping client message");
                }
            },
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => (),
        }
    }

    let _ = state.e_send.send(Event::Disconnect { conn }).await;
}
