//! heatmap http server types.

use crate::*;

/// Print out a message if this thread dies.
struct ThreadGuard(&'static str);

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        tracing::debug!("{}", self.0);
    }
}

/// An actual heatmap_srv server instance.
///
/// Network io runs on a tokio runtime thread. All pin state lives on a
/// single os worker thread that handles one event at a time, so no
/// event ever observes another half-applied.
pub struct HeatmapSrv {
    workers: Vec<std::thread::JoinHandle<std::io::Result<()>>>,
    addrs: Vec<std::net::SocketAddr>,
    server: Option<Server>,
}

impl Drop for HeatmapSrv {
    fn drop(&mut self) {
        let _g = ThreadGuard("Server Shutdown Complete!");

        tracing::debug!("begin server shutdown...");
        let _ = self.shutdown();
    }
}

impl HeatmapSrv {
    /// Construct a new HeatmapSrv instance.
    pub fn new(config: Config) -> std::io::Result<Self> {
        // start the actual http server
        let mut server = Server::new(ServerConfig::from(&config))?;

        // get the address that was assigned
        let addrs = server.server_addrs().to_vec();
        tracing::info!(?addrs, "Listening");

        let recv = server
            .take_receiver()
            .ok_or_else(|| std::io::Error::other("event receiver taken"))?;

        // the one and only owner of pin state
        let workers = vec![std::thread::Builder::new()
            .name("pin-worker".into())
            .spawn(move || worker(config, recv))?];

        Ok(Self {
            workers,
            addrs,
            server: Some(server),
        })
    }

    /// Shutdown the server, returning an error result if any
    /// of the worker threads had panicked.
    pub fn shutdown(&mut self) -> std::io::Result<()> {
        let mut is_err = false;
        drop(self.server.take());
        while let Some(w) = self.workers.pop() {
            tracing::debug!("waiting on {} threads to close...", self.workers.len() + 1);
            if !matches!(w.join(), Ok(Ok(()))) {
                is_err = true;
            }
        }
        tracing::debug!("all threads closed.");
        if is_err {
            Err(std::io::Error::other("Failure shutting down worker thread"))
        } else {
            Ok(())
        }
    }

    /// Get the bound listening addresses of this server.
    pub fn listen_addrs(&self) -> &[std::net::SocketAddr] {
        self.addrs.as_slice()
    }

    /// Print the address server started on
    pub fn print_addrs(&self) {
        println!("#heatmap_srv#running#");
        for addr in self.addrs.iter() {
            // print these incase someone wants to parse for them
            println!("#heatmap_srv#listening#{addr:?}#");
        }
    }
}

fn worker(config: Config, recv: EventReceiver) -> std::io::Result<()> {
    let _g = ThreadGuard("pin worker thread has ended");

    let mut state = PinState::new(&config);

    while let Some(event) = recv.recv() {
        let now = Timestamp::now();

        match event {
            Event::Connect { conn, outbound } => {
                state.connect(conn, outbound, now)
            }
            Event::Disconnect { conn } => state.disconnect(&conn),
            Event::Client { conn, msg } => {
                // every failure here is a silently dropped input
                if let Err(err) = state.handle_client_msg(&conn, msg, now) {
                    tracing::debug!(%conn, %err, "dropped client message");
                }
            }
            Event::Http(req, res) => {
                Handler {
                    state: &mut state,
                    res,
                }
                .handle(req);
            }
        }
    }

    Ok(())
}

struct Handler<'lt> {
    state: &'lt mut PinState,
    res: HttpRespondCb,
}

impl Handler<'_> {
    /// Wrap the handle call so we can respond to the client with errors.
    pub fn handle(mut self, req: HttpRequest) {
        let res = match self.handle_inner(req) {
            Ok(res) => res,
            Err(err) => {
                let status = match err {
                    PinError::Malformed(_) => 400,
                    PinError::Unauthorized => 403,
                    _ => 500,
                };
                HttpResponse::error(status, err)
            }
        };
        self.respond(res);
    }

    /// Dispatch to the correct handlers.
    fn handle_inner(&mut self, req: HttpRequest) -> PinResult<HttpResponse> {
        match req {
            HttpRequest::HealthGet => Ok(HttpResponse::json(200, b"{}".to_vec())),
            HttpRequest::ResetPost { body } => self.handle_reset(body),
            HttpRequest::ExportGet { format } => Ok(HttpResponse {
                status: 200,
                content_type: format.content_type(),
                body: self.state.export(format).into_bytes(),
            }),
        }
    }

    /// Check the secret and clear all pins.
    fn handle_reset(&mut self, body: bytes::Bytes) -> PinResult<HttpResponse> {
        #[derive(serde::Deserialize)]
        struct ResetBody {
            #[serde(default)]
            password: Option<String>,
        }

        // an absent body carries no password
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            ResetBody { password: None }
        } else {
            serde_json::from_slice::<ResetBody>(&body)?
        };

        match body.password {
            Some(password) => self.state.reset(&password)?,
            None => return Err(PinError::Unauthorized),
        }

        Ok(HttpResponse::json(200, br#"{"ok":true}"#.to_vec()))
    }

    /// Process the response.
    fn respond(self, res: HttpResponse) {
        let Self { res: cb, .. } = self;
        cb(res);
    }
}
