//! The binary heatmap-srv.

use heatmap_srv::*;

#[derive(clap::Parser, Debug)]
#[command(version)]
pub struct Args {
    /// By default heatmap-srv runs in "testing" configuration, listening
    /// only on localhost at an os-assigned port with a fixed, well-known
    /// reset secret. That is enough for development and automated tests.
    ///
    /// To listen on all interfaces at port 3000 for real use,
    /// set this "production" mode.
    #[arg(long)]
    pub production: bool,

    /// Listen on this address. May be given more than once.
    /// Overrides the mode's default listen addresses.
    #[arg(long)]
    pub listen: Vec<std::net::SocketAddr>,

    /// Listen on all interfaces at this port.
    /// Ignored if any `--listen` address is given.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// The secret required by `POST /reset`.
    #[arg(long, env = "RESET_PASSWORD", hide_env_values = true)]
    pub reset_password: Option<String>,

    /// Serve static files (e.g. a web client) from this directory.
    #[arg(long)]
    pub static_dir: Option<std::path::PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    tracing_subscriber::filter::LevelFilter::INFO.into(),
                )
                .from_env_lossy(),
        )
        .init();

    let args = <Args as clap::Parser>::parse();

    let mut config = if args.production {
        Config::production()
    } else {
        Config::testing()
    };

    if !args.listen.is_empty() {
        config.listen_address_list = args.listen.clone();
    } else if let Some(port) = args.port {
        config.listen_address_list =
            vec![(std::net::Ipv4Addr::UNSPECIFIED, port).into()];
    }

    if let Some(secret) = args.reset_password.as_ref().filter(|s| !s.is_empty())
    {
        config.reset_secret = secret.clone();
    }

    config.static_dir = args.static_dir.clone();

    tracing::info!(
        production = args.production,
        listen = ?config.listen_address_list,
        "starting"
    );

    let (send, recv) = std::sync::mpsc::channel();

    if let Err(err) = ctrlc::set_handler(move || {
        let _ = send.send(());
    }) {
        eprintln!("failed to set ctrl-c handler: {err}");
        std::process::exit(1);
    }

    let srv = match HeatmapSrv::new(config) {
        Ok(srv) => srv,
        Err(err) => {
            eprintln!("failed to start heatmap-srv: {err}");
            std::process::exit(1);
        }
    };

    srv.print_addrs();

    let _ = recv.recv();

    println!("Terminating...");
    drop(srv);
    println!("Done.");
    std::process::exit(0);
}
