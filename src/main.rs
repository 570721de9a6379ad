use descent_tutor::{Server, ServerConfig, Service};
use log::info;
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let addr = config.addr();

    let listener = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    let server = Server::new(Service::new());

    tokio::select! {
        ret = server.run(listener) => {
            ret?;
        }
        _ = signal::ctrl_c() => {
            info!("received SIGTERM, shutting down");
        }
    }

    Ok(())
}
