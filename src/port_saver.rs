use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Orbit, Rocket};
use tokio::sync::watch;

/// Creates a fairing that publishes the bound port on liftoff, and the handle that reads it.
pub fn create_pair() -> (PortSaver, Port) {
    let (tx, rx) = watch::channel(None);
    (PortSaver { sender: tx }, Port { rx })
}

pub struct Port {
    rx: watch::Receiver<Option<u16>>,
}

impl Port {
    /// Waits until the server has lifted off. Returns `None` if it never will.
    pub async fn get(&self) -> Option<u16> {
        let mut rx = self.rx.clone();
        loop {
            if let Some(port) = *rx.borrow_and_update() {
                return Some(port);
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }
}

pub struct PortSaver {
    sender: watch::Sender<Option<u16>>,
}

#[rocket::async_trait]
impl Fairing for PortSaver {
    fn info(&self) -> Info {
        Info {
            name: "Port Saver",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let port = rocket.config().port;
        tracing::info!(port, "Server lifted off");
        if self.sender.send(Some(port)).is_err() {
            tracing::warn!("Nobody is waiting for the bound port");
        }
    }
}
