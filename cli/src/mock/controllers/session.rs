//! # Session Controller
//!
//! File: cli/src/mock/controllers/session.rs
//! Author: Christi Mahu
//!
//! `POST /session` opens an interactive session on a real daemon (BuildKit
//! uses it for file sync). Here it only has to exist: the response body is one
//! half of an in-memory duplex pipe. The other half is drained in a background
//! task until the client hangs up, so the session stays open: reads wait and
//! writes are accepted.
//!
use crate::mock::http::{Request, Response};
use crate::mock::router::{bind, versioned, Router};
use std::sync::Arc;
use tokio::io::{self, AsyncWriteExt};
use tracing::{debug, warn};

/// Buffer size of the session pipe.
const SESSION_BUFFER: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct SessionController;

impl SessionController {
    pub fn register(self: &Arc<Self>, router: &mut Router) {
        router.post(versioned("/session"), bind(self, Self::open));
    }

    async fn open(self: Arc<Self>, _req: Request, res: Response) -> Response {
        let (client, mut server) = io::duplex(SESSION_BUFFER);
        tokio::spawn(async move {
            match io::copy(&mut server, &mut io::sink()).await {
                Ok(bytes) => debug!("Session closed after {} byte(s)", bytes),
                Err(e) => warn!("Session pipe failed: {}", e),
            }
            let _ = server.shutdown().await;
        });
        debug!("Opened session pipe");
        res.send(client)
    }
}
