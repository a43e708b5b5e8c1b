//! Overlay links over TCP.
//!
//! Frames are newline-delimited JSON. Each side first sends a handshake line
//! carrying its overlay identity, then [`PeerMessage`] frames follow in both
//! directions. An instance's cloud id is the socket address it listens on.

use std::net::SocketAddr;

use civic_core::wire::PeerMessage;
use serde::{Deserialize, Serialize};
use tokio::{
  io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader},
  net::{TcpListener, TcpStream, tcp::OwnedWriteHalf},
  sync::mpsc,
};
use tracing::{debug, warn};

use super::{Advertisement, PeerLink, Signaling};
use crate::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Handshake {
  peer_id: String,
}

/// Signaling that listens on, and dials, TCP socket addresses.
#[derive(Debug, Clone)]
pub struct TcpSignaling {
  listen: SocketAddr,
}

impl TcpSignaling {
  /// `listen` may use port 0; the bound address becomes the cloud id.
  pub fn new(listen: SocketAddr) -> Self { Self { listen } }
}

impl Signaling for TcpSignaling {
  async fn advertise(&self, id: &str) -> Result<Advertisement> {
    let listener = TcpListener::bind(self.listen).await?;
    let cloud_id = listener.local_addr()?.to_string();
    debug!(requested = id, %cloud_id, "listening for peers");
    let (tx, incoming) = mpsc::unbounded_channel();
    let local_id = cloud_id.clone();

    tokio::spawn(async move {
      loop {
        let (stream, addr) = match listener.accept().await {
          Ok(accepted) => accepted,
          Err(e) => {
            warn!(error = %e, "peer accept failed");
            continue;
          }
        };
        if tx.is_closed() {
          break;
        }
        let tx = tx.clone();
        let local_id = local_id.clone();
        tokio::spawn(async move {
          match handshake(stream, &local_id).await {
            Ok(link) => {
              let _ = tx.send(link);
            }
            Err(e) => warn!(%addr, error = %e, "peer handshake failed"),
          }
        });
      }
    });

    Ok(Advertisement { cloud_id, incoming })
  }

  async fn dial(&self, local_id: &str, target: &str) -> Result<PeerLink> {
    let stream = TcpStream::connect(target).await.map_err(|e| {
      debug!(addr = %target, error = %e, "dial failed");
      Error::PeerUnavailable(target.to_owned())
    })?;
    handshake(stream, local_id).await
  }
}

/// Exchange identities, then spawn the frame reader and writer.
async fn handshake(stream: TcpStream, local_id: &str) -> Result<PeerLink> {
  stream.set_nodelay(true)?;
  let (read, mut write) = stream.into_split();
  let mut lines = BufReader::new(read).lines();

  write_frame(&mut write, &Handshake { peer_id: local_id.to_owned() }).await?;
  let line = lines.next_line().await?.ok_or_else(|| {
    std::io::Error::new(
      std::io::ErrorKind::UnexpectedEof,
      "peer closed during handshake",
    )
  })?;
  let hello: Handshake = serde_json::from_str(&line)?;
  let remote_id = hello.peer_id;

  let (outbound, mut out_rx) = mpsc::unbounded_channel::<PeerMessage>();
  let (in_tx, inbound) = mpsc::unbounded_channel();

  let peer = remote_id.clone();
  tokio::spawn(async move {
    while let Some(message) = out_rx.recv().await {
      if let Err(e) = write_frame(&mut write, &message).await {
        debug!(peer = %peer, error = %e, "peer write failed");
        break;
      }
    }
  });

  let peer = remote_id.clone();
  tokio::spawn(async move {
    loop {
      match lines.next_line().await {
        Ok(Some(line)) => match serde_json::from_str::<PeerMessage>(&line) {
          Ok(message) => {
            if in_tx.send(message).is_err() {
              break;
            }
          }
          Err(e) => warn!(peer = %peer, error = %e, "dropping malformed peer frame"),
        },
        Ok(None) => break,
        Err(e) => {
          debug!(peer = %peer, error = %e, "peer read failed");
          break;
        }
      }
    }
  });

  Ok(PeerLink { remote_id, outbound, inbound })
}

async fn write_frame<T: Serialize>(write: &mut OwnedWriteHalf, value: &T) -> Result<()> {
  let mut buf = serde_json::to_vec(value)?;
  buf.push(b'\n');
  write.write_all(&buf).await?;
  Ok(())
}
