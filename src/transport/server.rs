//! # TCP accept loop and per-connection tasks.
//!
//! ```text
//! serve(listener)
//!   └─ accept ──► connection task (child token)
//!                   ├─ hello ──► Rooms::join ──► LotService::connect ──► parking_lot_state
//!                   ├─ reader: line ──► Inbound ──► LotService handler ──► error frame on Err
//!                   └─ writer task: mpsc<String> ──► socket
//! ```
//!
//! Cancelling the root token stops the accept loop and every connection; eviction cancels
//! a single connection's token.
//!
//! A connection is in its station's group before the directory binds it, so a later
//! connect for the same station always finds it there to evict.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::rooms::Rooms;
use super::wire::{self, Inbound, MALFORMED_FRAME, Outbound};
use crate::core::{Connected, LotService, Notice};
use crate::error::ReportError;
use crate::stations::{ConnectionId, StationIdentity};

/// Errors that stop the daemon.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

/// Binds the listening socket.
pub async fn bind(addr: &str) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Accepts connections until `token` is cancelled.
///
/// Transient accept errors are logged and the loop continues.
pub async fn serve(
    listener: TcpListener,
    svc: Arc<LotService>,
    rooms: Arc<Rooms>,
    token: CancellationToken,
) {
    let mut next: u64 = 0;
    loop {
        let accepted = tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                next += 1;
                let conn = ConnectionId::new(format!("tcp-{next}"));
                debug!("[serve] accepted {peer} as {conn}");
                tokio::spawn(handle_connection(
                    stream,
                    peer,
                    conn,
                    Arc::clone(&svc),
                    Arc::clone(&rooms),
                    token.child_token(),
                ));
            }
            Err(e) => warn!("[serve] accept failed: {e}"),
        }
    }
    info!("[serve] accept loop stopped");
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    conn: ConnectionId,
    svc: Arc<LotService>,
    rooms: Arc<Rooms>,
    token: CancellationToken,
) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let (tx, mut rx) = mpsc::channel::<String>(svc.config().outbound_capacity_clamped());

    let writer = tokio::spawn(async move {
        while let Some(mut line) = rx.recv().await {
            line.push('\n');
            if write.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
        let _ = write.shutdown().await;
    });

    if let Some(station) = handshake(&mut lines, &conn, &svc, &rooms, &tx, &token).await {
        info!("[serve] {peer} joined as {station} ({conn})");
        read_loop(&mut lines, &conn, &svc, &tx, &token).await;
        rooms.leave(&conn).await;
        svc.disconnect(&conn).await;
    }

    drop(tx);
    let _ = writer.await;
    debug!("[serve] {conn} closed");
}

/// Reads the hello frame and binds the connection; `None` closes it.
async fn handshake(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    conn: &ConnectionId,
    svc: &LotService,
    rooms: &Rooms,
    tx: &mpsc::Sender<String>,
    token: &CancellationToken,
) -> Option<StationIdentity> {
    let line = tokio::select! {
        _ = token.cancelled() => return None,
        line = lines.next_line() => line.ok().flatten()?,
    };

    let hello = match wire::decode_handshake(&line) {
        Ok(hello) => hello,
        Err(e) => {
            send_error(tx, MALFORMED_FRAME, &e.to_string()).await;
            return None;
        }
    };

    let connected = match join_station(svc, rooms, conn, hello.client_id(), tx, token).await {
        Ok(connected) => connected,
        Err(e) => {
            send_report_error(tx, &e).await;
            return None;
        }
    };
    if token.is_cancelled() {
        // Superseded before the resync went out.
        rooms.leave(conn).await;
        svc.disconnect(conn).await;
        return None;
    }

    let state = Notice::ParkingLotState(connected.state);
    match wire::encode(&Outbound::Notice(&state)) {
        Ok(line) => {
            let _ = tx.send(line).await;
        }
        Err(e) => warn!("[serve] encode resync for {conn} failed: {e}"),
    }
    Some(connected.station)
}

/// Joins the station's group, then binds the connection; leaves the group on failure.
async fn join_station(
    svc: &LotService,
    rooms: &Rooms,
    conn: &ConnectionId,
    client_id: Option<&str>,
    tx: &mpsc::Sender<String>,
    token: &CancellationToken,
) -> Result<Connected, ReportError> {
    if let Ok(station) = StationIdentity::from_header(client_id) {
        rooms
            .join(station, conn.clone(), tx.clone(), token.clone())
            .await;
    }
    match svc.connect(conn.clone(), client_id).await {
        Ok(connected) => Ok(connected),
        Err(e) => {
            rooms.leave(conn).await;
            Err(e)
        }
    }
}

async fn read_loop(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    conn: &ConnectionId,
    svc: &LotService,
    tx: &mpsc::Sender<String>,
    token: &CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => break,
            next = lines.next_line() => next,
        };
        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!("[serve] {conn} read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match wire::decode(&line) {
            Ok(frame) => {
                if let Err(e) = handle_frame(svc, conn, frame).await {
                    send_report_error(tx, &e).await;
                }
            }
            Err(e) => send_error(tx, MALFORMED_FRAME, &e.to_string()).await,
        }
    }
}

async fn handle_frame(
    svc: &LotService,
    conn: &ConnectionId,
    frame: Inbound,
) -> Result<(), ReportError> {
    match frame {
        Inbound::CarArrived(report) => {
            svc.car_arrived(conn, report).await?;
        }
        Inbound::CarDeparted(report) => {
            svc.car_departed(conn, report).await?;
        }
        Inbound::OrderToCloseParkingLot => svc.order_to_close_parking_lot().await,
        Inbound::OrderToOpenParkingLot => svc.order_to_open_parking_lot().await,
        Inbound::OrderToCloseFloor(order) => {
            svc.order_to_close_floor(&order).await?;
        }
        Inbound::OrderToOpenFloor(order) => {
            svc.order_to_open_floor(&order).await?;
        }
        Inbound::ResetParkingLot => {
            svc.reset_parking_lot().await;
        }
    }
    Ok(())
}

async fn send_report_error(tx: &mpsc::Sender<String>, err: &ReportError) {
    send_error(tx, err.as_label(), &err.as_message()).await;
}

async fn send_error(tx: &mpsc::Sender<String>, label: &str, message: &str) {
    match wire::error_line(label, message) {
        Ok(line) => {
            let _ = tx.send(line).await;
        }
        Err(e) => warn!("[serve] encode error frame failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;
    use tokio::net::tcp::OwnedWriteHalf;
    use tokio::time::timeout;

    use super::*;
    use crate::config::Config;
    use crate::core::Dispatch;

    struct Client {
        lines: Lines<BufReader<OwnedReadHalf>>,
        write: OwnedWriteHalf,
    }

    impl Client {
        async fn connect(addr: SocketAddr) -> Self {
            let (read, write) = TcpStream::connect(addr).await.unwrap().into_split();
            Self {
                lines: BufReader::new(read).lines(),
                write,
            }
        }

        async fn send(&mut self, line: &str) {
            self.write.write_all(line.as_bytes()).await.unwrap();
            self.write.write_all(b"\n").await.unwrap();
        }

        async fn recv(&mut self) -> Option<Value> {
            let line = timeout(Duration::from_secs(5), self.lines.next_line())
                .await
                .unwrap()
                .unwrap()?;
            Some(serde_json::from_str(&line).unwrap())
        }
    }

    async fn start() -> (SocketAddr, Arc<LotService>, CancellationToken) {
        let rooms = Arc::new(Rooms::new());
        let svc = local(&rooms);
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        tokio::spawn(serve(listener, Arc::clone(&svc), rooms, token.clone()));
        (addr, svc, token)
    }

    fn local(rooms: &Arc<Rooms>) -> Arc<LotService> {
        LotService::builder(Config::default())
            .with_dispatcher(rooms.clone() as Arc<dyn Dispatch>)
            .build()
    }

    #[tokio::test]
    async fn test_superseded_connection_leaves_group() {
        let rooms = Arc::new(Rooms::new());
        let svc = local(&rooms);
        let (tx, _rx) = mpsc::channel(4);
        let (a, b) = (ConnectionId::from("a"), ConnectionId::from("b"));
        let (tok_a, tok_b) = (CancellationToken::new(), CancellationToken::new());

        join_station(&svc, &rooms, &a, Some("first_floor"), &tx, &tok_a)
            .await
            .unwrap();
        let connected = join_station(&svc, &rooms, &b, Some("first_floor"), &tx, &tok_b)
            .await
            .unwrap();

        assert_eq!(connected.superseded, Some(a.clone()));
        assert!(tok_a.is_cancelled());
        assert!(!tok_b.is_cancelled());
        assert_eq!(rooms.members(StationIdentity::First).await, 1);
        assert_eq!(svc.station_of(&a).await, None);
    }

    #[tokio::test]
    async fn test_rejected_hello_joins_no_group() {
        let rooms = Arc::new(Rooms::new());
        let svc = local(&rooms);
        let (tx, _rx) = mpsc::channel(4);
        let conn = ConnectionId::from("x");

        let err = join_station(&svc, &rooms, &conn, Some("roof"), &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "invalid_identity_header");
        for station in StationIdentity::iter() {
            assert_eq!(rooms.members(station).await, 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_hellos_leave_one_live_member() {
        for _ in 0..50 {
            let rooms = Arc::new(Rooms::new());
            let svc = local(&rooms);
            let (tx, _rx) = mpsc::channel(4);
            let (a, b) = (ConnectionId::from("a"), ConnectionId::from("b"));
            let (tok_a, tok_b) = (CancellationToken::new(), CancellationToken::new());

            let (ra, rb) = tokio::join!(
                join_station(&svc, &rooms, &a, Some("second_floor"), &tx, &tok_a),
                join_station(&svc, &rooms, &b, Some("second_floor"), &tx, &tok_b),
            );
            ra.unwrap();
            rb.unwrap();

            let (winner, loser) = if svc.station_of(&a).await.is_some() {
                (&tok_a, &tok_b)
            } else {
                (&tok_b, &tok_a)
            };
            assert!(!winner.is_cancelled());
            assert!(loser.is_cancelled());
            assert_eq!(rooms.members(StationIdentity::Second).await, 1);
        }
    }

    #[tokio::test]
    async fn test_hello_then_floor_closes() {
        let (addr, svc, token) = start().await;
        let mut client = Client::connect(addr).await;

        client.send(r#"{"event":"hello","client_id":"first_floor"}"#).await;
        let state = client.recv().await.unwrap();
        assert_eq!(state["event"], "parking_lot_state");
        assert_eq!(state["data"]["floor"], 1);

        for space in 0..8 {
            client
                .send(&format!(
                    r#"{{"event":"car_arrived","data":{{"parking_space":{space},"timestamp":0}}}}"#
                ))
                .await;
        }
        let notice = client.recv().await.unwrap();
        assert_eq!(notice["event"], "close_floor");
        assert!(svc.lot().is_floor_full(1).await.unwrap());

        token.cancel();
    }

    #[tokio::test]
    async fn test_errors_are_reported_to_sender() {
        let (addr, _svc, token) = start().await;
        let mut client = Client::connect(addr).await;

        client.send(r#"{"event":"hello","client_id":"ground_floor"}"#).await;
        client.recv().await.unwrap();

        client.send("garbage").await;
        let err = client.recv().await.unwrap();
        assert_eq!(err["data"]["label"], MALFORMED_FRAME);

        client
            .send(r#"{"event":"car_departed","data":{"parking_space":2,"timestamp":0}}"#)
            .await;
        let err = client.recv().await.unwrap();
        assert_eq!(err["event"], "error");
        assert_eq!(err["data"]["label"], "slot_already_empty");

        token.cancel();
    }

    #[tokio::test]
    async fn test_bad_hello_closes_connection() {
        let (addr, _svc, token) = start().await;
        let mut client = Client::connect(addr).await;

        client.send(r#"{"event":"hello","client_id":"roof"}"#).await;
        let err = client.recv().await.unwrap();
        assert_eq!(err["data"]["label"], "invalid_identity_header");
        assert!(client.recv().await.is_none());

        token.cancel();
    }

    #[tokio::test]
    async fn test_second_hello_evicts_first() {
        let (addr, svc, token) = start().await;
        let mut old = Client::connect(addr).await;
        old.send(r#"{"event":"hello","client_id":"second_floor"}"#).await;
        old.recv().await.unwrap();

        let mut new = Client::connect(addr).await;
        new.send(r#"{"event":"hello","client_id":"second_floor"}"#).await;
        new.recv().await.unwrap();

        assert!(old.recv().await.is_none());
        svc.order_to_close_floor(&crate::core::FloorOrder {
            client_id: "second_floor".into(),
        })
        .await
        .unwrap();
        assert_eq!(new.recv().await.unwrap()["event"], "close_floor");

        token.cancel();
    }
}
