use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::broker::participant::DeliverySink;
use crate::client::{Session, SessionRegistry};
use crate::transport::command::Command;
use crate::transport::sink::LineSink;
use crate::utils::error::Error;

const NOT_LOGGED_IN: &str = "You should login first";

/// Accept loop of the line server. Each connection gets its own task.
pub async fn start_server(addr: &str, sessions: Arc<SessionRegistry>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "client connected");
        let sessions = sessions.clone();
        tokio::spawn(async move {
            handle_connection(stream, sessions).await;
            info!(%peer, "client disconnected");
        });
    }
}

/// Reads lines off one connection and maps them onto the session surface.
///
/// All output for the connection, delivered messages and protocol responses
/// alike, goes through the connection's [`LineSink`] and is drained by a
/// single writer task.
async fn handle_connection(stream: TcpStream, sessions: Arc<SessionRegistry>) {
    let (reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    let sink = Arc::new(LineSink::new(tx));
    let mut session: Option<Arc<Session>> = None;

    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let command = Command::parse(line.trim_end());
        debug!(?command, "received line");
        match command {
            Command::Login { username, password } => {
                if session.is_some() {
                    respond(&sink, "You should leave before logging in again");
                    continue;
                }
                match sessions.login(&username, &password) {
                    Ok(s) => {
                        s.set_sink(sink.clone());
                        respond(&sink, &format!("Logged in as {username}"));
                        session = Some(s);
                    }
                    Err(Error::InvalidCredentials) => respond(&sink, "Invalid password"),
                    Err(err) => respond(&sink, &format!("ERROR: {err}")),
                }
            }
            Command::Join { topic } => match &session {
                Some(s) => {
                    if let Err(err) = s.join_topic(&topic).await {
                        respond(&sink, &format!("ERROR: {err}"));
                    }
                }
                None => respond(&sink, NOT_LOGGED_IN),
            },
            Command::Users => match &session {
                Some(s) => match s.list_participants().await {
                    Ok(users) => {
                        for user in users {
                            respond(&sink, &user);
                        }
                    }
                    Err(_) => respond(&sink, "You should join a channel to get users"),
                },
                None => respond(&sink, NOT_LOGGED_IN),
            },
            Command::Leave => match session.take() {
                Some(s) => {
                    // Closes the shared sink; the writer task winds down and
                    // the connection is shut.
                    s.leave();
                    break;
                }
                None => respond(&sink, NOT_LOGGED_IN),
            },
            Command::Publish { payload } => match &session {
                Some(s) => {
                    if s.send_message(&payload).await.is_err() {
                        respond(&sink, "Client hasn't joined any channel");
                    }
                }
                None => respond(&sink, "You could send messages after you login"),
            },
            Command::Unknown { .. } => respond(&sink, "UNKNOWN OPERATION"),
            Command::Malformed { usage } => respond(&sink, usage),
        }
    }

    // Release this connection's sink so the writer task ends. The session,
    // if any, keeps its topic membership; it just stops being deliverable
    // until another connection logs in and attaches a fresh sink.
    sink.close();
    let _ = writer_task.await;
}

fn respond(sink: &Arc<LineSink>, line: &str) {
    // Best effort; a closed connection drops the response.
    let _ = sink.write_line(line);
}
