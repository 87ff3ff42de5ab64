use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use crate::broker::participant::DeliverySink;

/// Write half of one client connection.
///
/// Everything headed for the client, whether a delivered message or a
/// protocol response, funnels through one channel drained by the
/// connection's writer task. Closing the sink drops the sender; the writer
/// task sees the channel end and shuts the connection down.
#[derive(Debug)]
pub struct LineSink {
    tx: Mutex<Option<UnboundedSender<String>>>,
}

impl LineSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl DeliverySink for LineSink {
    fn write_line(&self, line: &str) -> bool {
        match self.tx.lock().unwrap().as_ref() {
            Some(tx) => tx.send(line.to_string()).is_ok(),
            None => false,
        }
    }

    fn is_usable(&self) -> bool {
        match self.tx.lock().unwrap().as_ref() {
            Some(tx) => !tx.is_closed(),
            None => false,
        }
    }

    fn close(&self) {
        self.tx.lock().unwrap().take();
    }
}
