#![allow(dead_code)]

use keg::{Reply, Result, RowLabeled, RowNames, Transport, Value, stream};
use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scripted transport: hands back queued replies in order (an empty queue
/// answers with an empty OK), records every executed statement and tracks
/// how many executions overlap in time.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<Reply>>>,
    executed: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(keg::Error::msg(message.to_owned())));
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Result<Reply> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Reply::default()))
    }
}

impl Transport for MockTransport {
    async fn execute(&self, sql: &str) -> Result<Reply> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.executed.lock().unwrap().push(sql.to_owned());
        let reply = self.next_reply();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    fn fetch(&self, sql: &str) -> impl stream::Stream<Item = Result<RowLabeled>> + Send {
        self.executed.lock().unwrap().push(sql.to_owned());
        let items: Vec<Result<RowLabeled>> = match self.next_reply() {
            Ok(reply) => reply.rows.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(items)
    }
}

/// Builds a labeled row set sharing a single label allocation.
pub fn rows(labels: &[&str], data: impl IntoIterator<Item = Vec<Value>>) -> Vec<RowLabeled> {
    let labels: RowNames = labels
        .iter()
        .map(|v| (*v).to_owned())
        .collect::<Vec<_>>()
        .into();
    data.into_iter()
        .map(|values| RowLabeled::new(labels.clone(), values.into_boxed_slice()))
        .collect()
}
