//! JSON-lines host protocol.
//!
//! Requests arrive one per line on the input; responses go out one per line.
//! A solve runs on its own thread so `cancel` and `ping` stay responsive while
//! it works. Only one solve is in flight at a time.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::solver::{SolveReport, SolveStatus, Solver};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    Cancel,
    ClearCache,
    Solve { state: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Ready,
    Progress {
        text: String,
    },
    CacheCleared,
    Solved {
        status: SolveStatus,
        moves: Option<Vec<u8>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl From<SolveReport> for Response {
    fn from(report: SolveReport) -> Self {
        Response::Solved {
            status: report.status,
            moves: report.moves,
            error: report.error,
        }
    }
}

struct InFlight {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

struct Worker {
    solver: Arc<Solver>,
    events: mpsc::Sender<Response>,
    in_flight: Option<InFlight>,
}

impl Worker {
    fn send(&self, response: Response) {
        // The writer only goes away once every sender is dropped.
        let _ = self.events.send(response);
    }

    fn handle_line(&mut self, line: &str) {
        let request = match serde_json::from_str::<Request>(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("malformed request {line:?}: {e}");
                self.send(SolveReport::failed(Some(e.to_string())).into());
                return;
            }
        };
        debug!("request: {request:?}");

        match request {
            Request::Ping => self.send(Response::Ready),
            Request::Cancel => {
                if let Some(in_flight) = &self.in_flight {
                    in_flight.cancel.cancel();
                }
            }
            Request::ClearCache => match self.solver.clear_cache() {
                Ok(()) => self.send(Response::CacheCleared),
                Err(e) => self.send(SolveReport::failed(Some(e.to_string())).into()),
            },
            Request::Solve { state } => self.start_solve(state),
        }
    }

    fn reap(&mut self) {
        if self.in_flight.as_ref().is_some_and(|f| f.handle.is_finished()) {
            self.join();
        }
    }

    fn join(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            if in_flight.handle.join().is_err() {
                self.send(SolveReport::failed(Some("solver thread panicked".into())).into());
            }
        }
    }

    fn start_solve(&mut self, state: Vec<u8>) {
        self.reap();
        if self.in_flight.is_some() {
            self.send(SolveReport::failed(Some("solve already in progress".into())).into());
            return;
        }

        let cancel = CancelToken::new();
        let token = cancel.clone();
        let solver = Arc::clone(&self.solver);
        let events = self.events.clone();
        let handle = thread::spawn(move || {
            let progress_events = events.clone();
            let mut sink = move |text: &str| {
                let _ = progress_events.send(Response::Progress {
                    text: text.to_string(),
                });
            };
            let report = solver.solve(&state, &token, &mut sink);
            let _ = events.send(report.into());
        });
        self.in_flight = Some(InFlight { cancel, handle });
    }
}

fn write_responses<W: Write>(events: mpsc::Receiver<Response>, mut out: W) -> Result<()> {
    for response in events {
        serde_json::to_writer(&mut out, &response)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }
    Ok(())
}

/// Serves requests from `input` until it ends, then waits for an in-flight solve to report.
pub fn serve<R, W>(solver: Arc<Solver>, input: R, output: W) -> Result<()>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let writer = thread::spawn(move || write_responses(rx, output));

    let mut worker = Worker {
        solver,
        events: tx,
        in_flight: None,
    };
    worker.send(Response::Ready);

    let mut read_result = Ok(());
    for line in input.lines() {
        match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => worker.handle_line(line.trim()),
            Err(e) => {
                read_result = Err(e);
                break;
            }
        }
    }
    worker.join();
    drop(worker);

    let written = writer
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "response writer panicked"))?;
    read_result?;
    written
}
