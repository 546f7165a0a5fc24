// src/report.rs
// =============================================================================
// This module collects diagnostics into the final report.
//
// Producers (the classifier, every link-check worker) send into an
// unbounded channel through a cloned DiagnosticsSink, so they never block.
// One background task drains the channel. Collector::finish waits until
// every sink clone is gone and hands back the Report.
// =============================================================================

use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Why a construct failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    InvalidRef,
    InvalidDoc,
    UnknownRole,
    UndefinedConstant { constant: String },
    Unreachable { url: String, response: String },
}

/// One failure, tied to the document it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    /// The offending construct as written, e.g. :ref:`fantastic`
    pub subject: String,
    #[serde(flatten)]
    pub problem: Problem,
}

impl Diagnostic {
    pub fn new(file: &str, subject: impl fmt::Display, problem: Problem) -> Self {
        Diagnostic {
            file: file.to_string(),
            subject: subject.to_string(),
            problem,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}: ", self.file)?;
        match &self.problem {
            Problem::InvalidRef => write!(f, "{} is not a valid ref", self.subject),
            Problem::InvalidDoc => {
                write!(f, "{} is not a valid file found in this docset", self.subject)
            }
            Problem::UnknownRole => write!(f, "{} is not a valid role", self.subject),
            Problem::UndefinedConstant { constant } => {
                write!(f, "{} uses constant {} which is not defined in config", self.subject, constant)
            }
            Problem::Unreachable { url, response } if url == &self.subject => {
                write!(f, "{} is not a valid http link. Got response {}", url, response)
            }
            Problem::Unreachable { url, response } => write!(
                f,
                "interpreted url {} from {} was not valid. Got response {}",
                url, self.subject, response
            ),
        }
    }
}

/// Cheap, cloneable handle for sending diagnostics.
#[derive(Clone)]
pub struct DiagnosticsSink {
    tx: mpsc::UnboundedSender<Diagnostic>,
}

impl DiagnosticsSink {
    pub fn report(&self, diagnostic: Diagnostic) {
        if let Err(e) = self.tx.send(diagnostic) {
            warn!(diagnostic = %e.0, "diagnostics collector already stopped");
        }
    }
}

/// Owns the background task that drains the diagnostics channel.
pub struct Collector {
    sink: DiagnosticsSink,
    handle: JoinHandle<Vec<Diagnostic>>,
}

impl Collector {
    /// Starts draining. With `echo`, each diagnostic is also logged as it arrives.
    pub fn start(echo: bool) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Diagnostic>();

        let handle = tokio::spawn(async move {
            let mut diagnostics = Vec::new();
            while let Some(diagnostic) = rx.recv().await {
                if echo {
                    error!("{diagnostic}");
                }
                diagnostics.push(diagnostic);
            }
            diagnostics
        });

        Collector {
            sink: DiagnosticsSink { tx },
            handle,
        }
    }

    pub fn sink(&self) -> DiagnosticsSink {
        self.sink.clone()
    }

    /// Waits for every sink to be dropped and returns what was collected.
    pub async fn finish(self) -> Report {
        drop(self.sink);
        let diagnostics = match self.handle.await {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                error!(error = %e, "diagnostics collector failed");
                Vec::new()
            }
        };
        Report { diagnostics }
    }
}

/// Everything a run found wrong, in arrival order.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 0 when clean, 1 when anything was reported.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
