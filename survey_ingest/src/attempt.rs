//! The life cycle of an analysis attempt.
//!
//! ```text
//! Idle -> Requesting -> Succeeded(result)
//!                    \-> Failed(failure)
//! ```
//!
//! Only one attempt is in flight at a time. Both end states stay until the caller
//! starts a new attempt, which discards them. Cancelling an attempt drops its
//! pending result and goes back to `Idle`.

use log::{info, warn};
use snafu::{ResultExt, Snafu};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analysis::AnalysisResult;
use crate::request::AnalysisRequest;
use crate::sanitize::{sanitize, ResponseError};

/// The analysis service, seen as a black box that answers a request with raw text.
pub trait AnalysisCapability {
    /// Sends the request and returns the raw text of the response.
    ///
    /// Implementations may poll `cancel` and give up early with `CapabilityError::Cancelled`.
    fn generate(
        &self,
        request: &AnalysisRequest,
        cancel: &CancelHandle,
    ) -> Result<String, CapabilityError>;
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CapabilityError {
    #[snafu(display("the analysis service failed: {message}"))]
    Unavailable { message: String },
    #[snafu(display("the analysis request was cancelled"))]
    Cancelled {},
}

/// Why an attempt ended in the `Failed` state.
#[derive(Debug, Snafu)]
pub enum AnalysisFailure {
    #[snafu(display("{source}"))]
    Capability { source: CapabilityError },
    #[snafu(display("{source}"))]
    Response { source: ResponseError },
}

/// Misuse of the attempt protocol.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
pub enum SessionError {
    #[snafu(display("attempt {attempt} is still in flight"))]
    Busy { attempt: u64 },
    #[snafu(display("attempt {attempt} is not the attempt in flight"))]
    StaleTicket { attempt: u64 },
}

/// Lets any holder cancel the attempt it was issued for.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Issued when an attempt starts, and needed to complete or cancel it.
#[derive(Debug, Clone)]
pub struct AttemptTicket {
    pub attempt: u64,
    /// The fingerprint of the request sent in this attempt.
    pub fingerprint: String,
    cancel: CancelHandle,
}

impl AttemptTicket {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

#[derive(Debug)]
pub enum AttemptState {
    Idle,
    Requesting { attempt: u64, fingerprint: String },
    Succeeded(AnalysisResult),
    Failed(AnalysisFailure),
}

/// Holds the state of the analysis attempts of one caller.
#[derive(Debug)]
pub struct AnalysisSession {
    state: AttemptState,
    num_attempts: u64,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        AnalysisSession::new()
    }
}

impl AnalysisSession {
    pub fn new() -> AnalysisSession {
        AnalysisSession {
            state: AttemptState::Idle,
            num_attempts: 0,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// The result of the last attempt, if it succeeded.
    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            AttemptState::Succeeded(r) => Some(r),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&AnalysisFailure> {
        match &self.state {
            AttemptState::Failed(f) => Some(f),
            _ => None,
        }
    }

    /// Starts a new attempt for the request. Any previous result or failure is discarded.
    pub fn begin(&mut self, request: &AnalysisRequest) -> Result<AttemptTicket, SessionError> {
        if let AttemptState::Requesting { attempt, .. } = &self.state {
            return BusySnafu { attempt: *attempt }.fail();
        }
        self.num_attempts += 1;
        let attempt = self.num_attempts;
        info!(
            "begin: attempt {:?} for request {}",
            attempt, request.fingerprint
        );
        self.state = AttemptState::Requesting {
            attempt,
            fingerprint: request.fingerprint.clone(),
        };
        Ok(AttemptTicket {
            attempt,
            fingerprint: request.fingerprint.clone(),
            cancel: CancelHandle::default(),
        })
    }

    /// Ends the attempt of the ticket with the raw outcome of the analysis service.
    ///
    /// The outcome is dropped if the ticket is not the one in flight, or if it has
    /// been cancelled in the meantime.
    pub fn complete(
        &mut self,
        ticket: &AttemptTicket,
        outcome: Result<String, CapabilityError>,
    ) -> Result<&AttemptState, SessionError> {
        self.check_in_flight(ticket)?;
        if ticket.cancel.is_cancelled() {
            info!("complete: attempt {:?} was cancelled, dropping its outcome", ticket.attempt);
            self.state = AttemptState::Idle;
            return Ok(&self.state);
        }

        let result = outcome
            .context(CapabilitySnafu {})
            .and_then(|raw| sanitize(&raw).context(ResponseSnafu {}));
        self.state = match result {
            Ok(r) => {
                info!("complete: attempt {:?} succeeded", ticket.attempt);
                AttemptState::Succeeded(r)
            }
            Err(e) => {
                warn!("complete: attempt {:?} failed: {}", ticket.attempt, e);
                AttemptState::Failed(e)
            }
        };
        Ok(&self.state)
    }

    /// Cancels the attempt in flight. Its outcome will be dropped.
    pub fn cancel(&mut self, ticket: &AttemptTicket) -> Result<(), SessionError> {
        self.check_in_flight(ticket)?;
        ticket.cancel.cancel();
        info!("cancel: attempt {:?}", ticket.attempt);
        self.state = AttemptState::Idle;
        Ok(())
    }

    /// Forgets the last result or failure.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if let AttemptState::Requesting { attempt, .. } = &self.state {
            return BusySnafu { attempt: *attempt }.fail();
        }
        self.state = AttemptState::Idle;
        Ok(())
    }

    /// Runs a whole attempt: begin, call the service, complete.
    pub fn run<C: AnalysisCapability + ?Sized>(
        &mut self,
        capability: &C,
        request: &AnalysisRequest,
    ) -> Result<&AttemptState, SessionError> {
        let ticket = self.begin(request)?;
        let outcome = capability.generate(request, &ticket.cancel_handle());
        self.complete(&ticket, outcome)
    }

    fn check_in_flight(&self, ticket: &AttemptTicket) -> Result<(), SessionError> {
        match &self.state {
            AttemptState::Requesting { attempt, .. } if *attempt == ticket.attempt => Ok(()),
            _ => {
                warn!(
                    "attempt {:?} is not in flight, current state: {:?}",
                    ticket.attempt, self.state
                );
                StaleTicketSnafu {
                    attempt: ticket.attempt,
                }
                .fail()
            }
        }
    }
}
