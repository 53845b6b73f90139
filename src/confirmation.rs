/// Confirmation port
///
/// The stepper asks the host to confirm a navigation through this port and
/// never renders anything itself. The host answers through a one-shot
/// `ConfirmationResponder`, either right away or later from its UI loop.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::config::ConfirmDialogOptions;
use crate::stepper::Direction;

/// Answer to a confirmation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// What the host should ask the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub direction: Direction,
    pub message: Option<String>,
    pub header: Option<String>,
    pub icon: Option<String>,
    pub accept_label: Option<String>,
    pub reject_label: Option<String>,
}

impl ConfirmationRequest {
    pub fn new(direction: Direction, options: &ConfirmDialogOptions) -> Self {
        Self {
            direction,
            message: options.message.clone(),
            header: options.header.clone(),
            icon: Some(direction.icon().to_string()),
            accept_label: options.accept_label.clone(),
            reject_label: options.reject_label.clone(),
        }
    }
}

/// One-shot reply handle; dropping it unanswered counts as a rejection
#[derive(Debug)]
pub struct ConfirmationResponder {
    reply: Sender<Decision>,
}

impl ConfirmationResponder {
    pub fn accept(self) {
        self.respond(Decision::Accept);
    }

    pub fn reject(self) {
        self.respond(Decision::Reject);
    }

    pub fn respond(self, decision: Decision) {
        // The stepper may have been dropped while the dialog was open
        let _ = self.reply.send(decision);
    }
}

/// Create a responder and the receiver the stepper waits on
pub(crate) fn reply_channel() -> (ConfirmationResponder, Receiver<Decision>) {
    let (tx, rx) = bounded(1);
    (ConfirmationResponder { reply: tx }, rx)
}

/// Capability the host supplies to ask the user for confirmation
pub trait ConfirmationPort {
    fn confirm(&self, request: ConfirmationRequest, responder: ConfirmationResponder);
}

impl<F> ConfirmationPort for F
where
    F: Fn(ConfirmationRequest, ConfirmationResponder),
{
    fn confirm(&self, request: ConfirmationRequest, responder: ConfirmationResponder) {
        self(request, responder)
    }
}

/// Port answering every request with a fixed decision
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub Decision);

impl ConfirmationPort for AutoConfirm {
    fn confirm(&self, request: ConfirmationRequest, responder: ConfirmationResponder) {
        tracing::debug!("Auto-answering {} confirmation: {:?}", request.direction, self.0);
        responder.respond(self.0);
    }
}

/// A request waiting for the host UI
#[derive(Debug)]
pub struct PendingConfirmation {
    pub request: ConfirmationRequest,
    pub responder: ConfirmationResponder,
}

/// Port forwarding requests to a receiver owned by the host UI loop
#[derive(Debug, Clone)]
pub struct ChannelConfirmationPort {
    requests: Sender<PendingConfirmation>,
}

impl ChannelConfirmationPort {
    pub fn new() -> (Self, Receiver<PendingConfirmation>) {
        let (tx, rx) = unbounded();
        (Self { requests: tx }, rx)
    }
}

impl ConfirmationPort for ChannelConfirmationPort {
    fn confirm(&self, request: ConfirmationRequest, responder: ConfirmationResponder) {
        if let Err(e) = self.requests.send(PendingConfirmation { request, responder }) {
            // Receiver is gone; the responder drops with the message, i.e. rejects
            tracing::warn!("Confirmation UI not listening: {}", e);
        }
    }
}
