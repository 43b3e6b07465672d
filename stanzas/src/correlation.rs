//! Tracking of Iq requests and correlation of their replies.

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use jid::Jid;
use minidom::Element;
use tokio::sync::oneshot;

use crate::iq::{Iq, IqType};
use crate::stanza::make_id;
use crate::stanza_error::StanzaError;

/// An Iq request payload.
pub enum IqRequest {
    /// Payload for a `type="get"` request.
    Get(Element),

    /// Payload for a `type="set"` request.
    Set(Element),
}

impl From<IqRequest> for IqType {
    fn from(other: IqRequest) -> IqType {
        match other {
            IqRequest::Get(v) => IqType::Get(v),
            IqRequest::Set(v) => IqType::Set(v),
        }
    }
}

/// An Iq response payload.
#[derive(Debug, PartialEq)]
pub enum IqResponse {
    /// Payload for a `type="result"` response.
    Result(Option<Element>),

    /// Payload for a `type="error"` response.
    Error(StanzaError),
}

impl From<IqResponse> for IqType {
    fn from(other: IqResponse) -> IqType {
        match other {
            IqResponse::Result(v) => IqType::Result(v),
            IqResponse::Error(v) => IqType::Error(v),
        }
    }
}

/// The tracker for a request was torn down before its reply arrived.
///
/// Whatever owned the [`ReplyTracker`] is gone, so the reply can never
/// be delivered.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestDropped;

impl fmt::Display for RequestDropped {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("request tracking was dropped before a reply arrived")
    }
}

impl core::error::Error for RequestDropped {}

type ReplyMap = BTreeMap<String, ReplySink>;

struct MapEntryHandle {
    id: String,
    map: Weak<Mutex<ReplyMap>>,
}

impl Drop for MapEntryHandle {
    fn drop(&mut self) {
        let Some(map) = self.map.upgrade() else {
            return;
        };
        let Some(mut map) = map.lock().ok() else {
            return;
        };
        map.remove(&self.id);
    }
}

pin_project_lite::pin_project! {
    /// Handle for awaiting the reply to a tracked request.
    ///
    /// The `ReplyToken` can be awaited and will generate a result once
    /// the reply has been received. Note that an `Ok(_)` result does
    /// **not** imply a successful execution of the remote operation:
    /// it may contain an [`IqResponse::Error`] variant.
    ///
    /// There are no internal timeouts: if a reply never arrives, the
    /// future never completes. Most of the time, you should combine
    /// the token with something like [`tokio::time::timeout`].
    ///
    /// Dropping (cancelling) a `ReplyToken` removes the internal
    /// bookkeeping required for tracking the reply; a reply arriving
    /// afterwards is anomalous.
    pub struct ReplyToken {
        entry: Option<MapEntryHandle>,
        #[pin]
        inner: oneshot::Receiver<IqResponse>,
    }
}

impl Future for ReplyToken {
    type Output = Result<IqResponse, RequestDropped>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.inner.poll(cx) {
            Poll::Ready(Ok(v)) => {
                // Drop the map entry handle to release some memory.
                this.entry.take();
                Poll::Ready(Ok(v))
            }
            Poll::Ready(Err(_)) => {
                this.entry.take();
                Poll::Ready(Err(RequestDropped))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

struct ReplySink {
    inner: oneshot::Sender<IqResponse>,
}

impl ReplySink {
    fn complete(self, resp: IqResponse) {
        // The receiving token may have been dropped concurrently; that
        // is its way of cancelling and not an error here.
        let _: Result<_, _> = self.inner.send(resp);
    }
}

/// What an incoming Iq turned out to be, from the tracker's point of
/// view.
#[derive(Debug)]
pub enum Correlated {
    /// The Iq was the reply to a tracked request and has been handed
    /// to the awaiting [`ReplyToken`].
    Delivered,

    /// The Iq was a reply, but nothing was waiting for it: its id is
    /// unknown, already resolved, or was cancelled. The stanza is
    /// handed back; dropping it is the caller's decision.
    Anomalous(Iq),

    /// The Iq was not a reply at all but a fresh request, to be
    /// handled by whatever answers requests.
    Unrelated(Iq),
}

/// Utility struct to track requests and correlate their replies.
///
/// Tracking is opt-in by construction: only [`ReplyTracker::track`]
/// creates tokens, so replies the tracker never asked for can be told
/// apart from replies it is waiting on.
pub struct ReplyTracker {
    map: Arc<Mutex<ReplyMap>>,
}

impl ReplyTracker {
    /// Create a new empty tracker.
    pub fn new() -> ReplyTracker {
        ReplyTracker {
            map: Arc::new(Mutex::new(ReplyMap::new())),
        }
    }

    /// Allocate a tracking handle for a request.
    ///
    /// A fresh process-unique id is assigned to the request; the
    /// returned Iq is ready to send, and the returned token resolves
    /// when the reply with that id comes through
    /// [`ReplyTracker::correlate`].
    pub fn track(&self, from: Option<Jid>, to: Option<Jid>, req: IqRequest) -> (Iq, ReplyToken) {
        let id = make_id();
        let (tx, rx) = oneshot::channel();
        let sink = ReplySink { inner: tx };
        let token = ReplyToken {
            entry: Some(MapEntryHandle {
                id: id.clone(),
                map: Arc::downgrade(&self.map),
            }),
            inner: rx,
        };
        let mut map = self.map.lock().unwrap();
        map.insert(id.clone(), sink);
        (
            Iq {
                from,
                to,
                id,
                lang: None,
                payload: req.into(),
            },
            token,
        )
    }

    /// Attempt to handle an incoming Iq as the reply to a tracked
    /// request.
    pub fn correlate(&self, iq: Iq) -> Correlated {
        let Iq {
            from,
            to,
            id,
            lang,
            payload,
        } = iq;
        let response = match payload {
            IqType::Result(result) => IqResponse::Result(result),
            IqType::Error(error) => IqResponse::Error(error),
            payload => {
                return Correlated::Unrelated(Iq {
                    from,
                    to,
                    id,
                    lang,
                    payload,
                })
            }
        };
        let mut map = self.map.lock().unwrap();
        match map.remove(&id) {
            Some(sink) => {
                sink.complete(response);
                Correlated::Delivered
            }
            None => {
                log::warn!(
                    "reply from {:?} with id {:?} matches no tracked request",
                    from,
                    id
                );
                Correlated::Anomalous(Iq {
                    from,
                    to,
                    id,
                    lang,
                    payload: response.into(),
                })
            }
        }
    }
}

impl Default for ReplyTracker {
    fn default() -> ReplyTracker {
        ReplyTracker::new()
    }
}
