use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::host::{DomError, HostDom};
use crate::view::matcher::sample_headings;

/// Where a "navigation may have occurred" signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavSource {
    Startup,
    Push,
    Replace,
    PopState,
    HeadingPoll,
    /// A full document load (reload or hard navigation) replaced the page.
    Reload,
}

/// The host's history entry points.
pub trait History {
    fn push_state(&mut self, url: &str);
    fn replace_state(&mut self, url: &str);
}

impl<H: History + ?Sized> History for &mut H {
    fn push_state(&mut self, url: &str) {
        (**self).push_state(url);
    }

    fn replace_state(&mut self, url: &str) {
        (**self).replace_state(url);
    }
}

/// Cloneable sender half of the navigation stream.
#[derive(Debug, Clone)]
pub struct NavigationHandle {
    tx: Sender<NavSource>,
}

impl NavigationHandle {
    pub fn notify(&self, source: NavSource) {
        // The receiver lives as long as the runtime; a send after shutdown is moot.
        let _ = self.tx.send(source);
    }
}

/// History decorator: runs the original entry point unchanged, then signals.
pub struct InterceptedHistory<H> {
    inner: H,
    handle: NavigationHandle,
}

impl<H: History> History for InterceptedHistory<H> {
    fn push_state(&mut self, url: &str) {
        self.inner.push_state(url);
        self.handle.notify(NavSource::Push);
    }

    fn replace_state(&mut self, url: &str) {
        self.inner.replace_state(url);
        self.handle.notify(NavSource::Replace);
    }
}

/// Process-wide stream of navigation signals.
///
/// Created once at startup and kept for the page lifetime. Wrapped history
/// entry points and popstate feed the channel; `poll` adds the low-frequency
/// heading check for transitions that touch neither.
pub struct NavigationSignal {
    tx: Sender<NavSource>,
    rx: Receiver<NavSource>,
    poll_interval: Duration,
    next_poll: Option<DateTime<Utc>>,
    last_heading: String,
}

impl NavigationSignal {
    pub fn new(poll_interval: Duration) -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            poll_interval,
            next_poll: None,
            last_heading: String::new(),
        }
    }

    pub fn handle(&self) -> NavigationHandle {
        NavigationHandle {
            tx: self.tx.clone(),
        }
    }

    /// Wrap a history implementation so its push/replace calls signal here.
    pub fn intercept<H: History>(&self, history: H) -> InterceptedHistory<H> {
        InterceptedHistory {
            inner: history,
            handle: self.handle(),
        }
    }

    pub fn drain(&self) -> Vec<NavSource> {
        self.rx.try_iter().collect()
    }

    /// Record the current heading without signalling, so a transition that
    /// was already handled is not reported again by the poll.
    pub fn prime<D: HostDom>(&mut self, dom: &mut D) -> Result<(), DomError> {
        self.last_heading = sample_headings(dom)?.join(",");
        Ok(())
    }

    /// Fallback poll. Returns a signal when the sampled heading text differs
    /// from the last observed value; does nothing before the interval elapses.
    pub fn poll<D: HostDom>(
        &mut self,
        dom: &mut D,
        now: DateTime<Utc>,
    ) -> Result<Option<NavSource>, DomError> {
        if let Some(due) = self.next_poll {
            if now < due {
                return Ok(None);
            }
        }
        let step = TimeDelta::from_std(self.poll_interval).unwrap_or(TimeDelta::zero());
        self.next_poll = Some(now + step);

        let heading = sample_headings(dom)?.join(",");
        if heading == self.last_heading {
            return Ok(None);
        }
        debug!(from = %self.last_heading, to = %heading, "heading changed");
        self.last_heading = heading;
        Ok(Some(NavSource::HeadingPoll))
    }
}
