//! Search control: stop flag, clock and node budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// What a single `think` call is allowed to spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchLimits {
    /// Deepest iteration to start. `None` searches until another limit hits.
    pub depth: Option<u8>,
    /// Wall-clock budget for the whole search.
    pub movetime: Option<Duration>,
    /// Node budget for the whole search.
    pub nodes: Option<u64>,
}

impl SearchLimits {
    /// Limits that stop after the given iteration.
    pub fn depth(depth: u8) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// Build the control for these limits around a shared stop flag.
    ///
    /// A movetime becomes the hard limit; no new iteration starts after half
    /// of it has elapsed.
    pub fn control(&self, stopped: Arc<AtomicBool>) -> SearchControl {
        let control = match self.movetime {
            Some(movetime) => SearchControl::new_timed(stopped, movetime / 2, movetime),
            None => SearchControl::new_infinite(stopped),
        };
        match self.nodes {
            Some(nodes) => control.with_node_limit(nodes),
            None => control,
        }
    }
}

/// Decides when a search has to stop.
///
/// The stop flag can be raised from any thread through [`stop`](Self::stop)
/// or through the `Arc` the control was built around. The search itself polls
/// [`should_stop`](Self::should_stop) at a fixed node interval and consults
/// [`should_stop_iterating`](Self::should_stop_iterating) between iterations.
#[derive(Debug)]
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
    node_limit: Option<u64>,
}

impl SearchControl {
    /// Control with no clock: only the stop flag (and a node limit, if set)
    /// ends the search.
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            soft_limit: None,
            hard_limit: None,
            node_limit: None,
        }
    }

    /// Control with a soft limit (no new iteration) and a hard limit (abort).
    /// The clock starts now.
    pub fn new_timed(stopped: Arc<AtomicBool>, soft: Duration, hard: Duration) -> Self {
        Self {
            soft_limit: Some(soft),
            hard_limit: Some(hard),
            ..Self::new_infinite(stopped)
        }
    }

    /// Abort once the search has visited `nodes` nodes.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// Ask the search to stop as soon as it next polls.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether the stop flag is raised.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Whether the in-flight search must abort now.
    ///
    /// Trips on the stop flag, the hard time limit or the node limit. Either
    /// limit raises the stop flag so later checks return immediately.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.is_stopped() {
            return true;
        }

        let out_of_nodes = self.node_limit.is_some_and(|limit| nodes >= limit);
        let out_of_time = self.hard_limit.is_some_and(|hard| self.elapsed() >= hard);
        if out_of_nodes || out_of_time {
            self.stop();
            return true;
        }

        false
    }

    /// Whether another iteration should not be started.
    pub fn should_stop_iterating(&self, nodes: u64) -> bool {
        if self.is_stopped() {
            return true;
        }
        if self.node_limit.is_some_and(|limit| nodes >= limit) {
            return true;
        }
        self.soft_limit.is_some_and(|soft| self.elapsed() >= soft)
    }

    /// Time since the control was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_only_stops_on_flag() {
        let control = SearchControl::new_infinite(Arc::new(AtomicBool::new(false)));
        assert!(!control.should_stop(u64::MAX));
        assert!(!control.should_stop_iterating(u64::MAX));
        control.stop();
        assert!(control.should_stop(0));
        assert!(control.should_stop_iterating(0));
    }

    #[test]
    fn stop_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let control = SearchControl::new_infinite(Arc::clone(&flag));
        flag.store(true, Ordering::Relaxed);
        assert!(control.is_stopped());
    }

    #[test]
    fn node_limit_raises_flag() {
        let control = SearchControl::new_infinite(Arc::new(AtomicBool::new(false))).with_node_limit(1_000);
        assert!(!control.should_stop(999));
        assert!(control.should_stop(1_000));
        assert!(control.is_stopped());
    }

    #[test]
    fn expired_hard_limit_aborts() {
        let control = SearchControl::new_timed(Arc::new(AtomicBool::new(false)), Duration::ZERO, Duration::ZERO);
        assert!(control.should_stop_iterating(0));
        assert!(control.should_stop(0));
    }

    #[test]
    fn generous_clock_keeps_going() {
        let hour = Duration::from_secs(3600);
        let control = SearchControl::new_timed(Arc::new(AtomicBool::new(false)), hour, hour);
        assert!(!control.should_stop(10_000));
        assert!(!control.should_stop_iterating(10_000));
    }

    #[test]
    fn limits_build_matching_control() {
        let limits = SearchLimits {
            movetime: Some(Duration::from_secs(3600)),
            nodes: Some(50),
            ..SearchLimits::default()
        };
        let control = limits.control(Arc::new(AtomicBool::new(false)));
        assert!(!control.should_stop(49));
        assert!(control.should_stop(50));
        assert_eq!(SearchLimits::depth(3).depth, Some(3));
    }
}
