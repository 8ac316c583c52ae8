use crate::error::ConnectivityError;
use crate::puzzle_sliding16::board::Board;
use crate::puzzle_sliding16::neighbors::Direction;
use crate::reference::{ReferenceAccumulator, ReferenceBoard, ReferenceMoves, ReferenceVerifier, SolverContext};
use std::fmt;
use std::sync::Arc;
use log::{info, warn};

/// Operations of the reference cache, possibly provided by another process.
///
/// Every call can fail with [`ConnectivityError`], which is reported at the call boundary.
/// A failed call must not leave the cache in an inconsistent state.
///
/// Solvers call the service synchronously from the search. Implementations that talk to another
/// process must bound the time of each call and return [`ConnectivityError::TimedOut`] when the bound
/// is exceeded, instead of blocking the solver.
pub trait ReferenceService: Send + Sync {
    fn active_map(&self) -> Result<Vec<(ReferenceBoard, ReferenceMoves)>, ConnectivityError>;

    fn cutoff_setting(&self) -> Result<u8, ConnectivityError>;

    fn cutoff_limit(&self) -> Result<u8, ConnectivityError>;

    fn lookup_exact(&self, board: &Board) -> Result<Option<ReferenceMoves>, ConnectivityError>;

    fn boost_estimate(&self, board: &Board, estimate: u8) -> Result<u8, ConnectivityError>;

    fn add_board(&self, board: &Board, moves: u8, solution: &[Direction], context: &SolverContext) -> Result<bool, ConnectivityError>;

    fn update_pending(&self, verifier: Option<&mut dyn ReferenceVerifier>) -> Result<usize, ConnectivityError>;

    fn update_last_search(&self, board: &Board, verifier: Option<&mut dyn ReferenceVerifier>) -> Result<bool, ConnectivityError>;

    fn invalidate(&self, board: &Board) -> Result<bool, ConnectivityError>;
}

/// Local cache never fails.
impl ReferenceService for ReferenceAccumulator {
    fn active_map(&self) -> Result<Vec<(ReferenceBoard, ReferenceMoves)>, ConnectivityError> {
        Ok(ReferenceAccumulator::active_map(self))
    }

    fn cutoff_setting(&self) -> Result<u8, ConnectivityError> {
        Ok(ReferenceAccumulator::cutoff_setting(self))
    }

    fn cutoff_limit(&self) -> Result<u8, ConnectivityError> {
        Ok(ReferenceAccumulator::cutoff_limit(self))
    }

    fn lookup_exact(&self, board: &Board) -> Result<Option<ReferenceMoves>, ConnectivityError> {
        Ok(ReferenceAccumulator::lookup_exact(self, board))
    }

    fn boost_estimate(&self, board: &Board, estimate: u8) -> Result<u8, ConnectivityError> {
        Ok(ReferenceAccumulator::boost_estimate(self, board, estimate))
    }

    fn add_board(&self, board: &Board, moves: u8, solution: &[Direction], context: &SolverContext) -> Result<bool, ConnectivityError> {
        Ok(ReferenceAccumulator::add_board(self, board, moves, solution, context))
    }

    fn update_pending(&self, verifier: Option<&mut dyn ReferenceVerifier>) -> Result<usize, ConnectivityError> {
        Ok(ReferenceAccumulator::update_pending(self, verifier))
    }

    fn update_last_search(&self, board: &Board, verifier: Option<&mut dyn ReferenceVerifier>) -> Result<bool, ConnectivityError> {
        Ok(ReferenceAccumulator::update_last_search(self, board, verifier))
    }

    fn invalidate(&self, board: &Board) -> Result<bool, ConnectivityError> {
        Ok(ReferenceAccumulator::invalidate(self, board))
    }
}

/// What happens to a connection whose remote service has failed.
#[derive(Clone)]
pub enum FallbackPolicy {
    /// Continue with the given local cache.
    LocalOnly(Arc<ReferenceAccumulator>),
    /// Continue without any cache.
    Disable
}

/// Kind of the cache used by a solver.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConnectionType {
    RemoteServer,
    Standalone,
    Disabled
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionType::RemoteServer => "remote server",
            ConnectionType::Standalone => "standalone",
            ConnectionType::Disabled => "disabled",
        })
    }
}

enum Link {
    Remote(Arc<dyn ReferenceService>, FallbackPolicy),
    Standalone(Arc<ReferenceAccumulator>),
    Disabled
}

/// Connection of a solver to the reference cache.
///
/// A failure of the remote service never reaches the solver:
/// it is logged and the connection falls back according to its [`FallbackPolicy`].
pub struct ReferenceConnection {
    link: Link
}

impl Default for ReferenceConnection {
    fn default() -> Self { Self::disabled() }
}

impl ReferenceConnection {
    pub fn disabled() -> Self { Self { link: Link::Disabled } }

    pub fn standalone(accumulator: Arc<ReferenceAccumulator>) -> Self {
        Self { link: Link::Standalone(accumulator) }
    }

    pub fn remote(service: Arc<dyn ReferenceService>, fallback: FallbackPolicy) -> Self {
        Self { link: Link::Remote(service, fallback) }
    }

    pub fn connection_type(&self) -> ConnectionType {
        match self.link {
            Link::Remote(..) => ConnectionType::RemoteServer,
            Link::Standalone(_) => ConnectionType::Standalone,
            Link::Disabled => ConnectionType::Disabled,
        }
    }

    #[inline] pub fn is_enabled(&self) -> bool { !matches!(self.link, Link::Disabled) }

    fn fall_back(&mut self, error: &ConnectivityError) {
        let link = std::mem::replace(&mut self.link, Link::Disabled);
        self.link = match link {
            Link::Remote(_, FallbackPolicy::LocalOnly(local)) => {
                warn!("reference service failed ({}), switching to the local cache", error);
                Link::Standalone(local)
            }
            _ => {
                warn!("reference service failed ({}), the cache is disabled", error);
                Link::Disabled
            }
        };
    }

    /// Calls `op` on the current service. Falls back and retries if the service fails.
    /// Returns `None` if the cache is (or has become) disabled.
    pub fn call<T>(&mut self, mut op: impl FnMut(&dyn ReferenceService) -> Result<T, ConnectivityError>) -> Option<T> {
        loop {
            let result = match &self.link {
                Link::Remote(service, _) => op(service.as_ref()),
                Link::Standalone(local) => op(local.as_ref()),
                Link::Disabled => return None,
            };
            match result {
                Ok(value) => return Some(value),
                Err(error) => self.fall_back(&error),
            }
        }
    }

    /// Replaces the connection by the one to `service`, after checking that the service responds.
    ///
    /// If it does not, the connection falls back immediately and the error is returned.
    pub fn reconnect(&mut self, service: Arc<dyn ReferenceService>, fallback: FallbackPolicy) -> Result<(), ConnectivityError> {
        match service.cutoff_setting() {
            Ok(cutoff) => {
                info!("connected to reference service with cutoff {}", cutoff);
                self.link = Link::Remote(service, fallback);
                Ok(())
            }
            Err(error) => {
                self.link = Link::Remote(service, fallback);
                self.fall_back(&error);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle_sliding16::heuristic::HeuristicKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Service whose every call fails, either at once or after its time bound.
    struct Unreachable { calls: AtomicUsize, timeout_ms: Option<u64> }

    impl Unreachable {
        fn fail<T>(&self) -> Result<T, ConnectivityError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Err(match self.timeout_ms {
                Some(ms) => ConnectivityError::TimedOut(ms),
                None => ConnectivityError::Unreachable("test".to_owned())
            })
        }
    }

    impl ReferenceService for Unreachable {
        fn active_map(&self) -> Result<Vec<(ReferenceBoard, ReferenceMoves)>, ConnectivityError> { self.fail() }
        fn cutoff_setting(&self) -> Result<u8, ConnectivityError> { self.fail() }
        fn cutoff_limit(&self) -> Result<u8, ConnectivityError> { self.fail() }
        fn lookup_exact(&self, _board: &Board) -> Result<Option<ReferenceMoves>, ConnectivityError> { self.fail() }
        fn boost_estimate(&self, _board: &Board, _estimate: u8) -> Result<u8, ConnectivityError> { self.fail() }
        fn add_board(&self, _board: &Board, _moves: u8, _solution: &[Direction], _context: &SolverContext) -> Result<bool, ConnectivityError> { self.fail() }
        fn update_pending(&self, _verifier: Option<&mut dyn ReferenceVerifier>) -> Result<usize, ConnectivityError> { self.fail() }
        fn update_last_search(&self, _board: &Board, _verifier: Option<&mut dyn ReferenceVerifier>) -> Result<bool, ConnectivityError> { self.fail() }
        fn invalidate(&self, _board: &Board) -> Result<bool, ConnectivityError> { self.fail() }
    }

    fn unreachable() -> Arc<Unreachable> { Arc::new(Unreachable { calls: AtomicUsize::new(0), timeout_ms: None }) }

    #[test]
    fn test_fallback_to_local() {
        let local = Arc::new(ReferenceAccumulator::new(5, 8, 4));
        let remote = unreachable();
        let mut connection = ReferenceConnection::remote(remote.clone(), FallbackPolicy::LocalOnly(local.clone()));
        assert_eq!(connection.connection_type(), ConnectionType::RemoteServer);
        assert_eq!(connection.call(|s| s.cutoff_setting()), Some(5));
        assert_eq!(connection.connection_type(), ConnectionType::Standalone);
        assert_eq!(remote.calls.load(Ordering::Relaxed), 1);
        let context = SolverContext { kind: HeuristicKind::PatternDatabase, side: 3, boosted: false };
        let board = Board::goal(3).apply(&[Direction::Right, Direction::Down]).unwrap();
        assert_eq!(connection.call(|s| s.add_board(&board, 6, &[], &context)), Some(true));
        assert_eq!(local.lookup_exact(&board).map(|r| r.moves), Some(6));
        assert_eq!(remote.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_fallback_to_disabled() {
        let remote = unreachable();
        let mut connection = ReferenceConnection::remote(remote.clone(), FallbackPolicy::Disable);
        assert!(connection.is_enabled());
        assert_eq!(connection.call(|s| s.lookup_exact(&Board::goal(4))), None);
        assert_eq!(connection.connection_type(), ConnectionType::Disabled);
        assert!(!connection.is_enabled());
        assert_eq!(connection.call(|s| s.cutoff_limit()), None);
        assert_eq!(remote.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_timed_out_call_falls_back() {
        assert_eq!(ConnectivityError::TimedOut(250).to_string(), "reference service did not answer within 250 ms");
        let local = Arc::new(ReferenceAccumulator::new(5, 8, 4));
        let remote = Arc::new(Unreachable { calls: AtomicUsize::new(0), timeout_ms: Some(250) });
        let mut connection = ReferenceConnection::remote(remote.clone(), FallbackPolicy::LocalOnly(local));
        assert_eq!(connection.call(|s| s.lookup_exact(&Board::goal(3))), Some(None));
        assert_eq!(connection.connection_type(), ConnectionType::Standalone);
        assert_eq!(connection.call(|s| s.cutoff_limit()), Some(4));
        assert_eq!(remote.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_reconnect() {
        let mut connection = ReferenceConnection::default();
        assert_eq!(connection.connection_type(), ConnectionType::Disabled);
        let local = Arc::new(ReferenceAccumulator::new(46, 8, 8));
        assert!(connection.reconnect(unreachable(), FallbackPolicy::LocalOnly(local.clone())).is_err());
        assert_eq!(connection.connection_type(), ConnectionType::Standalone);
        let remote: Arc<dyn ReferenceService> = Arc::new(ReferenceAccumulator::new(40, 8, 8));
        assert!(connection.reconnect(remote, FallbackPolicy::Disable).is_ok());
        assert_eq!(connection.connection_type(), ConnectionType::RemoteServer);
        assert_eq!(connection.call(|s| s.cutoff_limit()), Some(38));
        assert_eq!(ConnectionType::Standalone.to_string(), "standalone");
    }
}
