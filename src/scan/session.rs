// src/scan/session.rs
// =============================================================================
// The mutable state of one scan.
//
// Holds:
// - the retained results (those the status filter lets through)
// - the cancellation token every producer, worker and collector listens to
//
// All appends go through the single write lock; readers get copies.
// =============================================================================

use crate::probe::ProbeResult;
use crate::scan::filter::StatusFilter;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct ScanSession {
    results: RwLock<Vec<ProbeResult>>,
    filter: StatusFilter,
    cancel: CancellationToken,
}

impl ScanSession {
    pub fn new(filter: StatusFilter) -> Self {
        Self {
            results: RwLock::new(Vec::new()),
            filter,
            cancel: CancellationToken::new(),
        }
    }

    /// Appends `result` if the status filter retains it; returns whether it did
    pub async fn add(&self, result: ProbeResult) -> bool {
        if !self.filter.retains(result.status) {
            return false;
        }
        self.results.write().await.push(result);
        true
    }

    /// Copy of the retained results
    pub async fn snapshot(&self) -> Vec<ProbeResult> {
        self.results.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn result(status: u16) -> ProbeResult {
        let mut r = ProbeResult::new("https://h/", "p", "https://h/p");
        r.status = Some(status);
        r
    }

    #[tokio::test]
    async fn test_add_applies_filter() {
        let session = ScanSession::new(StatusFilter::new(&[], &["404".to_string()]));
        assert!(session.add(result(200)).await);
        assert!(!session.add(result(404)).await);
        assert_eq!(session.len().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_a_copy() {
        let session = ScanSession::new(StatusFilter::default());
        session.add(result(200)).await;

        let mut snapshot = session.snapshot().await;
        snapshot.clear();
        assert_eq!(session.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds() {
        let session = Arc::new(ScanSession::new(StatusFilter::default()));
        let mut handles = Vec::new();
        for i in 0..50u16 {
            let session = Arc::clone(&session);
            handles.push(tokio::spawn(async move { session.add(result(200 + i)).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(session.len().await, 50);
    }

    #[test]
    fn test_cancel() {
        let session = ScanSession::new(StatusFilter::default());
        let token = session.cancel_token();
        assert!(!token.is_cancelled());
        session.cancel();
        assert!(token.is_cancelled());
        assert!(session.is_cancelled());
    }
}
