//! An ordered sequence of currently-trusted proxies with constant-time
//! pop-front / push-back. Not thread-safe by itself; all mutation is
//! serialized through `ProxyManager`'s two loops (serve, return-drain).

use std::collections::VecDeque;

use crate::types::ProxyAddress;

#[derive(Debug, Default)]
pub struct ProxyQueue {
    inner: VecDeque<ProxyAddress>,
}

impl ProxyQueue {
    pub fn new() -> Self {
        ProxyQueue {
            inner: VecDeque::new(),
        }
    }

    pub fn from_candidates(candidates: Vec<ProxyAddress>) -> Self {
        ProxyQueue {
            inner: candidates.into_iter().collect(),
        }
    }

    pub fn pop_front(&mut self) -> Option<ProxyAddress> {
        self.inner.pop_front()
    }

    pub fn push_back(&mut self, proxy: ProxyAddress) {
        self.inner.push_back(proxy);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
