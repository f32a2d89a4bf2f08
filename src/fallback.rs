// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Ordered alternatives for fetching one thing.
//!
//! Each step runs at most once, in order, and the first step producing a
//! value ends the chain. A step that fails or produces nothing hands over to
//! the next one. There is no backoff and no second attempt at the same step.

use anyhow::Result;
use futures_util::future::BoxFuture;
use std::future::Future;
use tracing::debug;

type StepFn<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<Option<T>>> + Send + 'a>;

struct Step<'a, T> {
    label: String,
    run: StepFn<'a, T>,
}

pub struct FallbackChain<'a, T> {
    name: &'static str,
    steps: Vec<Step<'a, T>>,
}

impl<'a, T: Send + 'a> FallbackChain<'a, T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step<F, Fut>(mut self, label: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<Option<T>>> + Send + 'a,
    {
        self.steps.push(Step {
            label: label.into(),
            run: Box::new(move || Box::pin(f())),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(self) -> Option<T> {
        for step in self.steps {
            match (step.run)().await {
                Ok(Some(value)) => {
                    debug!("{}: using {}", self.name, step.label);
                    return Some(value);
                }
                Ok(None) => debug!("{}: {} gave nothing", self.name, step.label),
                Err(e) => debug!("{}: {} failed: {:#}", self.name, step.label, e),
            }
        }
        debug!("{}: all alternatives exhausted", self.name);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn stops_at_first_value() {
        let calls = &AtomicUsize::new(0);
        let result = FallbackChain::new("test")
            .step("fails", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("boom"))
            })
            .step("empty", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .step("hit", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some(7))
            })
            .step("never", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some(8))
            })
            .run()
            .await;

        assert_eq!(result, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_chain_yields_none() {
        let chain: FallbackChain<'_, u8> = FallbackChain::new("test")
            .step("a", || async { Ok(None) })
            .step("b", || async { Err(anyhow::anyhow!("down")) });
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.run().await, None);
    }
}
