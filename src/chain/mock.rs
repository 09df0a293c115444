//! Scripted in-memory chain
//!
//! Answers queries from a table, fails chosen submission steps and returns
//! canned confirmation logs. Every query, build and submission is recorded.

use super::*;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct MockChain {
    chain: ChainId,
    answers: Mutex<HashMap<StateQuery, Result<StateValue, ChainError>>>,
    /// Track calls for verification
    queries: Mutex<Vec<StateQuery>>,
    built: Mutex<Vec<Vec<ComposedOperation>>>,
    submitted: Mutex<Vec<NativeSubmission>>,
    submit_count: AtomicUsize,
    /// Configured behavior
    fail_build_at: Mutex<Option<(usize, ChainError)>>,
    fail_submit_at: Mutex<Option<(usize, ChainError)>>,
    omit_signers: Mutex<bool>,
    logs: Mutex<Vec<LogRecord>>,
}

impl MockChain {
    pub fn new(chain: ChainId) -> Self {
        Self {
            chain,
            answers: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            built: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            submit_count: AtomicUsize::new(0),
            fail_build_at: Mutex::new(None),
            fail_submit_at: Mutex::new(None),
            omit_signers: Mutex::new(false),
            logs: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(&self, query: StateQuery, value: StateValue) {
        self.answers.lock().unwrap().insert(query, Ok(value));
    }

    pub fn fail_query(&self, query: StateQuery, err: ChainError) {
        self.answers.lock().unwrap().insert(query, Err(err));
    }

    /// Fail the `step`-th build call (0-based)
    pub fn fail_build_at(&self, step: usize, err: ChainError) {
        *self.fail_build_at.lock().unwrap() = Some((step, err));
    }

    /// Fail the `step`-th submit call (0-based)
    pub fn fail_submit_at(&self, step: usize, err: ChainError) {
        *self.fail_submit_at.lock().unwrap() = Some((step, err));
    }

    /// Builder forgets to list ephemeral co-signers
    pub fn set_omit_signers(&self, omit: bool) {
        *self.omit_signers.lock().unwrap() = omit;
    }

    /// Logs returned with every confirmation
    pub fn set_logs(&self, logs: Vec<LogRecord>) {
        *self.logs.lock().unwrap() = logs;
    }

    pub fn queries(&self) -> Vec<StateQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn built(&self) -> Vec<Vec<ComposedOperation>> {
        self.built.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<NativeSubmission> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn query(&self, query: &StateQuery) -> Result<StateValue, ChainError> {
        self.queries.lock().unwrap().push(query.clone());
        match self.answers.lock().unwrap().get(query) {
            Some(answer) => answer.clone(),
            None => Err(ChainError::Rpc(format!("no scripted answer for {:?}", query))),
        }
    }

    async fn build(&self, ops: &[ComposedOperation]) -> Result<NativeSubmission, ChainError> {
        let step = {
            let mut built = self.built.lock().unwrap();
            built.push(ops.to_vec());
            built.len() - 1
        };
        if let Some((at, err)) = self.fail_build_at.lock().unwrap().as_ref() {
            if *at == step {
                return Err(err.clone());
            }
        }

        let message = Sha256::digest(format!("{:?}", ops).as_bytes()).to_vec();
        let required_signers = if *self.omit_signers.lock().unwrap() {
            Vec::new()
        } else {
            ops.iter().flat_map(|op| op.ephemeral_signers()).collect()
        };
        Ok(NativeSubmission {
            chain: self.chain,
            message,
            required_signers,
            signatures: Vec::new(),
        })
    }

    async fn submit(&self, submission: NativeSubmission) -> Result<ConfirmedResult, ChainError> {
        let step = self.submit_count.fetch_add(1, Ordering::SeqCst);
        if let Some((at, err)) = self.fail_submit_at.lock().unwrap().as_ref() {
            if *at == step {
                return Err(err.clone());
            }
        }
        self.submitted.lock().unwrap().push(submission);
        Ok(ConfirmedResult {
            chain: self.chain,
            tx_id: format!("mock-{}-{}", self.chain, step),
            logs: self.logs.lock().unwrap().clone(),
        })
    }
}
