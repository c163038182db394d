//! Suite execution
//!
//! Builds every operation's suite, then drains the variants through a
//! bounded pool of scoped worker threads pulling from a shared cursor.
//! Rows come back in generation order regardless of completion order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use negcase_core::report::{MAX_SNIPPET_BYTES, truncate_snippet};
use negcase_core::{
    Config, ExpectationPolicy, GenerationOptions, KeywordPolicy, ReportRow, TestStatus, Variant,
    build_suite, classify, expected_error_text,
};

use crate::contract::Contract;
use crate::knowledge::{self, KnowledgeBase};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::validator::{self, Judgement, Validator};

/// Shared flag that stops workers from picking up further variants.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Execution knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Worker threads; `0` is treated as `1`
    pub concurrency: usize,
    pub stop_on_failure: bool,
    /// Maximum variants executed per operation
    pub limit: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            stop_on_failure: false,
            limit: None,
        }
    }
}

/// Rows of one run, in generation order.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub rows: Vec<ReportRow>,
    /// Variants generated but never executed because the run was cancelled
    pub skipped: usize,
}

struct Job<'a> {
    variant: &'a Variant,
    op_label: &'a str,
}

pub struct Runner {
    transport: Box<dyn Transport>,
    validator: Box<dyn Validator>,
    knowledge: Box<dyn KnowledgeBase>,
    policy: Box<dyn ExpectationPolicy>,
    generation: GenerationOptions,
    options: RunOptions,
    cancel: CancelToken,
}

impl Runner {
    /// Runner with the given transport, no validator and no knowledge base.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            validator: Box::new(validator::DisabledValidator),
            knowledge: Box::new(knowledge::EmptyKnowledgeBase),
            policy: Box::new(KeywordPolicy::default()),
            generation: GenerationOptions::default(),
            options: RunOptions::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Wire the HTTP transport, validator and knowledge base from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self, RunError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let transport = ReqwestTransport::new(timeout, config.verify_tls)?;

        Ok(Self::new(Box::new(transport))
            .with_validator(validator::from_config(&config.llm, timeout))
            .with_knowledge(knowledge::from_config(&config.knowledge))
            .with_generation(config.generation_options())
            .with_concurrency(config.concurrency))
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn with_knowledge(mut self, knowledge: Box<dyn KnowledgeBase>) -> Self {
        self.knowledge = knowledge;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn ExpectationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.options.stop_on_failure = stop;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.options.limit = limit;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Generate and execute every operation's suite.
    #[must_use]
    pub fn run(&self, contract: &Contract) -> RunOutput {
        let suites: Vec<_> = contract
            .operations
            .iter()
            .map(|op| {
                let suite = build_suite(op, &self.generation);
                tracing::info!(
                    operation = %suite.operation,
                    variants = suite.len(),
                    duplicates = suite.duplicates(),
                    "suite generated"
                );
                suite
            })
            .collect();

        let jobs: Vec<Job<'_>> = suites
            .iter()
            .flat_map(|suite| {
                let take = self.options.limit.unwrap_or(usize::MAX);
                suite.variants.iter().take(take).map(move |variant| Job {
                    variant,
                    op_label: suite.operation.as_str(),
                })
            })
            .collect();

        let rows = self.execute_all(&jobs, contract);
        let skipped = jobs.len() - rows.len();
        if skipped > 0 {
            tracing::warn!(skipped, "run cancelled before all variants executed");
        }
        RunOutput { rows, skipped }
    }

    fn execute_all(&self, jobs: &[Job<'_>], contract: &Contract) -> Vec<ReportRow> {
        let cursor = AtomicUsize::new(0);
        let finished: Mutex<Vec<(usize, ReportRow)>> = Mutex::new(Vec::with_capacity(jobs.len()));
        let workers = self.options.concurrency.clamp(1, jobs.len().max(1));

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        if self.cancel.is_cancelled() {
                            break;
                        }
                        let idx = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some(job) = jobs.get(idx) else {
                            break;
                        };
                        let row = self.execute_one(job, contract);
                        if self.options.stop_on_failure && row.test_status == TestStatus::Fail {
                            tracing::info!(case = %row.description, "failure detected, stopping");
                            self.cancel.cancel();
                        }
                        if let Ok(mut done) = finished.lock() {
                            done.push((idx, row));
                        }
                    }
                });
            }
        });

        let mut rows = finished.into_inner().unwrap_or_else(|poison| poison.into_inner());
        rows.sort_by_key(|(idx, _)| *idx);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    fn execute_one(&self, job: &Job<'_>, contract: &Contract) -> ReportRow {
        let variant = job.variant;
        let request = HttpRequest::from_variant(variant);
        let url = request.full_url();

        let start = Instant::now();
        let exchange = self.transport.execute(&request);
        let elapsed = start.elapsed().as_secs_f64();

        let classification = classify(self.policy.as_ref(), variant, exchange.status, &exchange.body);
        let expected_error = expected_error_text(variant, &classification.error, &contract.error_codes);

        let query = if variant.description.is_empty() {
            url.as_str()
        } else {
            variant.description.as_str()
        };
        let context = self.knowledge.query(query);

        let (llm_verdict, llm_notes) = self.validator.judge(&Judgement {
            method: &variant.method,
            url: &url,
            headers: &variant.headers,
            body: variant.body.as_ref(),
            status: exchange.status,
            response: &exchange.body,
            expected_error: &expected_error,
            context: &context,
            contract_text: &contract.source,
        });

        tracing::debug!(
            operation = job.op_label,
            case = %variant.description,
            status = exchange.status,
            expected = ?classification.expected_status,
            outcome = %classification.outcome,
            "executed"
        );

        ReportRow {
            description: variant.description.clone(),
            endpoint: variant.path.clone(),
            method: variant.method.clone(),
            url,
            request_headers: serde_json::to_string(&variant.headers).unwrap_or_default(),
            request_body: variant
                .body
                .as_ref()
                .filter(|b| !b.is_null())
                .map(ToString::to_string)
                .unwrap_or_default(),
            actual_status: exchange.status,
            actual_response_snippet: truncate_snippet(&exchange.body, MAX_SNIPPET_BYTES).to_string(),
            expected_status: classification.expected_status,
            expected_response_example: variant
                .expected_example
                .as_ref()
                .filter(|e| !e.is_null())
                .map_or_else(|| "{}".to_string(), ToString::to_string),
            test_status: classification.outcome,
            llm_verdict,
            llm_notes,
            elapsed_secs: (elapsed * 1000.0).round() / 1000.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("HTTP error: {0}")]
    Http(String),
}
