//! negcase-runner: contract loading, suite execution and report files

pub mod contract;
pub mod knowledge;
pub mod report;
pub mod runner;
pub mod transport;
pub mod validator;

pub use contract::{Contract, ContractError, load_contract, load_filter};
pub use knowledge::{ChunkedKnowledgeBase, EmptyKnowledgeBase, KnowledgeBase};
pub use report::{ReportError, write_csv, write_reports};
pub use runner::{CancelToken, RunError, RunOptions, RunOutput, Runner};
pub use transport::{Exchange, HttpRequest, ReqwestTransport, Transport};
pub use validator::{ChatValidator, DisabledValidator, Judgement, Validator};
