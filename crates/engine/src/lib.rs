//! # Statecraft Engine
//!
//! Compiles typed container-job task specifications into orchestrator task
//! states and the authorization statements those states need at runtime.
//!
//! ## Pipeline
//!
//! 1. **Gate**: the requested integration pattern must be one the task type supports.
//! 2. **Validate**: literal fields are checked against service limits; values
//!    resolved at runtime are passed through unchecked.
//! 3. **Render**: the task state document, with `.$` keys for runtime values.
//! 4. **Derive**: the policy statements, widened to wildcards for runtime resources.
//!
//! ## Usage
//!
//! ```rust
//! use statecraft_engine::{Compiler, StartJobRun, Task};
//!
//! let task: Task = StartJobRun::new("abc123", "s3://bucket/job.py")
//!     .with_execution_role("arn:aws:iam::123456789012:role/JobRole")
//!     .into();
//! let compiled = Compiler::default().compile(&task)?;
//! assert_eq!(compiled.state["Resource"], "arn:aws:states:::emr-containers:startJobRun.sync");
//! assert_eq!(compiled.policy_statements.len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compile;
pub mod error;
pub mod file;
pub mod gate;
pub mod policy;
pub mod render;
pub mod task;
pub mod validate;

pub use compile::{CompiledTask, Compiler, TrustPolicyRequest, TrustPolicyUpdater};
pub use error::CompileError;
pub use file::{TaskFile, load_task_file, parse_task_str};
pub use gate::validate_pattern;
pub use policy::derive_statements;
pub use render::render_state;
pub use task::{
    CreateVirtualCluster, DeleteVirtualCluster, JobDriver, SparkSubmitJobDriver, StartJobRun, StateOptions, Task, TaskDefinition, TaskKind,
};
pub use validate::validate_task;
