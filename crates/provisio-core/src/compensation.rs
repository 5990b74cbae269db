//! Compensation for multi-step provisioning
//!
//! The control plane has no multi-resource transactions. A [`Transaction`]
//! records an undo action for every committed step and, when a later step
//! fails, runs those undo actions in reverse commit order.

use crate::context::WaitContext;
use crate::error::{LroError, Result};
use futures_util::future::BoxFuture;
use std::future::Future;

type UndoFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;
type CommitFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<CompensationStep>> + Send>;

/// One committed side effect together with the action that reverts it
pub struct CompensationStep {
    label: String,
    undo: UndoFn,
}

impl CompensationStep {
    pub fn new<F, Fut>(label: impl Into<String>, undo: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            undo: Box::new(move || Box::pin(undo())),
        }
    }

    /// Step whose effect needs no cleanup
    pub fn irreversible(label: impl Into<String>) -> Self {
        Self::new(label, || async { Ok(()) })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for CompensationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompensationStep")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A step for [`CompensationCoordinator::run`]
pub struct Step {
    label: String,
    commit: CommitFn,
}

impl Step {
    pub fn new<F, Fut>(label: impl Into<String>, commit: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<CompensationStep>> + Send + 'static,
    {
        Self {
            label: label.into(),
            commit: Box::new(move || Box::pin(commit())),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Lifecycle of one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    /// Committing the step with this zero based index
    Committing(usize),
    AllCommitted,
    /// Undoing the committed step with this zero based index
    RollingBack(usize),
    RolledBack,
    RollbackIncomplete,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::AllCommitted
                | TransactionState::RolledBack
                | TransactionState::RollbackIncomplete
        )
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::NotStarted => write!(f, "not started"),
            TransactionState::Committing(i) => write!(f, "committing step {}", i + 1),
            TransactionState::AllCommitted => write!(f, "all committed"),
            TransactionState::RollingBack(i) => write!(f, "rolling back step {}", i + 1),
            TransactionState::RolledBack => write!(f, "rolled back"),
            TransactionState::RollbackIncomplete => write!(f, "rollback incomplete"),
        }
    }
}

/// An undo action that did not succeed
#[derive(Debug)]
pub struct UndoFailure {
    pub step: String,
    pub error: LroError,
}

/// How far the rollback got
#[derive(Debug)]
pub enum RollbackStatus {
    /// Every committed step was undone (or nothing had been committed)
    Complete,
    /// Some undo actions failed
    Partial { failures: Vec<UndoFailure> },
    /// Every undo action failed
    Failed { failures: Vec<UndoFailure> },
}

impl RollbackStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, RollbackStatus::Complete)
    }

    pub fn failures(&self) -> &[UndoFailure] {
        match self {
            RollbackStatus::Complete => &[],
            RollbackStatus::Partial { failures } | RollbackStatus::Failed { failures } => failures,
        }
    }
}

/// A failed transaction: the triggering error plus the rollback report
///
/// The triggering error is always reported first and is the error's
/// `source()`, so rollback trouble never hides why the transaction failed.
#[derive(Debug)]
pub struct TransactionError {
    step: String,
    cause: LroError,
    rollback: RollbackStatus,
    undone: usize,
}

impl TransactionError {
    /// Label of the step whose commit failed
    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn cause(&self) -> &LroError {
        &self.cause
    }

    pub fn into_cause(self) -> LroError {
        self.cause
    }

    pub fn rollback(&self) -> &RollbackStatus {
        &self.rollback
    }

    /// Number of undo actions that succeeded
    pub fn undone(&self) -> usize {
        self.undone
    }

    pub fn needs_manual_cleanup(&self) -> bool {
        !self.rollback.is_complete()
    }
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.step, self.cause)?;
        match &self.rollback {
            RollbackStatus::Complete if self.undone > 0 => {
                write!(f, " (rolled back {} committed step(s))", self.undone)
            }
            RollbackStatus::Complete => Ok(()),
            RollbackStatus::Partial { failures } | RollbackStatus::Failed { failures } => {
                let labels: Vec<&str> = failures.iter().map(|u| u.step.as_str()).collect();
                write!(
                    f,
                    "; rollback incomplete, {} of {} undo action(s) failed ({}). \
                     These resources were not cleaned up, check your account and \
                     remove them manually",
                    failures.len(),
                    failures.len() + self.undone,
                    labels.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Entry point for all-or-nothing sequences of create calls
///
/// Holds no state of its own; every undo stack is scoped to one
/// [`Transaction`].
#[derive(Debug, Clone, Default)]
pub struct CompensationCoordinator {
    name: String,
}

impl CompensationCoordinator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn begin(&self, ctx: &WaitContext) -> Transaction {
        Transaction::new(self.name.clone(), ctx.clone())
    }

    /// Commit `steps` in order, rolling back committed ones on the first failure
    pub async fn run(
        &self,
        ctx: &WaitContext,
        steps: Vec<Step>,
    ) -> std::result::Result<(), TransactionError> {
        let mut tx = self.begin(ctx);
        for Step { label, commit } in steps {
            tx.commit(label, async move { commit().await.map(|undo| ((), undo)) })
                .await?;
        }
        tx.finish();
        Ok(())
    }
}

/// Undo stack for one logical provisioning sequence
///
/// Commits are strictly sequential, so a later commit can use values
/// returned by an earlier one. Undo actions carry their own context; they
/// still run when the transaction's context was cancelled.
pub struct Transaction {
    name: String,
    ctx: WaitContext,
    committed: Vec<CompensationStep>,
    state: TransactionState,
    next_index: usize,
}

impl Transaction {
    fn new(name: String, ctx: WaitContext) -> Self {
        Self {
            name,
            ctx,
            committed: Vec::new(),
            state: TransactionState::NotStarted,
            next_index: 0,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Labels of the committed steps, oldest first
    pub fn committed(&self) -> Vec<&str> {
        self.committed.iter().map(|s| s.label()).collect()
    }

    /// Run one commit
    ///
    /// On success the returned undo step is pushed and the value handed back.
    /// On failure every previously committed step is undone before the error
    /// is returned.
    pub async fn commit<T, Fut>(
        &mut self,
        label: impl Into<String>,
        commit: Fut,
    ) -> std::result::Result<T, TransactionError>
    where
        Fut: Future<Output = Result<(T, CompensationStep)>>,
    {
        let label = label.into();

        if self.state.is_terminal() {
            return Err(TransactionError {
                cause: LroError::InvalidState(format!(
                    "transaction {} is already {}",
                    self.name, self.state
                )),
                step: label,
                rollback: RollbackStatus::Complete,
                undone: 0,
            });
        }

        if self.ctx.is_done() {
            let cause = LroError::Cancelled(label.clone());
            return Err(self.fail(label, cause).await);
        }

        self.state = TransactionState::Committing(self.next_index);
        self.next_index += 1;
        tracing::debug!(transaction = %self.name, step = %label, "Committing step");

        match commit.await {
            Ok((value, undo)) => {
                self.committed.push(undo);
                Ok(value)
            }
            Err(cause) => Err(self.fail(label, cause).await),
        }
    }

    /// Roll back after a failure detected by the caller between commits
    pub async fn abort(mut self, label: impl Into<String>, cause: LroError) -> TransactionError {
        self.fail(label.into(), cause).await
    }

    /// Mark the sequence complete and discard every undo action
    pub fn finish(mut self) -> TransactionState {
        tracing::debug!(
            transaction = %self.name,
            steps = self.committed.len(),
            "All steps committed"
        );
        self.committed.clear();
        self.state = TransactionState::AllCommitted;
        self.state
    }

    async fn fail(&mut self, step: String, cause: LroError) -> TransactionError {
        tracing::warn!(
            transaction = %self.name,
            step = %step,
            error = %cause,
            committed = self.committed.len(),
            "Step failed, rolling back committed steps"
        );

        let total = self.committed.len();
        let mut failures = Vec::new();

        while let Some(CompensationStep { label, undo }) = self.committed.pop() {
            self.state = TransactionState::RollingBack(self.committed.len());
            tracing::info!(transaction = %self.name, step = %label, "Undoing step");

            if let Err(error) = undo().await {
                tracing::error!(
                    transaction = %self.name,
                    step = %label,
                    error = %error,
                    "Undo failed, continuing rollback"
                );
                failures.push(UndoFailure { step: label, error });
            }
        }

        let undone = total - failures.len();
        let rollback = if failures.is_empty() {
            self.state = TransactionState::RolledBack;
            RollbackStatus::Complete
        } else if undone == 0 {
            self.state = TransactionState::RollbackIncomplete;
            RollbackStatus::Failed { failures }
        } else {
            self.state = TransactionState::RollbackIncomplete;
            RollbackStatus::Partial { failures }
        };

        TransactionError {
            step,
            cause,
            rollback,
            undone,
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed.is_empty() {
            tracing::warn!(
                transaction = %self.name,
                steps = ?self.committed(),
                "Transaction dropped without finish; committed steps will not be undone"
            );
        }
    }
}
