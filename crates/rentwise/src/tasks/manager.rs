use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::handlers::{standard_handlers, MessageHandler};
use super::message::{Message, MessageKind};
use super::task::{Task, TaskStatus, TaskSummary};
use crate::config::{TaskConfig, TenancyConfig};
use crate::services::{Notifier, ServiceError};
use crate::store::{Store, StoreError};
use crate::tenancy::{Actor, TenantError, TenantFilter, TenantScope};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(u64),
    #[error("no handler registered for '{0}'")]
    NoHandler(MessageKind),
    #[error("task {id} is {status}; only pending tasks can run")]
    InvalidState { id: u64, status: TaskStatus },
    #[error("'{expected}' handler cannot process a '{found}' message")]
    UnexpectedMessage {
        expected: MessageKind,
        found: MessageKind,
    },
    #[error("task queue unavailable: {0}")]
    QueueUnavailable(&'static str),
    #[error(transparent)]
    Tenant(#[from] TenantError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Persists dispatched messages as tasks and routes them to their handlers.
pub struct TaskManager {
    store: Arc<Store>,
    handlers: HashMap<MessageKind, Box<dyn MessageHandler>>,
    filter: TenantFilter,
    queue: mpsc::Sender<u64>,
    /// Held while a task moves from pending to running, so only one caller claims it.
    claims: Mutex<()>,
}

/// Receiving end of the task queue, drained by a worker.
pub struct TaskQueue {
    receiver: mpsc::Receiver<u64>,
}

impl TaskManager {
    pub fn new(store: Arc<Store>, config: TaskConfig) -> (Self, TaskQueue) {
        let (queue, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let manager = Self {
            store,
            handlers: HashMap::new(),
            filter: TenantFilter::default(),
            queue,
            claims: Mutex::new(()),
        };
        (manager, TaskQueue { receiver })
    }

    /// Manager with every standard handler registered.
    pub fn standard(
        store: Arc<Store>,
        notifier: Arc<dyn Notifier>,
        tasks: TaskConfig,
        tenancy: TenancyConfig,
    ) -> (Self, TaskQueue) {
        let filter = if tenancy.filter_enabled {
            TenantFilter::enabled()
        } else {
            warn!("tenant filter disabled; every actor sees all organizations");
            TenantFilter::disabled()
        };

        let (manager, queue) = Self::new(store, tasks);
        let manager = standard_handlers(notifier)
            .into_iter()
            .fold(manager.with_filter(filter), |manager, handler| {
                manager.with_boxed_handler(handler)
            });
        (manager, queue)
    }

    pub fn with_filter(mut self, filter: TenantFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_handler<H: MessageHandler + 'static>(self, handler: H) -> Self {
        self.with_boxed_handler(Box::new(handler))
    }

    /// Registers `handler`, replacing any previous handler of the same kind.
    pub fn with_boxed_handler(mut self, handler: Box<dyn MessageHandler>) -> Self {
        self.handlers.insert(handler.kind(), handler);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn scope_for(&self, actor: &Actor) -> TenantScope {
        self.filter.scope_for(actor)
    }

    pub fn handles(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Persist a pending task for `actor` and queue it for the worker.
    pub fn dispatch(&self, actor: &Actor, message: Message) -> Result<Task, TaskError> {
        let task = self.create(actor, message)?;

        match self.queue.try_send(task.id) {
            Ok(()) => {
                info!(
                    task_id = task.id,
                    kind = %task.kind(),
                    owner = %task.owner,
                    "task dispatched"
                );
                Ok(task)
            }
            Err(err) => {
                let reason = match err {
                    TrySendError::Full(_) => "task queue is full",
                    TrySendError::Closed(_) => "task queue is closed",
                };
                warn!(task_id = task.id, reason, "task could not be queued");
                let mut task = task;
                task.fail(reason.to_string());
                self.store.scoped(TenantScope::Unrestricted).tasks().update(task)?;
                Err(TaskError::QueueUnavailable(reason))
            }
        }
    }

    /// Create and run a task in the calling thread, bypassing the queue.
    pub fn execute_now(&self, actor: &Actor, message: Message) -> Result<Task, TaskError> {
        let task = self.create(actor, message)?;
        self.run(task.id)
    }

    /// Run a pending task under the scope of the tenant that dispatched it.
    ///
    /// Handler failures are recorded on the task, which is returned as `Failed`; only
    /// bookkeeping problems (missing task, wrong state, storage) surface as `Err`.
    pub fn run(&self, task_id: u64) -> Result<Task, TaskError> {
        let system = self.store.scoped(TenantScope::Unrestricted);
        let mut task = self.claim(task_id)?;

        match self.execute(&task) {
            Ok(summary) => {
                info!(task_id, kind = %task.kind(), summary = ?summary.counts(), "task completed");
                task.complete(summary);
            }
            Err(err) => {
                error!(task_id, kind = %task.kind(), error = %err, "task failed");
                task.fail(err.to_string());
            }
        }

        Ok(system.tasks().update(task)?)
    }

    pub fn get(&self, actor: &Actor, task_id: u64) -> Result<Task, TaskError> {
        self.store
            .scoped(self.scope_for(actor))
            .tasks()
            .get(task_id)?
            .ok_or(TaskError::NotFound(task_id))
    }

    pub fn list(&self, actor: &Actor) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.scoped(self.scope_for(actor)).tasks().list()?)
    }

    fn create(&self, actor: &Actor, message: Message) -> Result<Task, TaskError> {
        let kind = message.kind();
        if !self.handles(kind) {
            return Err(TaskError::NoHandler(kind));
        }

        let scope = self.scope_for(actor);
        Ok(self
            .store
            .scoped(scope)
            .tasks()
            .insert(Task::pending(actor.user, message))?)
    }

    fn claim(&self, task_id: u64) -> Result<Task, TaskError> {
        let _guard = self
            .claims
            .lock()
            .map_err(|_| StoreError::Unavailable("task claim lock poisoned".to_string()))?;
        let system = self.store.scoped(TenantScope::Unrestricted);
        let mut task = system.tasks().get(task_id)?.ok_or(TaskError::NotFound(task_id))?;

        if task.status != TaskStatus::Pending {
            return Err(TaskError::InvalidState {
                id: task_id,
                status: task.status,
            });
        }

        task.start();
        Ok(system.tasks().update(task)?)
    }

    fn execute(&self, task: &Task) -> Result<TaskSummary, TaskError> {
        let kind = task.kind();
        let handler = self.handlers.get(&kind).ok_or(TaskError::NoHandler(kind))?;
        let scope = TenantScope::for_stamp(&task.owner)?;
        handler.handle(&self.store.scoped(scope), &task.message)
    }
}

impl TaskQueue {
    /// Run queued tasks on a background tokio task. The manager owns the sender, so the worker
    /// lives as long as the runtime.
    pub fn spawn(self, manager: Arc<TaskManager>) -> JoinHandle<()> {
        tokio::spawn(self.work(manager))
    }

    pub async fn work(mut self, manager: Arc<TaskManager>) {
        while let Some(task_id) = self.receiver.recv().await {
            let worker = manager.clone();
            match tokio::task::spawn_blocking(move || worker.run(task_id)).await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => warn!(task_id, error = %err, "queued task skipped"),
                Err(err) => error!(task_id, error = %err, "task worker panicked"),
            }
        }
        info!("task queue closed; worker stopping");
    }

    /// Run whatever is queued right now in the calling thread.
    pub fn drain(&mut self, manager: &TaskManager) -> Vec<Result<Task, TaskError>> {
        let mut outcomes = Vec::new();
        while let Ok(task_id) = self.receiver.try_recv() {
            outcomes.push(manager.run(task_id));
        }
        outcomes
    }
}
