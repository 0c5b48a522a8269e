use std::thread;
use tokio::sync::{mpsc, oneshot};

/// The worker thread has exited, so the database it owned is unreachable
#[derive(Debug, Clone, thiserror::Error)]
#[error("database worker {0} is not running")]
pub struct WorkerGone(pub String);

type Job<D> = Box<dyn FnOnce(&D) + Send>;

/// Commands sent to the worker thread
enum Command<D> {
    Run(Job<D>),
    Shutdown,
}

/// Handle to a blocking resource (a SQLite connection) owned by one
/// dedicated thread. Async callers hand it closures and await the result.
pub struct DbWorker<D> {
    name: String,
    tx: mpsc::Sender<Command<D>>,
}

impl<D> Clone for DbWorker<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<D: Send + 'static> DbWorker<D> {
    /// Spawn a new worker thread owning `db`
    pub fn spawn(name: impl Into<String>, db: D) -> std::io::Result<Self> {
        let name = name.into();
        let (tx, mut rx) = mpsc::channel::<Command<D>>(256);

        let thread_name = name.clone();
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(cmd) = rx.blocking_recv() {
                    match cmd {
                        Command::Run(job) => job(&db),
                        Command::Shutdown => {
                            tracing::info!("Database worker {} shutting down", thread_name);
                            break;
                        }
                    }
                }
            })?;

        Ok(Self { name, tx })
    }

    /// Run `f` against the database on the worker thread
    pub async fn call<R, F>(&self, f: F) -> Result<R, WorkerGone>
    where
        R: Send + 'static,
        F: FnOnce(&D) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Job<D> = Box::new(move |db| {
            let _ = reply.send(f(db));
        });

        self.tx
            .send(Command::Run(job))
            .await
            .map_err(|_| WorkerGone(self.name.clone()))?;
        rx.await.map_err(|_| WorkerGone(self.name.clone()))
    }

    /// Stop the worker thread after it drains queued jobs
    pub async fn shutdown(&self) -> Result<(), WorkerGone> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| WorkerGone(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_call_runs_on_worker() {
        let worker = DbWorker::spawn("test-worker", Cell::new(1)).unwrap();

        let value = worker.call(|n| { n.set(n.get() + 1); n.get() }).await.unwrap();
        assert_eq!(value, 2);

        let name = worker
            .call(|_| thread::current().name().map(str::to_string))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("test-worker"));
    }

    #[tokio::test]
    async fn test_call_after_shutdown_fails() {
        let worker = DbWorker::spawn("stopped-worker", ()).unwrap();
        worker.shutdown().await.unwrap();

        // the thread drops its receiver once it sees Shutdown
        let mut result = Ok(());
        for _ in 0..50 {
            result = worker.call(|_| ()).await;
            if result.is_err() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(result.is_err());
    }
}
