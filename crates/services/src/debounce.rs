use std::time::Duration;

use tokio::sync::mpsc;

use crate::task::TaskGuard;

/// Quiet period before a search query is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces a burst of values into the last one, delivered once the input
/// has been quiet for `delay`.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    _task: TaskGuard,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn<F>(delay: Duration, mut deliver: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let task = TaskGuard::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                if pending.is_none() {
                    match rx.recv().await {
                        Some(value) => pending = Some(value),
                        None => return,
                    }
                    continue;
                }

                tokio::select! {
                    next = rx.recv() => match next {
                        Some(value) => pending = Some(value),
                        None => {
                            if let Some(value) = pending.take() {
                                deliver(value);
                            }
                            return;
                        }
                    },
                    _ = tokio::time::sleep(delay) => {
                        if let Some(value) = pending.take() {
                            deliver(value);
                        }
                    }
                }
            }
        });

        Self { tx, _task: task }
    }

    pub fn push(&self, value: T) {
        // Only fails once the task is gone, i.e. during teardown.
        let _ = self.tx.send(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl FnMut(String) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn fast_typing_delivers_only_the_last_value() {
        let (seen, deliver) = recorder();
        let debouncer = Debouncer::spawn(SEARCH_DEBOUNCE, deliver);

        for q in ["r", "re", "rea", "real"] {
            debouncer.push(q.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["real".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_inputs_are_each_delivered() {
        let (seen, deliver) = recorder();
        let debouncer = Debouncer::spawn(SEARCH_DEBOUNCE, deliver);

        debouncer.push("boca".to_string());
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.push("river".to_string());
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["boca".to_string(), "river".to_string()]);
    }
}
