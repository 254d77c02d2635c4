use rayon::prelude::*;
use rayon::ThreadPool;

/// Fixed-size worker pool fanning independent per-log work over shards.
#[derive(Debug)]
pub struct ParallelRunner {
    pool: Option<ThreadPool>,
    threads: usize,
}

impl Default for ParallelRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelRunner {
    /// One worker per available core.
    pub fn new() -> Self {
        Self::with_threads(num_cpus::get())
    }

    pub fn with_threads(threads: usize) -> Self {
        let threads = threads.max(1);
        let pool = if threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("seqscope-worker-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!(error = %e, "could not start worker pool; running inline");
                    None
                }
            }
        } else {
            None
        };
        let threads = if pool.is_some() { threads } else { 1 };
        Self { pool, threads }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Units handed to each worker: one each when there are fewer units than
    /// workers, otherwise an even split rounded up.
    pub fn shard_size(&self, len: usize) -> usize {
        if len < self.threads { 1 } else { len.div_ceil(self.threads) }
    }

    /// Applies `f` to every item and returns the outputs in input order.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync,
    {
        let pool = match &self.pool {
            Some(pool) if items.len() > 1 => pool,
            _ => return items.iter().enumerate().map(|(i, t)| f(i, t)).collect(),
        };
        let shard = self.shard_size(items.len());
        let f = &f;
        let shards: Vec<Vec<R>> = pool.install(|| {
            items
                .par_chunks(shard)
                .enumerate()
                .map(|(s, chunk)| {
                    chunk.iter().enumerate().map(|(j, t)| f(s * shard + j, t)).collect()
                })
                .collect()
        });
        shards.into_iter().flatten().collect()
    }
}
