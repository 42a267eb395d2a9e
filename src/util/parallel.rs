use rayon::prelude::*;
use tracing::warn;

pub fn map_in_order<T, R, F>(items: Vec<T>, jobs: Option<usize>, func: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    match jobs {
        Some(count) if count > 1 && items.len() > 1 => {
            match rayon::ThreadPoolBuilder::new().num_threads(count).build() {
                Ok(pool) => pool.install(|| items.into_par_iter().map(func).collect()),
                Err(err) => {
                    warn!(%err, "falling back to sequential fetches");
                    items.into_iter().map(func).collect()
                }
            }
        }
        _ => items.into_iter().map(func).collect(),
    }
}
