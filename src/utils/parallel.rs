#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::prelude::*;

/// Below this many items the work runs on the calling thread.
/// Each item is a whole layer image, so the bar is low.
pub const PARALLEL_THRESHOLD: usize = 4;

// Helper to switch between rayon and a plain iterator based on size and
// the `parallel` feature. Output order always matches input order.
#[inline]
pub fn map_collect<T, R, F>(collection: &[T], f: F) -> Vec<R>
where T: Sync, R: Send, F: Fn(&T) -> R + Sync + Send {
    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        if collection.len() >= PARALLEL_THRESHOLD {
            collection.par_iter().map(f).collect()
        } else {
            collection.iter().map(f).collect()
        }
    }
    #[cfg(any(not(feature = "parallel"), target_arch = "wasm32"))]
    {
        collection.iter().map(f).collect()
    }
}
