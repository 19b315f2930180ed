use std::sync::Arc;

use parking_lot::RwLock;

/// A value that's loaded on first use, then kept.
///
/// This allows for caching metadata such that sources are not re-read each
/// time an accessor is called. Clones share the same cache.
#[derive(Debug)]
pub struct Cached<T>(Arc<RwLock<Option<T>>>);

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(None)))
    }
}

impl<T: Clone> Cached<T> {
    /// Returns a copy of the cached value, loading it if needed.
    ///
    /// To avoid data races, we check the state of the cache both times we
    /// get the lock. That also lets us only `read` at first, then
    /// conditionally `write`, so concurrent readers load at most once per
    /// miss.
    pub fn get_or_load<E: core::fmt::Display>(
        &self,
        what: &str,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if let Some(v) = &*self.0.read() {
            log::trace!("Cached {what} found! Returning...");
            return Ok(v.clone());
        }

        let locked = &mut *self.0.write();

        // someone may have beaten us to it
        if let Some(v) = locked {
            log::trace!("{what} was loaded while we waited. Returning...");
            return Ok(v.clone());
        }

        match load() {
            Ok(v) => {
                log::trace!("Loaded {what}! Cached internally.");
                *locked = Some(v.clone());
                Ok(v)
            }
            Err(e) => {
                log::error!("Failed to load {what}! err: {e}");
                Err(e)
            }
        }
    }

    /// Runs `f` on the cached value, loading it first if needed.
    pub fn with_mut<R, E: core::fmt::Display>(
        &self,
        what: &str,
        load: impl FnOnce() -> Result<T, E>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, E> {
        let locked = &mut *self.0.write();

        let mut value = match locked.take() {
            Some(v) => v,
            None => load().inspect_err(|e| log::error!("Failed to load {what}! err: {e}"))?,
        };

        let out = f(&mut value);
        *locked = Some(value);
        Ok(out)
    }

    /// Replaces the cached value.
    pub fn set(&self, value: T) {
        *self.0.write() = Some(value);
    }

    /// Forgets the cached value, so the next access reloads it.
    pub fn invalidate(&self) {
        *self.0.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::Cached;

    #[test]
    fn loads_once() {
        let cache: Cached<u32> = Cached::default();
        let loads = AtomicUsize::new(0);

        let load = || -> Result<u32, String> {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        };

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| assert_eq!(cache.get_or_load("number", load), Ok(7)));
            }
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate();
        assert_eq!(cache.get_or_load("number", load), Ok(7));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_loads_arent_cached() {
        let cache: Cached<u32> = Cached::default();
        assert_eq!(
            cache.get_or_load("number", || Err::<u32, _>("nope".to_string())),
            Err("nope".to_string())
        );
        assert_eq!(cache.get_or_load("number", || Ok::<_, String>(1)), Ok(1));
    }

    #[test]
    fn mutation_sticks() {
        let cache: Cached<Vec<u8>> = Cached::default();
        let pushed = cache.with_mut("bytes", || Ok::<_, String>(vec![1]), |v| {
            v.push(2);
            v.len()
        });
        assert_eq!(pushed, Ok(2));
        assert_eq!(
            cache.get_or_load("bytes", || Err::<Vec<u8>, _>("unused".to_string())),
            Ok(vec![1, 2])
        );
    }
}
