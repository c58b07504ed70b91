// Thread-per-unit substrate. Each unit runs on its own scoped thread with its
// identity installed in the ambient context, so kernels use `AmbientUnit`
// (or the native-parallel print macros) and never receive an identity.

use std::sync::Arc;
use std::thread;

use kprint_abi::ambient::{self, UnitContext};
use kprint_abi::{console, Console, UnitId};

use crate::config::GroupConfig;

pub struct ThreadGroup {
    size: u32,
    console: Arc<dyn Console>,
}

impl ThreadGroup {
    pub fn new(size: u32) -> Self {
        Self::with_console(size, console::stdout())
    }

    pub fn with_console(size: u32, console: Arc<dyn Console>) -> Self {
        Self {
            size: size.max(1),
            console,
        }
    }

    pub fn from_config(cfg: &GroupConfig) -> Self {
        Self::with_console(cfg.group_size, cfg.console.console())
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Run `kernel` on every unit concurrently and wait for all of them.
    /// A panicking unit makes `launch` panic after the others finish.
    pub fn launch<F>(&self, kernel: F)
    where
        F: Fn(UnitId) + Sync,
    {
        self.launch_collect(kernel);
    }

    /// Like [`launch`](Self::launch), returning each unit's result in identity order.
    pub fn launch_collect<T, F>(&self, kernel: F) -> Vec<T>
    where
        T: Send,
        F: Fn(UnitId) -> T + Sync,
    {
        tracing::debug!(size = self.size, "thread group launch");
        let kernel = &kernel;
        thread::scope(|s| {
            let handles: Vec<_> = (0..self.size)
                .map(|id| {
                    let ctx = UnitContext::new(UnitId(id), self.size, Arc::clone(&self.console));
                    s.spawn(move || {
                        let _guard = ambient::enter(ctx);
                        kernel(UnitId(id))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(v) => v,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kprint_abi::{AmbientUnit, ExecutionUnit, RecordingConsole};
    use pretty_assertions::assert_eq;

    #[test]
    fn every_thread_sees_its_own_identity() {
        let group = ThreadGroup::new(8);
        let seen = group.launch_collect(|id| (id, AmbientUnit.unit_id(), AmbientUnit.group_size()));
        for (expected, ambient, size) in seen {
            assert_eq!(expected, ambient);
            assert_eq!(size, 8);
        }
    }

    #[test]
    fn ambient_writes_reach_the_group_console() {
        let console = Arc::new(RecordingConsole::new());
        let group = ThreadGroup::with_console(4, console.clone());
        group.launch(|id| AmbientUnit.write_console(format!("u{id}\n").as_bytes()));

        assert_eq!(console.len(), 4);
        for id in 0..4 {
            assert_eq!(console.texts_for(UnitId(id)), vec![format!("u{id}\n")]);
        }
    }

    #[test]
    fn context_is_removed_after_launch() {
        ThreadGroup::new(2).launch(|_| {});
        assert_eq!(ambient::current(), None);
    }
}
