// Ambient per-thread unit context.
//
// Native-parallel substrates run every unit on its own thread and install the
// unit's context here for the duration of the kernel; `AmbientUnit` reads it
// back so call sites never thread an identity by hand.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::console::Console;
use crate::unit::{ExecutionUnit, SoloUnit, UnitId};

thread_local! {
    static CURRENT: RefCell<Option<UnitContext>> = const { RefCell::new(None) };
}

/// What a substrate knows about the unit running on the current thread.
#[derive(Clone)]
pub struct UnitContext {
    pub unit: UnitId,
    pub group_size: u32,
    pub console: Arc<dyn Console>,
}

impl UnitContext {
    pub fn new(unit: UnitId, group_size: u32, console: Arc<dyn Console>) -> Self {
        Self {
            unit,
            group_size,
            console,
        }
    }
}

impl fmt::Debug for UnitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitContext")
            .field("unit", &self.unit)
            .field("group_size", &self.group_size)
            .finish_non_exhaustive()
    }
}

/// Restores the previous context (usually none) when dropped, including on unwind.
#[must_use = "the ambient context is removed as soon as the guard is dropped"]
pub struct AmbientGuard {
    previous: Option<UnitContext>,
    // tied to the thread that installed it
    _not_send: PhantomData<*const ()>,
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|c| *c.borrow_mut() = previous);
    }
}

/// Install `ctx` as the calling thread's unit context.
pub fn enter(ctx: UnitContext) -> AmbientGuard {
    let previous = CURRENT.with(|c| c.replace(Some(ctx)));
    AmbientGuard {
        previous,
        _not_send: PhantomData,
    }
}

/// Identity and group size installed for this thread, if any.
pub fn current() -> Option<(UnitId, u32)> {
    CURRENT.with(|c| c.borrow().as_ref().map(|ctx| (ctx.unit, ctx.group_size)))
}

/// Reads the calling thread's ambient context.
///
/// A thread that is not running inside a group behaves like [`SoloUnit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientUnit;

impl ExecutionUnit for AmbientUnit {
    fn unit_id(&self) -> UnitId {
        current().map_or(SoloUnit.unit_id(), |(unit, _)| unit)
    }

    fn group_size(&self) -> u32 {
        current().map_or(SoloUnit.group_size(), |(_, size)| size)
    }

    fn write_console(&self, block: &[u8]) {
        let target = CURRENT.with(|c| {
            c.borrow()
                .as_ref()
                .map(|ctx| (ctx.unit, Arc::clone(&ctx.console)))
        });
        match target {
            Some((unit, console)) => console.write_block(unit, block),
            None => SoloUnit.write_console(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::RecordingConsole;
    use pretty_assertions::assert_eq;

    #[test]
    fn ambient_unit_reads_installed_context() {
        let console = Arc::new(RecordingConsole::new());
        {
            let _guard = enter(UnitContext::new(UnitId(5), 8, console.clone()));
            assert_eq!(AmbientUnit.unit_id(), UnitId(5));
            assert_eq!(AmbientUnit.group_size(), 8);
            AmbientUnit.write_console(b"hello\n");
        }
        assert_eq!(current(), None);
        assert_eq!(console.texts_for(UnitId(5)), vec!["hello\n"]);
    }

    #[test]
    fn nested_contexts_restore_on_drop() {
        let console: Arc<dyn Console> = Arc::new(RecordingConsole::new());
        let outer = enter(UnitContext::new(UnitId(1), 4, console.clone()));
        {
            let _inner = enter(UnitContext::new(UnitId(3), 4, console.clone()));
            assert_eq!(current(), Some((UnitId(3), 4)));
        }
        assert_eq!(current(), Some((UnitId(1), 4)));
        drop(outer);
        assert_eq!(current(), None);
    }

    #[test]
    fn outside_a_group_the_thread_is_a_solo_leader() {
        assert_eq!(AmbientUnit.unit_id(), UnitId::LEADER);
        assert_eq!(AmbientUnit.group_size(), 1);
    }
}
