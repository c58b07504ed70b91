use std::sync::Arc;

use kprint_abi::{console, Console, ExecutionUnit, UnitId};

use crate::config::GroupConfig;

/// Single-threaded stand-in for a parallel group.
///
/// `run` executes the kernel once per unit, in identity order, on the calling
/// thread. There is no ambient identity here: each invocation receives its
/// [`Lane`] and passes it to the print macros explicitly.
pub struct EmulatedGroup {
    size: u32,
    console: Arc<dyn Console>,
}

impl EmulatedGroup {
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

    pub fn run<F>(&self, mut kernel: F)
    where
        F: FnMut(&Lane<'_>),
    {
        tracing::debug!(size = self.size, "emulated group run");
        for id in 0..self.size {
            kernel(&self.lane(UnitId(id)));
        }
    }

    /// Like [`run`](Self::run), keeping each unit's result in identity order.
    pub fn run_collect<T, F>(&self, mut kernel: F) -> Vec<T>
    where
        F: FnMut(&Lane<'_>) -> T,
    {
        (0..self.size)
            .map(|id| kernel(&self.lane(UnitId(id))))
            .collect()
    }

    fn lane(&self, unit: UnitId) -> Lane<'_> {
        Lane {
            unit,
            group_size: self.size,
            console: self.console.as_ref(),
        }
    }
}

/// One unit of an [`EmulatedGroup`], valid for a single kernel invocation.
#[derive(Clone, Copy)]
pub struct Lane<'g> {
    unit: UnitId,
    group_size: u32,
    console: &'g dyn Console,
}

impl std::fmt::Debug for Lane<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lane")
            .field("unit", &self.unit)
            .field("group_size", &self.group_size)
            .finish_non_exhaustive()
    }
}

impl ExecutionUnit for Lane<'_> {
    fn unit_id(&self) -> UnitId {
        self.unit
    }

    fn group_size(&self) -> u32 {
        self.group_size
    }

    fn write_console(&self, block: &[u8]) {
        self.console.write_block(self.unit, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kprint_abi::RecordingConsole;
    use pretty_assertions::assert_eq;

    #[test]
    fn runs_every_lane_in_identity_order() {
        let group = EmulatedGroup::new(4);
        let ids = group.run_collect(|lane| (lane.unit_id().get(), lane.group_size()));
        assert_eq!(ids, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
    }

    #[test]
    fn lanes_write_to_the_group_console() {
        let console = Arc::new(RecordingConsole::new());
        let group = EmulatedGroup::with_console(3, console.clone());
        group.run(|lane| lane.write_console(format!("{}\n", lane.unit_id()).as_bytes()));
        assert_eq!(console.units(), vec![UnitId(0), UnitId(1), UnitId(2)]);
        assert_eq!(console.texts_for(UnitId(1)), vec!["1\n"]);
    }

    #[test]
    fn empty_group_is_promoted_to_one_unit() {
        assert_eq!(EmulatedGroup::new(0).size(), 1);
    }
}
