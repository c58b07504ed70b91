// Consoles receive one fully formatted block per emit. Writes are best effort:
// a kernel print has no error path back to the caller.

use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::unit::UnitId;

/// Sink behind the native emit primitive.
pub trait Console: Send + Sync {
    /// Write one block. Implementations must not split a block across writes.
    fn write_block(&self, unit: UnitId, block: &[u8]);
}

static STDOUT: Lazy<Arc<dyn Console>> = Lazy::new(|| Arc::new(StdoutConsole));
static STDERR: Lazy<Arc<dyn Console>> = Lazy::new(|| Arc::new(StderrConsole));

/// Shared process stdout console.
pub fn stdout() -> Arc<dyn Console> {
    Arc::clone(&STDOUT)
}

/// Shared process stderr console.
pub fn stderr() -> Arc<dyn Console> {
    Arc::clone(&STDERR)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn write_block(&self, _unit: UnitId, block: &[u8]) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(block);
        let _ = out.flush();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StderrConsole;

impl Console for StderrConsole {
    fn write_block(&self, _unit: UnitId, block: &[u8]) {
        let mut err = io::stderr().lock();
        let _ = err.write_all(block);
    }
}

/// One emitted block as seen by a [`RecordingConsole`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub unit: UnitId,
    pub block: Vec<u8>,
}

impl Record {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.block).into_owned()
    }
}

/// Keeps every block in memory; used by tests and by hosts that post-process output.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    records: Mutex<Vec<Record>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        // A panicking unit must not hide what the others printed.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot in arrival order. Arrival order across units is not meaningful.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Units that emitted at least once, sorted and deduplicated.
    pub fn units(&self) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self.lock().iter().map(|r| r.unit).collect();
        units.sort_unstable();
        units.dedup();
        units
    }

    /// Every block emitted by `unit`, in that unit's own order.
    pub fn texts_for(&self, unit: UnitId) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|r| r.unit == unit)
            .map(Record::text)
            .collect()
    }

    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.lock())
    }
}

impl Console for RecordingConsole {
    fn write_block(&self, unit: UnitId, block: &[u8]) {
        self.lock().push(Record {
            unit,
            block: block.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recording_console_groups_blocks_by_unit() {
        let console = RecordingConsole::new();
        console.write_block(UnitId(2), b"two\n");
        console.write_block(UnitId(0), b"zero\n");
        console.write_block(UnitId(2), b"two again\n");

        assert_eq!(console.len(), 3);
        assert_eq!(console.units(), vec![UnitId(0), UnitId(2)]);
        assert_eq!(console.texts_for(UnitId(2)), vec!["two\n", "two again\n"]);
        assert!(console.texts_for(UnitId(1)).is_empty());

        let taken = console.take();
        assert_eq!(taken.len(), 3);
        assert!(console.is_empty());
    }

    #[test]
    fn shared_consoles_are_singletons() {
        assert!(Arc::ptr_eq(&stdout(), &stdout()));
        assert!(Arc::ptr_eq(&stderr(), &stderr()));
    }
}
