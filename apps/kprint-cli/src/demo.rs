// Traced tree reduction. Each step is one group launch over double-buffered
// values, so units never read a slot another unit writes in the same step.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicI64, Ordering};

use kprint_core::{AmbientUnit, ExecutionUnit, Mask, UnitId};
use kprint_group::{EmulatedGroup, GroupConfig, ThreadGroup};

// Routes a call to the print macros with or without an explicit unit,
// depending on how kprint-core was built.
#[cfg(not(feature = "native-parallel"))]
macro_rules! trace_on {
    ($unit:expr, $policy:ident!($($args:tt)*)) => {
        kprint_core::$policy!($unit => $($args)*)
    };
}

#[cfg(feature = "native-parallel")]
macro_rules! trace_on {
    ($unit:expr, $policy:ident!($($args:tt)*)) => {{
        let _ = $unit;
        kprint_core::$policy!($($args)*)
    }};
}

enum Substrate {
    Emulated(EmulatedGroup),
    Threaded(ThreadGroup),
}

impl Substrate {
    fn from_config(cfg: &GroupConfig) -> Self {
        if cfg.threaded || kprint_core::NATIVE_PARALLEL {
            Substrate::Threaded(ThreadGroup::from_config(cfg))
        } else {
            Substrate::Emulated(EmulatedGroup::from_config(cfg))
        }
    }

    fn size(&self) -> u32 {
        match self {
            Substrate::Emulated(g) => g.size(),
            Substrate::Threaded(g) => g.size(),
        }
    }

    fn step<K>(&self, kernel: K)
    where
        K: Fn(&dyn ExecutionUnit) + Sync,
    {
        match self {
            Substrate::Emulated(g) => g.run(|lane| kernel(lane)),
            Substrate::Threaded(g) => g.launch(|_| kernel(&AmbientUnit)),
        }
    }
}

fn load(unit: &dyn ExecutionUnit, mask: Mask, values: &[AtomicI64]) {
    let id = unit.unit_id().get();
    let v = i64::from(id + 1) * 3;
    values[id as usize].store(v, Ordering::Relaxed);
    trace_on!(unit, print_mask!(1, mask.0, c"load v[%u] = %lld", id, v));
}

fn fold(unit: &dyn ExecutionUnit, width: usize, src: &[AtomicI64], dst: &[AtomicI64]) {
    let id = unit.unit_id().get() as usize;
    let half = width.div_ceil(2);
    if id >= half {
        return;
    }
    let mine = src[id].load(Ordering::Relaxed);
    let other = if id + half < width {
        src[id + half].load(Ordering::Relaxed)
    } else {
        0
    };
    dst[id].store(mine + other, Ordering::Relaxed);

    // only pairs that actually combined are worth a line
    let paired = Mask::from_units((0..(width - half) as u32).map(UnitId));
    trace_on!(
        unit,
        print_mask!(2, paired.0, c"width %u: %lld + %lld = %lld", width as u32, mine, other, mine + other)
    );
}

pub fn run(cfg: &GroupConfig) -> Result<()> {
    let mask = cfg.trace_mask;
    let substrate = Substrate::from_config(cfg);
    let n = substrate.size() as usize;
    tracing::info!(
        units = n,
        threaded = matches!(substrate, Substrate::Threaded(_)),
        instrumented = kprint_core::INSTRUMENTED,
        "demo reduction"
    );

    let mut src: Vec<AtomicI64> = (0..n).map(|_| AtomicI64::new(0)).collect();
    let mut dst: Vec<AtomicI64> = (0..n).map(|_| AtomicI64::new(0)).collect();

    substrate.step(|unit| {
        trace_on!(unit, print_single!(0, c"reduce over %u units", unit.group_size()));
        load(unit, mask, &src);
    });

    let mut width = n;
    while width > 1 {
        substrate.step(|unit| fold(unit, width, &src, &dst));
        std::mem::swap(&mut src, &mut dst);
        width = width.div_ceil(2);
    }

    let total = src[0].load(Ordering::Relaxed);
    substrate.step(|unit| trace_on!(unit, print_single!(1, c"sum = %lld", total)));

    let expected = 3 * (n as i64) * (n as i64 + 1) / 2;
    if total != expected {
        bail!("reduction produced {total}, expected {expected}");
    }
    tracing::info!(total, "demo reduction verified");
    Ok(())
}
