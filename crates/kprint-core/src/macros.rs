// Call-site surface and build-time gate.
//
// With `log-execution` the print macros bind every argument once, run the
// policy, and forward the prepared template plus arguments to `snprintf`.
// Without it they expand to an empty block: no allocation, no branch, and the
// arguments are never evaluated.
//
// Without `native-parallel` the unit is explicit: `print_all!(unit => level, fmt, args...)`.
// With it the unit comes from the ambient thread context: `print_all!(level, fmt, args...)`.
//
// Arguments follow C variadic rules: integers at least `c_int` wide, `f64`
// for floating point, raw pointers for `%s`/`%p`.

/// Binds each argument to its own local, then calls the policy.
#[doc(hidden)]
#[macro_export]
macro_rules! __kprint_call {
    (@bind $policy:path, ($($head:expr),*), $tag:ident, [$($bound:ident)*], $arg:expr $(, $rest:expr)*) => {{
        let __arg = $arg;
        $crate::__kprint_call!(@bind $policy, ($($head),*), $tag, [$($bound)* __arg] $(, $rest)*)
    }};
    (@bind $policy:path, ($($head:expr),*), $tag:ident, [$($bound:ident)*]) => {
        $crate::__kprint_call!(@call $policy, ($($head),*), $tag, [$($bound)*])
    };
    // unit identity goes first, for the header's placeholder
    (@call $policy:path, ($($head:expr),*), tagged, [$($bound:ident)*]) => {
        $policy($($head),*, |__template: &::core::ffi::CStr, __unit: $crate::UnitId| {
            let __unit = __unit.get() as $crate::__private::c_int;
            $crate::emit::format_c(|__buf, __len| unsafe {
                $crate::__private::snprintf(__buf, __len, __template.as_ptr(), __unit $(, $bound)*)
            })
        })
    };
    (@call $policy:path, ($($head:expr),*), untagged, [$($bound:ident)*]) => {
        $policy($($head),*, |__template: &::core::ffi::CStr, _: $crate::UnitId| {
            $crate::emit::format_c(|__buf, __len| unsafe {
                $crate::__private::snprintf(__buf, __len, __template.as_ptr() $(, $bound)*)
            })
        })
    };
    // policy chosen at run time; the identity is passed only when tagged
    (@call $policy:path, ($($head:expr),*), dynamic, [$($bound:ident)*]) => {
        $policy($($head),*, |__template: &::core::ffi::CStr, __tag: ::core::option::Option<$crate::UnitId>| {
            $crate::emit::format_c(|__buf, __len| unsafe {
                match __tag {
                    ::core::option::Option::Some(__unit) => $crate::__private::snprintf(
                        __buf,
                        __len,
                        __template.as_ptr(),
                        __unit.get() as $crate::__private::c_int
                        $(, $bound)*
                    ),
                    ::core::option::Option::None => {
                        $crate::__private::snprintf(__buf, __len, __template.as_ptr() $(, $bound)*)
                    }
                }
            })
        })
    };
}

/// Logs a failed print call; the call itself is abandoned.
#[doc(hidden)]
#[macro_export]
macro_rules! __kprint_report {
    ($result:expr) => {{
        if let ::core::result::Result::Err(__err) = $result {
            $crate::__private::report(&__err);
        }
    }};
}

// ---------- Instrumented, emulated substrate ----------

#[cfg(all(feature = "log-execution", not(feature = "native-parallel")))]
#[macro_export]
macro_rules! try_print_all {
    ($unit:expr => $level:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_all, (&$unit, $level, $fmt), tagged, [] $(, $arg)*)
    };
}

#[cfg(all(feature = "log-execution", not(feature = "native-parallel")))]
#[macro_export]
macro_rules! try_print_mask {
    ($unit:expr => $level:expr, $mask:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_mask, (&$unit, $level, $crate::Mask($mask), $fmt), tagged, [] $(, $arg)*)
    };
}

/// The second form runs as the fixed single-unit context ([`SoloUnit`](crate::SoloUnit)).
#[cfg(all(feature = "log-execution", not(feature = "native-parallel")))]
#[macro_export]
macro_rules! try_print_single {
    ($unit:expr => $level:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_single, (&$unit, $level, $fmt), untagged, [] $(, $arg)*)
    };
    ($level:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_single, (&$crate::SoloUnit, $level, $fmt), untagged, [] $(, $arg)*)
    };
}

/// Any [`Policy`](crate::Policy), preparing into a caller-owned [`TemplateBuf`](crate::TemplateBuf).
/// `$buf` names the buffer itself, not a reference to it.
#[cfg(all(feature = "log-execution", not(feature = "native-parallel")))]
#[macro_export]
macro_rules! try_print_into {
    ($buf:expr, $unit:expr => $level:expr, $policy:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_into, (&mut $buf, &$unit, $level, $policy, $fmt), dynamic, [] $(, $arg)*)
    };
}

// ---------- Instrumented, native-parallel substrate ----------

#[cfg(all(feature = "log-execution", feature = "native-parallel"))]
#[macro_export]
macro_rules! try_print_all {
    ($level:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_all, (&$crate::AmbientUnit, $level, $fmt), tagged, [] $(, $arg)*)
    };
}

#[cfg(all(feature = "log-execution", feature = "native-parallel"))]
#[macro_export]
macro_rules! try_print_mask {
    ($level:expr, $mask:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_mask, (&$crate::AmbientUnit, $level, $crate::Mask($mask), $fmt), tagged, [] $(, $arg)*)
    };
}

#[cfg(all(feature = "log-execution", feature = "native-parallel"))]
#[macro_export]
macro_rules! try_print_single {
    ($level:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_single, (&$crate::AmbientUnit, $level, $fmt), untagged, [] $(, $arg)*)
    };
}

#[cfg(all(feature = "log-execution", feature = "native-parallel"))]
#[macro_export]
macro_rules! try_print_into {
    ($buf:expr, $level:expr, $policy:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::__kprint_call!(@bind $crate::policy::print_into, (&mut $buf, &$crate::AmbientUnit, $level, $policy, $fmt), dynamic, [] $(, $arg)*)
    };
}

// ---------- Silent ----------

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! try_print_all {
    ($($tokens:tt)*) => {
        ::core::result::Result::<$crate::Outcome, $crate::PrintError>::Ok($crate::Outcome::Suppressed { prepared: 0 })
    };
}

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! try_print_mask {
    ($($tokens:tt)*) => {
        ::core::result::Result::<$crate::Outcome, $crate::PrintError>::Ok($crate::Outcome::Suppressed { prepared: 0 })
    };
}

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! try_print_single {
    ($($tokens:tt)*) => {
        ::core::result::Result::<$crate::Outcome, $crate::PrintError>::Ok($crate::Outcome::Suppressed { prepared: 0 })
    };
}

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! try_print_into {
    ($($tokens:tt)*) => {
        ::core::result::Result::<$crate::Outcome, $crate::PrintError>::Ok($crate::Outcome::Suppressed { prepared: 0 })
    };
}

// ---------- Fire-and-forget forms ----------

/// Every unit prints its block, tagged `Unit%3i : `.
#[cfg(feature = "log-execution")]
#[macro_export]
macro_rules! print_all {
    ($($tokens:tt)*) => {
        $crate::__kprint_report!($crate::try_print_all!($($tokens)*))
    };
}

/// Units whose bit is set in the `u32` mask print; all units prepare.
#[cfg(feature = "log-execution")]
#[macro_export]
macro_rules! print_mask {
    ($($tokens:tt)*) => {
        $crate::__kprint_report!($crate::try_print_mask!($($tokens)*))
    };
}

/// Unit 0 prints, untagged; all units prepare.
#[cfg(feature = "log-execution")]
#[macro_export]
macro_rules! print_single {
    ($($tokens:tt)*) => {
        $crate::__kprint_report!($crate::try_print_single!($($tokens)*))
    };
}

/// Any policy, reusing a caller-owned template buffer.
#[cfg(feature = "log-execution")]
#[macro_export]
macro_rules! print_into {
    ($($tokens:tt)*) => {
        $crate::__kprint_report!($crate::try_print_into!($($tokens)*))
    };
}

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! print_all {
    ($($tokens:tt)*) => {{}};
}

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! print_mask {
    ($($tokens:tt)*) => {{}};
}

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! print_single {
    ($($tokens:tt)*) => {{}};
}

#[cfg(not(feature = "log-execution"))]
#[macro_export]
macro_rules! print_into {
    ($($tokens:tt)*) => {{}};
}

#[cfg(all(test, feature = "log-execution", not(feature = "native-parallel")))]
mod tests {
    use crate::{Mask, Outcome, Policy, TemplateBuf, UnitId};
    use kprint_abi::{Console, ExecutionUnit, RecordingConsole};
    use pretty_assertions::assert_eq;

    struct Probe<'c> {
        id: u32,
        console: &'c RecordingConsole,
    }

    impl ExecutionUnit for Probe<'_> {
        fn unit_id(&self) -> UnitId {
            UnitId(self.id)
        }

        fn group_size(&self) -> u32 {
            4
        }

        fn write_console(&self, block: &[u8]) {
            self.console.write_block(UnitId(self.id), block);
        }
    }

    #[test]
    fn substitutes_unit_and_arguments() {
        let console = RecordingConsole::new();
        let unit = Probe { id: 3, console: &console };
        let outcome = crate::try_print_all!(unit => 1, c"x=%d y=%s", 42, c"ok".as_ptr()).unwrap();
        assert!(outcome.emitted());
        assert_eq!(console.texts_for(UnitId(3)), vec!["  Unit  3 : x=42 y=ok\n"]);
    }

    #[test]
    fn arguments_are_evaluated_once_per_call() {
        let console = RecordingConsole::new();
        let mut evaluations = 0;
        let mut next = || {
            evaluations += 1;
            evaluations
        };
        for id in 0..4 {
            let unit = Probe { id, console: &console };
            crate::print_mask!(unit => 0, 0b0001, c"n=%d\n", next());
        }
        // every unit evaluates, printing or not
        assert_eq!(evaluations, 4);
        assert_eq!(console.texts_for(UnitId(0)), vec!["Unit  0 : n=1\n"]);
        assert_eq!(console.len(), 1);
    }

    #[test]
    fn multi_line_blocks_align_under_the_tag() {
        let console = RecordingConsole::new();
        let unit = Probe { id: 12, console: &console };
        crate::print_all!(unit => 0, c"a=%d\nb=%.1f\n", 1, 2.5);
        assert_eq!(
            console.texts_for(UnitId(12)),
            vec!["Unit 12 : a=1\n          b=2.5\n"]
        );
    }

    #[test]
    fn leader_only_with_and_without_arguments() {
        let console = RecordingConsole::new();
        for id in 0..4 {
            let unit = Probe { id, console: &console };
            crate::print_single!(unit => 1, c"total=%d", 10);
            crate::print_single!(unit => 0, c"--");
        }
        assert_eq!(console.units(), vec![UnitId(0)]);
        assert_eq!(console.texts_for(UnitId(0)), vec!["  total=10\n", "--\n"]);
    }

    #[test]
    fn solo_context_reports_leader_outcome() {
        let outcome = crate::try_print_single!(0, c"").unwrap();
        assert_eq!(
            outcome,
            Outcome::Emitted {
                prepared: 1,
                written: 1
            }
        );
    }

    #[test]
    fn one_buffer_serves_every_policy() {
        let console = RecordingConsole::new();
        let mut buf = TemplateBuf::with_capacity(128);
        let capacity = buf.capacity();
        for id in 0..4 {
            let unit = Probe { id, console: &console };
            crate::print_into!(buf, unit => 0, Policy::All, c"all %d", 1);
            crate::print_into!(buf, unit => 1, Policy::Mask(Mask(0b1000)), c"mask %d", 2);
            crate::print_into!(buf, unit => 0, Policy::Single, c"single %d", 3);
        }
        assert_eq!(buf.capacity(), capacity);
        assert_eq!(
            console.texts_for(UnitId(0)),
            vec!["Unit  0 : all 1\n", "single 3\n"]
        );
        assert_eq!(
            console.texts_for(UnitId(3)),
            vec!["Unit  3 : all 1\n", "  Unit  3 : mask 2\n"]
        );
        assert_eq!(console.len(), 6);
    }
}
