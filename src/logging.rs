//! No-op-unless-enabled logging macros, one family per pipeline stage. Each is backed by
//! `saying::say!` when its Cargo feature is enabled and compiles away entirely otherwise —
//! these must never influence compilation results, only developer-facing trace output.

#[macro_export]
#[cfg(feature = "show_tokens")]
macro_rules! token_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}
#[macro_export]
#[cfg(not(feature = "show_tokens"))]
macro_rules! token_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_headers")]
macro_rules! header_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}
#[macro_export]
#[cfg(not(feature = "show_headers"))]
macro_rules! header_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_ast")]
macro_rules! ast_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}
#[macro_export]
#[cfg(not(feature = "show_ast"))]
macro_rules! ast_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_symbols")]
macro_rules! symbol_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}
#[macro_export]
#[cfg(not(feature = "show_symbols"))]
macro_rules! symbol_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_deps")]
macro_rules! dependency_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}
#[macro_export]
#[cfg(not(feature = "show_deps"))]
macro_rules! dependency_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_typeck")]
macro_rules! typeck_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}
#[macro_export]
#[cfg(not(feature = "show_typeck"))]
macro_rules! typeck_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_topo")]
macro_rules! topo_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}
#[macro_export]
#[cfg(not(feature = "show_topo"))]
macro_rules! topo_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}
#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {};
}
