// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

// Conditional logging shim: uses `tracing` when enabled, compiles to nothing otherwise

#[cfg(feature = "tracing")]
macro_rules! warn_shim {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*)
    };
}

#[cfg(feature = "tracing")]
macro_rules! debug_shim {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_shim {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_shim {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_shim as debug;
pub(crate) use warn_shim as warn;
