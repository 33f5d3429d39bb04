/// Emits a `log::trace!` record when the `log` feature is enabled; expands to nothing otherwise.
macro_rules! trace {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        {
            log::trace!($($tt)*);
        }
    };
}
