pub type Result<T> = std::result::Result<T, crate::Error>;

/// Returns early with [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument)
/// naming the argument and the failed condition when `$cond` is false.
#[macro_export]
macro_rules! verify_arg {
    ($name:ident, $cond:expr) => {
        if !($cond) {
            return Err($crate::result::failed_arg_check(
                stringify!($name),
                stringify!($cond),
            ));
        }
    };
}

#[cold]
#[doc(hidden)]
pub fn failed_arg_check(name: &str, condition: &str) -> crate::Error {
    crate::Error::invalid_arg(name, condition)
}
