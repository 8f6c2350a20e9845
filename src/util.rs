/// Checks that a numerical value is in the provided interval `[a,b]` and returns
/// early with [`Error::InvalidHyperparameter`](crate::Error::InvalidHyperparameter) if not
///
/// ### Example
/// ```ignore
/// let value = 2.0;
/// ensure_interval!(value, 0.0, 1.0);
/// ```
/// This returns an error reporting "Invalid value for \`value\`: 2 is not in the interval \[0, 1\]".
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::Error::InvalidHyperparameter {
                name: stringify!($var),
                value: $var,
                min: $a,
                max: $b,
            });
        }
    };
}
