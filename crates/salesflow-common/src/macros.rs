//! Early-return macro for `PipelineError`

/// Equivalent to `anyhow::bail!` but for `PipelineError`
///
/// # Examples
///
/// ```rust
/// use salesflow_common::bail;
/// use salesflow_common::Result;
///
/// fn check_quantity(quantity: i32) -> Result<()> {
///     if quantity < 0 {
///         bail!("Quantity cannot be negative: {}", quantity);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::PipelineError::new($msg))
    };
    ($err:expr $(,)?) => {
        return Err($crate::PipelineError::new($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::PipelineError::new(format!($fmt, $($arg)*)))
    };
}
