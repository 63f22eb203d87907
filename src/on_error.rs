use std::fmt::Display;

/// Runs a fallible action and hands any error it returns to a handler.
///
/// The handler decides what the caller sees: `Ok(())` swallows the error,
/// `Err(e)` passes it on.
///
/// ```
/// use wrapped_sync::ActionOnError;
///
/// let mut action = ActionOnError::log_error_and_swallow(|| Err::<(), _>("disk full"));
/// assert_eq!(action.run(), Ok(()));
///
/// let mut action = ActionOnError::log_error_and_rethrow(|| Err::<(), _>("disk full"));
/// assert_eq!(action.run(), Err("disk full"));
/// ```
///
/// 运行一个可能失败的动作，并把它返回的任何错误交给处理器。
/// 处理器决定调用者看到什么：`Ok(())` 吞掉错误，`Err(e)` 继续传递。
pub struct ActionOnError<F, H> {
    delegate: F,
    handler: H,
}

impl<F, H, E> ActionOnError<F, H>
where
    F: FnMut() -> Result<(), E>,
    H: FnMut(E) -> Result<(), E>,
{
    pub fn new(delegate: F, handler: H) -> Self {
        Self { delegate, handler }
    }

    pub fn run(&mut self) -> Result<(), E> {
        match (self.delegate)() {
            Ok(()) => Ok(()),
            Err(err) => (self.handler)(err),
        }
    }
}

impl<F, E> ActionOnError<F, fn(E) -> Result<(), E>>
where
    F: FnMut() -> Result<(), E>,
    E: Display,
{
    /// Log errors at error level and carry on.
    /// 以 error 级别记录错误并继续。
    pub fn log_error_and_swallow(delegate: F) -> Self {
        Self::new(delegate, swallow::<E>)
    }

    /// Log errors at error level, then return them to the caller.
    /// 以 error 级别记录错误，然后将其返回给调用者。
    pub fn log_error_and_rethrow(delegate: F) -> Self {
        Self::new(delegate, rethrow::<E>)
    }
}

fn swallow<E: Display>(err: E) -> Result<(), E> {
    tracing::error!(error = %err, "caught error");
    Ok(())
}

fn rethrow<E: Display>(err: E) -> Result<(), E> {
    tracing::error!(error = %err, "caught error");
    Err(err)
}
