//! Small shared helpers.

/// Macro to convert Result to Option with error logging.
/// Usage: `try_log!(result, "context message")`
///
/// Used on per-device enumeration paths where one misbehaving device
/// should be skipped rather than failing the whole operation.
#[macro_export]
macro_rules! try_log {
    ($result:expr, $context:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {:?}", $context, e);
                return None;
            }
        }
    };
}
