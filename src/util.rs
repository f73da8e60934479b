/// Lock a mutex, turning a poisoned lock into a `StoreError::Lock`
/// so callers can propagate it with `?`.
#[macro_export]
macro_rules! lock {
    ( $mutex_arc:expr ) => {
        $mutex_arc.lock().map_err(|e| {
            log::error!("unable to get lock on mutex: {e}");
            $crate::store::error::StoreError::Lock(format!("unable to get lock on mutex: {e}"))
        })
    };
}
