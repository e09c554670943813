/// The progress callback invoked during a transfer
///
/// Called with `(bytes_so_far, bytes_total)` for every incremental tick;
/// the total may be `0.0` while it is indeterminate. A nonzero return
/// value cancels the transfer.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(f64, f64) -> i32;

/// A progress callback that reports nothing and never cancels
///
/// ## Examples
/// ```
/// use ryum_download::no_progress;
///
/// let mut progress = no_progress();
/// assert_eq!(0, progress(1024.0, 4096.0));
/// ```
pub fn no_progress() -> impl FnMut(f64, f64) -> i32 {
    |_, _| 0
}
