/// Called as `(current, total, description)` at stage and phase boundaries.
/// Workers call it from their own threads.
pub type ProgressReporter<'a> = dyn Fn(usize, usize, &str) + Sync + 'a;

pub fn no_progress(_current: usize, _total: usize, _description: &str) {}
