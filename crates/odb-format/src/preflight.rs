use std::path::Path;

use crate::error::{OdbError, OdbResult};

/// Names from `names` with no file under `dir`, in the order given.
pub fn missing_files<I, N>(dir: &Path, names: I) -> Vec<String>
where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    names
        .into_iter()
        .filter(|n| !dir.join(n.as_ref()).is_file())
        .map(|n| n.as_ref().to_owned())
        .collect()
}

/// Fails with one error listing every missing name.
pub fn ensure_present<I, N>(dir: &Path, names: I) -> OdbResult<()>
where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let missing = missing_files(dir, names);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(OdbError::MissingFiles(missing))
    }
}
