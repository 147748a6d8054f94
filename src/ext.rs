use std::path::{Path, PathBuf};

/// Flattens an object key into a single path component.
///
/// Every `/` becomes `_`. The mapping is lossy: `a/b` and `a_b` flatten to the
/// same name and the later download overwrites the earlier one.
///
/// Keys come from the bucket and are otherwise trusted; check the result with
/// [`is_plain_file_name`] before joining it to a directory.
pub trait FlattenKey {
    fn flatten_key(&self) -> String;
}

impl<T> FlattenKey for T
where
    T: AsRef<str> + ?Sized,
{
    fn flatten_key(&self) -> String {
        self.as_ref().replace('/', "_")
    }
}

pub trait LocalPathExt {
    fn local_path_for(&self, key: &str) -> PathBuf;
}

impl LocalPathExt for Path {
    fn local_path_for(&self, key: &str) -> PathBuf {
        self.join(key.flatten_key())
    }
}

/// True when `name` stays a direct child once joined to a directory.
///
/// Rejects empty names, `.` and `..`, and on Windows any `\` or `:` since
/// those change how `Path::join` resolves there.
pub fn is_plain_file_name(name: &str) -> bool {
    let windows_separator = cfg!(windows) && (name.contains('\\') || name.contains(':'));

    !(name.is_empty() || name == "." || name == ".." || windows_separator)
}
