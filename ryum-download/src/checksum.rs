use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use digest::Digest;
use log::debug;
use md5::Md5;
use ryum_types::DigestKind;
use sha1::Sha1;
use sha2::Sha256;

use crate::Error;

/// Feed a reader through a hash function and return the hex digest.
fn hash_reader<D: Digest>(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buf = [0u8; 8192];

    loop {
        let count = reader.read(&mut buf)?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the hex digest of a file
///
/// Returns `None` for [`DigestKind::None`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
///
/// ## Examples
/// ```no_run
/// use ryum_download::file_digest;
/// use ryum_types::DigestKind;
///
/// let digest = file_digest("/tmp/pkg.rpm", DigestKind::Sha256)?;
/// assert_eq!(Some(64), digest.map(|d| d.len()));
/// # Ok::<(), ryum_download::Error>(())
/// ```
pub fn file_digest(path: impl AsRef<Path>, kind: DigestKind) -> Result<Option<String>, Error> {
    let path = path.as_ref();
    let open = |path: &Path| {
        File::open(path)
            .map(BufReader::new)
            .map_err(|source| Error::IoPath {
                path: path.to_path_buf(),
                context: "opening the file for digesting".to_string(),
                source,
            })
    };
    let io_error = |source| Error::IoPath {
        path: path.to_path_buf(),
        context: "digesting the file".to_string(),
        source,
    };

    let digest = match kind {
        DigestKind::Md5 => hash_reader::<Md5>(open(path)?).map_err(io_error)?,
        DigestKind::Sha1 => hash_reader::<Sha1>(open(path)?).map_err(io_error)?,
        DigestKind::Sha256 => hash_reader::<Sha256>(open(path)?).map_err(io_error)?,
        DigestKind::None => return Ok(None),
    };

    Ok(Some(digest))
}

/// Returns `true` if the file's digest matches the expected hex digest
///
/// The comparison covers the first `expected.len()` characters of the
/// computed hex digest, so truncated expected digests compare against
/// their prefix. Both sides are lowercased. [`DigestKind::None`] always
/// matches; an unreadable file never does.
pub fn digest_matches(path: impl AsRef<Path>, expected: &str, kind: DigestKind) -> bool {
    if kind == DigestKind::None {
        return true;
    }

    let Ok(Some(actual)) = file_digest(path.as_ref(), kind) else {
        return false;
    };

    let expected = expected.to_lowercase();
    if expected.is_empty() || expected.len() > actual.len() {
        return false;
    }

    if actual[..expected.len()] != expected {
        debug!(
            "digest mismatch for {}:\nexpected:   {expected}\ncalculated: {actual}",
            path.as_ref().display()
        );
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;
    use testresult::TestResult;

    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const ABC_SHA1: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";
    const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

    fn file_with(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[rstest]
    #[case(DigestKind::Md5, ABC_MD5)]
    #[case(DigestKind::Sha1, ABC_SHA1)]
    #[case(DigestKind::Sha256, ABC_SHA256)]
    fn file_digest_abc(#[case] kind: DigestKind, #[case] expected: &str) -> TestResult {
        let file = file_with(b"abc");
        assert_eq!(Some(expected.to_string()), file_digest(file.path(), kind)?);
        Ok(())
    }

    #[test]
    fn file_digest_empty() -> TestResult {
        let file = file_with(b"");
        assert_eq!(
            Some(EMPTY_SHA256.to_string()),
            file_digest(file.path(), DigestKind::Sha256)?
        );
        Ok(())
    }

    #[test]
    fn file_digest_none_kind() -> TestResult {
        let file = file_with(b"abc");
        assert_eq!(None, file_digest(file.path(), DigestKind::None)?);
        Ok(())
    }

    #[test]
    fn file_digest_missing_file() {
        assert!(file_digest("/nonexistent/file", DigestKind::Sha256).is_err());
    }

    #[rstest]
    #[case(ABC_SHA256, true)]
    // prefix comparison: the expected length drives the check
    #[case("ba7816bf", true)]
    #[case("BA7816BF", true)]
    #[case("ba7816be", false)]
    #[case(EMPTY_SHA256, false)]
    #[case("", false)]
    fn digest_matches_abc(#[case] expected: &str, #[case] ok: bool) {
        let file = file_with(b"abc");
        assert_eq!(ok, digest_matches(file.path(), expected, DigestKind::Sha256));
    }

    #[test]
    fn digest_matches_none_kind() {
        let file = file_with(b"abc");
        assert!(digest_matches(file.path(), "ignored", DigestKind::None));
    }

    #[test]
    fn digest_matches_missing_file() {
        assert!(!digest_matches(
            "/nonexistent/file",
            ABC_SHA256,
            DigestKind::Sha256
        ));
    }
}
