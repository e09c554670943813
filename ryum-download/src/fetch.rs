use std::fs::File;
use std::fs::remove_file;
use std::fs::rename;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use log::debug;
use log::info;
use log::warn;
use ryum_types::DigestKind;

use crate::Error;
use crate::MirrorList;
use crate::ProgressCallback;
use crate::cache::tmp_path;
use crate::checksum::digest_matches;
use crate::checksum::file_digest;

/// Compose a full URL from a mirror base URL and a repo-relative path.
fn compose_url(base: &str, relative_path: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{relative_path}")
    } else {
        format!("{base}/{relative_path}")
    }
}

/// Build the blocking HTTP client used for all transfers.
fn http_client(url: &str) -> Result<reqwest::blocking::Client, Error> {
    reqwest::blocking::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|source| Error::Transport {
            url: url.to_string(),
            source: std::io::Error::other(source),
        })
}

/// Download a single URL to a local path
///
/// The response body is streamed to `out_path`; the progress callback is
/// invoked per chunk with `(bytes_so_far, bytes_total)` and cancels the
/// transfer when it returns nonzero. The partial file is unlinked on any
/// failure. Redirects are followed; the only success status is `200`.
///
/// `display_name` names the transfer in log output.
///
/// # Errors
///
/// Returns [`Error::Transport`] on connection or body-read failures,
/// [`Error::Http`] on a non-200 response, [`Error::Cancelled`] when the
/// callback cancels, and [`Error::IoPath`] when the local file cannot be
/// written.
pub fn download(
    url: &str,
    out_path: &Path,
    display_name: &str,
    progress: ProgressCallback,
) -> Result<(), Error> {
    debug!("downloading {display_name} from {url}");

    let result = download_inner(url, out_path, progress);
    if result.is_err() {
        let _ = remove_file(out_path);
    }

    result
}

fn download_inner(url: &str, out_path: &Path, mut progress: ProgressCallback) -> Result<(), Error> {
    let client = http_client(url)?;
    let mut response = client
        .get(url)
        .send()
        .map_err(|source| Error::Transport {
            url: url.to_string(),
            source: std::io::Error::other(source),
        })?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(Error::Http {
            url: url.to_string(),
            code: status,
        });
    }

    let total = response.content_length().unwrap_or(0) as f64;
    let mut out = File::create(out_path).map_err(|source| Error::IoPath {
        path: out_path.to_path_buf(),
        context: "opening the download destination".to_string(),
        source,
    })?;

    let mut written = 0u64;
    let mut buf = [0u8; 8192];
    loop {
        let count = response.read(&mut buf).map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;
        if count == 0 {
            break;
        }

        out.write_all(&buf[..count]).map_err(|source| Error::IoPath {
            path: out_path.to_path_buf(),
            context: "writing the download destination".to_string(),
            source,
        })?;
        written += count as u64;

        if progress(written as f64, total) != 0 {
            return Err(Error::Cancelled {
                url: url.to_string(),
            });
        }
    }

    Ok(())
}

/// Download a repo-relative path from the first working mirror
///
/// Picks a random good mirror, composes the URL (inserting a `/` only
/// when the base lacks a trailing slash) and attempts the transfer. On a
/// transport error or a non-success response the mirror is marked bad and
/// another is tried; the output file is truncated between attempts.
///
/// # Errors
///
/// Returns [`Error::AllMirrorsFailed`] once no usable mirror is left.
/// Cancellation and local I/O failures abort immediately without marking
/// the mirror.
pub fn download_from_mirror(
    mirrors: &mut MirrorList,
    relative_path: &str,
    out_path: &Path,
    display_name: &str,
    progress: ProgressCallback,
) -> Result<(), Error> {
    loop {
        let Some(base) = mirrors.pick_random() else {
            warn!("no usable mirror left for {relative_path}");
            return Err(Error::AllMirrorsFailed {
                relative_path: relative_path.to_string(),
            });
        };
        let base = base.to_string();
        let url = compose_url(&base, relative_path);

        match download(&url, out_path, display_name, progress) {
            Ok(()) => return Ok(()),
            Err(error @ (Error::Transport { .. } | Error::Http { .. })) => {
                debug!("{error}; marking {base} as bad");
                mirrors.mark_bad(&base);
            }
            Err(error) => return Err(error),
        }
    }
}

/// Returns `true` if a cached file is absent, truncated, or corrupt
///
/// A file is missing when it cannot be stat'ed, its size differs from
/// `expected_size`, or its digest does not match `expected_digest` (see
/// [`digest_matches`](crate::digest_matches) for the prefix rule;
/// [`DigestKind::None`] skips the digest check).
pub fn is_missing(
    path: &Path,
    expected_digest: &str,
    digest_kind: DigestKind,
    expected_size: u64,
) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return true;
    };
    if metadata.len() != expected_size {
        return true;
    }

    !digest_matches(path, expected_digest, digest_kind)
}

/// Fetch a repo-relative path unless a verified copy is already cached
///
/// When [`is_missing`] reports the cached file stale, the artifact is
/// downloaded from the mirror list to `<out_path>.tmp` and renamed into
/// place after digest verification. A digest mismatch unlinks the
/// temporary and retries the download once; a second mismatch is fatal.
/// Returns `Ok` only when the final file exists and verifies.
///
/// # Errors
///
/// Returns the mirrored-download errors of [`download_from_mirror`], or
/// [`Error::DigestMismatch`] when verification keeps failing.
#[allow(clippy::too_many_arguments)]
pub fn download_if_missing(
    mirrors: &mut MirrorList,
    relative_path: &str,
    out_path: &Path,
    display_name: &str,
    expected_digest: &str,
    digest_kind: DigestKind,
    expected_size: u64,
    progress: ProgressCallback,
) -> Result<(), Error> {
    if is_missing(out_path, expected_digest, digest_kind, expected_size) {
        let tmp = tmp_path(out_path);
        let mut retried = false;

        loop {
            let result =
                download_from_mirror(mirrors, relative_path, &tmp, display_name, progress);
            if let Err(error) = result {
                let _ = remove_file(&tmp);
                return Err(error);
            }

            if digest_matches(&tmp, expected_digest, digest_kind) {
                rename(&tmp, out_path).map_err(|source| Error::IoPath {
                    path: out_path.to_path_buf(),
                    context: "moving the verified download into place".to_string(),
                    source,
                })?;
                info!("downloaded {display_name}");
                break;
            }

            let actual = file_digest(&tmp, digest_kind)?.unwrap_or_default();
            let _ = remove_file(&tmp);

            if retried {
                return Err(Error::DigestMismatch {
                    path: out_path.to_path_buf(),
                    expected: expected_digest.to_string(),
                    actual,
                });
            }
            debug!("digest mismatch for {display_name}, retrying once");
            retried = true;
        }
    }

    if !digest_matches(out_path, expected_digest, digest_kind) {
        let actual = file_digest(out_path, digest_kind)?.unwrap_or_default();
        let _ = remove_file(out_path);
        return Err(Error::DigestMismatch {
            path: out_path.to_path_buf(),
            expected: expected_digest.to_string(),
            actual,
        });
    }

    Ok(())
}
