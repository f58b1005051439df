//! Group pipeline: materialize → reassemble → unarchive → compress → publish.
//!
//! One [`GroupPipeline::process`] call handles one group end to end inside a
//! scratch directory that is removed when the call returns, whether it
//! succeeded or not.
//!
//! # Steps
//! 1. Fetch every member into the scratch directory under its remote name.
//! 2. If any member has a part number, concatenate all members in ascending
//!    path order into `{group}.csv`.
//! 3. Extract archives; the payload is written to the archive path with
//!    `.zip` removed.
//! 4. Gzip each artifact to `<name>.gz`, rejecting output above the ceiling.
//! 5. Upload each `.gz` under its bare file name.
//!
//! Uploads that finished before a later failure stay in the bucket and are
//! reported on the returned [`GroupError`].

use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, error, info, warn};
use zip::ZipArchive;

use crate::classify::{ArtifactKind, FileDescriptor};
use crate::config::PipelineConfig;
use crate::contract::{ObjectStore, RemoteSession};
use crate::error::{GroupError, GroupErrorKind};
use crate::grouping::{requires_merge, GroupKey};

/// A file in the group's scratch directory.
#[derive(Debug, Clone)]
struct Artifact {
    path: PathBuf,
    kind: ArtifactKind,
}

pub struct GroupPipeline<'a, S: ?Sized, O: ?Sized> {
    session: &'a S,
    store: &'a O,
    config: &'a PipelineConfig,
}

impl<'a, S, O> GroupPipeline<'a, S, O>
where
    S: RemoteSession + ?Sized,
    O: ObjectStore + ?Sized,
{
    pub fn new(session: &'a S, store: &'a O, config: &'a PipelineConfig) -> Self {
        Self {
            session,
            store,
            config,
        }
    }

    /// Process one group, returning the object names written to the bucket.
    pub async fn process(
        &self,
        key: &GroupKey,
        members: &[FileDescriptor],
    ) -> Result<Vec<String>, GroupError> {
        info!(group = %key, members = members.len(), "[SYNC][GROUP] Processing group");

        let work_dir = self
            .create_work_dir(key)
            .map_err(|kind| GroupError::new(key.clone(), kind, Vec::new()))?;

        let mut published = Vec::new();
        let result = self
            .run_steps(key, members, work_dir.path(), &mut published)
            .await;

        let work_path = work_dir.path().to_path_buf();
        if let Err(e) = work_dir.close() {
            warn!(group = %key, path = %work_path.display(), error = ?e, "[SYNC][GROUP] Failed to remove work directory");
        } else {
            debug!(group = %key, path = %work_path.display(), "[SYNC][GROUP] Removed work directory");
        }

        match result {
            Ok(()) => {
                info!(group = %key, objects = published.len(), "[SYNC][GROUP] Group published");
                Ok(published)
            }
            Err(kind) => {
                error!(group = %key, error = %kind, uploaded = published.len(), "[SYNC][GROUP][ERROR] Group failed");
                Err(GroupError::new(key.clone(), kind, published))
            }
        }
    }

    fn create_work_dir(&self, key: &GroupKey) -> Result<tempfile::TempDir, GroupErrorKind> {
        let root = &self.config.work_dir;
        fs::create_dir_all(root).map_err(io_error(root))?;
        tempfile::Builder::new()
            .prefix(&format!("{key}-"))
            .tempdir_in(root)
            .map_err(io_error(root))
    }

    async fn run_steps(
        &self,
        key: &GroupKey,
        members: &[FileDescriptor],
        work_dir: &Path,
        published: &mut Vec<String>,
    ) -> Result<(), GroupErrorKind> {
        let mut artifacts = self.materialize(members, work_dir).await?;

        if requires_merge(members) {
            artifacts = vec![reassemble(key, artifacts, work_dir)?];
        }

        let payloads = artifacts
            .into_iter()
            .map(unarchive)
            .collect::<Result<Vec<_>, _>>()?;

        for payload in payloads {
            let compressed = compress(&payload, self.config.max_compressed_bytes)?;
            let object_name = self.publish(&compressed).await?;
            published.push(object_name);
        }
        Ok(())
    }

    async fn materialize(
        &self,
        members: &[FileDescriptor],
        work_dir: &Path,
    ) -> Result<Vec<Artifact>, GroupErrorKind> {
        let mut artifacts = Vec::with_capacity(members.len());
        for member in members {
            let name = &member.original_name;
            if Path::new(name).file_name() != Some(OsStr::new(name)) {
                return Err(GroupErrorKind::UnsafeName(name.clone()));
            }

            let bytes = self
                .session
                .fetch(name)
                .await
                .map_err(|source| GroupErrorKind::Fetch {
                    file: name.clone(),
                    source,
                })?;

            let local = work_dir.join(name);
            fs::write(&local, &bytes).map_err(io_error(&local))?;
            debug!(file = %name, size = bytes.len(), "[SYNC][GROUP] Downloaded remote file");

            artifacts.push(Artifact {
                path: local,
                kind: member.kind,
            });
        }
        Ok(artifacts)
    }

    async fn publish(&self, compressed: &Path) -> Result<String, GroupErrorKind> {
        let object_name = compressed
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| GroupErrorKind::UnsafeName(compressed.display().to_string()))?;
        let body = fs::read(compressed).map_err(io_error(compressed))?;

        info!(object = %object_name, bucket = %self.config.bucket, size = body.len(), "[SYNC][UPLOAD] Uploading artifact");
        self.store
            .put_object(&self.config.bucket, &object_name, body)
            .await
            .map_err(|source| GroupErrorKind::Upload {
                object: object_name.clone(),
                source,
            })?;
        Ok(object_name)
    }
}

/// Concatenate all parts, ordered by local path, into `{key}.csv`.
///
/// Parts are read fully before the output is written, so the output may
/// replace one of its own inputs.
fn reassemble(
    key: &GroupKey,
    mut parts: Vec<Artifact>,
    work_dir: &Path,
) -> Result<Artifact, GroupErrorKind> {
    parts.sort_by(|a, b| a.path.cmp(&b.path));

    let mut combined = Vec::new();
    for part in &parts {
        let bytes = fs::read(&part.path).map_err(io_error(&part.path))?;
        combined.extend_from_slice(&bytes);
    }

    let merged = work_dir.join(format!("{key}.csv"));
    fs::write(&merged, &combined).map_err(io_error(&merged))?;
    info!(
        path = %merged.display(),
        parts = parts.len(),
        size = combined.len(),
        "[SYNC][GROUP] Reassembled multi-part file"
    );

    Ok(Artifact {
        path: merged,
        kind: ArtifactKind::Plain,
    })
}

fn unarchive(artifact: Artifact) -> Result<PathBuf, GroupErrorKind> {
    match artifact.kind {
        ArtifactKind::Plain => Ok(artifact.path),
        ArtifactKind::Archive => extract_archive(&artifact.path),
    }
}

/// Extract the first file entry of a zip archive to the archive's own path
/// with the `.zip` extension removed.
fn extract_archive(archive_path: &Path) -> Result<PathBuf, GroupErrorKind> {
    let extract_error = |source| GroupErrorKind::Extract {
        archive: archive_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).map_err(io_error(archive_path))?;
    let mut archive = ZipArchive::new(file).map_err(extract_error)?;

    let mut file_entries = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(extract_error)?;
        if entry.is_file() {
            file_entries.push(index);
        }
    }
    let Some(&payload_index) = file_entries.first() else {
        return Err(GroupErrorKind::EmptyArchive {
            archive: archive_path.to_path_buf(),
        });
    };
    if file_entries.len() > 1 {
        warn!(
            archive = %archive_path.display(),
            entries = file_entries.len(),
            "Archive holds more than one file; using the first"
        );
    }

    let output = archive_path.with_extension("");
    let mut entry = archive.by_index(payload_index).map_err(extract_error)?;
    let mut out = File::create(&output).map_err(io_error(&output))?;
    io::copy(&mut entry, &mut out).map_err(io_error(&output))?;

    info!(
        archive = %archive_path.display(),
        entry = %entry.name(),
        path = %output.display(),
        "Extracted archive payload"
    );
    Ok(output)
}

/// Gzip `path` to `path.gz` and enforce the size ceiling on the result.
fn compress(path: &Path, max_bytes: u64) -> Result<PathBuf, GroupErrorKind> {
    let mut gz_name = OsString::from(path.as_os_str());
    gz_name.push(".gz");
    let output = PathBuf::from(gz_name);

    let mut input = File::open(path).map_err(io_error(path))?;
    let out = File::create(&output).map_err(io_error(&output))?;
    let mut encoder = GzEncoder::new(BufWriter::new(out), Compression::default());
    io::copy(&mut input, &mut encoder).map_err(io_error(&output))?;
    let mut writer = encoder.finish().map_err(io_error(&output))?;
    writer.flush().map_err(io_error(&output))?;
    drop(writer);

    let size = fs::metadata(&output).map_err(io_error(&output))?.len();
    if size > max_bytes {
        return Err(GroupErrorKind::SizeLimitExceeded {
            artifact: output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size,
            limit: max_bytes,
        });
    }

    debug!(path = %output.display(), size, "Compressed artifact");
    Ok(output)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> GroupErrorKind + '_ {
    move |source| GroupErrorKind::Io {
        path: path.to_path_buf(),
        source,
    }
}
