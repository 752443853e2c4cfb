//! Dataset builders: turn keyword blocks into image/sidecar pairs on disk.
//!
//! Two builders share the `DatasetBuilder` capability: `SubjectBuilder`
//! emits raw acquisitions under `sub-NN/...`, `DerivativeBuilder` emits
//! annotation files under `derivatives/labels/sub-NN/...` with a label
//! dimension that fully cross-multiplies with the keyword combinations.
//!
//! A build is a stateless traversal (session → block → combination → label)
//! with no retained state between iterations. Each builder covers one
//! subject, so distinct subjects can run on independent workers writing to
//! non-overlapping subtrees; directory creation is idempotent to stay safe
//! under concurrent siblings.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::json::write_json;
use crate::keywords::{Combination, KeywordSpec};
use crate::layout::{stem_for, DatasetTarget, Session, Subject};
use crate::metadata::{DatasetDescription, SidecarMetadata};
use crate::nifti::{mock_nifti1, save_nifti};

/// Default BIDS modality-category folder.
pub const ANAT: &str = "anat";

/// Shape of every placeholder volume.
const MOCK_SHAPE: [usize; 3] = [8, 8, 8];

/// Shared capability of the subject and derivative builders.
///
/// `build` validates every block before the first write, then walks
/// session → block → combination (→ label) and emits one sidecar+image pair
/// per leaf, sidecar first. The dataset description is written exactly once
/// per build, after the traversal. Pre-existing files at a computed path
/// are silently overwritten (last-writer-wins).
pub trait DatasetBuilder {
    fn target(&self) -> &DatasetTarget;
    fn subject(&self) -> Subject;
    fn sessions(&self) -> &[Session];

    /// The label dimension; empty for raw datasets. When non-empty, one
    /// label-suffixed pair is emitted per (combination × label) and the
    /// unlabelled base pair is not.
    fn labels(&self) -> &[String] { &[] }

    fn stem(&self, session: Option<Session>, combination: &Combination) -> String {
        stem_for(self.subject(), session, combination)
    }

    fn dir(&self, session: Option<Session>) -> PathBuf {
        self.target().dir_for(self.subject(), session)
    }

    /// Write `dataset_description.json` at the dataset root.
    fn generate_description(&self) -> Result<()> {
        let dir = self.target().description_dir();
        create_dir_all(&dir).map_err(Error::io(&dir))?;
        write_json(&dir.join("dataset_description.json"), &DatasetDescription::mock())
    }

    fn build(&self, blocks: &[KeywordSpec]) -> Result<()> {
        // A malformed block fails the whole subject before any file exists.
        for block in blocks {
            block.validate()?;
        }
        if self.sessions().is_empty() {
            self.build_session(None, blocks)?;
        } else {
            for &session in self.sessions() {
                self.build_session(Some(session), blocks)?;
            }
        }
        self.generate_description()
    }

    fn build_session(&self, session: Option<Session>, blocks: &[KeywordSpec]) -> Result<()> {
        let dir = self.dir(session);
        create_dir_all(&dir).map_err(Error::io(&dir))?;
        for block in blocks {
            for combination in block.expand()? {
                let stem = self.stem(session, &combination);
                if self.labels().is_empty() {
                    emit_pair(&dir, &stem, &combination)?;
                } else {
                    for label in self.labels() {
                        emit_pair(&dir, &format!("{stem}_{label}"), &combination)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Sidecar first, then image. Fixed order: on partial failure the sidecar
/// may exist without its volume, never the other way around.
fn emit_pair(dir: &Path, stem: &str, combination: &Combination) -> Result<()> {
    write_json(
        &dir.join(format!("{stem}.json")),
        &SidecarMetadata::mock(combination.modality()),
    )?;
    save_nifti(&mock_nifti1(MOCK_SHAPE), &dir.join(format!("{stem}.nii")))
}

/// Builds one subject's raw dataset.
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    target: DatasetTarget,
    subject: Subject,
    sessions: Vec<Session>,
}

impl SubjectBuilder {
    /// An empty `sessions` list means the dataset does not use sessions:
    /// the traversal runs once and paths carry no `ses-` segment.
    pub fn new(root: impl Into<PathBuf>, subject: Subject, sessions: Vec<Session>) -> Self {
        Self::in_category(root, subject, sessions, ANAT)
    }

    pub fn in_category(
        root: impl Into<PathBuf>,
        subject: Subject,
        sessions: Vec<Session>,
        category: impl Into<String>,
    ) -> Self {
        Self { target: DatasetTarget::raw(root.into(), category), subject, sessions }
    }
}

impl DatasetBuilder for SubjectBuilder {
    fn target(&self) -> &DatasetTarget { &self.target }
    fn subject(&self) -> Subject { self.subject }
    fn sessions(&self) -> &[Session] { &self.sessions }
}

/// Builds one subject's annotation dataset under `derivatives/labels`.
#[derive(Debug, Clone)]
pub struct DerivativeBuilder {
    target: DatasetTarget,
    subject: Subject,
    sessions: Vec<Session>,
    labels: Vec<String>,
}

impl DerivativeBuilder {
    pub fn new(
        root: impl Into<PathBuf>,
        subject: Subject,
        sessions: Vec<Session>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            target: DatasetTarget::derivative(root.into(), ANAT),
            subject,
            sessions,
            labels,
        }
    }
}

impl DatasetBuilder for DerivativeBuilder {
    fn target(&self) -> &DatasetTarget { &self.target }
    fn subject(&self) -> Subject { self.subject }
    fn sessions(&self) -> &[Session] { &self.sessions }
    fn labels(&self) -> &[String] { &self.labels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::MODALITY_KEY;
    use tempfile::tempdir;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    fn count_files(root: &Path) -> usize {
        fn walk(dir: &Path, acc: &mut usize) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() { walk(&path, acc) } else { *acc += 1 }
            }
        }
        let mut n = 0;
        walk(root, &mut n);
        n
    }

    #[test]
    fn malformed_block_writes_nothing() {
        let dir = tempdir().unwrap();
        let good = KeywordSpec::contrasts(["T1w"]);
        let bad = KeywordSpec::new().keyword("acq", ["ax"]); // no modality
        let builder = SubjectBuilder::new(dir.path(), Subject(1), vec![Session(1)]);

        assert!(builder.build(&[good, bad]).is_err());
        assert_eq!(count_files(dir.path()), 0);
    }

    #[test]
    fn description_written_once_at_root() {
        let dir = tempdir().unwrap();
        let builder = SubjectBuilder::new(
            dir.path(),
            Subject(2),
            vec![Session(1), Session(2), Session(3)],
        );
        let block = KeywordSpec::contrasts(["T1w", "T2w", "FLAIR", "PD", "MTS"]);
        builder.build(std::slice::from_ref(&block)).unwrap();

        assert!(dir.path().join("dataset_description.json").is_file());
        // 3 sessions x 5 contrasts x (json + nii), plus the one description
        assert_eq!(count_files(dir.path()), 3 * 5 * 2 + 1);
    }

    #[test]
    fn derivative_labels_replace_the_base_pair() {
        let dir = tempdir().unwrap();
        let builder = DerivativeBuilder::new(
            dir.path(),
            Subject(9),
            vec![Session(5)],
            vec!["lesion-manual-rater1".into(), "lesion-manual-rater2".into()],
        );
        let block = KeywordSpec::new()
            .keyword("flip", [1, 2])
            .keyword(MODALITY_KEY, ["MTS"]);
        builder.build(std::slice::from_ref(&block)).unwrap();

        let anat = dir.path().join("derivatives/labels/sub-09/ses-05/anat");
        assert!(anat
            .join("sub-09_ses-05_MTS_flip-1_lesion-manual-rater1.nii")
            .is_file());
        // no unlabelled base pair
        assert!(!anat.join("sub-09_ses-05_MTS_flip-1.nii").exists());
        // description goes under derivatives/, not the tree root
        assert!(dir.path().join("derivatives/dataset_description.json").is_file());
        assert!(!dir.path().join("dataset_description.json").exists());
    }

    #[test]
    fn no_sessions_means_no_ses_segment() {
        let dir = tempdir().unwrap();
        let builder = SubjectBuilder::new(dir.path(), Subject(4), vec![]);
        builder.build(&[KeywordSpec::contrasts(["T2w"])]).unwrap();

        assert!(dir.path().join("sub-04/anat/sub-04_T2w.nii").is_file());
        assert!(dir.path().join("sub-04/anat/sub-04_T2w.json").is_file());
    }
}
