//! BIDS path and file-stem rules.
//!
//! These are the pure functions behind the on-disk layout:
//!
//! - Raw: `<root>/sub-<NN>/[ses-<NN>/]<category>/<stem>.{nii,json}`
//! - Derivatives: `<root>/derivatives/labels/sub-<NN>/[ses-<NN>/]<category>/...`
//!
//! The session segment is omitted entirely when no session is given: it is a
//! real branch, not an empty or zero default.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::keywords::Combination;

/// Subject index; renders zero-padded as `sub-05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(pub u32);

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{:02}", self.0)
    }
}

/// Session index; renders zero-padded as `ses-04`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(pub u32);

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ses-{:02}", self.0)
    }
}

/// Where a dataset lives: its root, whether it is the derivatives/labels
/// subtree, and the BIDS modality-category folder (`anat`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetTarget {
    root: PathBuf,
    derivative: bool,
    category: String,
}

impl DatasetTarget {
    pub fn raw(root: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self { root: root.into(), derivative: false, category: category.into() }
    }

    pub fn derivative(root: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self { root: root.into(), derivative: true, category: category.into() }
    }

    pub fn is_derivative(&self) -> bool { self.derivative }

    /// Where the `dataset_description.json` for this dataset belongs:
    /// `<root>` for raw data, `<root>/derivatives` for the labels subtree.
    pub fn description_dir(&self) -> PathBuf {
        if self.derivative { self.root.join("derivatives") } else { self.root.clone() }
    }

    /// Directory holding the image/sidecar pairs for one subject (and
    /// session, when present).
    pub fn dir_for(&self, subject: Subject, session: Option<Session>) -> PathBuf {
        let mut dir = self.root.clone();
        if self.derivative {
            dir.push("derivatives");
            dir.push("labels");
        }
        dir.push(subject.to_string());
        if let Some(session) = session {
            dir.push(session.to_string());
        }
        dir.push(&self.category);
        dir
    }
}

/// The canonical file stem:
/// `sub-<NN>[_ses-<NN>]_<modality>[_<keyword>-<value>]*`.
///
/// The modality token comes first after the subject/session prefix; the
/// remaining keywords follow strictly in their declaration order.
pub fn stem_for(subject: Subject, session: Option<Session>, combination: &Combination) -> String {
    let mut stem = subject.to_string();
    if let Some(session) = session {
        stem.push('_');
        stem.push_str(&session.to_string());
    }
    stem.push('_');
    stem.push_str(&combination.modality().to_string());
    for (key, value) in combination.modifiers() {
        stem.push_str(&format!("_{key}-{value}"));
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{KeywordSpec, MODALITY_KEY};
    use rstest::rstest;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    fn single_combination(spec: KeywordSpec) -> Combination {
        let mut combos = spec.expand().unwrap();
        assert_eq!(combos.len(), 1);
        combos.pop().unwrap()
    }

    // -------------------- Some hand-picked examples --------------------------
    #[rstest(/**/ subject, session       , spec, expected,
             case( 5, Some(Session(4)),
                   KeywordSpec::new().keyword("acq", ["MTon"]).keyword(MODALITY_KEY, ["MTS"]),
                   "sub-05_ses-04_MTS_acq-MTon"),
             case( 9, Some(Session(5)),
                   KeywordSpec::new()
                       .keyword("flip", [2]).keyword("mt", ["off"]).keyword(MODALITY_KEY, ["MTS"]),
                   "sub-09_ses-05_MTS_flip-2_mt-off"),
             // no session: the segment disappears, it is not zero-padded away
             case( 3, None, KeywordSpec::contrasts(["T1w"]), "sub-03_T1w"),
             // two-digit indices stay two digits
             case(12, Some(Session(11)), KeywordSpec::contrasts(["FLAIR"]), "sub-12_ses-11_FLAIR"),
    )]
    fn hand_picked_stems(subject: u32, session: Option<Session>, spec: KeywordSpec, expected: &str) {
        let combo = single_combination(spec);
        assert_eq!(stem_for(Subject(subject), session, &combo), expected);
    }

    #[rstest(/**/ derivative, session, expected,
             case(false, Some(Session(6)), "data/sub-07/ses-06/anat"),
             case(false, None,             "data/sub-07/anat"),
             case(true,  Some(Session(6)), "data/derivatives/labels/sub-07/ses-06/anat"),
             case(true,  None,             "data/derivatives/labels/sub-07/anat"),
    )]
    fn hand_picked_dirs(derivative: bool, session: Option<Session>, expected: &str) {
        let target = if derivative {
            DatasetTarget::derivative("data", "anat")
        } else {
            DatasetTarget::raw("data", "anat")
        };
        assert_eq!(target.dir_for(Subject(7), session), PathBuf::from(expected));
    }

    #[test]
    fn session_absent_paths_never_contain_ses_segment() {
        let target = DatasetTarget::raw("data", "anat");
        let dir = target.dir_for(Subject(1), None);
        assert!(!dir.to_string_lossy().contains("ses-"));
    }

    #[test]
    fn distinct_combinations_give_distinct_stems() {
        let spec = KeywordSpec::new()
            .keyword("flip", [1, 2])
            .keyword("mt", ["on", "off"])
            .keyword(MODALITY_KEY, ["MTS"]);
        let stems: Vec<String> = spec
            .expand()
            .unwrap()
            .iter()
            .map(|c| stem_for(Subject(9), Some(Session(5)), c))
            .collect();
        for (i, a) in stems.iter().enumerate() {
            for b in &stems[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn description_dir_branches_on_derivative() {
        assert_eq!(DatasetTarget::raw("d", "anat").description_dir(), PathBuf::from("d"));
        assert_eq!(
            DatasetTarget::derivative("d", "anat").description_dir(),
            PathBuf::from("d/derivatives"),
        );
    }
}
