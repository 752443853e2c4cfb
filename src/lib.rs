pub mod builder;
pub mod config;
pub mod error;
pub mod json;
pub mod keywords;
pub mod layout;
pub mod metadata;
pub mod nifti;

pub use builder::{DatasetBuilder, DerivativeBuilder, SubjectBuilder};
pub use error::{Error, Result};
pub use keywords::{Combination, KeywordSpec, KeywordValue, MODALITY_KEY};
pub use layout::{stem_for, DatasetTarget, Session, Subject};
