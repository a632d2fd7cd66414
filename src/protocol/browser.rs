//! `browser` namespace.

use serde::{Deserialize, Serialize};

use super::EmptyParams;

/// `browser.close` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Close(pub EmptyParams);
