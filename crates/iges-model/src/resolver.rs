// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter lookup trait

use crate::{DeNumber, DecodedEntity, DirectoryEntry, ParameterRecord, Result};
use std::sync::Arc;

/// Parameter data lookup by directory-entry number
///
/// Implementations decode lazily and cache records, so repeated lookups of
/// shared entities (vertex lists, curves used by several edges) are cheap.
pub trait ParameterSource {
    /// Tokenized parameter record of the entity at `de`
    fn parameters(&self, de: DeNumber, entry: &DirectoryEntry) -> Result<Arc<ParameterRecord>>;

    /// Decode the entity at `de` into its typed layout
    fn decode(&self, de: DeNumber, entry: &DirectoryEntry) -> Result<DecodedEntity> {
        let record = self.parameters(de, entry)?;
        DecodedEntity::decode(&record, entry.entity_type, entry.form)
    }
}
