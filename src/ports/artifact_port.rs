// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::contract::TableContract;
use crate::domain::errors::Result;
use std::path::{Path, PathBuf};

/// Port for writing hand-off artifacts (DDL, contract description) for a table.
pub trait ArtifactPort: Send + Sync {
    /// Writes every artifact for `contract` into `output_dir` and returns the paths written.
    fn write_artifacts(
        &self,
        schema: &str,
        contract: &TableContract,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}
