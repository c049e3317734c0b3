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

//! # Batch Source Port
//!
//! Where incoming batches come from. Sources only land data; they make no
//! promise about column types, which the enforcement engine assigns later.

use crate::domain::errors::Result;
use arrow::record_batch::RecordBatch;

pub trait BatchSource: Send + Sync {
    /// Reads the whole source as a single batch.
    fn read_batch(&self) -> Result<RecordBatch>;

    /// Human-readable origin, used in logs and the run report.
    fn describe(&self) -> String;
}
