// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Booky project bookkeeping: provisioning numbered project directories and
// assembling their intake collections into one renumbered page sequence.

pub mod assemble;
pub mod provision;

pub use assemble::{AssemblyReport, assemble};
pub use provision::{
    ProvisionReport, ProvisionRequest, existing_project_ids, next_project_id, provision,
};
