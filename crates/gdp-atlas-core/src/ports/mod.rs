// SPDX-License-Identifier: Apache-2.0

mod process;

pub use process::{ProcessError, ProcessPort, ProcessRequest, ProcessResult};
