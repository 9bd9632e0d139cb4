// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod bundler;
pub mod chain;
pub mod provider;
pub mod router;
