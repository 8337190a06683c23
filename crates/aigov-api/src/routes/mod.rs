//! # Route Modules
//!
//! | Prefix                  | Module          | Domain                     |
//! |-------------------------|-----------------|----------------------------|
//! | `/v1/auth/*`            | [`sessions`]    | Login, switch, logout      |
//! | `/v1/enterprises/*`     | [`enterprises`] | Enterprise & seat creation |
//! | `/v1/policies/*`        | [`policies`]    | Snapshot management        |
//! | `/v1/policy/evaluate`   | [`governance`]  | Ad-hoc rule evaluation     |
//! | `/v1/governance/decide` | [`governance`]  | Gated decision recording   |
//! | `/v1/replay/*`          | [`replay`]      | Single & bulk replay       |

pub mod enterprises;
pub mod governance;
pub mod policies;
pub mod replay;
pub mod sessions;
