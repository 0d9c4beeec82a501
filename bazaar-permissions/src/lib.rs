//! Permission Resolver: the pure `resolve`/`is_visible` algorithm from
//! spec §4.2. The R2E `Guard` adapter that calls this against a concrete
//! application state lives in the `bazaar` binary crate, since guards are
//! necessarily generic over the app's own state type.

pub mod resolve;

pub use resolve::{is_visible, resolve, EffectivePermission, Principal};
