//! Services implementing the directory's business logic over the
//! repository traits.

pub mod account;
pub mod recovery;
pub mod session;

pub use account::{AccountService, FederatedIdentity, RegisterAccount};
pub use recovery::RecoveryService;
pub use session::SessionService;
