pub mod session;
pub mod toast;

pub use session::{Credentials, SessionStore, UserPatch};
pub use toast::{Toast, ToastKind, ToastQueue};
